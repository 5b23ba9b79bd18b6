use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::users::model::User;
use crate::users::store::{StoreError, UserStore};

/// Postgres-backed [`UserStore`]. The `users_email_key` unique index is the
/// authoritative uniqueness guarantee; violations surface as
/// [`StoreError::Duplicate`].
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_email_conflict(err: sqlx::Error, email: &str) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::duplicate_email(email);
        }
    }
    StoreError::Backend(anyhow::Error::new(err))
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: User) -> Result<User, StoreError> {
        let created = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, name, age, email, password, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, age, email, password, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, &user.email))?;
        Ok(created)
    }

    async fn find_all(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, email, password, created_at
            FROM users
            ORDER BY created_at
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        Ok(users)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, email, password, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, age, email, password, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(anyhow::Error::new)?;
        Ok(user)
    }

    async fn update(&self, user: User) -> Result<User, StoreError> {
        let updated = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $2, age = $3, email = $4, password = $5
            WHERE id = $1
            RETURNING id, name, age, email, password, created_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(user.age)
        .bind(&user.email)
        .bind(&user.password)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_email_conflict(e, &user.email))?;
        Ok(updated)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(anyhow::Error::new)?;
        Ok(result.rows_affected() > 0)
    }
}
