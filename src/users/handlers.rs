use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::{json, Map, Value};
use time::OffsetDateTime;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    error::ApiError,
    response::Success,
    state::AppState,
    users::{
        dto::PublicUser,
        model::User,
        password::{hash_password, password_matches},
        store::StoreError,
    },
    validation::{normalize_email, parse_age, sanitize_body, valid_name, valid_password},
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/checkUsers", get(check_users))
        .route("/updateUser/:id", put(update_user))
        .route("/deleteUser/:id", delete(delete_user))
}

/// A field counts as filled when it is present, non-null and, for strings,
/// non-empty after trimming. Numbers are always filled.
fn is_filled(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(_) => true,
    }
}

fn extra_fields_error(extras: Vec<String>) -> ApiError {
    warn!(fields = ?extras, "request carried unknown fields");
    ApiError::bad_request(
        format!("EXTRA FIELDS ARE NOT ALLOWED: {}", extras.join(", ")),
        None,
        "ERR_EXTRA_FIELDS",
    )
}

#[instrument(skip(state, body))]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Success, ApiError> {
    sanitize_body(&body).map_err(extra_fields_error)?;

    if !["name", "age", "email", "password"]
        .iter()
        .all(|field| is_filled(body.get(*field)))
    {
        return Err(ApiError::bad_request(
            "ALL FIELDS NEED TO BE FILLED!",
            None,
            "ERR_MISSING_FIELDS",
        ));
    }

    let name = match body.get("name") {
        Some(Value::String(s)) if valid_name(s) => s.trim().to_string(),
        _ => {
            return Err(ApiError::bad_request(
                "ADD FUNCTION: INVALID NAME!",
                Some("name"),
                "ERR_INVALID_NAME",
            ))
        }
    };

    let age = parse_age(body.get("age").unwrap_or(&Value::Null)).ok_or_else(|| {
        ApiError::bad_request("ADD FUNCTION: INVALID AGE!", Some("age"), "ERR_INVALID_AGE")
    })?;

    let email = body
        .get("email")
        .and_then(Value::as_str)
        .map(normalize_email)
        .unwrap_or_default();

    // Friendlier conflict error than the index violation; the store still
    // closes the race if two registrations slip past this check.
    match state.store.find_by_email(&email).await {
        Ok(Some(_)) => {
            warn!(email = %email, "email already registered");
            return Err(ApiError::bad_request(
                "EMAIL ALREADY IN USE!",
                Some("email"),
                "ERR_EMAIL_IN_USE",
            ));
        }
        Ok(None) => {}
        Err(err) => return Err(register_failed(err)),
    }

    let plaintext = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut user = User {
        id: Uuid::new_v4(),
        name,
        age,
        email,
        password: String::new(),
        created_at: OffsetDateTime::now_utc(),
    };

    let errors = user.validate(Some(plaintext));
    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }

    user.password = hash_password(plaintext).map_err(|e| register_failed(StoreError::Backend(e)))?;

    let user = match state.store.insert(user).await {
        Ok(user) => user,
        Err(err) => return Err(register_failed(err)),
    };

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Success::created("SUCCESSFULLY REGISTERED!").data(json!(PublicUser::from(&user))))
}

fn register_failed(err: StoreError) -> ApiError {
    ApiError::store(
        err,
        "UNEXPECTED ERROR IN REGISTER FUNCTION!",
        None,
        "ERR_REGISTER_FAILED",
    )
}

#[instrument(skip(state))]
pub async fn check_users(State(state): State<AppState>) -> Result<Success, ApiError> {
    let users = state.store.find_all().await.map_err(|err| {
        ApiError::store(
            err,
            "UNEXPECTED ERROR WHILE CHECKING USERS!",
            None,
            "ERR_CHECKUSER_FAILED",
        )
    })?;

    if users.is_empty() {
        return Ok(Success::new("NO USERS FOUND!").data(json!([])));
    }

    let listed: Vec<PublicUser> = users.iter().map(PublicUser::from).collect();
    info!(count = listed.len(), "users listed");
    Ok(Success::new("USERS SUCCESSFULLY FOUND!").data(json!(listed)))
}

#[instrument(skip(state, body))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Result<Success, ApiError> {
    let id: Uuid = raw_id.parse().map_err(|_| {
        warn!(id = %raw_id, "malformed user id");
        ApiError::bad_request(
            "UPDATE FUNCTION: INVALID USER ID FORMAT!",
            Some("id"),
            "ERR_INVALID_ID",
        )
    })?;

    let found = state
        .store
        .find_by_id(id)
        .await
        .map_err(update_failed)?;
    let Some(mut user) = found else {
        return Err(ApiError::not_found(
            "USER NOT FOUND!",
            Some("id"),
            "ERR_USER_NOT_FOUND",
        ));
    };

    sanitize_body(&body).map_err(extra_fields_error)?;

    if body.is_empty() {
        return Err(ApiError::bad_request(
            "AT LEAST ONE FIELD NEED TO BE FILLED!",
            None,
            "ERR_NO_FIELDS_TO_UPDATE",
        ));
    }

    let mut changed = false;

    if let Some(value) = body.get("name") {
        let name = match value {
            Value::String(s) if valid_name(s) => s.trim().to_string(),
            _ => {
                return Err(ApiError::bad_request(
                    "UPDATE FUNCTION: INVALID NAME!",
                    Some("name"),
                    "ERR_INVALID_NAME",
                ))
            }
        };
        if name != user.name {
            user.name = name;
            changed = true;
        }
    }

    if let Some(value) = body.get("age") {
        let age = parse_age(value).ok_or_else(|| {
            ApiError::bad_request(
                "UPDATE FUNCTION: INVALID AGE!",
                Some("age"),
                "ERR_INVALID_AGE",
            )
        })?;
        if age != user.age {
            user.age = age;
            changed = true;
        }
    }

    if let Some(value) = body.get("password") {
        let plain = value.as_str().unwrap_or_default();
        // Resubmitting the current password is a no-op, not an error; only a
        // genuinely new plaintext is strength-checked and re-hashed.
        if !password_matches(plain, &user.password) {
            if !valid_password(plain) {
                return Err(ApiError::bad_request(
                    "UPDATE FUNCTION: INVALID PASSWORD!",
                    Some("password"),
                    "ERR_INVALID_PASSWORD",
                ));
            }
            user.password = hash_password(plain)
                .map_err(|e| update_failed(StoreError::Backend(e)))?;
            changed = true;
        }
    }

    if let Some(value) = body.get("email") {
        let email = normalize_email(value.as_str().unwrap_or_default());
        if email != user.email {
            let taken = state
                .store
                .find_by_email(&email)
                .await
                .map_err(update_failed)?;
            if taken.is_some_and(|other| other.id != user.id) {
                warn!(email = %email, "email taken by another user");
                return Err(ApiError::bad_request(
                    "EMAIL IS ALREADY IN USE!",
                    Some("email"),
                    "ERR_EMAIL_IN_USE",
                ));
            }
            user.email = email;
            changed = true;
        }
    }

    if !changed {
        warn!(user_id = %user.id, "update left every field as it was");
        return Err(ApiError::bad_request(
            "ANYTHING HAS CHANGED!",
            None,
            "ERR_NO_CHANGES",
        ));
    }

    let errors = user.validate(None);
    if !errors.is_empty() {
        return Err(ApiError::Validation { errors });
    }

    state.store.update(user).await.map_err(update_failed)?;

    info!(user_id = %id, "user updated");
    Ok(Success::new("USER SUCCESSFULLY UPDATED!"))
}

fn update_failed(err: StoreError) -> ApiError {
    ApiError::store(
        err,
        "UNEXPECTED ERROR IN UPDATE FUNCTION!",
        None,
        "ERR_UPDATE_FAILED",
    )
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Success, ApiError> {
    let id: Uuid = raw_id.parse().map_err(|_| {
        warn!(id = %raw_id, "malformed user id");
        ApiError::bad_request(
            "DELETE FUNCTION: INVALID USER ID FORMAT!",
            Some("id"),
            "ERR_INVALID_ID",
        )
    })?;

    let deleted = state.store.delete_by_id(id).await.map_err(|err| {
        ApiError::store(
            err,
            "UNEXPECTED ERROR IN DELETE FUNCTION!",
            None,
            "ERR_DELETE_FAILED",
        )
    })?;

    if !deleted {
        return Err(ApiError::not_found(
            "USER NOT FOUND!",
            Some("id"),
            "ERR_USER_NOT_FOUND",
        ));
    }

    info!(user_id = %id, "user deleted");
    Ok(Success::new("USER SUCCESSFULLY DELETED!"))
}
