use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::validation;

pub const PASSWORD_RULE_MSG: &str = "Password requires at least 8 characters, with at least one upcase, a lowercase and a special character! Oss";

/// The persisted user record. The password column holds an argon2 hash and
/// is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub age: i64,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub created_at: OffsetDateTime,
}

impl User {
    /// Schema-level invariant check, run before every insert or update.
    /// Collects one message per failing rule instead of stopping at the
    /// first, so the validation envelope can report them all.
    ///
    /// `plaintext` is the not-yet-hashed password when one is being set;
    /// a stored hash is never checked against the strength rule.
    pub fn validate(&self, plaintext: Option<&str>) -> Vec<String> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required".to_string());
        } else if !validation::valid_name(&self.name) {
            errors.push("Name must not containg numbers!".to_string());
        }

        if self.age < 1 {
            errors.push("Age must be at least 1".to_string());
        }

        if !validation::valid_email(&self.email) {
            errors.push("Please, insert a valid email!".to_string());
        }

        if let Some(plain) = plaintext {
            if !validation::valid_password(plain) {
                errors.push(PASSWORD_RULE_MSG.to_string());
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> User {
        User {
            id: Uuid::new_v4(),
            name: "Test User".to_string(),
            age: 25,
            email: "test@example.com".to_string(),
            password: "$argon2id$fake".to_string(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn valid_user_produces_no_errors() {
        assert!(sample().validate(None).is_empty());
        assert!(sample().validate(Some("Valid@123")).is_empty());
    }

    #[test]
    fn aggregates_every_failing_rule() {
        let user = User {
            name: String::new(),
            email: "invalid-email@".to_string(),
            ..sample()
        };
        let errors = user.validate(None);
        assert!(errors.contains(&"Name is required".to_string()));
        assert!(errors.contains(&"Please, insert a valid email!".to_string()));
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn name_with_digits_gets_the_schema_message() {
        let user = User {
            name: "John3".to_string(),
            ..sample()
        };
        assert_eq!(user.validate(None), vec!["Name must not containg numbers!"]);
    }

    #[test]
    fn password_rule_applies_only_when_plaintext_is_set() {
        let user = sample();
        assert!(user.validate(None).is_empty());
        assert_eq!(user.validate(Some("123")), vec![PASSWORD_RULE_MSG]);
    }

    #[test]
    fn serialization_never_exposes_the_password() {
        let value = serde_json::to_value(sample()).unwrap();
        assert!(value.get("password").is_none());
        assert!(value.get("email").is_some());
    }
}
