use axum::{
    extract::{Path, State},
    routing::get,
    Router,
};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::ApiError,
    response::Success,
    state::AppState,
    validation::{normalize_email, valid_email_loose},
};

pub fn email_routes() -> Router<AppState> {
    Router::new().route("/checkEmail/:email", get(check_email))
}

/// Availability probe for the registration form. Deliberately uses the
/// permissive email pattern; the strict one only guards actual registration.
#[instrument(skip(state))]
pub async fn check_email(
    State(state): State<AppState>,
    Path(raw): Path<String>,
) -> Result<Success, ApiError> {
    let email = normalize_email(&raw);
    debug!(email = %email, "checking email availability");

    if email.is_empty() || !valid_email_loose(&email) {
        warn!(email = %email, "malformed email");
        return Err(ApiError::bad_request(
            "EMAIL IS INVALID!",
            Some("email"),
            "ERR_INVALID_EMAIL",
        ));
    }

    let exists = state
        .store
        .find_by_email(&email)
        .await
        .map_err(|err| {
            ApiError::store(
                err,
                "ERROR TO CHECK EMAIL!",
                Some("EMAIL"),
                "ERR_EMAIL_CHECK_FAILED",
            )
        })?
        .is_some();

    if exists {
        warn!(email = %email, "email is taken");
    } else {
        info!(email = %email, "email is available");
    }

    Ok(Success::new(format!("{email} checked successfully."))
        .data(json!({ "exists": exists })))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    fn app() -> Router {
        build_app(AppState::fake())
    }

    async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn register(app: &Router, email: &str) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/register")
            .header("content-type", "application/json")
            .body(Body::from(
                json!({
                    "name": "Existing User",
                    "age": 30,
                    "email": email,
                    "password": "Test@1234",
                })
                .to_string(),
            ))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn reports_false_for_an_unknown_email() {
        let app = app();
        let (status, body) = get_json(&app, "/api/checkEmail/exist@example.com").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["exists"], false);
    }

    #[tokio::test]
    async fn reports_true_for_a_registered_email() {
        let app = app();
        register(&app, "exist@example.com").await;

        let (status, body) = get_json(&app, "/api/checkEmail/exist@example.com").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["exists"], true);
        assert!(body["message"]
            .as_str()
            .unwrap()
            .contains("exist@example.com"));
    }

    #[tokio::test]
    async fn lookup_is_case_insensitive() {
        let app = app();
        register(&app, "exist@example.com").await;

        let (_, body) = get_json(&app, "/api/checkEmail/EXIST@EXAMPLE.COM").await;
        assert_eq!(body["data"]["exists"], true);
    }

    #[tokio::test]
    async fn rejects_a_malformed_email() {
        let app = app();
        let (status, body) = get_json(&app, "/api/checkEmail/notanemail").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "EMAIL IS INVALID!");
        assert_eq!(body["code"], "ERR_INVALID_EMAIL");
    }

    #[tokio::test]
    async fn accepts_addresses_the_strict_pattern_would_refuse() {
        let app = app();
        let (status, body) = get_json(&app, "/api/checkEmail/odd!chars@weird.x").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["exists"], false);
    }
}
