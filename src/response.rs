use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tracing::info;

/// Uniform envelope for every 2xx response.
#[derive(Debug)]
pub struct Success {
    status: StatusCode,
    message: String,
    data: Value,
    meta: Value,
}

impl Success {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: json!({}),
            meta: json!({}),
        }
    }

    pub fn created(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            ..Self::new(message)
        }
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }
}

impl IntoResponse for Success {
    fn into_response(self) -> Response {
        let time_stamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        info!(status = %self.status, "{}", self.message);
        (
            self.status,
            Json(json!({
                "success": true,
                "status": "Success",
                "message": self.message,
                "data": self.data,
                "meta": self.meta,
                "timeStamp": time_stamp,
            })),
        )
            .into_response()
    }
}
