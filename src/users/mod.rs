use crate::state::AppState;
use axum::Router;

mod dto;
pub mod handlers;
pub mod model;
pub mod password;
pub mod pg;
pub mod store;

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
