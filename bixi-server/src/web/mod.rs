//! HTTP tool surface.
//!
//! Each query operation is exposed as a named tool invoked with
//! `POST /tools/{name}` and a JSON object of arguments.

mod dto;
mod routes;
mod state;
mod tools;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
pub use tools::Tool;
