pub mod auth;
pub mod user;

pub use auth::auth_config;
pub use user::user_config;

use crate::error::AppError;
use actix_web::web;

/// Malformed JSON bodies answer with the same 400 shape as validation failures.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(64 * 1024)
        .error_handler(|err, _req| {
            AppError::ValidationError(format!("JSON inválido: {err}")).into()
        })
}
