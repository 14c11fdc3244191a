pub mod auth_service;
pub mod pending_registration_service;
pub mod registration_service;
pub mod user_service;

pub use auth_service::*;
pub use pending_registration_service::*;
pub use registration_service::*;
pub use user_service::*;
