pub mod common;
pub mod registration;
pub mod user;

pub use common::*;
pub use registration::*;
pub use user::*;
