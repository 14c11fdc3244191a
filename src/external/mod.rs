pub mod google;
pub mod mailer;
pub mod smtp;

pub use google::*;
pub use mailer::*;
pub use smtp::*;
