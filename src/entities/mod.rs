pub mod pending_registrations;
pub mod user_profiles;
pub mod users;

pub use pending_registrations as pending_registration_entity;
pub use user_profiles as user_profile_entity;
pub use users as user_entity;
