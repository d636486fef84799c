pub mod auth;
pub use auth::AuthService;
pub mod session_store;
pub use session_store::{InMemorySessionStore, SessionStore};
pub mod licence_service;
pub use licence_service::LicenceService;
pub mod sharing_service;
pub use sharing_service::SharingService;
pub mod registration_service;
pub use registration_service::RegistrationService;
pub mod status_service;
pub use status_service::StatusService;
