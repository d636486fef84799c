pub mod auth;
pub mod crm;
pub mod scope;
pub mod session;
