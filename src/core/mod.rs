pub mod app;
pub mod config;
pub mod conversation;
pub mod identity;
pub mod presence;
pub mod session;
