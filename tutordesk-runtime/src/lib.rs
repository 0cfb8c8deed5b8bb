pub mod admin;
pub mod ask;
pub mod auth;
pub mod config_store;
pub mod courses;
pub mod defaults;
pub mod files;
pub mod ipc;
pub mod secrets;
pub mod session_store;
pub mod transcript;
pub mod voice;
