pub mod auth_service;
pub mod prompts;
pub mod reading_service;
