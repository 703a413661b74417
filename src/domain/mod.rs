pub mod api_config;
pub mod error;

// Student import module
pub mod import;
