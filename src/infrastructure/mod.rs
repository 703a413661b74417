pub mod api_client;
pub mod bootstrap;
pub mod config;
pub mod spreadsheet;
