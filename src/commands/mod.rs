// Prefix commands
pub mod config;
pub mod help;
pub mod ping;
pub mod roll;
