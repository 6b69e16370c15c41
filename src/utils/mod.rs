// Utility functions module
pub mod config;
pub mod dice;
pub mod formatters;
