// Data models
pub mod guild;
