// Bot features
pub mod gateway;
pub mod guild_config;
pub mod keep_alive;
pub mod onboarding;
