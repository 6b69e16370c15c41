use serde::{Deserialize, Serialize};

/// Guild (Server) specific configuration
///
/// Everything is referenced by name rather than by id, so server admins can
/// recreate a channel or role without reconfiguring the bot.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GuildConfig {
    /// Channel where newcomers are greeted and asked for their character name
    #[serde(rename = "canal_introducao")]
    pub intro_channel: String,
    /// Role granted once onboarding completes
    #[serde(rename = "cargo_jogador")]
    pub player_role: String,
    /// Category holding the per-player private channels
    #[serde(rename = "categoria_privados")]
    pub private_category: String,
}

impl Default for GuildConfig {
    fn default() -> Self {
        Self {
            intro_channel: "introducao".to_string(),
            player_role: "Jogador".to_string(),
            private_category: "Sessões Individuais".to_string(),
        }
    }
}

/// A single editable setting of [`GuildConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigField {
    IntroChannel,
    PlayerRole,
    PrivateCategory,
}

impl ConfigField {
    pub fn apply(self, config: &mut GuildConfig, value: String) {
        match self {
            ConfigField::IntroChannel => config.intro_channel = value,
            ConfigField::PlayerRole => config.player_role = value,
            ConfigField::PrivateCategory => config.private_category = value,
        }
    }

    /// Human readable label used in command replies
    pub fn label(self) -> &'static str {
        match self {
            ConfigField::IntroChannel => "O canal de introdução",
            ConfigField::PlayerRole => "O cargo de jogador",
            ConfigField::PrivateCategory => "A categoria de canais privados",
        }
    }
}
