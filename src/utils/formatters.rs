// Formatting utilities

use super::config::{MAX_CHANNEL_NAME_LEN, PRIVATE_CHANNEL_PREFIX};

/// Lowercase the name and replace spaces with hyphens
pub fn slugify(name: &str) -> String {
    name.to_lowercase().replace(' ', "-")
}

/// Name of the private channel created for a player
pub fn private_channel_name(player_name: &str) -> String {
    let name = format!("{}{}", PRIVATE_CHANNEL_PREFIX, slugify(player_name));
    name.chars().take(MAX_CHANNEL_NAME_LEN).collect()
}

/// Truncate string to max length (in chars) with ellipsis
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Gandalf o Cinzento"), "gandalf-o-cinzento");
        assert_eq!(slugify("Éowyn"), "éowyn");
        assert_eq!(slugify("aragorn"), "aragorn");
    }

    #[test]
    fn test_private_channel_name() {
        assert_eq!(private_channel_name("Bilbo Bolseiro"), "diario-bilbo-bolseiro");

        let long = "a".repeat(200);
        assert_eq!(private_channel_name(&long).chars().count(), 100);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 8), "hello...");
        assert_eq!(truncate("ação ação", 7), "ação...");
    }
}
