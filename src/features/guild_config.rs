// Per-guild configuration store
// One flat JSON file mapping guild id -> GuildConfig, rewritten wholesale on every change.

use std::collections::BTreeMap;
use std::path::PathBuf;

use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::models::guild::{ConfigField, GuildConfig};

/// Guild id (decimal string) -> settings
pub type ConfigTable = BTreeMap<String, GuildConfig>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("could not access `{path}`: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not parse `{path}`: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("could not serialize guild configs: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// Where the table is persisted
#[async_trait]
pub trait ConfigBackend: Send + Sync {
    async fn load(&self) -> Result<ConfigTable, StoreError>;
    async fn save(&self, table: &ConfigTable) -> Result<(), StoreError>;
}

/// Stores the table in a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ConfigBackend for JsonFileBackend {
    async fn load(&self) -> Result<ConfigTable, StoreError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Io {
                path: self.path.clone(),
                source,
            })?;

        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, table: &ConfigTable) -> Result<(), StoreError> {
        let serialized = serde_json::to_string_pretty(table).map_err(StoreError::Serialize)?;
        let io_err = |path: &PathBuf| {
            let path = path.clone();
            move |source: std::io::Error| StoreError::Io { path, source }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(io_err(&parent.to_path_buf()))?;
        }

        // Write next to the target, then rename over it
        let tmp_path = self.path.with_extension("json.new");
        tokio::fs::write(&tmp_path, serialized)
            .await
            .map_err(io_err(&tmp_path))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(io_err(&self.path))?;

        Ok(())
    }
}

/// In-memory table guarded by a lock, persisted through a [`ConfigBackend`]
///
/// Every read-modify-write and the save that follows it happen under the same
/// lock, so concurrent tasks never persist a stale snapshot.
#[derive(Debug)]
pub struct ConfigStore<B = JsonFileBackend> {
    backend: B,
    table: Mutex<ConfigTable>,
}

impl<B: ConfigBackend> ConfigStore<B> {
    /// Load the persisted table. A missing or corrupt store starts empty.
    pub async fn load(backend: B) -> Self {
        let table = match backend.load().await {
            Ok(table) => table,
            Err(StoreError::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                info!("No guild config file yet, starting empty");
                ConfigTable::new()
            }
            Err(e) => {
                warn!("Failed to load guild configs, starting empty: {}", e);
                ConfigTable::new()
            }
        };

        Self {
            backend,
            table: Mutex::new(table),
        }
    }

    /// Return the guild's settings, creating and persisting the defaults the
    /// first time the guild is seen.
    pub async fn get_or_create(&self, guild_id: serenity::GuildId) -> GuildConfig {
        let mut table = self.table.lock().await;
        let key = guild_id.to_string();

        if let Some(config) = table.get(&key) {
            return config.clone();
        }

        let config = GuildConfig::default();
        table.insert(key, config.clone());
        debug!("Created default config for guild {}", guild_id);

        // The in-memory entry stays authoritative; the next mutation rewrites the file anyway.
        if let Err(e) = self.backend.save(&table).await {
            warn!("Failed to persist default config for guild {}: {}", guild_id, e);
        }

        config
    }

    /// Change one setting and persist the whole table
    pub async fn set(
        &self,
        guild_id: serenity::GuildId,
        field: ConfigField,
        value: String,
    ) -> Result<GuildConfig, StoreError> {
        let mut table = self.table.lock().await;
        let key = guild_id.to_string();
        let previous = table.get(&key).cloned();

        let mut updated = previous.clone().unwrap_or_default();
        field.apply(&mut updated, value);
        table.insert(key.clone(), updated.clone());

        // A failed write must not leave the unsaved value in memory
        if let Err(e) = self.backend.save(&table).await {
            match previous {
                Some(config) => table.insert(key, config),
                None => table.remove(&key),
            };
            return Err(e);
        }
        info!("Updated config for guild {}: {:?}", guild_id, field);

        Ok(updated)
    }

    /// Rewrite the whole table to the backend
    pub async fn save(&self) -> Result<(), StoreError> {
        let table = self.table.lock().await;
        self.backend.save(&table).await
    }

    /// Number of guilds with a stored config
    pub async fn len(&self) -> usize {
        self.table.lock().await.len()
    }
}

/// Backend that never touches the filesystem
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryBackend {
    initial: ConfigTable,
    saved: std::sync::Mutex<Option<ConfigTable>>,
    saves: std::sync::atomic::AtomicUsize,
    /// Every save fails while set
    broken: std::sync::atomic::AtomicBool,
}

#[cfg(test)]
impl MemoryBackend {
    pub fn with_table(initial: ConfigTable) -> Self {
        Self {
            initial,
            ..Default::default()
        }
    }

    pub fn set_broken(&self, broken: bool) {
        self.broken.store(broken, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn save_count(&self) -> usize {
        self.saves.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn last_saved(&self) -> Option<ConfigTable> {
        self.saved.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl ConfigBackend for MemoryBackend {
    async fn load(&self) -> Result<ConfigTable, StoreError> {
        Ok(self.initial.clone())
    }

    async fn save(&self, table: &ConfigTable) -> Result<(), StoreError> {
        self.saves.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        if self.broken.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(StoreError::Io {
                path: PathBuf::from("memory"),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        *self.saved.lock().unwrap() = Some(table.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    const GUILD: serenity::GuildId = serenity::GuildId::new(123456789012345678);

    #[tokio::test]
    async fn test_get_or_create_inserts_defaults() {
        let store = ConfigStore::load(MemoryBackend::default()).await;

        let config = store.get_or_create(GUILD).await;
        assert_eq!(config, GuildConfig::default());

        let saved = store.backend.last_saved().unwrap();
        assert_eq!(saved.get("123456789012345678"), Some(&GuildConfig::default()));
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let store = ConfigStore::load(MemoryBackend::default()).await;

        let first = store.get_or_create(GUILD).await;
        let second = store.get_or_create(GUILD).await;

        assert_eq!(first, second);
        assert_eq!(store.backend.save_count(), 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_get_or_create_keeps_existing_values() {
        let custom = GuildConfig {
            intro_channel: "boas-vindas".to_string(),
            ..GuildConfig::default()
        };
        let table = ConfigTable::from([(GUILD.to_string(), custom.clone())]);
        let store = ConfigStore::load(MemoryBackend::with_table(table)).await;

        assert_eq!(store.get_or_create(GUILD).await, custom);
        assert_eq!(store.backend.save_count(), 0);
    }

    #[tokio::test]
    async fn test_set_creates_and_persists() {
        let store = ConfigStore::load(MemoryBackend::default()).await;

        let updated = store
            .set(GUILD, ConfigField::PrivateCategory, "Diários".to_string())
            .await
            .unwrap();

        assert_eq!(updated.private_category, "Diários");
        assert_eq!(updated.intro_channel, "introducao");
        let saved = store.backend.last_saved().unwrap();
        assert_eq!(saved[&GUILD.to_string()].private_category, "Diários");
    }

    #[tokio::test]
    async fn test_failed_set_keeps_previous_value() {
        let store = ConfigStore::load(MemoryBackend::default()).await;
        store
            .set(GUILD, ConfigField::IntroChannel, "apresentacoes".to_string())
            .await
            .unwrap();

        store.backend.set_broken(true);
        let result = store
            .set(GUILD, ConfigField::IntroChannel, "novo".to_string())
            .await;

        assert!(result.is_err());
        assert_eq!(store.get_or_create(GUILD).await.intro_channel, "apresentacoes");
    }

    #[tokio::test]
    async fn test_failed_set_on_new_guild_leaves_no_entry() {
        let store = ConfigStore::load(MemoryBackend::default()).await;
        store.backend.set_broken(true);

        let result = store
            .set(GUILD, ConfigField::PlayerRole, "Aventureiro".to_string())
            .await;

        assert!(result.is_err());
        assert_eq!(store.len().await, 0);
        assert_eq!(store.get_or_create(GUILD).await.player_role, "Jogador");
    }

    #[tokio::test]
    async fn test_save_rewrites_whole_table() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        let table = ConfigTable::from([
            ("1".to_string(), GuildConfig::default()),
            ("2".to_string(), GuildConfig::default()),
        ]);
        let store = ConfigStore {
            backend: JsonFileBackend::new(&path),
            table: Mutex::new(table.clone()),
        };

        store.save().await.unwrap();

        let reloaded = JsonFileBackend::new(&path).load().await.unwrap();
        assert_eq!(reloaded, table);
    }

    #[tokio::test]
    async fn test_guilds_are_isolated() {
        let other = serenity::GuildId::new(42);
        let store = ConfigStore::load(MemoryBackend::default()).await;

        store
            .set(GUILD, ConfigField::PlayerRole, "Aventureiro".to_string())
            .await
            .unwrap();

        assert_eq!(store.get_or_create(other).await.player_role, "Jogador");
        assert_eq!(store.get_or_create(GUILD).await.player_role, "Aventureiro");
    }

    #[tokio::test]
    async fn test_concurrent_sets_all_land() {
        let store = Arc::new(ConfigStore::load(MemoryBackend::default()).await);

        let handles: Vec<_> = (1..=20u64)
            .map(|id| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .set(
                            serenity::GuildId::new(id),
                            ConfigField::IntroChannel,
                            format!("canal-{}", id),
                        )
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let saved = store.backend.last_saved().unwrap();
        assert_eq!(saved.len(), 20);
        assert_eq!(saved["7"].intro_channel, "canal-7");
    }

    #[tokio::test]
    async fn test_missing_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let store = ConfigStore::load(JsonFileBackend::new(dir.path().join("config.json"))).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_corrupt_file_starts_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");
        tokio::fs::write(&path, "{ not json").await.unwrap();

        let store = ConfigStore::load(JsonFileBackend::new(&path)).await;
        assert_eq!(store.len().await, 0);
    }

    #[tokio::test]
    async fn test_default_is_persisted_under_string_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.json");

        let store = ConfigStore::load(JsonFileBackend::new(&path)).await;
        store.get_or_create(GUILD).await;

        let raw: serde_json::Value =
            serde_json::from_str(&tokio::fs::read_to_string(&path).await.unwrap()).unwrap();
        assert_eq!(raw["123456789012345678"]["canal_introducao"], "introducao");
        assert_eq!(raw["123456789012345678"]["cargo_jogador"], "Jogador");
        assert_eq!(raw["123456789012345678"]["categoria_privados"], "Sessões Individuais");

        let reloaded = JsonFileBackend::new(&path).load().await.unwrap();
        assert_eq!(reloaded.get("123456789012345678"), Some(&GuildConfig::default()));
    }

    #[tokio::test]
    async fn test_setting_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("config.json");

        let store = ConfigStore::load(JsonFileBackend::new(&path)).await;
        store
            .set(GUILD, ConfigField::IntroChannel, "apresentacoes".to_string())
            .await
            .unwrap();
        drop(store);

        let restarted = ConfigStore::load(JsonFileBackend::new(&path)).await;
        let config = restarted.get_or_create(GUILD).await;
        assert_eq!(config.intro_channel, "apresentacoes");
        assert_eq!(config.player_role, "Jogador");
    }
}
