//! Configuration management

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::application::errors::ConfigError;
use crate::application::messaging::{DispatcherOptions, ReplyPolicy, UnknownGroupPolicy};

/// Relay configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub identity: IdentityConfig,
    pub storage: StorageConfig,
    pub http: HttpConfig,
    pub directory: DirectoryConfig,
    pub relay: RelayConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub nickname: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct IdentityConfig {
    /// Passphrase protecting the identity file
    pub passphrase: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct StorageConfig {
    /// Base directory; empty means the process working directory
    pub home: PathBuf,
    pub identity_file: PathBuf,
    pub address_book: PathBuf,
    pub group_directory: PathBuf,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct HttpConfig {
    pub listen: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct DirectoryConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RelayConfig {
    pub group_settle_delay_ms: u64,
    pub reply_policy: ReplyPolicy,
    pub quote_suffix: String,
    pub unknown_group_policy: UnknownGroupPolicy,
    pub channel_capacity: usize,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            nickname: "cr3ma-bot".to_string(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            home: PathBuf::new(),
            identity_file: PathBuf::from("threema.id"),
            address_book: PathBuf::from("address.book"),
            group_directory: PathBuf::from("group.directory"),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: "0.0.0.0:8082".to_string(),
        }
    }
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.threema.ch".to_string(),
            timeout_secs: 10,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            group_settle_delay_ms: 500,
            reply_policy: ReplyPolicy::default(),
            quote_suffix: "Exactly!".to_string(),
            unknown_group_policy: UnknownGroupPolicy::default(),
            channel_capacity: 32,
        }
    }
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// File config if `path` exists, else defaults; then environment, then validation
    pub fn resolve(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            tracing::info!("No config at {}, using defaults", path.display());
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `RELAY_*` variables supplied by `var`
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(passphrase) = var("RELAY_PASSPHRASE") {
            self.identity.passphrase = passphrase;
        }
        if let Some(home) = var("RELAY_HOME") {
            self.storage.home = PathBuf::from(home);
        }
        if let Some(nickname) = var("RELAY_NICKNAME") {
            self.bot.nickname = nickname;
        }
        if let Some(listen) = var("RELAY_LISTEN") {
            self.http.listen = listen;
        }
        if let Some(url) = var("RELAY_DIRECTORY_URL") {
            self.directory.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.identity.passphrase.is_empty() {
            return Err(ConfigError::MissingField("identity.passphrase".to_string()));
        }
        if self.http.listen.trim().is_empty() {
            return Err(ConfigError::MissingField("http.listen".to_string()));
        }
        self.listen_addr()?;
        if self.relay.channel_capacity == 0 {
            return Err(ConfigError::InvalidValue(
                "relay.channel-capacity must be at least 1".to_string(),
            ));
        }
        if self.directory.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField("directory.base-url".to_string()));
        }
        if self.directory.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "directory.timeout-secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Listen address; a bare `:port` binds every interface
    pub fn listen_addr(&self) -> Result<SocketAddr, ConfigError> {
        let listen = self.http.listen.trim();
        let full = match listen.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{}", port),
            None => listen.to_string(),
        };
        full.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue(format!("http.listen {:?}: {}", self.http.listen, e)))
    }

    fn in_home(&self, file: &Path) -> PathBuf {
        if self.storage.home.as_os_str().is_empty() {
            file.to_path_buf()
        } else {
            self.storage.home.join(file)
        }
    }

    pub fn identity_path(&self) -> PathBuf {
        self.in_home(&self.storage.identity_file)
    }

    pub fn address_book_path(&self) -> PathBuf {
        self.in_home(&self.storage.address_book)
    }

    pub fn group_directory_path(&self) -> PathBuf {
        self.in_home(&self.storage.group_directory)
    }

    pub fn group_settle_delay(&self) -> Duration {
        Duration::from_millis(self.relay.group_settle_delay_ms)
    }

    pub fn directory_timeout(&self) -> Duration {
        Duration::from_secs(self.directory.timeout_secs)
    }

    pub fn dispatcher_options(&self) -> DispatcherOptions {
        DispatcherOptions {
            reply: self.relay.reply_policy,
            quote_suffix: self.relay.quote_suffix.clone(),
            unknown_group: self.relay.unknown_group_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_need_a_passphrase() {
        let config = Config::default();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));
    }

    #[test]
    fn env_overrides_file_values() {
        let mut config = Config::from_yaml(
            "bot:\n  nickname: file-bot\nhttp:\n  listen: 127.0.0.1:9000\n",
        )
        .unwrap();
        config.apply_env(env(&[
            ("RELAY_PASSPHRASE", "secret"),
            ("RELAY_HOME", "/var/lib/relay"),
            ("RELAY_LISTEN", "127.0.0.1:8082"),
        ]));

        config.validate().unwrap();
        assert_eq!(config.bot.nickname, "file-bot");
        assert_eq!(config.listen_addr().unwrap().port(), 8082);
        assert_eq!(config.identity_path(), PathBuf::from("/var/lib/relay/threema.id"));
    }

    #[test]
    fn empty_home_means_working_directory() {
        let config = Config::default();
        assert_eq!(config.address_book_path(), PathBuf::from("address.book"));
        assert_eq!(config.group_directory_path(), PathBuf::from("group.directory"));
    }

    #[test]
    fn rejects_unparseable_listen_address() {
        let mut config = Config::default();
        config.identity.passphrase = "secret".into();
        config.http.listen = "localhost:http".into();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn port_only_listen_binds_all_interfaces() {
        let mut config = Config::default();
        config.identity.passphrase = "secret".into();
        config.http.listen = ":8082".into();
        config.validate().unwrap();
        assert_eq!(config.listen_addr().unwrap(), "0.0.0.0:8082".parse::<SocketAddr>().unwrap());
    }

    #[test]
    fn rejects_zero_directory_timeout() {
        let mut config = Config::default();
        config.identity.passphrase = "secret".into();
        config.directory.timeout_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));
    }

    #[test]
    fn relay_policies_parse_from_yaml() {
        let config = Config::from_yaml(
            "relay:\n  group-settle-delay-ms: 250\n  reply-policy: ack-only\n  quote-suffix: Indeed\n  unknown-group-policy: fatal\n  channel-capacity: 8\n",
        )
        .unwrap();
        let options = config.dispatcher_options();
        assert_eq!(options.reply, ReplyPolicy::AckOnly);
        assert_eq!(options.unknown_group, UnknownGroupPolicy::Fatal);
        assert_eq!(config.group_settle_delay(), Duration::from_millis(250));
    }

    #[test]
    fn default_config_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        let back = Config::from_yaml(&yaml).unwrap();
        assert_eq!(back.http.listen, "0.0.0.0:8082");
        assert_eq!(back.relay.quote_suffix, "Exactly!");
    }
}
