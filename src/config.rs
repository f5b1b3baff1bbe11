// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Portal access and scraping settings
    pub portal: PortalConfig,

    /// Telegram delivery settings
    pub telegram: TelegramConfig,

    /// Seen-state persistence settings
    #[serde(default)]
    pub state: StateConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// The file carries portal credentials, so a missing or unreadable
    /// file is a hard error rather than a fallback to defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| AppError::config(format!("cannot read {}: {e}", path.display())))?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if Url::parse(&self.portal.login_url).is_err() {
            return Err(AppError::validation(format!(
                "portal.login_url is not a valid URL: '{}'",
                self.portal.login_url
            )));
        }
        if self.portal.username.trim().is_empty() {
            return Err(AppError::validation("portal.username is empty"));
        }
        if self.portal.password.trim().is_empty() {
            return Err(AppError::validation("portal.password is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::validation("portal.timeout_secs must be > 0"));
        }
        if self.portal.username_fields.is_empty() {
            return Err(AppError::validation("portal.username_fields is empty"));
        }
        if self.portal.password_fields.is_empty() {
            return Err(AppError::validation("portal.password_fields is empty"));
        }
        if self.portal.messages_link_text.trim().is_empty() {
            return Err(AppError::validation("portal.messages_link_text is empty"));
        }
        if self.portal.messages_link_keyword.trim().is_empty() {
            return Err(AppError::validation("portal.messages_link_keyword is empty"));
        }
        if self.portal.messages_link_fallback.trim().is_empty() {
            return Err(AppError::validation("portal.messages_link_fallback is empty"));
        }
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::validation("telegram.bot_token is empty"));
        }
        if self.telegram.chat_id.trim().is_empty() {
            return Err(AppError::validation("telegram.chat_id is empty"));
        }
        if Url::parse(&self.telegram.api_base).is_err() {
            return Err(AppError::validation(format!(
                "telegram.api_base is not a valid URL: '{}'",
                self.telegram.api_base
            )));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.state.path.as_os_str().is_empty() {
            return Err(AppError::validation("state.path is empty"));
        }
        Ok(())
    }
}

/// Portal access and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// URL of the portal login page
    pub login_url: String,

    /// Portal account user name
    pub username: String,

    /// Portal account password
    pub password: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::portal_timeout")]
    pub timeout_secs: u64,

    /// Login form user name field candidates, tried in order
    #[serde(default = "defaults::username_fields")]
    pub username_fields: Vec<String>,

    /// Login form password field candidates, tried in order
    #[serde(default = "defaults::password_fields")]
    pub password_fields: Vec<String>,

    /// URL substrings that mark a successful login
    #[serde(default = "defaults::success_markers")]
    pub success_markers: Vec<String>,

    /// Exact link text of the pending messages view
    #[serde(default = "defaults::messages_link_text")]
    pub messages_link_text: String,

    /// Case-insensitive fallback keyword for the messages link
    #[serde(default = "defaults::messages_link_keyword")]
    pub messages_link_keyword: String,

    /// Last-resort link token tried when text and keyword both miss
    #[serde(default = "defaults::messages_link_fallback")]
    pub messages_link_fallback: String,

    /// Messages table layout
    #[serde(default)]
    pub table: TableConfig,
}

/// Cell layout of the pending messages table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableConfig {
    /// Index of the table element holding the messages
    #[serde(default = "defaults::table_index")]
    pub table_index: usize,

    /// Cell index of the entry date
    #[serde(default = "defaults::date_cell")]
    pub date_cell: usize,

    /// Cell index of the subject
    #[serde(default = "defaults::title_cell")]
    pub title_cell: usize,

    /// Cell index of the sender
    #[serde(default = "defaults::sender_cell")]
    pub sender_cell: usize,

    /// Cell index of the read date
    #[serde(default = "defaults::read_cell")]
    pub read_cell: usize,

    /// Rows whose title has this many characters or fewer are discarded
    #[serde(default = "defaults::min_title_len")]
    pub min_title_len: usize,
}

impl Default for TableConfig {
    fn default() -> Self {
        Self {
            table_index: defaults::table_index(),
            date_cell: defaults::date_cell(),
            title_cell: defaults::title_cell(),
            sender_cell: defaults::sender_cell(),
            read_cell: defaults::read_cell(),
            min_title_len: defaults::min_title_len(),
        }
    }
}

/// Telegram bot delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token
    pub bot_token: String,

    /// Target chat identifier
    pub chat_id: String,

    /// Bot API base URL
    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::telegram_timeout")]
    pub timeout_secs: u64,
}

/// Seen-state persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateConfig {
    /// Path of the JSON file recording already handled messages
    #[serde(default = "defaults::state_path")]
    pub path: PathBuf,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            path: defaults::state_path(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Portal defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".into()
    }
    pub fn portal_timeout() -> u64 {
        30
    }
    pub fn username_fields() -> Vec<String> {
        vec!["USUARIO".into(), "usuario".into()]
    }
    pub fn password_fields() -> Vec<String> {
        vec!["CLAVE_P".into(), "clave".into()]
    }
    pub fn success_markers() -> Vec<String> {
        vec!["nav/".into(), "pasen".into()]
    }
    pub fn messages_link_text() -> String {
        "Mensajes pendientes".into()
    }
    pub fn messages_link_keyword() -> String {
        "mensajes".into()
    }
    pub fn messages_link_fallback() -> String {
        "pasen".into()
    }

    // Table layout defaults, matching the portal's pending messages view
    pub fn table_index() -> usize {
        1
    }
    pub fn date_cell() -> usize {
        1
    }
    pub fn title_cell() -> usize {
        5
    }
    pub fn sender_cell() -> usize {
        6
    }
    pub fn read_cell() -> usize {
        7
    }
    pub fn min_title_len() -> usize {
        3
    }

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn telegram_timeout() -> u64 {
        10
    }

    // State defaults
    pub fn state_path() -> PathBuf {
        PathBuf::from("data/processed.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [portal]
        login_url = "https://portal.example/login"
        username = "user"
        password = "secret"

        [telegram]
        bot_token = "123:abc"
        chat_id = "42"
    "#;

    fn minimal_config() -> Config {
        toml::from_str(MINIMAL).unwrap()
    }

    #[test]
    fn minimal_toml_parses_with_defaults() {
        let config = minimal_config();
        assert_eq!(config.portal.timeout_secs, 30);
        assert_eq!(config.portal.username_fields, vec!["USUARIO", "usuario"]);
        assert_eq!(config.portal.messages_link_text, "Mensajes pendientes");
        assert_eq!(config.portal.messages_link_fallback, "pasen");
        assert_eq!(config.portal.table.table_index, 1);
        assert_eq!(config.portal.table.title_cell, 5);
        assert_eq!(config.telegram.api_base, "https://api.telegram.org");
        assert_eq!(config.state.path, PathBuf::from("data/processed.json"));
    }

    #[test]
    fn minimal_config_is_valid() {
        assert!(minimal_config().validate().is_ok());
    }

    #[test]
    fn explicit_values_override_defaults() {
        let toml_str = r#"
            [portal]
            login_url = "https://portal.example/login"
            username = "user"
            password = "secret"
            timeout_secs = 5

            [portal.table]
            table_index = 0
            title_cell = 2

            [telegram]
            bot_token = "123:abc"
            chat_id = "42"
            api_base = "https://tg.proxy.example"

            [state]
            path = "/var/lib/avisos/state.json"
        "#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.portal.timeout_secs, 5);
        assert_eq!(config.portal.table.table_index, 0);
        assert_eq!(config.portal.table.title_cell, 2);
        // unset table fields still fall back
        assert_eq!(config.portal.table.date_cell, 1);
        assert_eq!(config.telegram.api_base, "https://tg.proxy.example");
        assert_eq!(
            config.state.path,
            PathBuf::from("/var/lib/avisos/state.json")
        );
    }

    #[test]
    fn missing_credentials_fail_to_parse() {
        let toml_str = r#"
            [portal]
            login_url = "https://portal.example/login"

            [telegram]
            bot_token = "123:abc"
            chat_id = "42"
        "#;
        assert!(toml::from_str::<Config>(toml_str).is_err());
    }

    #[test]
    fn validate_rejects_bad_login_url() {
        let mut config = minimal_config();
        config.portal.login_url = "not a url".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_password() {
        let mut config = minimal_config();
        config.portal.password = "   ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_timeout() {
        let mut config = minimal_config();
        config.portal.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_field_candidates() {
        let mut config = minimal_config();
        config.portal.username_fields.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_link_text() {
        // an empty exact-match text would select the first bare anchor
        let mut config = minimal_config();
        config.portal.messages_link_text = String::new();
        assert!(config.validate().is_err());

        let mut config = minimal_config();
        config.portal.messages_link_fallback = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_empty_chat_id() {
        let mut config = minimal_config();
        config.telegram.chat_id = String::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_rejects_missing_file() {
        assert!(Config::load("/nonexistent/avisos.toml").is_err());
    }
}
