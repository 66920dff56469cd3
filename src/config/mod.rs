//! Configuration management for feedly-notifier.
//!
//! Options are read from `~/.config/feedly-notifier/config.toml`.
//! If the file doesn't exist, a default configuration with comments is created.
//! A subset of the options is *critical*: changing any of them requires the
//! scheduler to be re-initialized instead of a plain snapshot refresh.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::domain::UserStreams;

/// Longest accepted refresh period in minutes (one week).
pub const MAX_UPDATE_INTERVAL: u64 = 7 * 24 * 60;

/// Names of the options whose change forces a scheduler restart.
pub const CRITICAL_OPTIONS: [&str; 9] = [
    "update_interval",
    "access_token",
    "show_full_feed_content",
    "open_site_on_icon_click",
    "max_number_of_feeds",
    "ability_save_feeds",
    "filters",
    "is_filters_enabled",
    "show_counter",
];

/// Typed application options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Refresh period in minutes
    pub update_interval: u64,
    pub mark_read_on_click: bool,
    pub show_desktop_notifications: bool,
    /// Seconds before notifications are hidden, 0 keeps them
    pub hide_notification_delay: u64,
    pub show_full_feed_content: bool,
    pub max_notifications_count: usize,
    pub open_site_on_icon_click: bool,
    pub ability_save_feeds: bool,
    pub max_number_of_feeds: usize,
    pub force_update_feeds: bool,
    pub use_secure_connection: bool,
    pub is_filters_enabled: bool,
    pub filters: Vec<String>,
    pub show_counter: bool,

    pub access_token: String,
    pub refresh_token: String,
    pub feedly_user_id: String,
    pub feedly_user_plan: String,
    pub client_id: String,
    pub client_secret: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            update_interval: 2,
            mark_read_on_click: true,
            show_desktop_notifications: true,
            hide_notification_delay: 10,
            show_full_feed_content: false,
            max_notifications_count: 5,
            open_site_on_icon_click: false,
            ability_save_feeds: false,
            max_number_of_feeds: 20,
            force_update_feeds: false,
            use_secure_connection: false,
            is_filters_enabled: false,
            filters: Vec::new(),
            show_counter: true,
            access_token: String::new(),
            refresh_token: String::new(),
            feedly_user_id: String::new(),
            feedly_user_plan: String::new(),
            client_id: String::new(),
            client_secret: String::new(),
        }
    }
}

impl Options {
    /// Check the numeric ranges serde can't express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval == 0 {
            return Err(ConfigError::Invalid(
                "update_interval must be at least 1 minute".into(),
            ));
        }
        if self.update_interval > MAX_UPDATE_INTERVAL {
            return Err(ConfigError::Invalid(format!(
                "update_interval must be at most {} minutes",
                MAX_UPDATE_INTERVAL
            )));
        }
        if self.max_notifications_count == 0 {
            return Err(ConfigError::Invalid(
                "max_notifications_count must be greater than 0".into(),
            ));
        }
        if self.max_number_of_feeds == 0 {
            return Err(ConfigError::Invalid(
                "max_number_of_feeds must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    pub fn streams(&self) -> UserStreams {
        UserStreams::new(&self.feedly_user_id)
    }

    /// Filtering applies only when enabled with at least one category.
    pub fn filters_active(&self) -> bool {
        self.is_filters_enabled && !self.filters.is_empty()
    }

    /// Streams polled by a feed refresh.
    pub fn feed_stream_ids(&self) -> Vec<String> {
        if self.filters_active() {
            self.filters.clone()
        } else {
            vec![self.streams().global_all()]
        }
    }

    /// Critical options that differ between `self` and `other`.
    pub fn changed_critical_options(&self, other: &Options) -> Vec<&'static str> {
        let checks = [
            self.update_interval != other.update_interval,
            self.access_token != other.access_token,
            self.show_full_feed_content != other.show_full_feed_content,
            self.open_site_on_icon_click != other.open_site_on_icon_click,
            self.max_number_of_feeds != other.max_number_of_feeds,
            self.ability_save_feeds != other.ability_save_feeds,
            self.filters != other.filters,
            self.is_filters_enabled != other.is_filters_enabled,
            self.show_counter != other.show_counter,
        ];

        CRITICAL_OPTIONS
            .iter()
            .zip(checks)
            .filter_map(|(name, changed)| changed.then_some(*name))
            .collect()
    }
}

/// Durable option storage.
pub trait OptionsStore: Send + Sync {
    fn read(&self) -> Result<Options, ConfigError>;
    fn write(&self, options: &Options) -> Result<(), ConfigError>;
}

/// Options persisted as a TOML file.
pub struct TomlOptionsStore {
    path: PathBuf,
}

impl TomlOptionsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default path: `~/.config/feedly-notifier/config.toml`
    pub fn at_default_path() -> Result<Self, ConfigError> {
        Ok(Self::new(Self::default_config_path()?))
    }

    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feedly-notifier").join("config.toml"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_file(&self, content: &str) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        file.write_all(content.as_bytes())
            .map_err(|e| ConfigError::Io {
                path: self.path.clone(),
                source: e,
            })
    }

    /// Generate the default config file content with comments.
    fn default_config_content() -> String {
        r##"# feedly-notifier configuration
#
# Options marked (critical) restart the update scheduler when changed.

# Minutes between refreshes (critical)
update_interval = 2

# Mark an entry as read when its notification is clicked
mark_read_on_click = true

# Desktop notifications for new entries
show_desktop_notifications = true

# Seconds before notifications are hidden, 0 keeps them on screen
hide_notification_delay = 10

# Use the full entry content instead of the summary when available (critical)
show_full_feed_content = false

# Above this many new entries a single summary notification is shown
max_notifications_count = 5

# Open the Feedly site instead of the entry list on icon click (critical)
open_site_on_icon_click = false

# Allow saving entries for later (critical)
ability_save_feeds = false

# Maximum number of unread entries fetched and cached (critical)
max_number_of_feeds = 20

# Always refresh before listing entries
force_update_feeds = false

# Talk to the API over https
use_secure_connection = false

# Restrict the counter and entry list to the categories in `filters` (critical)
is_filters_enabled = false
filters = []

# Show the unread counter badge (critical)
show_counter = true

# Session, written back after a token refresh
access_token = ""
refresh_token = ""
feedly_user_id = ""
feedly_user_plan = ""
client_id = ""
client_secret = ""
"##
        .to_string()
    }
}

impl OptionsStore for TomlOptionsStore {
    /// Missing fields in the file fall back to their defaults.
    fn read(&self) -> Result<Options, ConfigError> {
        if !self.path.exists() {
            self.write_file(&Self::default_config_content())?;
            return Ok(Options::default());
        }

        let content = fs::read_to_string(&self.path).map_err(|e| ConfigError::Io {
            path: self.path.clone(),
            source: e,
        })?;

        let options: Options = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: self.path.clone(),
            source: e,
        })?;

        options.validate()?;
        Ok(options)
    }

    fn write(&self, options: &Options) -> Result<(), ConfigError> {
        options.validate()?;
        let content = toml::to_string_pretty(options)?;
        self.write_file(&content)
    }
}

/// Options kept in memory, used when no file should be touched.
#[derive(Default)]
pub struct MemoryOptionsStore {
    options: Mutex<Options>,
}

impl MemoryOptionsStore {
    pub fn new(options: Options) -> Self {
        Self {
            options: Mutex::new(options),
        }
    }
}

impl OptionsStore for MemoryOptionsStore {
    fn read(&self) -> Result<Options, ConfigError> {
        let options = self.options.lock().map_err(|_| ConfigError::Poisoned)?;
        Ok(options.clone())
    }

    fn write(&self, options: &Options) -> Result<(), ConfigError> {
        options.validate()?;
        let mut current = self.options.lock().map_err(|_| ConfigError::Poisoned)?;
        *current = options.clone();
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize options: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid option: {0}")]
    Invalid(String),

    #[error("Options lock poisoned")]
    Poisoned,
}
