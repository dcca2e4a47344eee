use serde::{Deserialize, Serialize};

use crate::model::filter::{DateBucket, FilterState};

/// Configuration from `config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Notes directory to scan for markdown files
    #[serde(default)]
    pub directory: Option<String>,
    /// Inbox file for new tasks. Empty selects the alphabetically-first
    /// markdown file in the directory.
    #[serde(default = "default_inbox")]
    pub inbox: String,
    #[serde(default)]
    pub filter: FilterConfig,
    /// Quick tags offered by the review loop
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            directory: None,
            inbox: default_inbox(),
            filter: FilterConfig::default(),
            tags: default_tags(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Unrecognized names fall back to `all`
    #[serde(default = "default_bucket")]
    pub bucket: String,
    #[serde(default)]
    pub text: String,
    #[serde(default = "default_true")]
    pub exclude_hourly_snooze: bool,
}

impl Default for FilterConfig {
    fn default() -> Self {
        FilterConfig {
            bucket: default_bucket(),
            text: String::new(),
            exclude_hourly_snooze: true,
        }
    }
}

impl FilterConfig {
    pub fn to_state(&self) -> FilterState {
        FilterState {
            bucket: DateBucket::from_name_lenient(&self.bucket),
            text: self.text.clone(),
            exclude_hourly_snooze: self.exclude_hourly_snooze,
        }
    }
}

fn default_inbox() -> String {
    "New Tasks.md".to_string()
}

fn default_bucket() -> String {
    "all".to_string()
}

fn default_true() -> bool {
    true
}

fn default_tags() -> Vec<String> {
    vec!["drive".into(), "errand".into(), "household".into()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.directory.is_none());
        assert_eq!(config.inbox, "New Tasks.md");
        assert_eq!(config.filter.to_state(), FilterState::default());
        assert_eq!(config.tags, vec!["drive", "errand", "household"]);
    }

    #[test]
    fn filter_section_maps_to_state() {
        let config: Config = toml::from_str(
            r##"
directory = "/notes"

[filter]
bucket = "today_or_before"
text = "#errand"
exclude_hourly_snooze = false
"##,
        )
        .unwrap();
        let state = config.filter.to_state();
        assert_eq!(state.bucket, DateBucket::TodayOrBefore);
        assert_eq!(state.text, "#errand");
        assert!(!state.exclude_hourly_snooze);
    }

    #[test]
    fn unknown_bucket_in_config_means_all() {
        let config: Config = toml::from_str("[filter]\nbucket = \"later\"\n").unwrap();
        assert_eq!(config.filter.to_state().bucket, DateBucket::All);
    }
}
