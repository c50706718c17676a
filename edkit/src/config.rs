use config::{Config as ConfigBuilder, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// Editor core settings.
///
/// Loaded from, in order of precedence:
/// 1. A custom config file passed explicitly
/// 2. Local `.edkit.yaml` in the current directory
/// 3. Global `$HOME/.config/edkit/config.yaml`
///
/// CLI flags take precedence over all file values; the merge lives in
/// `merge_with_cli`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Root directory multi-file operations start from
    #[serde(default = "default_root")]
    pub root_path: PathBuf,

    /// Space-separated glob list restricting multi-file operations,
    /// e.g. "*.pli *.inc"
    #[serde(default = "default_filters")]
    pub file_filters: String,

    /// Whether searches match case by default
    #[serde(default)]
    pub case_sensitive: bool,

    /// Optional YAML highlight-rules file; the built-in PL/1 set is used
    /// when absent
    #[serde(default)]
    pub rules_file: Option<PathBuf>,

    /// Number of threads for eager multi-file searches
    #[serde(default = "default_thread_count")]
    pub thread_count: NonZeroUsize,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_filters() -> String {
    "*".to_string()
}

fn default_thread_count() -> NonZeroUsize {
    NonZeroUsize::new(num_cpus::get()).unwrap_or(NonZeroUsize::MIN)
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            root_path: default_root(),
            file_filters: default_filters(),
            case_sensitive: false,
            rules_file: None,
            thread_count: default_thread_count(),
            log_level: default_log_level(),
        }
    }
}

impl Settings {
    /// Loads settings from the default locations.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Loads settings, optionally layering a specific file on top.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        let config_files = [
            // Global config
            dirs::config_dir().map(|p| p.join("edkit/config.yaml")),
            // Local config
            Some(PathBuf::from(".edkit.yaml")),
            // Custom config
            config_path.map(PathBuf::from),
        ];

        for path in config_files.iter().flatten() {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_path()));
            }
        }

        builder.build()?.try_deserialize()
    }

    /// Merges CLI arguments over file values.
    pub fn merge_with_cli(mut self, cli: Settings) -> Self {
        if cli.root_path != default_root() {
            self.root_path = cli.root_path;
        }
        if cli.file_filters != default_filters() {
            self.file_filters = cli.file_filters;
        }
        if cli.case_sensitive {
            self.case_sensitive = true;
        }
        if cli.rules_file.is_some() {
            self.rules_file = cli.rules_file;
        }
        if cli.thread_count != default_thread_count() {
            self.thread_count = cli.thread_count;
        }
        if cli.log_level != default_log_level() {
            self.log_level = cli.log_level;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn test_load_config_file() {
        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let config_content = r#"
            root_path: "src"
            file_filters: "*.pli *.inc"
            case_sensitive: true
            thread_count: 4
            log_level: "debug"
        "#;

        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        let settings = Settings::load_from(Some(&config_path)).unwrap();
        assert_eq!(settings.root_path, PathBuf::from("src"));
        assert_eq!(settings.file_filters, "*.pli *.inc");
        assert!(settings.case_sensitive);
        assert_eq!(settings.thread_count, NonZeroUsize::new(4).unwrap());
        assert_eq!(settings.log_level, "debug");
        assert_eq!(settings.rules_file, None);
    }

    #[test]
    fn test_merge_with_cli() {
        let from_file = Settings {
            root_path: PathBuf::from("src"),
            file_filters: "*.pli".to_string(),
            case_sensitive: false,
            rules_file: None,
            thread_count: NonZeroUsize::new(4).unwrap(),
            log_level: "warn".to_string(),
        };

        let cli = Settings {
            root_path: PathBuf::from("tests"),
            file_filters: default_filters(),
            case_sensitive: true,
            rules_file: Some(PathBuf::from("rules.yaml")),
            thread_count: default_thread_count(),
            log_level: "debug".to_string(),
        };

        let merged = from_file.merge_with_cli(cli);
        assert_eq!(merged.root_path, PathBuf::from("tests")); // CLI value
        assert_eq!(merged.file_filters, "*.pli"); // file value kept
        assert!(merged.case_sensitive); // CLI value
        assert_eq!(merged.rules_file, Some(PathBuf::from("rules.yaml")));
        assert_eq!(merged.thread_count, NonZeroUsize::new(4).unwrap()); // file value kept
        assert_eq!(merged.log_level, "debug"); // CLI value
    }

    #[test]
    fn test_invalid_config() {
        let config_content = r#"
            root_path: []
            thread_count: "invalid"
        "#;

        let dir = tempdir().unwrap();
        let config_path = dir.path().join("config.yaml");
        let mut file = File::create(&config_path).unwrap();
        file.write_all(config_content.as_bytes()).unwrap();

        assert!(Settings::load_from(Some(&config_path)).is_err());
    }
}
