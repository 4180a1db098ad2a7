//! CLI configuration.
//!
//! Read from `$XDG_CONFIG_HOME/campdir/config.ron`. Every field is optional;
//! command-line flags override whatever the file says.
//!
//! ```ron
//! (
//!     document: "/srv/campdir/document.json",
//!     cache: "/home/amy/.cache/campdir/regions.json",
//!     seed: Http("https://example.org/campdir/regions.json"),
//!     sync: (save_debounce_ms: 1000),
//! )
//! ```

use std::path::{Path, PathBuf};

use campdir_client::{ConfigError, SyncConfig};
use campdir_store::SeedSource;
use serde::{Deserialize, Serialize};

/// Where the first tree comes from when the document does not exist yet.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeedSetting {
    #[default]
    Embedded,
    File(PathBuf),
    Http(String),
}

impl SeedSetting {
    /// `embedded`, an `http(s)://` URL, or a file path.
    pub fn parse(arg: &str) -> Self {
        if arg.eq_ignore_ascii_case("embedded") {
            SeedSetting::Embedded
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            SeedSetting::Http(arg.to_string())
        } else {
            SeedSetting::File(PathBuf::from(arg))
        }
    }

    pub fn source(&self) -> SeedSource {
        match self {
            SeedSetting::Embedded => SeedSource::Embedded,
            SeedSetting::File(path) => SeedSource::File(path.clone()),
            SeedSetting::Http(url) => SeedSource::Http(url.clone()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Shared document file.
    pub document: PathBuf,
    /// Local cache file.
    pub cache: PathBuf,
    pub seed: SeedSetting,
    pub sync: SyncConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        let data = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        let cache = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            document: data.join("campdir").join("document.json"),
            cache: cache.join("campdir").join("regions.json"),
            seed: SeedSetting::default(),
            sync: SyncConfig::default(),
        }
    }
}

impl CliConfig {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("campdir").join("config.ron"))
    }

    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    /// Missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_ron(&text),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_seed_parse() {
        assert_eq!(SeedSetting::parse("embedded"), SeedSetting::Embedded);
        assert_eq!(
            SeedSetting::parse("https://example.org/seed.json"),
            SeedSetting::Http("https://example.org/seed.json".into())
        );
        assert_eq!(
            SeedSetting::parse("./seed.json"),
            SeedSetting::File(PathBuf::from("./seed.json"))
        );
    }

    #[test]
    fn test_full_ron() {
        let config = CliConfig::from_ron(
            r#"(
                document: "/tmp/doc.json",
                cache: "/tmp/cache.json",
                seed: File("/tmp/seed.json"),
                sync: (echo_window_ms: 5000),
            )"#,
        )
        .unwrap();

        assert_eq!(config.document, PathBuf::from("/tmp/doc.json"));
        assert_eq!(config.cache, PathBuf::from("/tmp/cache.json"));
        assert_eq!(config.seed.source(), SeedSource::File("/tmp/seed.json".into()));
        assert_eq!(config.sync.echo_window_ms, 5000);
        assert_eq!(config.sync.save_debounce_ms, SyncConfig::default().save_debounce_ms);
    }

    #[test]
    fn test_empty_ron_is_default() {
        assert_eq!(CliConfig::from_ron("()").unwrap(), CliConfig::default());
    }

    #[test]
    fn test_missing_file_is_default() {
        let config = CliConfig::load(Path::new("/nonexistent/campdir/config.ron")).unwrap();
        assert_eq!(config, CliConfig::default());
    }
}
