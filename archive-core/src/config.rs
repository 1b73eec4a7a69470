use crate::error::ConfigError;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_OUTPUT_ROOT: &str = "plurk-image-backup";
pub const DEFAULT_PLURKS_DIR: &str = "data/plurks";
pub const DEFAULT_RESPONSES_DIR: &str = "data/responses";

/// Everything the archive run needs to know, resolved before processing starts.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    pub output_root: PathBuf,
    pub plurks_dir: PathBuf,
    pub responses_dir: PathBuf,
    /// Extension of export files, without the dot.
    pub export_extension: String,
    pub request_timeout: Duration,
    /// Bodies must be strictly larger than this to count as a real image.
    pub min_body_bytes: usize,
    pub user_agent: String,
    pub platform: PlatformHosts,
}

/// Host names and paths of the platform's own assets, which are never archived.
#[derive(Debug, Clone)]
pub struct PlatformHosts {
    /// Inline emoticon host.
    pub emoticon_host: String,
    /// UI chrome host.
    pub static_host: String,
    /// Host serving both user uploads and official stickers.
    pub image_host: String,
    /// Regex matched against candidates on `image_host` to spot official stickers.
    pub sticker_pattern: String,
}

impl Default for PlatformHosts {
    fn default() -> Self {
        Self {
            emoticon_host: "emos.plurk.com".to_string(),
            static_host: "static.plurk.com".to_string(),
            image_host: "images.plurk.com".to_string(),
            sticker_pattern: r"https://images\.plurk\.com/mx_".to_string(),
        }
    }
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            output_root: PathBuf::from(DEFAULT_OUTPUT_ROOT),
            plurks_dir: PathBuf::from(DEFAULT_PLURKS_DIR),
            responses_dir: PathBuf::from(DEFAULT_RESPONSES_DIR),
            export_extension: "js".to_string(),
            request_timeout: Duration::from_secs(15),
            min_body_bytes: 5120,
            user_agent: concat!("plurk-archive/", env!("CARGO_PKG_VERSION")).to_string(),
            platform: PlatformHosts::default(),
        }
    }
}

impl ArchiveConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_root = path.into();
        self
    }

    pub fn with_sources(
        mut self,
        plurks_dir: impl Into<PathBuf>,
        responses_dir: impl Into<PathBuf>,
    ) -> Self {
        self.plurks_dir = plurks_dir.into();
        self.responses_dir = responses_dir.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_min_body_bytes(mut self, bytes: usize) -> Self {
        self.min_body_bytes = bytes;
        self
    }

    pub fn with_platform(mut self, platform: PlatformHosts) -> Self {
        self.platform = platform;
        self
    }

    /// Folder for images posted on the given day (`YYYY-MM-DD`).
    pub fn day_folder(&self, day: &str) -> PathBuf {
        self.output_root.join(day)
    }

    pub fn is_export_file(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(&self.export_extension))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_root.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "output_root".to_string(),
                value: String::new(),
            });
        }
        if self.export_extension.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "export_extension".to_string(),
                value: String::new(),
            });
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout".to_string(),
                value: format!("{:?}", self.request_timeout),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ArchiveConfig::default();
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.min_body_bytes, 5120);
        assert_eq!(config.plurks_dir, PathBuf::from("data/plurks"));
        assert_eq!(config.responses_dir, PathBuf::from("data/responses"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_day_folder() {
        let config = ArchiveConfig::new().with_output_root("/tmp/out");
        assert_eq!(
            config.day_folder("2024-01-01"),
            PathBuf::from("/tmp/out/2024-01-01")
        );
    }

    #[test]
    fn test_export_file_matching() {
        let config = ArchiveConfig::default();
        assert!(config.is_export_file(Path::new("data/plurks/2024_01.js")));
        assert!(config.is_export_file(Path::new("BACKUP.JS")));
        assert!(!config.is_export_file(Path::new("notes.json")));
        assert!(!config.is_export_file(Path::new("js")));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ArchiveConfig::new().with_request_timeout(Duration::ZERO);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "request_timeout"
        ));
    }
}
