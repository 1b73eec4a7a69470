use archive_core::{ConfigError, PlatformHosts};
use regex::Regex;
use std::collections::HashSet;
use tracing::debug;
use url::Url;

/// Image links anywhere in free text. Quotes, backslashes and whitespace end a candidate.
pub const IMAGE_URL_PATTERN: &str = r#"(?i)https?://[^\s"'\\]+\.(?:jpg|png|gif|jpeg)"#;

/// Finds user-posted image URLs in record text, ignoring the platform's own assets.
#[derive(Debug, Clone)]
pub struct UrlExtractor {
    image_pattern: Regex,
    sticker_pattern: Regex,
    emoticon_host: String,
    static_host: String,
    image_host: String,
}

impl UrlExtractor {
    pub fn new(platform: &PlatformHosts) -> Result<Self, ConfigError> {
        let image_pattern =
            Regex::new(IMAGE_URL_PATTERN).map_err(|e| ConfigError::InvalidPattern {
                field: "image_url_pattern".to_string(),
                details: e.to_string(),
            })?;
        let sticker_pattern =
            Regex::new(&platform.sticker_pattern).map_err(|e| ConfigError::InvalidPattern {
                field: "sticker_pattern".to_string(),
                details: e.to_string(),
            })?;

        Ok(Self {
            image_pattern,
            sticker_pattern,
            emoticon_host: platform.emoticon_host.to_lowercase(),
            static_host: platform.static_host.to_lowercase(),
            image_host: platform.image_host.to_lowercase(),
        })
    }

    /// Returns the distinct image URLs in `text`. JSON-escaped slashes (`\/`) are
    /// normalised first so escaped and plain links match alike.
    pub fn extract(&self, text: &str) -> HashSet<String> {
        if text.is_empty() {
            return HashSet::new();
        }

        let clean_text = text.replace("\\/", "/");
        self.image_pattern
            .find_iter(&clean_text)
            .map(|m| m.as_str())
            .filter(|candidate| {
                let keep = !self.is_platform_asset(candidate);
                if !keep {
                    debug!("Ignoring platform asset {}", candidate);
                }
                keep
            })
            .map(str::to_string)
            .collect()
    }

    fn is_platform_asset(&self, candidate: &str) -> bool {
        let host = Url::parse(candidate)
            .ok()
            .and_then(|url| url.host_str().map(str::to_lowercase))
            .unwrap_or_else(|| candidate.to_lowercase());

        if host.contains(&self.emoticon_host) || host.contains(&self.static_host) {
            return true;
        }

        host.contains(&self.image_host) && self.sticker_pattern.is_match(candidate)
    }
}
