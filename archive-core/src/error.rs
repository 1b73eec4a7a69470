use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Metadata error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Cannot create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone)]
pub enum ExportError {
    #[error("Cannot read export file {path}: {details}")]
    Unreadable { path: PathBuf, details: String },

    #[error("Export file is not valid UTF-8: {path}")]
    Encoding { path: PathBuf },

    #[error("No assignment operator found in {path}")]
    MissingAssignment { path: PathBuf },

    #[error("Malformed export payload in {path}: {details}")]
    MalformedPayload { path: PathBuf, details: String },

    #[error("Export payload in {path} is not an array")]
    NotAnArray { path: PathBuf },

    #[error("Unparseable post timestamp: {value:?}")]
    InvalidTimestamp { value: String },
}

#[derive(Error, Debug, Clone)]
pub enum FetchError {
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    #[error("Transport failure for {url}: {details}")]
    Transport { url: String, details: String },

    #[error("Unexpected status {status_code} for {url}")]
    Status { url: String, status_code: u16 },

    #[error("Body of {url} too small: {bytes} bytes (need more than {min_bytes})")]
    Undersized {
        url: String,
        bytes: usize,
        min_bytes: usize,
    },

    #[error("Cannot write {path}: {details}")]
    Write { path: PathBuf, details: String },
}

#[derive(Error, Debug, Clone)]
pub enum MetadataError {
    #[error("Unsupported container for metadata: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("Cannot read embedded metadata: {details}")]
    Read { details: String },

    #[error("Cannot encode metadata block: {details}")]
    Encode { details: String },

    #[error("Cannot write metadata into {path}: {details}")]
    Write { path: PathBuf, details: String },
}

#[derive(Error, Debug, Clone)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Invalid pattern for {field}: {details}")]
    InvalidPattern { field: String, details: String },

    #[error("HTTP client setup failed: {details}")]
    HttpClient { details: String },
}

impl FetchError {
    /// Classifies a transport-level reqwest failure for `url`.
    pub fn from_transport(url: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                details: err.to_string(),
            }
        }
    }
}

impl From<reqwest::Error> for ConfigError {
    fn from(err: reqwest::Error) -> Self {
        ConfigError::HttpClient {
            details: err.to_string(),
        }
    }
}
