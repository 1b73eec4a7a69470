use crate::error::*;
use tracing::{debug, error, info, warn};

/// How a failure affects the run that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The item contributes nothing; processing moves on silently.
    Skip,
    /// A per-item failure: logged, never counted, never aborts the run.
    SoftFail,
    /// Propagates to the caller and halts the run.
    Fatal,
}

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn severity(&self) -> Severity;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;

    fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl ErrorExt for ArchiveError {
    fn log_error(&self) -> &Self {
        error!("ArchiveError: {}", self);
        match self {
            ArchiveError::Export(e) => {
                error!("Export error details: {:?}", e);
            }
            ArchiveError::Fetch(e) => {
                error!("Fetch error details: {:?}", e);
            }
            ArchiveError::Metadata(e) => {
                error!("Metadata error details: {:?}", e);
            }
            ArchiveError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ArchiveError (warning): {}", self);
        self
    }

    fn severity(&self) -> Severity {
        match self {
            ArchiveError::Export(e) => e.severity(),
            ArchiveError::Fetch(e) => e.severity(),
            ArchiveError::Metadata(e) => e.severity(),
            ArchiveError::Config(e) => e.severity(),
            ArchiveError::CreateDir { .. } => Severity::Fatal,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ArchiveError::Export(e) => e.user_friendly_message(),
            ArchiveError::Fetch(e) => e.user_friendly_message(),
            ArchiveError::Metadata(e) => e.user_friendly_message(),
            ArchiveError::Config(e) => e.user_friendly_message(),
            ArchiveError::CreateDir { path, .. } => format!(
                "Could not create folder {}. Please check permissions.",
                path.display()
            ),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ArchiveError::Export(_) => "EXPORT".to_string(),
            ArchiveError::Fetch(_) => "FETCH".to_string(),
            ArchiveError::Metadata(_) => "METADATA".to_string(),
            ArchiveError::Config(_) => "CONFIG".to_string(),
            ArchiveError::CreateDir { .. } => "CREATE_DIR".to_string(),
        }
    }
}

impl ErrorExt for ExportError {
    fn log_error(&self) -> &Self {
        error!("ExportError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ExportError (warning): {}", self);
        self
    }

    fn severity(&self) -> Severity {
        // A broken file or record never stops the other files.
        Severity::Skip
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ExportError::Unreadable { path, .. } | ExportError::Encoding { path } => {
                format!("Could not read export file {}.", path.display())
            }
            ExportError::MissingAssignment { path }
            | ExportError::MalformedPayload { path, .. }
            | ExportError::NotAnArray { path } => {
                format!("Export file {} is not in the expected format.", path.display())
            }
            ExportError::InvalidTimestamp { value } => {
                format!("Post date '{}' could not be understood.", value)
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ExportError::Unreadable { .. } => "EXPORT_UNREADABLE".to_string(),
            ExportError::Encoding { .. } => "EXPORT_ENCODING".to_string(),
            ExportError::MissingAssignment { .. } => "EXPORT_MISSING_ASSIGNMENT".to_string(),
            ExportError::MalformedPayload { .. } => "EXPORT_MALFORMED".to_string(),
            ExportError::NotAnArray { .. } => "EXPORT_NOT_ARRAY".to_string(),
            ExportError::InvalidTimestamp { .. } => "EXPORT_INVALID_TIMESTAMP".to_string(),
        }
    }
}

impl ErrorExt for FetchError {
    fn log_error(&self) -> &Self {
        error!("FetchError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("FetchError (warning): {}", self);
        self
    }

    fn severity(&self) -> Severity {
        Severity::SoftFail
    }

    fn user_friendly_message(&self) -> String {
        match self {
            FetchError::Timeout { url } => format!("Download of {} timed out.", url),
            FetchError::Transport { url, .. } => {
                format!("Could not connect while downloading {}.", url)
            }
            FetchError::Status { url, status_code } => {
                format!("Server answered {} for {}.", status_code, url)
            }
            FetchError::Undersized { url, .. } => {
                format!("{} looks like a placeholder image and was ignored.", url)
            }
            FetchError::Write { path, .. } => {
                format!("Could not save image to {}.", path.display())
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            FetchError::Timeout { .. } => "FETCH_TIMEOUT".to_string(),
            FetchError::Transport { .. } => "FETCH_TRANSPORT".to_string(),
            FetchError::Status { .. } => "FETCH_STATUS".to_string(),
            FetchError::Undersized { .. } => "FETCH_UNDERSIZED".to_string(),
            FetchError::Write { .. } => "FETCH_WRITE".to_string(),
        }
    }
}

impl ErrorExt for MetadataError {
    fn log_error(&self) -> &Self {
        error!("MetadataError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("MetadataError (warning): {}", self);
        self
    }

    fn severity(&self) -> Severity {
        match self {
            MetadataError::UnsupportedFormat { .. } => Severity::Skip,
            _ => Severity::SoftFail,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            MetadataError::UnsupportedFormat { path } => format!(
                "{} is not a JPEG; its timestamp was left alone.",
                path.display()
            ),
            _ => "Could not update the image timestamp.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            MetadataError::UnsupportedFormat { .. } => "METADATA_UNSUPPORTED".to_string(),
            MetadataError::Read { .. } => "METADATA_READ".to_string(),
            MetadataError::Encode { .. } => "METADATA_ENCODE".to_string(),
            MetadataError::Write { .. } => "METADATA_WRITE".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn severity(&self) -> Severity {
        Severity::Fatal
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::InvalidValue { field, .. } => {
                format!("Invalid value for configuration field '{}'.", field)
            }
            ConfigError::InvalidPattern { field, .. } => {
                format!("Pattern '{}' could not be compiled.", field)
            }
            ConfigError::HttpClient { .. } => {
                "The HTTP client could not be initialised.".to_string()
            }
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::InvalidPattern { .. } => "CONFIG_INVALID_PATTERN".to_string(),
            ConfigError::HttpClient { .. } => "CONFIG_HTTP_CLIENT".to_string(),
        }
    }
}

/// Logs errors at the top of a run or at the point a soft failure is absorbed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    pub fn report_error(&self, error: &ArchiveError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
    }

    pub fn report_warning(&self, error: &ArchiveError) {
        error.log_warn();
        debug!("Error code: {}", error.error_code());
    }
}
