//! Drives export sources end to end: parse, extract, fetch, reconcile, count.

mod discovery;
mod summary;

use archive_core::{
    ArchiveConfig, ArchiveError, ErrorExt, ErrorReporter, ExportRecord, RunCounters, Severity,
    TimestampReconciler, DAY_FOLDER_FORMAT,
};
use export_parser::try_parse_export;
use image_fetcher::{ImageFetcher, UrlExtractor};
use std::path::Path;
use tracing::{debug, info, warn};

pub use discovery::discover_exports;
pub use summary::RunSummary;

pub const PLURKS_LABEL: &str = "plurks";
pub const RESPONSES_LABEL: &str = "responses";

#[cfg(feature = "exif")]
static EXIF_RECONCILER: exif_writer::ExifReconciler = exif_writer::ExifReconciler;

/// Whether this build can rewrite embedded image metadata.
pub fn metadata_available() -> bool {
    cfg!(feature = "exif")
}

#[cfg(feature = "exif")]
fn metadata_reconciler() -> Option<&'static dyn TimestampReconciler> {
    Some(&EXIF_RECONCILER)
}

#[cfg(not(feature = "exif"))]
fn metadata_reconciler() -> Option<&'static dyn TimestampReconciler> {
    None
}

/// Processes export source folders with one shared HTTP client and URL extractor.
#[derive(Debug)]
pub struct FolderProcessor {
    config: ArchiveConfig,
    extractor: UrlExtractor,
    fetcher: ImageFetcher,
    write_metadata: bool,
}

impl FolderProcessor {
    /// `write_metadata` is ignored when the metadata capability is not built in.
    pub fn new(config: ArchiveConfig, write_metadata: bool) -> Result<Self, ArchiveError> {
        config.validate()?;
        let extractor = UrlExtractor::new(&config.platform)?;
        let fetcher = ImageFetcher::new(&config)?;

        Ok(Self {
            config,
            extractor,
            fetcher,
            write_metadata: write_metadata && metadata_available(),
        })
    }

    pub fn config(&self) -> &ArchiveConfig {
        &self.config
    }

    pub fn writes_metadata(&self) -> bool {
        self.write_metadata
    }

    fn reconciler(&self) -> Option<&'static dyn TimestampReconciler> {
        if self.write_metadata {
            metadata_reconciler()
        } else {
            None
        }
    }

    /// Processes every export file directly inside `source_dir`.
    ///
    /// A missing folder is reported and yields zero counters.
    pub async fn process_source(
        &self,
        source_dir: &Path,
        label: &str,
    ) -> Result<RunCounters, ArchiveError> {
        let mut counters = RunCounters::new();
        if !source_dir.exists() {
            warn!(
                "{} folder not found at {}, skipping",
                label,
                source_dir.display()
            );
            return Ok(counters);
        }

        for path in discover_exports(source_dir, &self.config) {
            counters += self.process_file(&path, label).await?;
        }

        debug!("[{}] finished with {:?}", label, counters);
        Ok(counters)
    }

    pub async fn process_file(
        &self,
        path: &Path,
        label: &str,
    ) -> Result<RunCounters, ArchiveError> {
        let mut counters = RunCounters::new();

        let records = match try_parse_export(path) {
            Ok(records) => records,
            Err(e) => {
                let e = ArchiveError::from(e);
                if e.severity() == Severity::Fatal {
                    return Err(e);
                }
                ErrorReporter::new().report_warning(&e);
                return Ok(counters);
            }
        };
        if records.is_empty() {
            return Ok(counters);
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!("[{}] Processing {}", label, name);

        for record in &records {
            counters += self.process_record(record).await?;
        }
        Ok(counters)
    }

    /// Fetches every image referenced by one record into its day folder.
    /// Records without a usable timestamp contribute nothing.
    pub async fn process_record(
        &self,
        record: &ExportRecord,
    ) -> Result<RunCounters, ArchiveError> {
        let mut counters = RunCounters::new();

        let posted = match record.timestamp() {
            Ok(ts) => ts,
            Err(e) => {
                debug!("Skipping record: {}", e);
                return Ok(counters);
            }
        };
        let day_folder = self
            .config
            .day_folder(&posted.format(DAY_FOLDER_FORMAT).to_string());

        let reconciler = self.reconciler();
        for url in self.extractor.extract(&record.combined_text()) {
            match self
                .fetcher
                .ensure_image(&url, &day_folder, posted, reconciler)
                .await
            {
                Ok(outcome) => counters.record(outcome),
                Err(e) if !e.is_fatal() => {
                    ErrorReporter::new().report_warning(&e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(counters)
    }
}

/// Runs both export sources and returns their counters.
pub async fn run_archive(
    config: ArchiveConfig,
    write_metadata: bool,
) -> Result<RunSummary, ArchiveError> {
    config.validate()?;
    std::fs::create_dir_all(&config.output_root).map_err(|source| ArchiveError::CreateDir {
        path: config.output_root.clone(),
        source,
    })?;

    let processor = FolderProcessor::new(config, write_metadata)?;
    let config = processor.config();

    let plurks = processor
        .process_source(&config.plurks_dir, PLURKS_LABEL)
        .await?;
    let responses = processor
        .process_source(&config.responses_dir, RESPONSES_LABEL)
        .await?;

    Ok(RunSummary {
        plurks,
        responses,
        metadata_enabled: processor.writes_metadata(),
    })
}
