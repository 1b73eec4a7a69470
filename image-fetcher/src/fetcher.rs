use archive_core::{
    ArchiveConfig, ArchiveError, ConfigError, ErrorReporter, FetchError, FetchOutcome,
    TimestampReconciler,
};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Last path segment of `url` with any query string removed.
pub fn file_name_for(url: &str) -> String {
    let last = url.rsplit('/').next().unwrap_or(url);
    last.split('?').next().unwrap_or(last).to_string()
}

/// Downloads images that are missing locally, one request per URL, no retries.
#[derive(Debug, Clone)]
pub struct ImageFetcher {
    http_client: Client,
    min_body_bytes: usize,
    timeout: Duration,
}

impl ImageFetcher {
    pub fn new(config: &ArchiveConfig) -> Result<Self, ConfigError> {
        let http_client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            http_client,
            min_body_bytes: config.min_body_bytes,
            timeout: config.request_timeout,
        })
    }

    /// Fetches `url` and returns its body when the response looks like a real image:
    /// status 200 and more than `min_body_bytes` bytes.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        debug!("GET {} (timeout {:?})", url, self.timeout);
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::from_transport(url, &e))?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status_code: response.status().as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::from_transport(url, &e))?;

        if body.len() <= self.min_body_bytes {
            return Err(FetchError::Undersized {
                url: url.to_string(),
                bytes: body.len(),
                min_bytes: self.min_body_bytes,
            });
        }

        Ok(body.to_vec())
    }

    /// Makes sure the image behind `url` exists in `dest_folder`.
    ///
    /// Existing files are never downloaded again. When a `reconciler` is given, the
    /// file's embedded capture time is brought in line with `posted` whether it was
    /// just fetched or already present. Failed fetches report an all-false outcome;
    /// only failing to create `dest_folder` is an error.
    pub async fn ensure_image(
        &self,
        url: &str,
        dest_folder: &Path,
        posted: DateTime<Utc>,
        reconciler: Option<&dyn TimestampReconciler>,
    ) -> Result<FetchOutcome, ArchiveError> {
        // An empty file name resolves to `dest_folder` itself, which then counts as existing.
        let save_path = dest_folder.join(file_name_for(url));

        tokio::fs::create_dir_all(dest_folder)
            .await
            .map_err(|source| ArchiveError::CreateDir {
                path: dest_folder.to_path_buf(),
                source,
            })?;

        if tokio::fs::try_exists(&save_path).await.unwrap_or(false) {
            let updated = reconcile(reconciler, &save_path, posted);
            return Ok(FetchOutcome::existing(updated));
        }

        match self.download_to(url, &save_path).await {
            Ok(bytes) => {
                info!("Downloaded {} ({} bytes)", save_path.display(), bytes);
                let updated = reconcile(reconciler, &save_path, posted);
                Ok(FetchOutcome::downloaded(updated))
            }
            Err(e) => {
                ErrorReporter::new().report_warning(&ArchiveError::from(e));
                Ok(FetchOutcome::failed())
            }
        }
    }

    async fn download_to(&self, url: &str, save_path: &Path) -> Result<usize, FetchError> {
        let body = self.fetch(url).await?;

        if let Err(e) = tokio::fs::write(save_path, &body).await {
            // A truncated file would be mistaken for a finished download next run.
            let _ = tokio::fs::remove_file(save_path).await;
            return Err(FetchError::Write {
                path: save_path.to_path_buf(),
                details: e.to_string(),
            });
        }

        Ok(body.len())
    }
}

fn reconcile(
    reconciler: Option<&dyn TimestampReconciler>,
    path: &Path,
    posted: DateTime<Utc>,
) -> bool {
    reconciler.is_some_and(|r| r.reconcile_timestamp(path, posted))
}
