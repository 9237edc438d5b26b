//! Resumable chunked upload client.
//!
//! Protocol: an initiate request carrying the metadata JSON returns a
//! session URI; the file body is then PUT in chunks with `Content-Range`
//! headers. HTTP 308 acknowledges a chunk and asks for the next; a 2xx
//! with a JSON body ends the session with the new video id.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::config::UploadSettings;

use super::metadata::VideoMetadata;

/// Errors from the upload client.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload input missing: {0}")]
    MissingInput(PathBuf),

    #[error("Upload request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upload endpoint returned {status}: {body}")]
    BadStatus { status: u16, body: String },

    #[error("Initiate response carried no session URI")]
    SessionUriMissing,

    #[error("Finalize response carried no video id")]
    VideoIdMissing,

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

/// Render a `Content-Range` header value for one chunk.
pub fn content_range(start: u64, chunk_len: u64, total: u64) -> String {
    format!("bytes {}-{}/{}", start, start + chunk_len - 1, total)
}

/// Client for the video platform's upload and data endpoints.
pub struct UploadClient<'a> {
    settings: &'a UploadSettings,
    http: reqwest::blocking::Client,
}

impl<'a> UploadClient<'a> {
    pub fn new(settings: &'a UploadSettings) -> UploadResult<Self> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(settings.request_timeout_secs))
            .build()?;
        Ok(Self { settings, http })
    }

    pub(crate) fn http(&self) -> &reqwest::blocking::Client {
        &self.http
    }

    pub(crate) fn settings(&self) -> &UploadSettings {
        self.settings
    }

    /// Upload a video file with its metadata; returns the new video id.
    pub fn upload_video(
        &self,
        access_token: &str,
        video_path: &Path,
        metadata: &VideoMetadata,
    ) -> UploadResult<String> {
        if !video_path.exists() {
            return Err(UploadError::MissingInput(video_path.to_path_buf()));
        }

        let total = std::fs::metadata(video_path)
            .map_err(|e| UploadError::Io {
                path: video_path.to_path_buf(),
                source: e,
            })?
            .len();

        let session_uri = self.initiate_session(access_token, metadata, total)?;

        tracing::info!(
            size_mb = total / (1024 * 1024),
            "starting chunked upload"
        );

        self.put_chunks(access_token, video_path, total, &session_uri)
    }

    /// Start a resumable session and return the session URI.
    fn initiate_session(
        &self,
        access_token: &str,
        metadata: &VideoMetadata,
        total: u64,
    ) -> UploadResult<String> {
        let url = format!(
            "{}?uploadType=resumable&part=snippet,status",
            self.settings.upload_url
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", "video/*")
            .header("X-Upload-Content-Length", total.to_string())
            .json(&metadata.snippet_json())
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        response
            .headers()
            .get("location")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .ok_or(UploadError::SessionUriMissing)
    }

    /// Stream the file body in chunks until the session completes.
    fn put_chunks(
        &self,
        access_token: &str,
        video_path: &Path,
        total: u64,
        session_uri: &str,
    ) -> UploadResult<String> {
        let chunk_size = (self.settings.chunk_size_mb * 1024 * 1024) as usize;
        let mut file = File::open(video_path).map_err(|e| UploadError::Io {
            path: video_path.to_path_buf(),
            source: e,
        })?;

        let mut offset: u64 = 0;
        let mut last_logged_pct: u64 = 0;

        loop {
            let mut buffer = vec![0u8; chunk_size];
            let read = file.read(&mut buffer).map_err(|e| UploadError::Io {
                path: video_path.to_path_buf(),
                source: e,
            })?;
            if read == 0 {
                return Err(UploadError::VideoIdMissing);
            }
            buffer.truncate(read);

            let range = content_range(offset, read as u64, total);
            let response = self
                .http
                .put(session_uri)
                .bearer_auth(access_token)
                .header("Content-Range", range)
                .body(buffer)
                .send()?;

            offset += read as u64;
            let pct = offset * 100 / total;
            if pct / 10 > last_logged_pct / 10 {
                tracing::info!("upload progress: {}%", pct);
                last_logged_pct = pct;
            }

            let status = response.status().as_u16();
            match status {
                // 308: chunk accepted, session continues.
                308 => continue,
                200 | 201 => {
                    let json: Value = response.json()?;
                    return json
                        .get("id")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string())
                        .ok_or(UploadError::VideoIdMissing);
                }
                _ => {
                    let body = response.text().unwrap_or_default();
                    return Err(UploadError::BadStatus { status, body });
                }
            }
        }
    }

    /// Attach thumbnail bytes to an uploaded video.
    pub fn set_thumbnail(
        &self,
        access_token: &str,
        video_id: &str,
        image_bytes: Vec<u8>,
    ) -> UploadResult<()> {
        let url = format!(
            "{}/thumbnails/set?videoId={}",
            self.settings.api_url, video_id
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(access_token)
            .header("Content-Type", "image/png")
            .body(image_bytes)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_range_is_inclusive() {
        assert_eq!(content_range(0, 5_242_880, 104_857_600), "bytes 0-5242879/104857600");
        assert_eq!(content_range(100, 50, 150), "bytes 100-149/150");
    }

    #[test]
    fn missing_file_fails_before_any_request() {
        let settings = UploadSettings::default();
        let client = UploadClient::new(&settings).unwrap();
        let meta = VideoMetadata {
            title: "T".to_string(),
            description: "D".to_string(),
            tags: vec![],
            category_id: 24,
            privacy: "public".to_string(),
        };

        let result = client.upload_video("tok", Path::new("/nonexistent/final.mp4"), &meta);
        assert!(matches!(result, Err(UploadError::MissingInput(_))));
    }
}
