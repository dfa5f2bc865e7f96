use std::path::Path;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("request for {url} failed")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image from {url}")]
    Decode {
        url: String,
        #[source]
        source: image::ImageError,
    },
}

/// Source of raw thumbnail bytes. Implementations run on loader worker threads.
pub trait ThumbnailFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError>;
}

/// Fetches `http(s)://` thumbnails over the network and everything else from
/// the local filesystem (`file://` prefix optional).
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self { client })
    }

    fn fetch_remote(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|source| AssetError::Request {
                url: url.to_owned(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssetError::Status {
                url: url.to_owned(),
                status: status.as_u16(),
            });
        }

        response
            .bytes()
            .map(|bytes| bytes.to_vec())
            .map_err(|source| AssetError::Request {
                url: url.to_owned(),
                source,
            })
    }
}

impl ThumbnailFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, AssetError> {
        if url.starts_with("http://") || url.starts_with("https://") {
            return self.fetch_remote(url);
        }

        let path = url.strip_prefix("file://").unwrap_or(url);
        std::fs::read(Path::new(path)).map_err(|source| AssetError::Io {
            path: path.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_paths_are_read_from_disk() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("thumb.bin");
        std::fs::write(&path, [1u8, 2, 3]).expect("write thumbnail");

        let fetcher = HttpFetcher::new().expect("client");
        let url = format!("file://{}", path.display());

        assert_eq!(fetcher.fetch(&url).expect("reads file"), vec![1, 2, 3]);
    }

    #[test]
    fn missing_local_file_is_an_io_error() {
        let fetcher = HttpFetcher::new().expect("client");
        let error = fetcher.fetch("/no/such/thumbnail.jpg").expect_err("missing");
        assert!(matches!(error, AssetError::Io { .. }));
    }
}
