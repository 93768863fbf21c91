//! Where module binaries come from.

use std::path::PathBuf;

use async_trait::async_trait;
use url::Url;

use crate::error::LoadError;

/// A place a module binary can be fetched from.
///
/// Fetching is the only asynchronous step of loading. Compilation and
/// instantiation happen synchronously afterwards.
#[async_trait]
pub trait ModuleSource: Send + Sync {
    /// Fetch the module bytes (binary or text format).
    async fn fetch(&self) -> Result<Vec<u8>, LoadError>;

    /// Human-readable origin, for logs and errors.
    fn describe(&self) -> String;
}

/// A module on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ModuleSource for FileSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Ok(tokio::fs::read(&self.path).await?)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// A module served over HTTP(S).
#[derive(Debug, Clone)]
pub struct UrlSource {
    url: Url,
}

impl UrlSource {
    pub fn new(url: Url) -> Self {
        Self { url }
    }

    /// Parse `url` and wrap it.
    pub fn parse(url: &str) -> Result<Self, LoadError> {
        Ok(Self::new(Url::parse(url)?))
    }
}

#[async_trait]
impl ModuleSource for UrlSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        let response = reqwest::get(self.url.clone()).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Fetch {
                source_name: self.describe(),
                message: format!("HTTP {}", status),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// A module already in memory.
#[derive(Debug, Clone)]
pub struct BytesSource {
    bytes: Vec<u8>,
}

impl BytesSource {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl ModuleSource for BytesSource {
    async fn fetch(&self) -> Result<Vec<u8>, LoadError> {
        Ok(self.bytes.clone())
    }

    fn describe(&self) -> String {
        format!("<{} bytes>", self.bytes.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn file_source_reads_bytes() {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        let bytes = vec![0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];
        temp.write_all(&bytes).unwrap();

        let source = FileSource::new(temp.path());
        assert_eq!(source.fetch().await.unwrap(), bytes);
    }

    #[tokio::test]
    async fn file_source_not_found() {
        let source = FileSource::new("/nonexistent/path/to/module.wasm");
        assert!(matches!(source.fetch().await, Err(LoadError::Read(_))));
    }

    #[test]
    fn url_source_rejects_garbage() {
        assert!(matches!(
            UrlSource::parse("not a url"),
            Err(LoadError::InvalidUrl(_))
        ));
    }

    #[test]
    fn url_source_describe() {
        let source = UrlSource::parse("https://example.com/pua-lang.wasm").unwrap();
        assert_eq!(source.describe(), "https://example.com/pua-lang.wasm");
    }

    #[tokio::test]
    async fn bytes_source_returns_copy() {
        let source = BytesSource::new(b"(module)".to_vec());
        assert_eq!(source.fetch().await.unwrap(), b"(module)");
        assert_eq!(source.describe(), "<8 bytes>");
    }
}
