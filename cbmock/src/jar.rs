//! Locating the mock jar
//!
//! Resolution order: an explicitly configured path, then a cached copy in the
//! cache directory, then a download of the published release into the cache.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{MockError, MockResult};

/// Mock release used when nothing else is configured
pub const DEFAULT_MOCK_VERSION: &str = "1.5.25";

const DEFAULT_DOWNLOAD_BASE: &str = "https://packages.couchbase.com/clients/c/mock";
const JAR_PREFIX: &str = "CouchbaseMock-";
const JAR_SUFFIX: &str = ".jar";

#[derive(Debug, Clone)]
pub struct JarLocator {
    explicit_path: Option<PathBuf>,
    cache_dir: PathBuf,
    version: String,
    download_base: String,
}

impl JarLocator {
    pub fn new() -> Self {
        Self {
            explicit_path: None,
            cache_dir: std::env::temp_dir().join("cbmock"),
            version: DEFAULT_MOCK_VERSION.to_string(),
            download_base: DEFAULT_DOWNLOAD_BASE.to_string(),
        }
    }

    /// Use a jar at a fixed location; no download is attempted (fluent API)
    pub fn with_explicit_path(mut self, path: Option<PathBuf>) -> Self {
        self.explicit_path = path;
        self
    }

    /// Configure the cache directory (fluent API)
    pub fn with_cache_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Configure the mock release to fetch (fluent API)
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Configure the download base URL (fluent API)
    pub fn with_download_base(mut self, base: impl Into<String>) -> Self {
        self.download_base = base.into();
        self
    }

    pub fn explicit_path(&self) -> Option<&Path> {
        self.explicit_path.as_deref()
    }

    pub fn cached_path(&self) -> PathBuf {
        self.cache_dir.join(format!("{JAR_PREFIX}{}{JAR_SUFFIX}", self.version))
    }

    pub fn download_url(&self) -> String {
        format!(
            "{}/{JAR_PREFIX}{}{JAR_SUFFIX}",
            self.download_base.trim_end_matches('/'),
            self.version
        )
    }

    /// Release version of a jar, read from its `CouchbaseMock-<version>.jar` file name
    pub fn version_of(&self, path: &Path) -> String {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix(JAR_PREFIX))
            .and_then(|name| name.strip_suffix(JAR_SUFFIX))
            .filter(|version| !version.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| self.version.clone())
    }

    /// Resolve the jar path, downloading it into the cache when necessary
    pub async fn locate(&self) -> MockResult<PathBuf> {
        if let Some(ref path) = self.explicit_path {
            if tokio::fs::try_exists(path).await? {
                debug!("Using configured mock jar {}", path.display());
                return Ok(path.clone());
            }
            return Err(MockError::JarNotFound { path: path.clone() });
        }

        let cached = self.cached_path();
        if tokio::fs::try_exists(&cached).await? {
            debug!("Using cached mock jar {}", cached.display());
            return Ok(cached);
        }

        self.download(&cached).await?;
        Ok(cached)
    }

    async fn download(&self, target: &Path) -> MockResult<()> {
        let url = self.download_url();
        info!("Downloading mock jar from {}", url);

        let download_error = |message: String| MockError::DownloadFailed {
            url: url.clone(),
            message,
        };

        let response = reqwest::get(&url)
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| download_error(e.to_string()))?;
        let body = response.bytes().await.map_err(|e| download_error(e.to_string()))?;

        tokio::fs::create_dir_all(&self.cache_dir).await?;
        let partial = target.with_extension("jar.part");
        tokio::fs::write(&partial, &body).await?;
        tokio::fs::rename(&partial, target).await?;

        info!("Cached mock jar at {} ({} bytes)", target.display(), body.len());
        Ok(())
    }
}

impl Default for JarLocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_url_and_cache_path() {
        let locator = JarLocator::new()
            .with_cache_dir("/tmp/mock-cache")
            .with_version("1.5.30")
            .with_download_base("http://example.invalid/mock/");

        assert_eq!(
            locator.download_url(),
            "http://example.invalid/mock/CouchbaseMock-1.5.30.jar"
        );
        assert_eq!(
            locator.cached_path(),
            PathBuf::from("/tmp/mock-cache/CouchbaseMock-1.5.30.jar")
        );
    }

    #[test]
    fn test_version_from_file_name() {
        let locator = JarLocator::new();
        assert_eq!(locator.version_of(Path::new("/opt/CouchbaseMock-1.5.19.jar")), "1.5.19");
        assert_eq!(locator.version_of(Path::new("/opt/mock.jar")), DEFAULT_MOCK_VERSION);
    }

    #[tokio::test]
    async fn test_missing_explicit_jar_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let locator = JarLocator::new().with_explicit_path(Some(dir.path().join("absent.jar")));

        let err = locator.locate().await.unwrap_err();
        assert!(matches!(err, MockError::JarNotFound { .. }));
    }

    #[tokio::test]
    async fn test_explicit_jar_is_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let jar = dir.path().join("CouchbaseMock-9.9.9.jar");
        std::fs::write(&jar, b"jar").unwrap();

        let locator = JarLocator::new().with_explicit_path(Some(jar.clone()));
        assert_eq!(locator.locate().await.unwrap(), jar);
    }

    #[tokio::test]
    async fn test_cached_jar_skips_download() {
        let dir = tempfile::tempdir().unwrap();
        let locator = JarLocator::new()
            .with_cache_dir(dir.path())
            .with_download_base("http://127.0.0.1:1");
        std::fs::write(locator.cached_path(), b"jar").unwrap();

        assert_eq!(locator.locate().await.unwrap(), locator.cached_path());
    }
}
