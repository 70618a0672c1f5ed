//! Binary resources: readable bytes with an identity.

use std::fs::{self, File};
use std::io::{self, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, UNIX_EPOCH};

use chrono::DateTime;
use reqwest::header::LAST_MODIFIED;
use thiserror::Error;
use url::Url;

/// Errors from resource capabilities.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The resource kind cannot do this at all.
    #[error("{operation} is not supported for {name}")]
    Unsupported {
        operation: &'static str,
        name: String,
    },

    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Errors while fetching a URL for the URL fallback.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Unsupported URL scheme '{0}'")]
    UnsupportedScheme(String),

    #[error("URL '{0}' does not name a local file")]
    NotAFile(Url),

    #[error("Failed to read '{url}': {source}")]
    Io {
        url: Url,
        #[source]
        source: io::Error,
    },

    #[error("Failed to fetch '{url}': {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },
}

/// A class file on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileResource {
    path: PathBuf,
    uri: Url,
}

/// A class file fetched through the URL fallback.
///
/// Only identity, last-modified and reading are available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlResource {
    url: Url,
    last_modified: u64,
    body: Vec<u8>,
}

/// Something a class file can be read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryResource {
    File(FileResource),
    Url(UrlResource),
}

impl BinaryResource {
    /// A filesystem resource. The file does not have to exist.
    pub fn file(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let absolute = std::path::absolute(&path)?;
        let uri = Url::from_file_path(&absolute).map_err(|()| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("cannot express {} as a file URL", absolute.display()),
            )
        })?;
        Ok(BinaryResource::File(FileResource { path, uri }))
    }

    /// Fetch `url` once and keep its body.
    ///
    /// `file:` URLs are read from disk, `http`/`https` with one GET.
    pub fn fetch(url: Url, timeout: Duration) -> Result<Self, FetchError> {
        let resource = match url.scheme() {
            "file" => fetch_file(url)?,
            "http" | "https" => fetch_http(url, timeout)?,
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        };
        Ok(BinaryResource::Url(resource))
    }

    /// Name for messages: the path as given, or the URL.
    pub fn name(&self) -> String {
        match self {
            BinaryResource::File(file) => file.path.display().to_string(),
            BinaryResource::Url(remote) => remote.url.to_string(),
        }
    }

    pub fn uri(&self) -> &Url {
        match self {
            BinaryResource::File(file) => &file.uri,
            BinaryResource::Url(remote) => &remote.url,
        }
    }

    /// Milliseconds since the epoch; 0 when unknown or the file is missing.
    pub fn last_modified(&self) -> u64 {
        match self {
            BinaryResource::File(file) => fs::metadata(&file.path)
                .and_then(|m| m.modified())
                .ok()
                .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
            BinaryResource::Url(remote) => remote.last_modified,
        }
    }

    pub fn open_read(&self) -> io::Result<Box<dyn Read + '_>> {
        match self {
            BinaryResource::File(file) => Ok(Box::new(File::open(&file.path)?)),
            BinaryResource::Url(remote) => Ok(Box::new(Cursor::new(remote.body.as_slice()))),
        }
    }

    pub fn open_write(&self) -> Result<Box<dyn Write>, ResourceError> {
        match self {
            BinaryResource::File(file) => Ok(Box::new(File::create(&file.path)?)),
            BinaryResource::Url(_) => Err(self.unsupported("writing")),
        }
    }

    /// The content decoded as UTF-8, lossily if `ignore_encoding_errors`.
    pub fn char_content(&self, ignore_encoding_errors: bool) -> Result<String, ResourceError> {
        match self {
            BinaryResource::File(file) => {
                let bytes = fs::read(&file.path)?;
                if ignore_encoding_errors {
                    Ok(String::from_utf8_lossy(&bytes).into_owned())
                } else {
                    String::from_utf8(bytes)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e).into())
                }
            }
            BinaryResource::Url(_) => Err(self.unsupported("character decoding")),
        }
    }

    pub fn delete(&self) -> Result<(), ResourceError> {
        match self {
            BinaryResource::File(file) => Ok(fs::remove_file(&file.path)?),
            BinaryResource::Url(_) => Err(self.unsupported("deletion")),
        }
    }

    /// Path on disk, for filesystem resources.
    pub fn path(&self) -> Option<&Path> {
        match self {
            BinaryResource::File(file) => Some(&file.path),
            BinaryResource::Url(_) => None,
        }
    }

    fn unsupported(&self, operation: &'static str) -> ResourceError {
        ResourceError::Unsupported {
            operation,
            name: self.name(),
        }
    }
}

fn fetch_file(url: Url) -> Result<UrlResource, FetchError> {
    let path = url
        .to_file_path()
        .map_err(|()| FetchError::NotAFile(url.clone()))?;
    let read = || -> io::Result<(Vec<u8>, u64)> {
        let body = fs::read(&path)?;
        let modified = fs::metadata(&path)?
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok((body, modified))
    };
    let (body, last_modified) = read().map_err(|source| FetchError::Io {
        url: url.clone(),
        source,
    })?;
    Ok(UrlResource {
        url,
        last_modified,
        body,
    })
}

fn fetch_http(url: Url, timeout: Duration) -> Result<UrlResource, FetchError> {
    let http = |source| FetchError::Http {
        url: url.clone(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(http)?;
    let response = client
        .get(url.clone())
        .send()
        .and_then(|r| r.error_for_status())
        .map_err(http)?;

    let last_modified = response
        .headers()
        .get(LAST_MODIFIED)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| DateTime::parse_from_rfc2822(v).ok())
        .map(|t| t.timestamp_millis().max(0) as u64)
        .unwrap_or(0);
    let body = response.bytes().map_err(http)?.to_vec();

    Ok(UrlResource {
        url,
        last_modified,
        body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn url_resource() -> (TempDir, BinaryResource) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Remote.class");
        fs::write(&path, b"\xca\xfe\xba\xbe").unwrap();
        let url = Url::from_file_path(&path).unwrap();
        let resource = BinaryResource::fetch(url, Duration::from_secs(1)).unwrap();
        (dir, resource)
    }

    #[test]
    fn test_url_resource_reads_and_identifies() {
        let (_dir, resource) = url_resource();

        let mut bytes = Vec::new();
        resource.open_read().unwrap().read_to_end(&mut bytes).unwrap();
        assert_eq!(bytes, b"\xca\xfe\xba\xbe");
        assert!(resource.name().starts_with("file://"));
        assert!(resource.name().ends_with("Remote.class"));
        assert_eq!(resource.uri().scheme(), "file");
        assert!(resource.last_modified() > 0);
        assert!(resource.path().is_none());
    }

    #[test]
    fn test_url_resource_rejects_other_capabilities() {
        let (_dir, resource) = url_resource();

        assert!(matches!(
            resource.open_write(),
            Err(ResourceError::Unsupported { operation: "writing", .. })
        ));
        assert!(matches!(
            resource.char_content(true),
            Err(ResourceError::Unsupported { operation: "character decoding", .. })
        ));
        assert!(matches!(
            resource.delete(),
            Err(ResourceError::Unsupported { operation: "deletion", .. })
        ));
        // Still readable after the rejected calls.
        assert!(resource.open_read().is_ok());
    }

    #[test]
    fn test_missing_file_has_zero_timestamp() {
        let dir = TempDir::new().unwrap();
        let resource = BinaryResource::file(dir.path().join("Missing.class")).unwrap();
        assert_eq!(resource.last_modified(), 0);
        assert!(resource.open_read().is_err());
    }

    #[test]
    fn test_file_resource_supports_write_and_delete() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Local.class");
        let resource = BinaryResource::file(&path).unwrap();

        resource.open_write().unwrap().write_all(b"abc").unwrap();
        assert_eq!(resource.char_content(false).unwrap(), "abc");
        assert!(resource.last_modified() > 0);
        assert_eq!(resource.uri().scheme(), "file");

        resource.delete().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_fetch_rejects_unknown_scheme() {
        let url = Url::parse("ftp://example.org/Foo.class").unwrap();
        assert!(matches!(
            BinaryResource::fetch(url, Duration::from_secs(1)),
            Err(FetchError::UnsupportedScheme(scheme)) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_fetch_missing_file() {
        let dir = TempDir::new().unwrap();
        let url = Url::from_file_path(dir.path().join("Gone.class")).unwrap();
        assert!(matches!(
            BinaryResource::fetch(url, Duration::from_secs(1)),
            Err(FetchError::Io { .. })
        ));
    }
}
