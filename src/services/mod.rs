//! Domain services built on the signed transport

pub mod documents;
pub mod glossaries;
pub mod memories;
pub mod translator;

use serde::Serialize;
use std::path::Path;

use crate::core::errors::{LaraError, Result};

/// JSON part sent next to an imported file
#[derive(Debug, Serialize)]
pub(crate) struct ImportBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    compression: Option<&'static str>,
}

impl ImportBody {
    /// Files ending in `.gz` are declared gzip-compressed
    pub(crate) fn for_filename(filename: &str) -> Self {
        let compression = if filename.to_lowercase().ends_with(".gz") {
            Some("gzip")
        } else {
            None
        };
        Self { compression }
    }
}

pub(crate) fn is_empty(list: &&[String]) -> bool {
    list.is_empty()
}

/// Read a file to import, returning its name and content
pub(crate) async fn read_import_file(path: &Path) -> Result<(String, Vec<u8>)> {
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| LaraError::Config {
            message: format!("not a file path: {}", path.display()),
        })?;
    let content = tokio::fs::read(path).await?;
    Ok((filename, content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gzip_detection() {
        assert_eq!(ImportBody::for_filename("memory.tmx.GZ").compression, Some("gzip"));
        assert_eq!(ImportBody::for_filename("terms.csv").compression, None);
        assert_eq!(
            serde_json::to_string(&ImportBody::for_filename("terms.csv")).unwrap(),
            "{}"
        );
    }

    #[tokio::test]
    async fn test_read_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terms.csv");
        std::fs::write(&path, "en-US,it-IT\nhello,ciao\n").unwrap();

        let (filename, content) = read_import_file(&path).await.unwrap();
        assert_eq!(filename, "terms.csv");
        assert_eq!(content, b"en-US,it-IT\nhello,ciao\n");

        assert!(read_import_file(&dir.path().join("missing.csv")).await.is_err());
    }
}
