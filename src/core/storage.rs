//! Unsigned transfers against pre-signed object-store URLs

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::core::errors::{LaraError, Result};

/// Form fields returned alongside a pre-signed upload URL
pub type UploadFields = HashMap<String, String>;

/// Client for the object store behind `/documents/upload-url` and `/documents/download-url`
#[derive(Debug, Clone)]
pub struct ObjectStore {
    http: reqwest::Client,
}

impl ObjectStore {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// POST `content` with the server-supplied form fields
    pub async fn upload(&self, url: &str, fields: &UploadFields, content: Vec<u8>) -> Result<()> {
        let mut form = Form::new();
        for (name, value) in fields {
            form = form.text(name.clone(), value.clone());
        }
        let filename = fields.get("key").cloned().unwrap_or_default();
        let size = content.len();
        form = form.part("file", Part::bytes(content).file_name(filename));

        debug!("Uploading {} bytes to object store", size);
        let response = self
            .http
            .post(url)
            .multipart(form)
            .send()
            .await
            .map_err(LaraError::from_transport)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(LaraError::ObjectStore {
                operation: "upload",
                status: status.as_u16(),
            });
        }

        Ok(())
    }

    /// Upload a file from disk
    pub async fn upload_file(&self, url: &str, fields: &UploadFields, path: &Path) -> Result<()> {
        let content = tokio::fs::read(path).await?;
        self.upload(url, fields, content).await
    }

    /// GET the whole object into memory
    pub async fn download(&self, url: &str) -> Result<Bytes> {
        let response = self.fetch(url).await?;
        response.bytes().await.map_err(LaraError::from_transport)
    }

    /// Stream the object into `dest` chunk by chunk, returning the bytes written.
    ///
    /// The body lands in a sibling `.part` file that replaces `dest` only once
    /// complete; on failure `dest` is left untouched.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64> {
        let response = self.fetch(url).await?;
        let partial = partial_path(dest);

        match write_body(response, &partial).await {
            Ok(written) => {
                tokio::fs::rename(&partial, dest).await?;
                debug!("Downloaded {} bytes to {}", written, dest.display());
                Ok(written)
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                    warn!("Could not remove {}: {}", partial.display(), cleanup);
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(LaraError::from_transport)?;

        let status = response.status();
        if status.as_u16() >= 400 {
            return Err(LaraError::ObjectStore {
                operation: "download",
                status: status.as_u16(),
            });
        }

        Ok(response)
    }
}

/// `report.pdf` -> `report.pdf.part`, in the same directory
fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

async fn write_body(mut response: reqwest::Response, path: &Path) -> Result<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;

    while let Some(chunk) = response.chunk().await.map_err(LaraError::from_transport)? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok(written)
}
