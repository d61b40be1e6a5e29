//! Document translation through the object store

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::core::client::{ApiRequest, HttpClient};
use crate::core::errors::{LaraError, Result};
use crate::core::models::{
    Document, DocumentDownloadOptions, DocumentStatus, DocumentTranslateOptions,
    DocumentUploadOptions, TranslationStyle,
};
use crate::core::poller::{wait_until_complete, WaitOptions, WaitResult};
use crate::core::storage::{ObjectStore, UploadFields};
use crate::services::is_empty;

#[derive(Deserialize)]
struct UploadUrl {
    url: String,
    fields: UploadFields,
}

#[derive(Deserialize)]
struct DownloadUrl {
    url: String,
}

#[derive(Serialize)]
struct CreateDocumentBody<'a> {
    s3key: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    adapt_to: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    glossaries: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<TranslationStyle>,
}

/// Client for `/documents`
#[derive(Debug, Clone)]
pub struct Documents {
    client: Arc<HttpClient>,
    store: ObjectStore,
    poll_interval: Duration,
}

impl Documents {
    pub fn new(client: Arc<HttpClient>, store: ObjectStore, poll_interval: Duration) -> Self {
        Self {
            client,
            store,
            poll_interval,
        }
    }

    /// Upload a file and start its translation
    pub async fn upload(
        &self,
        path: &Path,
        filename: &str,
        source: Option<&str>,
        target: &str,
        options: &DocumentUploadOptions,
    ) -> Result<Document> {
        let content = tokio::fs::read(path).await?;
        self.upload_bytes(content, filename, source, target, options)
            .await
    }

    /// Upload in-memory content and start its translation
    pub async fn upload_bytes(
        &self,
        content: Vec<u8>,
        filename: &str,
        source: Option<&str>,
        target: &str,
        options: &DocumentUploadOptions,
    ) -> Result<Document> {
        let upload: UploadUrl = self
            .client
            .send(ApiRequest::get("/documents/upload-url").query("filename", filename))
            .await?;

        self.store.upload(&upload.url, &upload.fields, content).await?;

        let s3key = upload.fields.get("key").map(String::as_str).unwrap_or_default();
        let body = CreateDocumentBody {
            s3key,
            target,
            source,
            adapt_to: &options.adapt_to,
            glossaries: &options.glossaries,
            style: options.style,
        };

        let mut request = ApiRequest::post("/documents").json(&body)?;
        if options.no_trace {
            request = request.header("X-No-Trace", "true");
        }

        let document: Document = self.client.send(request).await?;
        info!("Uploaded {} as document {}", filename, document.id);
        Ok(document)
    }

    pub async fn status(&self, id: &str) -> Result<Document> {
        self.client.get(&format!("/documents/{}", id)).await
    }

    /// Download a translated document into memory
    pub async fn download(&self, id: &str, options: &DocumentDownloadOptions) -> Result<Bytes> {
        let url = self.download_url(id, options).await?;
        self.store.download(&url).await
    }

    /// Stream a translated document to `dest`, returning the bytes written
    pub async fn download_to(
        &self,
        id: &str,
        options: &DocumentDownloadOptions,
        dest: &Path,
    ) -> Result<u64> {
        let url = self.download_url(id, options).await?;
        self.store.download_to(&url, dest).await
    }

    /// Poll a document until it is `translated` or `error`
    pub async fn wait_for_translation(
        &self,
        document: Document,
        options: WaitOptions<'_, Document>,
    ) -> WaitResult<Document> {
        wait_until_complete(document, self.poll_interval, options, move |id| async move {
            self.status(&id).await
        })
        .await
    }

    /// Upload, wait for the translation and download the result
    pub async fn translate(
        &self,
        path: &Path,
        filename: &str,
        source: Option<&str>,
        target: &str,
        options: &DocumentTranslateOptions,
    ) -> Result<Bytes> {
        let document = self
            .upload(path, filename, source, target, &options.upload)
            .await?;

        let mut wait = WaitOptions::new()
            .on_update(|document: &Document| debug!("Document {} is {}", document.id, document.status));
        if let Some(max_wait) = options.max_wait {
            wait = wait.max_wait(max_wait);
        }
        let document = self.wait_for_translation(document, wait).await?;

        let document = ensure_translated(document)?;
        self.download(&document.id, &options.download).await
    }

    async fn download_url(&self, id: &str, options: &DocumentDownloadOptions) -> Result<String> {
        let mut request = ApiRequest::get(format!("/documents/{}/download-url", id));
        if let Some(format) = &options.output_format {
            request = request.query("output_format", format.clone());
        }
        let download: DownloadUrl = self.client.send(request).await?;
        Ok(download.url)
    }
}

/// Turn an `error` terminus into a failure carrying the recorded reason
pub fn ensure_translated(document: Document) -> Result<Document> {
    if document.status == DocumentStatus::Error {
        let reason = document
            .error_reason
            .clone()
            .unwrap_or_else(|| "translation failed".to_string());
        warn!("Document {} failed: {}", document.id, reason);
        return Err(LaraError::DocumentFailed { reason });
    }
    Ok(document)
}
