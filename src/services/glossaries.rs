//! Glossary management

use bytes::Bytes;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::client::{ApiRequest, Attachment, HttpClient};
use crate::core::errors::Result;
use crate::core::models::{Glossary, GlossaryCounts, GlossaryImport};
use crate::core::poller::{wait_until_complete, WaitOptions, WaitResult};
use crate::services::{read_import_file, ImportBody};

/// Client for `/glossaries`
#[derive(Debug, Clone)]
pub struct Glossaries {
    client: Arc<HttpClient>,
    poll_interval: Duration,
}

impl Glossaries {
    pub fn new(client: Arc<HttpClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    pub async fn list(&self) -> Result<Vec<Glossary>> {
        self.client.get("/glossaries").await
    }

    pub async fn create(&self, name: &str) -> Result<Glossary> {
        let glossary: Glossary = self
            .client
            .post("/glossaries", &json!({ "name": name }))
            .await?;
        info!("Created glossary {} ({})", glossary.name, glossary.id);
        Ok(glossary)
    }

    /// Fetch a glossary; `None` when the server reports 404
    pub async fn get(&self, id: &str) -> Result<Option<Glossary>> {
        match self.client.get(&format!("/glossaries/{}", id)).await {
            Ok(glossary) => Ok(Some(glossary)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<Glossary> {
        self.client.delete(&format!("/glossaries/{}", id)).await
    }

    pub async fn update(&self, id: &str, name: &str) -> Result<Glossary> {
        self.client
            .put(&format!("/glossaries/{}", id), &json!({ "name": name }))
            .await
    }

    /// Import a CSV file; `.gz` files are sent as gzip
    pub async fn import_csv(&self, id: &str, path: &Path) -> Result<GlossaryImport> {
        let (filename, content) = read_import_file(path).await?;
        self.import_csv_bytes(id, &filename, content).await
    }

    /// Import CSV content already in memory
    pub async fn import_csv_bytes(
        &self,
        id: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<GlossaryImport> {
        debug!("Importing {} ({} bytes) into glossary {}", filename, content.len(), id);
        let request = ApiRequest::post(format!("/glossaries/{}/import", id))
            .json(&ImportBody::for_filename(filename))?
            .attachment(Attachment::new("csv", filename, content));
        self.client.send(request).await
    }

    pub async fn get_import_status(&self, import_id: &str) -> Result<GlossaryImport> {
        self.client
            .get(&format!("/glossaries/imports/{}", import_id))
            .await
    }

    pub async fn counts(&self, id: &str) -> Result<GlossaryCounts> {
        self.client.get(&format!("/glossaries/{}/counts", id)).await
    }

    /// Export the glossary in `content_type` format (e.g. `csv/table-uni`)
    pub async fn export(&self, id: &str, content_type: &str, source: Option<&str>) -> Result<Bytes> {
        let mut request =
            ApiRequest::get(format!("/glossaries/{}/export", id)).query("content_type", content_type);
        if let Some(source) = source {
            request = request.query("source", source);
        }
        self.client.send_raw(request).await
    }

    /// Poll an import until its progress reaches 1.0
    pub async fn wait_for_import(
        &self,
        import: GlossaryImport,
        options: WaitOptions<'_, GlossaryImport>,
    ) -> WaitResult<GlossaryImport> {
        wait_until_complete(import, self.poll_interval, options, move |id| async move {
            self.get_import_status(&id).await
        })
        .await
    }
}
