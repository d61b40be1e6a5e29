//! Translation memory management

use serde::Serialize;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::client::{ApiRequest, Attachment, HttpClient};
use crate::core::errors::{LaraError, Result};
use crate::core::models::{Memory, MemoryImport, TranslationUnit};
use crate::core::poller::{wait_until_complete, WaitOptions, WaitResult};
use crate::services::{read_import_file, ImportBody};

#[derive(Serialize)]
struct UnitsBody<'a> {
    ids: &'a [String],
    #[serde(flatten)]
    unit: &'a TranslationUnit,
}

/// Client for `/memories`
#[derive(Debug, Clone)]
pub struct Memories {
    client: Arc<HttpClient>,
    poll_interval: Duration,
}

impl Memories {
    pub fn new(client: Arc<HttpClient>, poll_interval: Duration) -> Self {
        Self {
            client,
            poll_interval,
        }
    }

    pub async fn list(&self) -> Result<Vec<Memory>> {
        self.client.get("/memories").await
    }

    /// Create a memory, optionally tagged with the caller's own id
    pub async fn create(&self, name: &str, external_id: Option<&str>) -> Result<Memory> {
        let mut body = json!({ "name": name });
        if let Some(external_id) = external_id {
            body["external_id"] = json!(external_id);
        }
        let memory: Memory = self.client.post("/memories", &body).await?;
        info!("Created memory {} ({})", memory.name, memory.id);
        Ok(memory)
    }

    /// Fetch a memory; `None` when the server reports 404
    pub async fn get(&self, id: &str) -> Result<Option<Memory>> {
        match self.client.get(&format!("/memories/{}", id)).await {
            Ok(memory) => Ok(Some(memory)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub async fn delete(&self, id: &str) -> Result<Memory> {
        self.client.delete(&format!("/memories/{}", id)).await
    }

    pub async fn update(&self, id: &str, name: &str) -> Result<Memory> {
        self.client
            .put(&format!("/memories/{}", id), &json!({ "name": name }))
            .await
    }

    /// Connect shared memories to the caller's account
    pub async fn connect(&self, ids: &[String]) -> Result<Vec<Memory>> {
        self.client
            .post("/memories/connect", &json!({ "ids": ids }))
            .await
    }

    /// Connect a single shared memory
    pub async fn connect_one(&self, id: &str) -> Result<Memory> {
        self.connect(&[id.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| LaraError::Decode {
                message: format!("no memory returned for id {}", id),
            })
    }

    /// Import a TMX file; `.gz` files are sent as gzip
    pub async fn import_tmx(&self, id: &str, path: &Path) -> Result<MemoryImport> {
        let (filename, content) = read_import_file(path).await?;
        self.import_tmx_bytes(id, &filename, content).await
    }

    /// Import TMX content already in memory
    pub async fn import_tmx_bytes(
        &self,
        id: &str,
        filename: &str,
        content: Vec<u8>,
    ) -> Result<MemoryImport> {
        debug!("Importing {} ({} bytes) into memory {}", filename, content.len(), id);
        let request = ApiRequest::post(format!("/memories/{}/import", id))
            .json(&ImportBody::for_filename(filename))?
            .attachment(Attachment::new("tmx", filename, content));
        self.client.send(request).await
    }

    pub async fn get_import_status(&self, import_id: &str) -> Result<MemoryImport> {
        self.client
            .get(&format!("/memories/imports/{}", import_id))
            .await
    }

    /// Add a sentence pair to one memory
    pub async fn add_translation(&self, id: &str, unit: &TranslationUnit) -> Result<MemoryImport> {
        self.client
            .put(&format!("/memories/{}/content", id), unit)
            .await
    }

    /// Add a sentence pair to several memories at once
    pub async fn add_translation_to_many(
        &self,
        ids: &[String],
        unit: &TranslationUnit,
    ) -> Result<MemoryImport> {
        self.client
            .put("/memories/content", &UnitsBody { ids, unit })
            .await
    }

    /// Remove a sentence pair from one memory
    pub async fn delete_translation(
        &self,
        id: &str,
        unit: &TranslationUnit,
    ) -> Result<MemoryImport> {
        let request = ApiRequest::delete(format!("/memories/{}/content", id)).json(unit)?;
        self.client.send(request).await
    }

    /// Remove a sentence pair from several memories at once
    pub async fn delete_translation_from_many(
        &self,
        ids: &[String],
        unit: &TranslationUnit,
    ) -> Result<MemoryImport> {
        let request = ApiRequest::delete("/memories/content").json(&UnitsBody { ids, unit })?;
        self.client.send(request).await
    }

    /// Poll an import until its progress reaches 1.0
    pub async fn wait_for_import(
        &self,
        import: MemoryImport,
        options: WaitOptions<'_, MemoryImport>,
    ) -> WaitResult<MemoryImport> {
        wait_until_complete(import, self.poll_interval, options, move |id| async move {
            self.get_import_status(&id).await
        })
        .await
    }
}
