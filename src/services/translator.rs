//! Translator facade: text translation plus the domain services

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::core::auth::Credentials;
use crate::core::client::{ApiRequest, HttpClient};
use crate::core::config::ClientConfig;
use crate::core::errors::Result;
use crate::core::models::{TextResult, TranslateInput, TranslateOptions, TranslationStyle};
use crate::core::storage::ObjectStore;
use crate::services::documents::Documents;
use crate::services::glossaries::Glossaries;
use crate::services::is_empty;
use crate::services::memories::Memories;

#[derive(Serialize)]
struct TranslateBody<'a> {
    q: &'a TranslateInput,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    source: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    source_hint: Option<&'a str>,
    #[serde(skip_serializing_if = "is_empty")]
    adapt_to: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    glossaries: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    instructions: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    content_type: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    multiline: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    priority: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    use_cache: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cache_ttl: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbose: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    style: Option<TranslationStyle>,
}

/// Entry point of the client
#[derive(Debug, Clone)]
pub struct Translator {
    client: Arc<HttpClient>,
    config: Arc<ClientConfig>,
    pub memories: Memories,
    pub glossaries: Glossaries,
    pub documents: Documents,
}

impl Translator {
    /// Create a translator
    pub fn new(credentials: Credentials, config: ClientConfig) -> Result<Self> {
        let client = Arc::new(HttpClient::new(credentials, &config)?);
        let poll_interval = config.poll_interval();
        let store = ObjectStore::new(client.http().clone());

        debug!("Translator ready for {}", client.base_url());

        Ok(Self {
            memories: Memories::new(client.clone(), poll_interval),
            glossaries: Glossaries::new(client.clone(), poll_interval),
            documents: Documents::new(client.clone(), store, poll_interval),
            client,
            config: Arc::new(config),
        })
    }

    /// Create from environment
    pub fn from_env() -> Result<Self> {
        Self::new(Credentials::from_env(), ClientConfig::from_env()?)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Transport shared by all services
    pub fn client(&self) -> &HttpClient {
        &self.client
    }

    /// Translate a string, a list of strings or a list of text blocks.
    ///
    /// `source` is auto-detected when `None`.
    pub async fn translate(
        &self,
        text: impl Into<TranslateInput>,
        source: Option<&str>,
        target: &str,
        options: &TranslateOptions,
    ) -> Result<TextResult> {
        let text = text.into();
        let body = TranslateBody {
            q: &text,
            target,
            source,
            source_hint: options.source_hint.as_deref(),
            adapt_to: &options.adapt_to,
            glossaries: &options.glossaries,
            instructions: &options.instructions,
            content_type: options.content_type.as_deref(),
            multiline: options.multiline,
            timeout: options.timeout_ms.filter(|ms| *ms > 0),
            priority: options.priority.as_deref(),
            use_cache: options.use_cache,
            cache_ttl: options.cache_ttl,
            verbose: options.verbose,
            style: options.style,
        };

        let mut request = ApiRequest::post("/translate")
            .json(&body)?
            .headers(options.headers.clone());
        if options.no_trace {
            request = request.header("X-No-Trace", "true");
        }

        self.client.send(request).await
    }

    /// Language codes supported by the platform
    pub async fn languages(&self) -> Result<Vec<String>> {
        self.client.get("/languages").await
    }
}
