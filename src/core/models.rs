//! Core data models for the Lara API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use crate::core::poller::Operation;

/// Translation memory
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub id: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub collaborators_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_at: Option<DateTime<Utc>>,
}

/// Asynchronous import job, shared by memories and glossaries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Import {
    pub id: String,
    #[serde(default)]
    pub begin: i64,
    #[serde(default)]
    pub end: i64,
    #[serde(default)]
    pub channel: i64,
    #[serde(default)]
    pub size: i64,
    /// Fraction done, in `[0.0, 1.0]`
    #[serde(default)]
    pub progress: f64,
}

impl Operation for Import {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_complete(&self) -> bool {
        self.progress >= 1.0
    }
}

pub type MemoryImport = Import;
pub type GlossaryImport = Import;

/// Glossary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Glossary {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub owner_id: String,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: DateTime<Utc>,
}

/// Term counts of a glossary
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GlossaryCounts {
    #[serde(default)]
    pub unidirectional: HashMap<String, u64>,
    #[serde(default)]
    pub multidirectional: u64,
}

/// Lifecycle of a translated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Initialized,
    Analyzing,
    Paused,
    Ready,
    Translating,
    Translated,
    Error,
    #[serde(other)]
    Unknown,
}

impl DocumentStatus {
    /// `translated` and `error` end the job
    pub fn is_terminal(self) -> bool {
        matches!(self, DocumentStatus::Translated | DocumentStatus::Error)
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentStatus::Initialized => "initialized",
            DocumentStatus::Analyzing => "analyzing",
            DocumentStatus::Paused => "paused",
            DocumentStatus::Ready => "ready",
            DocumentStatus::Translating => "translating",
            DocumentStatus::Translated => "translated",
            DocumentStatus::Error => "error",
            DocumentStatus::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

/// Translation style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationStyle {
    Faithful,
    Fluid,
    Creative,
}

impl std::str::FromStr for TranslationStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "faithful" => Ok(TranslationStyle::Faithful),
            "fluid" => Ok(TranslationStyle::Fluid),
            "creative" => Ok(TranslationStyle::Creative),
            other => Err(format!("unknown translation style: {}", other)),
        }
    }
}

/// Options stored with a document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentOptions {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub adapt_to: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub glossaries: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub no_trace: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TranslationStyle>,
}

/// Document translation job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub status: DocumentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    pub filename: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<DocumentOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chars: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_reason: Option<String>,
}

impl Document {
    /// Fraction of characters translated so far, when the server reports it
    pub fn progress(&self) -> Option<f64> {
        match (self.translated_chars, self.total_chars) {
            (Some(done), Some(total)) if total > 0 => Some(done as f64 / total as f64),
            _ => None,
        }
    }
}

impl Operation for Document {
    fn id(&self) -> &str {
        &self.id
    }

    fn is_complete(&self) -> bool {
        self.status.is_terminal()
    }
}

/// Options for uploading a document
#[derive(Debug, Clone, Default)]
pub struct DocumentUploadOptions {
    pub adapt_to: Vec<String>,
    pub glossaries: Vec<String>,
    pub no_trace: bool,
    pub style: Option<TranslationStyle>,
}

/// Options for downloading a translated document
#[derive(Debug, Clone, Default)]
pub struct DocumentDownloadOptions {
    pub output_format: Option<String>,
}

/// Options for the upload, wait, download round trip
#[derive(Debug, Clone, Default)]
pub struct DocumentTranslateOptions {
    pub upload: DocumentUploadOptions,
    pub download: DocumentDownloadOptions,
    /// Give up waiting for the translation after this long
    pub max_wait: Option<Duration>,
}

/// A segment of text, optionally excluded from translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    pub text: String,
    pub translatable: bool,
}

impl TextBlock {
    pub fn new(text: impl Into<String>, translatable: bool) -> Self {
        Self {
            text: text.into(),
            translatable,
        }
    }
}

/// Text accepted by `/translate`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TranslateInput {
    Text(String),
    Texts(Vec<String>),
    Blocks(Vec<TextBlock>),
}

impl From<&str> for TranslateInput {
    fn from(text: &str) -> Self {
        TranslateInput::Text(text.to_string())
    }
}

impl From<String> for TranslateInput {
    fn from(text: String) -> Self {
        TranslateInput::Text(text)
    }
}

impl From<Vec<String>> for TranslateInput {
    fn from(texts: Vec<String>) -> Self {
        TranslateInput::Texts(texts)
    }
}

impl From<Vec<&str>> for TranslateInput {
    fn from(texts: Vec<&str>) -> Self {
        TranslateInput::Texts(texts.into_iter().map(String::from).collect())
    }
}

impl From<Vec<TextBlock>> for TranslateInput {
    fn from(blocks: Vec<TextBlock>) -> Self {
        TranslateInput::Blocks(blocks)
    }
}

/// Translated text, in the same shape as the input.
///
/// Decoding tries a string, then a list of strings, then a list of blocks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Translation {
    Text(String),
    Texts(Vec<String>),
    Blocks(Vec<TextBlock>),
}

impl Translation {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Translation::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl fmt::Display for Translation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Translation::Text(text) => write!(f, "{}", text),
            Translation::Texts(texts) => write!(f, "{}", texts.join("\n")),
            Translation::Blocks(blocks) => {
                for block in blocks {
                    write!(f, "{}", block.text)?;
                }
                Ok(())
            }
        }
    }
}

/// Memory segment that influenced a translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMatch {
    pub memory: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tuid: Option<String>,
    pub language: [String; 2],
    pub sentence: String,
    pub translation: String,
    pub score: f64,
}

/// Glossary term that influenced a translation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlossaryMatch {
    pub glossary: String,
    pub language: [String; 2],
    pub term: String,
    pub translation: String,
}

/// Result of `/translate`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextResult {
    pub content_type: String,
    pub source_language: String,
    pub translation: Translation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapted_to: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossaries: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub adapted_to_matches: Option<Vec<Vec<MemoryMatch>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossaries_matches: Option<Vec<Vec<GlossaryMatch>>>,
}

/// Options for `/translate`
#[derive(Debug, Clone, Default)]
pub struct TranslateOptions {
    pub adapt_to: Vec<String>,
    pub glossaries: Vec<String>,
    pub instructions: Vec<String>,
    pub content_type: Option<String>,
    pub multiline: Option<bool>,
    /// Server-side timeout in milliseconds
    pub timeout_ms: Option<u64>,
    pub priority: Option<String>,
    pub use_cache: Option<bool>,
    pub cache_ttl: Option<u64>,
    pub source_hint: Option<String>,
    pub no_trace: bool,
    pub verbose: Option<bool>,
    pub style: Option<TranslationStyle>,
    /// Extra request headers
    pub headers: HashMap<String, String>,
}

/// One sentence pair stored in a memory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TranslationUnit {
    pub source: String,
    pub target: String,
    pub sentence: String,
    pub translation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tuid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_before: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence_after: Option<String>,
}

impl TranslationUnit {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        sentence: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            sentence: sentence.into(),
            translation: translation.into(),
            tuid: None,
            sentence_before: None,
            sentence_after: None,
        }
    }

    pub fn with_tuid(mut self, tuid: impl Into<String>) -> Self {
        self.tuid = Some(tuid.into());
        self
    }

    /// Surrounding sentences used to disambiguate the pair
    pub fn with_context(
        mut self,
        sentence_before: impl Into<String>,
        sentence_after: impl Into<String>,
    ) -> Self {
        self.sentence_before = Some(sentence_before.into());
        self.sentence_after = Some(sentence_after.into());
        self
    }
}
