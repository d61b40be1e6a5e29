//! Lara Translate client library
//!
//! Signed access to the Lara HTTP API: text and document translation,
//! translation memories and glossaries. Long-running jobs (imports and
//! document translations) are tracked with a shared polling loop.

#![forbid(unsafe_code)]

pub mod cli;
pub mod core;
pub mod services;

// Re-export key types for convenience
pub use core::{
    auth::Credentials,
    client::{ApiRequest, Attachment, HttpClient},
    config::ClientConfig,
    errors::{LaraError, Result},
    models::{
        Document, DocumentDownloadOptions, DocumentStatus, DocumentTranslateOptions,
        DocumentUploadOptions, Glossary, GlossaryCounts, GlossaryImport, GlossaryMatch, Import,
        Memory, MemoryImport, MemoryMatch, TextBlock, TextResult, TranslateInput,
        TranslateOptions, Translation, TranslationStyle, TranslationUnit,
    },
    poller::{Operation, WaitError, WaitOptions, WaitResult},
};

pub use services::{
    documents::Documents, glossaries::Glossaries, memories::Memories, translator::Translator,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
