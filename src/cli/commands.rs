//! CLI command definitions and handlers

use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

use crate::core::models::{
    Document, DocumentDownloadOptions, DocumentUploadOptions, Import, TranslateOptions,
    TranslationStyle, TranslationUnit,
};
use crate::core::poller::WaitOptions;
use crate::services::documents::ensure_translated;
use crate::services::translator::Translator;

/// Commands for the Lara CLI
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate one or more strings
    Translate {
        /// Text to translate (several values are sent as a list)
        #[arg(required = true)]
        text: Vec<String>,

        /// Source language (auto-detect if not specified)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language
        #[arg(short, long)]
        target: String,

        /// Memory ids to adapt to
        #[arg(long)]
        adapt_to: Vec<String>,

        /// Glossary ids to apply
        #[arg(long)]
        glossary: Vec<String>,

        /// Free-form instructions for the translator
        #[arg(long)]
        instruction: Vec<String>,

        /// faithful, fluid or creative
        #[arg(long)]
        style: Option<TranslationStyle>,

        /// Ask the server not to keep a trace of the request
        #[arg(long)]
        no_trace: bool,
    },

    /// List supported languages
    Languages,

    /// Manage translation memories
    Memories {
        #[command(subcommand)]
        command: MemoryCommand,
    },

    /// Manage glossaries
    Glossaries {
        #[command(subcommand)]
        command: GlossaryCommand,
    },

    /// Translate a document file
    Document {
        /// Input document (required)
        #[arg(short, long)]
        file: PathBuf,

        /// Output file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Source language (auto-detect if not specified)
        #[arg(short, long)]
        source: Option<String>,

        /// Target language
        #[arg(short, long)]
        target: String,

        /// Memory ids to adapt to
        #[arg(long)]
        adapt_to: Vec<String>,

        /// Glossary ids to apply
        #[arg(long)]
        glossary: Vec<String>,

        /// faithful, fluid or creative
        #[arg(long)]
        style: Option<TranslationStyle>,

        /// Output format requested from the server
        #[arg(long)]
        output_format: Option<String>,

        /// Give up after this many seconds
        #[arg(long)]
        max_wait: Option<u64>,
    },
}

/// Memory subcommands
#[derive(Subcommand, Debug)]
pub enum MemoryCommand {
    /// List memories
    List,

    /// Create a memory
    Create {
        name: String,

        #[arg(long)]
        external_id: Option<String>,
    },

    /// Delete a memory
    Delete { id: String },

    /// Import a TMX file (optionally gzip-compressed)
    Import {
        id: String,

        #[arg(short, long)]
        file: PathBuf,

        /// Return as soon as the import is accepted
        #[arg(long)]
        no_wait: bool,

        /// Give up after this many seconds
        #[arg(long)]
        max_wait: Option<u64>,
    },

    /// Add a sentence pair to a memory
    Add {
        id: String,
        source: String,
        target: String,
        sentence: String,
        translation: String,

        #[arg(long)]
        tuid: Option<String>,
    },
}

/// Glossary subcommands
#[derive(Subcommand, Debug)]
pub enum GlossaryCommand {
    /// List glossaries
    List,

    /// Create a glossary
    Create { name: String },

    /// Delete a glossary
    Delete { id: String },

    /// Show term counts
    Counts { id: String },

    /// Import a CSV file (optionally gzip-compressed)
    Import {
        id: String,

        #[arg(short, long)]
        file: PathBuf,

        /// Return as soon as the import is accepted
        #[arg(long)]
        no_wait: bool,

        /// Give up after this many seconds
        #[arg(long)]
        max_wait: Option<u64>,
    },

    /// Export terms
    Export {
        id: String,

        #[arg(long, default_value = "csv/table-uni")]
        content_type: String,

        #[arg(long)]
        source: Option<String>,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Run a parsed command
pub async fn run(translator: &Translator, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Translate {
            text,
            source,
            target,
            adapt_to,
            glossary,
            instruction,
            style,
            no_trace,
        } => {
            let options = TranslateOptions {
                adapt_to,
                glossaries: glossary,
                instructions: instruction,
                style,
                no_trace,
                ..Default::default()
            };
            handle_translate(translator, text, source, target, options).await
        }
        Commands::Languages => handle_languages(translator).await,
        Commands::Memories { command } => handle_memories(translator, command).await,
        Commands::Glossaries { command } => handle_glossaries(translator, command).await,
        Commands::Document {
            file,
            output,
            source,
            target,
            adapt_to,
            glossary,
            style,
            output_format,
            max_wait,
        } => {
            let upload = DocumentUploadOptions {
                adapt_to,
                glossaries: glossary,
                style,
                ..Default::default()
            };
            let download = DocumentDownloadOptions { output_format };
            handle_document(
                translator,
                file,
                output,
                source,
                target,
                upload,
                download,
                max_wait.map(Duration::from_secs),
            )
            .await
        }
    }
}

/// Handle text translation command
pub async fn handle_translate(
    translator: &Translator,
    mut text: Vec<String>,
    source: Option<String>,
    target: String,
    options: TranslateOptions,
) -> anyhow::Result<()> {
    let result = if text.len() == 1 {
        let single = text.remove(0);
        translator
            .translate(single, source.as_deref(), &target, &options)
            .await?
    } else {
        translator
            .translate(text, source.as_deref(), &target, &options)
            .await?
    };

    info!("Detected source language: {}", result.source_language);
    println!("{}", result.translation);

    Ok(())
}

/// Handle languages command
pub async fn handle_languages(translator: &Translator) -> anyhow::Result<()> {
    let languages = translator.languages().await?;
    for language in &languages {
        println!("{}", language);
    }
    info!("{} languages supported", languages.len());
    Ok(())
}

/// Handle memory subcommands
pub async fn handle_memories(translator: &Translator, command: MemoryCommand) -> anyhow::Result<()> {
    let memories = &translator.memories;

    match command {
        MemoryCommand::List => {
            for memory in memories.list().await? {
                println!("{}\t{}\t{}", memory.id, memory.name, memory.updated_at);
            }
        }
        MemoryCommand::Create { name, external_id } => {
            let memory = memories.create(&name, external_id.as_deref()).await?;
            println!("✅ Created memory: {} (ID: {})", memory.name, memory.id);
        }
        MemoryCommand::Delete { id } => {
            let memory = memories.delete(&id).await?;
            println!("🗑️  Deleted memory: {} (ID: {})", memory.name, memory.id);
        }
        MemoryCommand::Import {
            id,
            file,
            no_wait,
            max_wait,
        } => {
            info!("Importing {} into memory {}", file.display(), id);
            let import = memories.import_tmx(&id, &file).await?;
            println!("📥 Import started (ID: {})", import.id);

            if !no_wait {
                let pb = import_progress_bar();
                let result = memories
                    .wait_for_import(import, wait_options(&pb, max_wait))
                    .await;
                report_import(&pb, result)?;
            }
        }
        MemoryCommand::Add {
            id,
            source,
            target,
            sentence,
            translation,
            tuid,
        } => {
            let mut unit = TranslationUnit::new(source, target, sentence, translation);
            if let Some(tuid) = tuid {
                unit = unit.with_tuid(tuid);
            }
            let import = memories.add_translation(&id, &unit).await?;
            println!("✅ Translation queued (job ID: {})", import.id);
        }
    }

    Ok(())
}

/// Handle glossary subcommands
pub async fn handle_glossaries(
    translator: &Translator,
    command: GlossaryCommand,
) -> anyhow::Result<()> {
    let glossaries = &translator.glossaries;

    match command {
        GlossaryCommand::List => {
            for glossary in glossaries.list().await? {
                println!("{}\t{}\t{}", glossary.id, glossary.name, glossary.updated_at);
            }
        }
        GlossaryCommand::Create { name } => {
            let glossary = glossaries.create(&name).await?;
            println!("✅ Created glossary: {} (ID: {})", glossary.name, glossary.id);
        }
        GlossaryCommand::Delete { id } => {
            let glossary = glossaries.delete(&id).await?;
            println!("🗑️  Deleted glossary: {} (ID: {})", glossary.name, glossary.id);
        }
        GlossaryCommand::Counts { id } => {
            let counts = glossaries.counts(&id).await?;
            println!("Multidirectional: {}", counts.multidirectional);
            let mut languages: Vec<_> = counts.unidirectional.iter().collect();
            languages.sort();
            for (language, count) in languages {
                println!("{}: {}", language, count);
            }
        }
        GlossaryCommand::Import {
            id,
            file,
            no_wait,
            max_wait,
        } => {
            info!("Importing {} into glossary {}", file.display(), id);
            let import = glossaries.import_csv(&id, &file).await?;
            println!("📥 Import started (ID: {})", import.id);

            if !no_wait {
                let pb = import_progress_bar();
                let result = glossaries
                    .wait_for_import(import, wait_options(&pb, max_wait))
                    .await;
                report_import(&pb, result)?;
            }
        }
        GlossaryCommand::Export {
            id,
            content_type,
            source,
            output,
        } => {
            let content = glossaries
                .export(&id, &content_type, source.as_deref())
                .await?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, &content).await?;
                    println!("📄 Exported {} bytes to {}", content.len(), path.display());
                }
                None => print!("{}", String::from_utf8_lossy(&content)),
            }
        }
    }

    Ok(())
}

/// Handle document translation command
#[allow(clippy::too_many_arguments)]
pub async fn handle_document(
    translator: &Translator,
    file: PathBuf,
    output: Option<PathBuf>,
    source: Option<String>,
    target: String,
    upload: DocumentUploadOptions,
    download: DocumentDownloadOptions,
    max_wait: Option<Duration>,
) -> anyhow::Result<()> {
    let filename = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Not a file: {}", file.display()))?;

    let output = output.unwrap_or_else(|| {
        let mut out = file.clone();
        out.set_file_name(format!("{}_{}", target, filename));
        out
    });

    info!("Input: {}", file.display());
    info!("Output: {}", output.display());
    info!("Target language: {}", target);

    let documents = &translator.documents;
    let document = documents
        .upload(&file, &filename, source.as_deref(), &target, &upload)
        .await?;

    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}% {msg}")?
            .progress_chars("=>-"),
    );

    let mut wait = WaitOptions::new().on_update(|document: &Document| {
        if let Some(progress) = document.progress() {
            pb.set_position((progress * 100.0) as u64);
        }
        pb.set_message(document.status.to_string());
    });
    if let Some(max_wait) = max_wait {
        wait = wait.max_wait(max_wait);
    }

    let document = match documents.wait_for_translation(document, wait).await {
        Ok(document) => document,
        Err(e) => {
            pb.abandon_with_message(format!("Stopped at status {}", e.snapshot.status));
            return Err(e.source.into());
        }
    };
    let document = ensure_translated(document)?;
    pb.finish_with_message("Translated");

    let written = documents.download_to(&document.id, &download, &output).await?;

    println!("\n✅ Document translation completed!");
    println!("   Document: {}", document.id);
    println!("   Saved: {} ({} bytes)", output.display(), written);

    Ok(())
}

fn import_progress_bar() -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    pb
}

fn wait_options(pb: &ProgressBar, max_wait: Option<u64>) -> WaitOptions<'_, Import> {
    let mut options = WaitOptions::new()
        .on_update(move |import: &Import| pb.set_position((import.progress * 100.0) as u64));
    if let Some(secs) = max_wait {
        options = options.max_wait(Duration::from_secs(secs));
    }
    options
}

fn report_import(pb: &ProgressBar, result: crate::core::poller::WaitResult<Import>) -> anyhow::Result<()> {
    match result {
        Ok(import) => {
            pb.finish_and_clear();
            println!("✅ Import completed (ID: {})", import.id);
            Ok(())
        }
        Err(e) => {
            pb.abandon();
            println!(
                "⚠️  Import {} stopped at {:.0}%",
                e.snapshot.id,
                e.snapshot.progress * 100.0
            );
            Err(e.source.into())
        }
    }
}
