use anyhow::{Context, Result};
use paperchat_core::constants::defaults;
use paperchat_core::{Attachment, NoteTarget, Settings, Summarizer};

use crate::render::TerminalSink;
use crate::SummarizeArgs;

pub async fn run_summarize(settings: &Settings, args: SummarizeArgs) -> Result<()> {
    let mut attachment = Attachment::from_path(&args.path);
    if let Some(key) = args.key {
        attachment = attachment.with_key(key);
    }
    if attachment.key.is_empty() {
        anyhow::bail!("Could not derive an attachment key from {}; pass --key", args.path.display());
    }

    let mut summarizer = Summarizer::from_settings(settings)?;
    if let Some(model) = args.model {
        summarizer = summarizer.with_model(model);
    }

    let summary = summarizer
        .summarize(&attachment, TerminalSink::stdout())
        .await
        .with_context(|| format!("Summarizing {} failed", args.path.display()))?;
    println!();

    if let Some(error) = &summary.outcome.error {
        eprintln!("Server reported an error: {}", error);
    }

    if args.save {
        let title = args
            .title
            .or_else(|| attachment.title.clone())
            .unwrap_or_else(|| defaults::CHAT_TITLE.to_string());
        let target = match (args.parent, args.collection) {
            (Some(parent), _) => NoteTarget::ParentItem(parent),
            (None, Some(collection)) => NoteTarget::Collection(collection),
            (None, None) => NoteTarget::Library,
        };

        let saved = summarizer
            .save(&summary, &title, &target)
            .await
            .context("Saving the conversation failed")?;
        println!("Conversation: {}", saved.chat_url);
        println!("Note: {}", saved.note.location);
    }

    Ok(())
}

pub fn run_config(settings: &Settings, init: bool) -> Result<()> {
    let path = Settings::config_path();
    if init {
        if path.exists() {
            println!("Config already exists: {}", path.display());
        } else {
            settings.save()?;
            println!("Wrote default config: {}", path.display());
        }
        return Ok(());
    }

    println!("Config file: {}", path.display());
    println!(
        "Server: {}",
        settings.server.base_url.as_deref().unwrap_or("(not configured)")
    );
    println!("Model: {}", settings.summary.model);
    println!("Notes: {}", settings.notes_dir().display());
    println!("Storage: {}", settings.storage_dir().display());
    Ok(())
}
