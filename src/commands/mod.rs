
use anyhow::Context;
use console::style;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{error, info};

use crate::config::{Config, Secrets};
use crate::documents::UploadedFile;
use crate::embeddings::OllamaClient;
use crate::rag::Answer;
use crate::session::{
    FileOutcome, FileReport, RECENT_HISTORY_LEN, SAMPLE_QUESTIONS, Session, UploadReport,
};
use crate::vector::{PineconeClient, VectorDatabase};
use crate::{HrError, Result};

const OWN_QUESTION: &str = "Type my own question";

/// Upload documents and store their chunks in the index
#[inline]
pub fn upload_files(config_dir: &Path, paths: &[PathBuf]) -> Result<()> {
    let session = open_session(config_dir)?;
    upload_paths(&session, paths);
    Ok(())
}

/// Answer a single question against the indexed documents
#[inline]
pub fn ask_question(config_dir: &Path, query: &str) -> Result<()> {
    if query.trim().is_empty() {
        return Err(HrError::EmptyQuery);
    }

    let mut session = open_session(config_dir)?;
    let bar = spinner("Searching HR documents...");
    let result = session.ask(query);
    bar.finish_and_clear();

    print_answer(&result?);
    Ok(())
}

/// Interactive session: upload, ask, review recent questions
#[inline]
pub fn run_chat(config_dir: &Path) -> Result<()> {
    println!("{}", style("👩‍💼 HR Knowledge Assistant").bold().cyan());
    println!("Upload HR policy documents, then ask questions about them.");
    println!();

    let mut session = open_session(config_dir)?;
    match session.coordinator().record_count() {
        Ok(0) => println!("{}", style("The index is empty; upload documents first.").yellow()),
        Ok(count) => println!("{} chunks indexed.", style(count).cyan()),
        Err(e) => println!("{} {}", style("⚠ Could not read index size:").yellow(), e),
    }
    let actions = [
        "Upload documents",
        "Ask a question",
        "Recent questions",
        "Quit",
    ];

    loop {
        println!();
        let choice = Select::new()
            .with_prompt("What would you like to do?")
            .items(&actions)
            .default(1)
            .interact()
            .context("Failed to read menu selection")?;

        match choice {
            0 => {
                let input: String = Input::new()
                    .with_prompt("File paths (.pdf or .docx, separated by spaces)")
                    .allow_empty(true)
                    .interact_text()
                    .context("Failed to read file paths")?;
                let paths: Vec<PathBuf> = input.split_whitespace().map(PathBuf::from).collect();
                if paths.is_empty() {
                    println!("{}", style("No files selected.").yellow());
                } else {
                    upload_paths(&session, &paths);
                }
            }
            1 => {
                let query = prompt_question()?;
                let bar = spinner("Searching HR documents...");
                let result = session.ask(&query);
                bar.finish_and_clear();
                render_result(result);
            }
            2 => println!("{}", format_history(&session.recent_history(RECENT_HISTORY_LEN))),
            _ => break,
        }
    }

    info!("Chat session ended after {} questions", session.history().len());
    Ok(())
}

/// Report the health of the embedding server and the vector index
#[inline]
pub fn show_status(config_dir: &Path) -> Result<()> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;

    println!("📊 HR Assistant Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🤖 Embedding Server:");
    match OllamaClient::new(&config.embedding) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.embedding.host, config.embedding.port
                );
                println!("   📋 Model: {}", client.model());
                println!("   🔢 Batch Size: {}", config.embedding.batch_size);
            }
            Err(e) => println!("   ⚠️  Ollama: Unhealthy - {:#}", e),
        },
        Err(e) => println!("   ❌ Ollama: Invalid configuration - {:#}", e),
    }

    println!();
    println!("🔑 Credentials:");
    let secrets = match Secrets::load(&config.secrets_file_path()) {
        Ok(secrets) => {
            println!("   ✅ API keys found");
            Some(secrets)
        }
        Err(e) => {
            println!("   ❌ {}", e);
            None
        }
    };

    println!();
    println!("🔍 Vector Index:");
    if let Some(secrets) = &secrets {
        report_index_status(&config, secrets);
    } else {
        println!("   ⏭️  Skipped (no API key)");
    }

    println!();
    println!("✨ Generation:");
    println!("   📋 Model: {}", config.gemini.model);

    Ok(())
}

fn report_index_status(config: &Config, secrets: &Secrets) {
    let name = &config.pinecone.index_name;
    let client = match PineconeClient::new(&config.pinecone, &secrets.pinecone_api_key) {
        Ok(client) => client,
        Err(e) => {
            println!("   ❌ Pinecone: Invalid configuration - {:#}", e);
            return;
        }
    };

    match client.list_indexes() {
        Ok(indexes) if indexes.iter().any(|i| i == name) => {
            println!("   ✅ Index {}: Exists", name);
            match client.open_index(name).and_then(|index| index.record_count()) {
                Ok(count) => println!("   📊 Stored chunks: {}", count),
                Err(e) => println!("   ⚠️  Stored chunks: Unknown - {:#}", e),
            }
        }
        Ok(_) => println!("   📭 Index {}: Not created yet (created on first use)", name),
        Err(e) => println!("   ❌ Pinecone: Failed to connect - {:#}", e),
    }
}

fn open_session(config_dir: &Path) -> Result<Session> {
    let config = Config::load(config_dir).context("Failed to load configuration")?;
    let secrets = Secrets::load(&config.secrets_file_path())?;

    let bar = spinner("Connecting to services...");
    let session = Session::connect(&config, &secrets);
    bar.finish_and_clear();
    session
}

fn upload_paths(session: &Session, paths: &[PathBuf]) {
    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        match UploadedFile::from_path(path) {
            Ok(file) => files.push(file),
            Err(e) => println!(
                "{} {}: {}",
                style("✗").red(),
                path.display(),
                e
            ),
        }
    }

    if files.is_empty() {
        return;
    }

    let bar = spinner(&format!("Processing {} file(s)...", files.len()));
    let report = session.upload_with(&files, |file, total| {
        bar.println(format_outcome(file));
        bar.set_message(format!("{} chunks stored so far", total));
    });
    bar.finish_and_clear();

    let summary = format_summary(&report);
    if report.total_chunks > 0 {
        println!("{}", style(summary).green());
    } else {
        println!("{}", style(summary).yellow());
    }
}

fn prompt_question() -> Result<String> {
    let mut options: Vec<&str> = SAMPLE_QUESTIONS.to_vec();
    options.push(OWN_QUESTION);

    let choice = Select::new()
        .with_prompt("Pick a sample question or ask your own")
        .items(&options)
        .default(options.len() - 1)
        .interact()
        .context("Failed to read question selection")?;

    match SAMPLE_QUESTIONS.get(choice) {
        Some(sample) => Ok((*sample).to_string()),
        None => Ok(Input::new()
            .with_prompt("Your question")
            .allow_empty(true)
            .interact_text()
            .context("Failed to read question")?),
    }
}

fn render_result(result: Result<Answer>) {
    match result {
        Ok(answer) => print_answer(&answer),
        Err(HrError::EmptyQuery) => println!("{}", style("Please enter a question.").yellow()),
        Err(e) => {
            error!("Answering failed: {}", e);
            println!("{} {}", style("✗ Could not answer:").red(), e);
        }
    }
}

fn print_answer(answer: &Answer) {
    if let Some(error) = &answer.generation_error {
        println!("{} {}", style("⚠ Generation failed:").yellow(), error);
    }
    println!("{}", format_answer(answer));
}

fn spinner(message: &str) -> ProgressBar {
    let bar = if console::user_attended_stderr() {
        ProgressBar::new_spinner().with_style(
            ProgressStyle::with_template("{spinner} {msg}").expect("style template is valid"),
        )
    } else {
        ProgressBar::hidden()
    };
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

/// Answer text followed by a bulleted source list when any sources contributed
fn format_answer(answer: &Answer) -> String {
    let mut out = answer.text.clone();
    if !answer.sources.is_empty() {
        out.push_str("\n\nSources:");
        for source in &answer.sources {
            let _ = write!(out, "\n- {}", source);
        }
    }
    out
}

fn format_outcome(report: &FileReport) -> String {
    match &report.outcome {
        FileOutcome::Stored(count) => format!("✓ {}: stored {} chunks", report.name, count),
        FileOutcome::Skipped(reason) => format!("- {}: skipped ({})", report.name, reason),
        FileOutcome::Failed(reason) => format!("✗ {}: failed ({})", report.name, reason),
    }
}

fn format_summary(report: &UploadReport) -> String {
    format!(
        "Stored {} chunks from {} of {} file(s)",
        report.total_chunks,
        report.stored_files(),
        report.files.len()
    )
}

fn format_history(entries: &[&str]) -> String {
    if entries.is_empty() {
        return "No questions asked yet.".to_string();
    }

    let mut out = String::from("Recent questions:");
    for (i, entry) in entries.iter().enumerate() {
        let _ = write!(out, "\n{}. {}", i + 1, entry);
    }
    out
}
