//! The interactive session: load documents, then answer questions.

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use docchat_model::OpenAIClient;
use docchat_rag::{
    ChatSession, DistanceMetric, Document, EmbeddingProvider, RagPipeline, SearchResult,
    VectorIndex, combine, extract_file,
};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{error, info, warn};

use crate::cli::Args;

const PROMPT: &str = "docchat> ";

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Question(String),
    Blank,
    Exit,
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Input::Blank
        } else if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            Input::Exit
        } else {
            Input::Question(line.to_string())
        }
    }
}

/// Build the session described by `args` and answer questions until done.
pub async fn run(args: Args) -> Result<()> {
    let config = args.rag_config()?;
    let pipeline = Arc::new(
        RagPipeline::builder()
            .config(config)
            .embedding_provider(Arc::new(args.embedding_provider()?))
            .build()?,
    );
    let completion = Arc::new(OpenAIClient::new(args.completion_config()?)?);

    let index = match &args.load_index {
        Some(dir) => {
            let index = VectorIndex::load(dir)
                .with_context(|| format!("failed to load index from {}", dir.display()))?;
            let provider_dimensions = pipeline.embedding_provider().dimensions();
            for mismatch in index_mismatches(&index, pipeline.config().metric, provider_dimensions)
            {
                warn!(index = %dir.display(), "{mismatch}");
                eprintln!("Warning: {mismatch}");
            }
            index
        }
        None => {
            let combined = combine(&load_documents(&args.files)?);
            println!("{}\n", combined.preview(args.preview_chars));
            let index = pipeline.build_index(&combined).await.context("failed to index documents")?;
            if let Some(dir) = &args.save_index {
                let path = index.save(dir)?;
                println!("Index saved to {}", path.display());
            }
            index
        }
    };
    println!("Indexed {} chunks.", index.len());

    let session = ChatSession::with_index(pipeline, completion, index);
    match &args.question {
        Some(question) => answer(&session, question, args.sources).await,
        None => prompt_loop(&session, args.sources).await,
    }
}

/// Extract every file, skipping (and reporting) the ones that fail.
fn load_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        match extract_file(path) {
            Ok(doc) if doc.text.trim().is_empty() => {
                warn!(document.id = %doc.id, "no extractable text");
                eprintln!("Skipping {}: no extractable text", path.display());
            }
            Ok(doc) => documents.push(doc),
            Err(e) => {
                error!(path = %path.display(), error = %e, "extraction failed");
                eprintln!("Skipping {}: {e}", path.display());
            }
        }
    }
    if documents.is_empty() {
        bail!("none of the given files could be read");
    }
    info!(documents = documents.len(), "documents loaded");
    Ok(documents)
}

async fn prompt_loop(session: &ChatSession, show_sources: bool) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    println!("Ask a question about your documents (exit or Ctrl-D to leave).");

    loop {
        let line = match editor.readline(PROMPT) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => continue,
            Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };

        match Input::parse(&line) {
            Input::Blank => continue,
            Input::Exit => break,
            Input::Question(question) => {
                if let Err(e) = editor.add_history_entry(question.as_str()) {
                    warn!(error = %e, "failed to record prompt history");
                }
                if let Err(e) = answer(session, &question, show_sources).await {
                    eprintln!("Error: {e:#}");
                }
            }
        }
    }
    Ok(())
}

/// Ways a loaded index disagrees with the current settings. A saved index
/// keeps the metric and embedding size it was built with.
pub fn index_mismatches(
    index: &VectorIndex,
    metric: DistanceMetric,
    provider_dimensions: usize,
) -> Vec<String> {
    let mut mismatches = Vec::new();
    if index.metric() != metric {
        mismatches.push(format!(
            "index was built with the {:?} metric; ignoring the requested {:?}",
            index.metric(),
            metric
        ));
    }
    if !index.is_empty() && index.dimensions() != provider_dimensions {
        mismatches.push(format!(
            "index holds {}-dimensional embeddings but the embedding model produces {}; \
             questions will fail until the index is rebuilt",
            index.dimensions(),
            provider_dimensions
        ));
    }
    mismatches
}

/// Stream one answer to stdout as it arrives.
async fn answer(session: &ChatSession, question: &str, show_sources: bool) -> Result<()> {
    let mut answer = session.ask(question).await?;
    let mut stdout = io::stdout();
    let mut printed = 0;

    while let Some(partial) = answer.response.next().await {
        match partial {
            Ok(text) => {
                write!(stdout, "{}", &text[printed..])?;
                stdout.flush()?;
                printed = text.len();
            }
            Err(e) => {
                writeln!(stdout)?;
                return Err(e).context("answer interrupted");
            }
        }
    }
    writeln!(stdout)?;

    if show_sources {
        for (rank, result) in answer.sources.iter().enumerate() {
            println!("{}", format_source(rank + 1, result));
        }
    }
    Ok(())
}

/// One line describing a retrieved chunk.
pub fn format_source(rank: usize, result: &SearchResult) -> String {
    let snippet: String = result.chunk.text.chars().take(60).collect();
    let ellipsis = if result.chunk.char_len() > 60 { "..." } else { "" };
    format!(
        "[{rank}] {} (score {:.3}): {}{ellipsis}",
        result.chunk.id,
        result.score,
        snippet.replace('\n', " ")
    )
}
