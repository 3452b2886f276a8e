//! Command-line arguments.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use docchat_model::openai::{DEFAULT_MODEL, OpenAIConfig};
use docchat_rag::openai::DEFAULT_EMBEDDING_MODEL;
use docchat_rag::{DistanceMetric, OpenAIEmbeddingProvider, RagConfig};

/// Ask questions about PDF and text documents.
#[derive(Debug, Parser)]
#[command(name = "docchat", version, about)]
pub struct Args {
    /// Document to load (PDF or plain text); repeat for several
    #[arg(
        short,
        long = "file",
        value_name = "PATH",
        required_unless_present = "load_index"
    )]
    pub files: Vec<PathBuf>,

    /// Answer this question and exit instead of starting a prompt
    #[arg(short, long)]
    pub question: Option<String>,

    /// List the retrieved chunks after each answer
    #[arg(long)]
    pub sources: bool,

    /// Characters of extracted text to preview
    #[arg(long, value_name = "CHARS", default_value_t = 2000)]
    pub preview_chars: usize,

    /// Write the built index to this directory
    #[arg(long, value_name = "DIR")]
    pub save_index: Option<PathBuf>,

    /// Use an index saved with --save-index instead of reading files
    #[arg(long, value_name = "DIR", conflicts_with = "files")]
    pub load_index: Option<PathBuf>,

    /// Maximum chunk size in characters
    #[arg(long, default_value_t = 500)]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[arg(long, default_value_t = 100)]
    pub chunk_overlap: usize,

    /// Number of chunks retrieved per question
    #[arg(short = 'k', long, default_value_t = 4)]
    pub top_k: usize,

    /// Drop retrieved chunks scoring below this value
    #[arg(long, value_name = "SCORE")]
    pub min_score: Option<f32>,

    /// Cap on the context placed in the prompt, in characters
    #[arg(long, value_name = "CHARS")]
    pub max_context_chars: Option<usize>,

    /// Similarity metric for the index
    #[arg(long, value_enum, default_value_t = Metric::Cosine)]
    pub metric: Metric,

    /// Embedding deadline in seconds; 0 waits forever
    #[arg(long, value_name = "SECS", default_value_t = 60)]
    pub embed_timeout: u64,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Chat model used for answers
    #[arg(long, env = "DOCCHAT_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Embedding model used for chunks and questions
    #[arg(long, env = "DOCCHAT_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Base URL of an OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL")]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Metric {
    Cosine,
    Euclidean,
}

impl From<Metric> for DistanceMetric {
    fn from(metric: Metric) -> Self {
        match metric {
            Metric::Cosine => DistanceMetric::Cosine,
            Metric::Euclidean => DistanceMetric::Euclidean,
        }
    }
}

impl Args {
    /// The pipeline configuration described by the flags.
    pub fn rag_config(&self) -> Result<RagConfig> {
        let mut builder = RagConfig::builder()
            .chunk_size(self.chunk_size)
            .chunk_overlap(self.chunk_overlap)
            .top_k(self.top_k)
            .metric(self.metric.into())
            .embed_timeout(
                (self.embed_timeout > 0).then(|| Duration::from_secs(self.embed_timeout)),
            );
        if let Some(score) = self.min_score {
            builder = builder.similarity_threshold(score);
        }
        if let Some(chars) = self.max_context_chars {
            builder = builder.max_context_chars(chars);
        }
        Ok(builder.build()?)
    }

    fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .context("no API key: set OPENAI_API_KEY or pass --api-key")
    }

    pub fn completion_config(&self) -> Result<OpenAIConfig> {
        let mut config = OpenAIConfig::new(self.api_key()?, &self.model);
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url);
        }
        Ok(config)
    }

    pub fn embedding_provider(&self) -> Result<OpenAIEmbeddingProvider> {
        let mut provider =
            OpenAIEmbeddingProvider::new(self.api_key()?)?.with_model(&self.embedding_model);
        if let Some(url) = &self.base_url {
            provider = provider.with_base_url(url);
        }
        Ok(provider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> std::result::Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("docchat").chain(args.iter().copied()))
    }

    #[test]
    fn defaults_follow_rag_config() {
        let args = parse(&["--file", "a.pdf"]).unwrap();
        assert_eq!(args.rag_config().unwrap(), RagConfig::default());
        assert_eq!(args.preview_chars, 2000);
        assert!(!args.sources);
    }

    #[test]
    fn files_repeat() {
        let args = parse(&["-f", "a.pdf", "--file", "b.txt"]).unwrap();
        assert_eq!(args.files, vec![PathBuf::from("a.pdf"), PathBuf::from("b.txt")]);
    }

    #[test]
    fn needs_files_or_saved_index() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--load-index", "idx"]).is_ok());
        assert!(parse(&["--load-index", "idx", "--file", "a.pdf"]).is_err());
    }

    #[test]
    fn tuning_flags_reach_the_config() {
        let args = parse(&[
            "-f",
            "a.pdf",
            "-k",
            "6",
            "--min-score",
            "0.25",
            "--max-context-chars",
            "3000",
            "--metric",
            "euclidean",
            "--embed-timeout",
            "0",
        ])
        .unwrap();
        let config = args.rag_config().unwrap();
        assert_eq!(config.top_k, 6);
        assert_eq!(config.similarity_threshold, Some(0.25));
        assert_eq!(config.max_context_chars, Some(3000));
        assert_eq!(config.metric, DistanceMetric::Euclidean);
        assert_eq!(config.embed_timeout, None);
    }

    #[test]
    fn invalid_chunking_is_reported() {
        let args = parse(&["-f", "a.pdf", "--chunk-size", "50", "--chunk-overlap", "50"]).unwrap();
        assert!(args.rag_config().is_err());
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let args = parse(&["-f", "a.pdf", "--api-key", " "]).unwrap();
        assert!(args.completion_config().is_err());
        assert!(args.embedding_provider().is_err());
    }
}
