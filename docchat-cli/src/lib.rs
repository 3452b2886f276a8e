//! # docchat-cli
//!
//! Command-line front end for docchat: load PDF or text documents, preview
//! the extracted text, then ask questions answered from the documents.
//!
//! ```text
//! docchat --file report.pdf --file notes.txt
//! docchat --file report.pdf --question "What are the key findings?" --sources
//! ```

pub mod cli;
pub mod console;

pub use cli::Args;
pub use console::run;
