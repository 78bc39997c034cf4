//! # media-tidy CLI
//!
//! Command-line interface for tidying an exported media tree.
//!
//! ## Usage
//! ```bash
//! media-tidy --dir ~/memories all
//! media-tidy --dir ~/memories dedupe --apply
//! media-tidy --dir ~/memories shorten --output json
//! ```

mod cli;

use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", console::style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
