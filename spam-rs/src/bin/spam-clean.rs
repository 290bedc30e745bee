//! Offline text preprocessing
//!
//! Applies the same normalization the `normalized` vectorizer analyzer uses,
//! one document per line, so training corpora are cleaned exactly like
//! serving-time input.
//!
//! # Usage
//!
//! ```bash
//! # Clean a corpus file
//! spam-clean --input messages.txt --output cleaned.txt
//!
//! # Emit token arrays as JSON lines
//! echo "You WIN money now!!!" | spam-clean --tokens
//! ```

use anyhow::Context;
use clap::Parser;
use spam_rs::text::TextNormalizer;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "spam-clean")]
#[command(about = "Normalize text for spam model training", long_about = None)]
struct Cli {
    /// Input file, one document per line (stdin when omitted)
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write JSON token arrays instead of space-joined text
    #[arg(long)]
    tokens: bool,
}

/// Clean each input line into one output line; returns the number of documents
fn clean_lines<R: BufRead, W: Write>(
    normalizer: &TextNormalizer,
    reader: R,
    writer: &mut W,
    tokens: bool,
) -> anyhow::Result<usize> {
    let mut count = 0usize;
    for line in reader.lines() {
        let line = line.context("Failed to read input")?;
        if tokens {
            let tokens = normalizer.normalize(&line);
            writeln!(writer, "{}", serde_json::to_string(&tokens)?)?;
        } else {
            writeln!(writer, "{}", normalizer.clean(&line))?;
        }
        count += 1;
    }
    Ok(count)
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let normalizer = TextNormalizer::new();

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open {}", path.display()))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut writer: Box<dyn Write> = match &cli.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout())),
    };

    let count = clean_lines(&normalizer, reader, &mut writer, cli.tokens)?;
    writer.flush()?;
    eprintln!("✓ Cleaned {} documents", count);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(input: &str, tokens: bool) -> (usize, String) {
        let mut out = Vec::new();
        let count = clean_lines(&TextNormalizer::new(), input.as_bytes(), &mut out, tokens).unwrap();
        (count, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_clean_text_output() {
        let (count, out) = run("You WIN money now!!!\nWinning the lottery!!\n", false);
        assert_eq!(count, 2);
        assert_eq!(out, "win money\nwin lotteri\n");
    }

    #[test]
    fn test_token_output() {
        let (count, out) = run("You WIN money now!!!\nthe and is\n", true);
        assert_eq!(count, 2);
        assert_eq!(out, "[\"win\",\"money\"]\n[]\n");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(run("", true), (0, String::new()));
    }
}
