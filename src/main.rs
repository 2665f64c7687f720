//! Batch analysis of which linguistic properties of English words predict
//! their human-rated concreteness.
//!
//! The pipeline joins several tabular lexical resources (concreteness norms,
//! part-of-speech tags, morpheme segmentations, etymology records, noun
//! countability classes, compound-word lists) into one per-lemma feature
//! table, then fits a series of descriptive and regression models on it and
//! writes the resulting summary tables to disk for plotting.

mod analysis;
mod config;
mod filter;
mod lemma;
mod model;
mod partition;
#[cfg(test)]
mod pipeline_tests;
mod progress;
mod report;
mod table;
mod tsv;

use crate::{config::Config, lemma::EnglishLemmatizer, progress::ProgressReport};
use clap::Parser;
use log::LevelFilter;
use std::path::PathBuf;

/// Study which linguistic properties predict human concreteness ratings
///
/// Reads the lexical resource tables from the input directory, builds the
/// per-lemma feature table, runs every analysis on the full dataset and on
/// the low-variability subset, and writes TSV summary tables to the output
/// directory.
#[derive(Parser, Debug)]
#[command(version, author)]
struct Args {
    /// Directory containing the lexical resource tables
    ///
    /// The expected file names and columns are documented in the resource
    /// loading module. Tables may be stored either as plain TSV or gzipped
    /// with a .gz suffix.
    #[arg(short, long, default_value = "data")]
    input_dir: PathBuf,

    /// Directory where the report tables are written
    ///
    /// Created if it does not exist. Existing report tables are overwritten.
    #[arg(short, long, default_value = "reports")]
    output_dir: PathBuf,

    /// Minimum fraction of raters that must know a word
    ///
    /// Ratings of words that many raters flagged as unknown mostly measure
    /// guessing, so words at or below this knowledge threshold are excluded
    /// before any analysis. The exclusion count is logged.
    #[arg(short = 'k', long, default_value = "0.95")]
    min_known: f64,

    /// Substring that exempts a word from lemmatization
    ///
    /// Superlatives are systematically mangled by the lemmatizer, so any
    /// word containing this substring keeps its surface form.
    #[arg(long, default_value = "est")]
    lemma_exception: String,

    /// Raw-etymology occurrence count above which a label counts as frequent
    ///
    /// Words whose raw etymology label occurs more than this many times
    /// across the whole table are assigned to the "large" etymology
    /// frequency class, the rest to "small".
    #[arg(long, default_value = "100")]
    etymology_cutoff: u32,
}
//
impl Args {
    /// Decode and validate CLI arguments
    pub fn parse_and_check() -> Result<Self> {
        // Decode CLI arguments
        let args = Args::parse();

        // Check CLI arguments for basic sanity
        anyhow::ensure!(
            (0.0..1.0).contains(&args.min_known),
            "knowledge threshold must lie within [0, 1)"
        );
        anyhow::ensure!(
            !args.lemma_exception.is_empty(),
            "an empty lemmatization exception would exempt every word"
        );
        Ok(args)
    }
}
//
#[tokio::main]
async fn main() -> Result<()> {
    // Set up logging
    setup_logging().map_err(|e| anyhow::format_err!("{e}"))?;

    // Decode CLI arguments
    let args = Args::parse_and_check()?;

    // Set up progress reporting
    let progress = ProgressReport::new();

    // Load the lexical resources
    let config = Config::new(args);
    let resources = tsv::load_resources(config.clone(), &progress).await?;

    // Normalize the rated words to deduplicated lemmas
    let lemmatizer = EnglishLemmatizer::new();
    let norms = lemma::normalize(resources.norms.clone(), &lemmatizer, &config);

    // Join the auxiliary features onto the lemma table and dump it
    let table =
        table::builder::TableBuilder::new(config.clone(), &resources).build(norms, &progress);
    report::write_word_table(&config, &table).await?;

    // Derive the two analysis views
    let full = filter::quality_filter(&table, &config);
    let low_variability = filter::low_variability(&full);

    // Run every analysis on both views
    let results = analysis::run_all(&full, &low_variability, &progress);

    // Write the report tables
    report::write_reports(&config, &results).await?;
    Ok(())
}

/// Use anyhow for Result type erasure
pub use anyhow::Result;

/// Word or lemma form
pub type Word = Box<str>;

/// Set up logging
fn setup_logging() -> syslog::Result<()> {
    syslog::init(
        syslog::Facility::LOG_USER,
        if cfg!(feature = "log-trace") {
            LevelFilter::Trace
        } else if cfg!(debug_assertions) {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        None,
    )
}
