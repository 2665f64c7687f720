//! Processing pipeline configuration

use crate::Args;
use std::{path::PathBuf, sync::Arc};

/// Final process configuration
///
/// This is the result of digesting the CLI [`Args`]. Please refer to [`Args`]
/// to know more about the meaning of common fields.
#[allow(missing_docs)]
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Directory containing the lexical resource tables
    pub input_dir: PathBuf,

    /// Directory where the report tables are written
    pub output_dir: PathBuf,

    // Other fields have the same meaning as in Args
    pub min_known: f64,
    pub lemma_exception: Box<str>,
    pub etymology_cutoff: u32,
}
//
impl Config {
    /// Determine process configuration from the decoded CLI arguments
    pub(crate) fn new(args: Args) -> Arc<Self> {
        let Args {
            input_dir,
            output_dir,
            min_known,
            lemma_exception,
            etymology_cutoff,
        } = args;
        Arc::new(Self {
            input_dir,
            output_dir,
            min_known,
            lemma_exception: lemma_exception.into(),
            etymology_cutoff,
        })
    }

    /// Location of one input resource table
    pub fn resource_path(&self, file_name: &str) -> PathBuf {
        self.input_dir.join(file_name)
    }

    /// Location of one output report table
    pub fn report_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

/// Allow tests to build a configuration without going through the CLI
#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            input_dir: "data".into(),
            output_dir: "reports".into(),
            min_known: 0.95,
            lemma_exception: "est".into(),
            etymology_cutoff: 100,
        }
    }
}
