//! Loading of the tabular lexical resources
//!
//! Every input is a TSV table (optionally gzipped) living in the configured
//! input directory. Resources are decoded into typed row sets with no further
//! transformation; joining and derivation happen in [`crate::table`]. A
//! missing or malformed resource is fatal and is reported with the offending
//! file name, as the pipeline cannot run without its declared inputs.

use crate::{
    config::Config,
    progress::{ProgressReport, ProgressTracker, Work},
    Result, Word,
};
use anyhow::Context;
use async_compression::tokio::bufread::GzipDecoder;
use csv_async::AsyncReaderBuilder;
use futures::stream::StreamExt;
use serde::{de::DeserializeOwned, Deserialize};
use std::sync::Arc;
use tokio::{fs::File, io::AsyncRead, io::BufReader};

/// Row of the concreteness rating norms
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct NormsRow {
    /// Rated word, in the surface form used by the rating study
    #[serde(rename = "Word")]
    pub word: Word,

    /// Mean concreteness rating (empirically ~1-5)
    #[serde(rename = "Conc.M")]
    pub concreteness_mean: f64,

    /// Standard deviation of the concreteness ratings
    #[serde(rename = "Conc.SD")]
    pub concreteness_sd: f64,

    /// Fraction of raters that knew the word
    #[serde(rename = "Percent_known")]
    pub percent_known: f64,
}

/// Row of the frequency-norms part-of-speech resource
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct PosRow {
    #[serde(rename = "Word")]
    pub word: Word,

    /// Most frequent part-of-speech tag for this word
    #[serde(rename = "Dominant_PoS")]
    pub dominant: Option<Box<str>>,

    /// Every attested part-of-speech tag, separated by dots
    #[serde(rename = "All_PoS")]
    pub all: Option<Box<str>>,

    /// Fraction of occurrences carrying the dominant tag
    #[serde(rename = "Percentage_dominant")]
    pub dominance: Option<f64>,
}

/// Row of the lexicon resource providing length and morphology counts
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct LexiconRow {
    #[serde(rename = "Word")]
    pub word: Word,

    /// Part-of-speech tag, used as a fallback when the frequency norms have
    /// no tag for a word
    #[serde(rename = "PoS")]
    pub pos: Option<Box<str>>,

    /// Number of letters
    #[serde(rename = "Length")]
    pub letters: Option<u32>,

    /// Number of phonemes
    #[serde(rename = "NPhon")]
    pub phonemes: Option<u32>,

    /// Number of morphemes
    #[serde(rename = "NMorph")]
    pub morphemes: Option<u32>,
}

/// Row of the noun countability incidence table
///
/// Each column counts attestations of the lemma in one grammatical class.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CountabilityRow {
    #[serde(rename = "Lemma")]
    pub lemma: Word,

    #[serde(rename = "Countable")]
    pub countable: u32,

    #[serde(rename = "Uncountable")]
    pub uncountable: u32,

    #[serde(rename = "Bipartite")]
    pub bipartite: u32,

    #[serde(rename = "PluralOnly")]
    pub plural_only: u32,
}

/// Row of the etymology resource
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct EtymologyRow {
    #[serde(rename = "Word")]
    pub word: Word,

    /// Raw language-of-origin label, e.g. "Old French"
    #[serde(rename = "Origin")]
    pub origin: Box<str>,
}

/// Row of a morphological segmentation resource
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ParseRow {
    #[serde(rename = "Word")]
    pub word: Word,

    /// Morphological parse string, with derivational suffixes marked as
    /// `>suffix` segments
    #[serde(rename = "Parse")]
    pub parse: Box<str>,
}

/// Single-column row of a compound word list
#[derive(Clone, Debug, Deserialize, PartialEq)]
struct WordRow {
    word: Word,
}

/// The complete set of loaded lexical resources
#[derive(Clone, Debug)]
pub struct Resources {
    pub norms: Vec<NormsRow>,
    pub pos_frequency: Vec<PosRow>,
    pub lexicon: Vec<LexiconRow>,
    pub countability: Vec<CountabilityRow>,
    pub etymology: Vec<EtymologyRow>,
    pub suffixed: Vec<ParseRow>,
    pub unsuffixed: Vec<ParseRow>,
    pub compounds: [Vec<Word>; 3],
}

/// Number of distinct input resource files, for progress reporting
const NUM_RESOURCES: usize = 10;

/// Load every lexical resource from the input directory
///
/// Resources are independent, so they are all decoded concurrently.
pub async fn load_resources(config: Arc<Config>, progress: &ProgressReport) -> Result<Resources> {
    let tracker = progress.add("Loading lexical resources", Work::Steps(NUM_RESOURCES));
    let (
        norms,
        pos_frequency,
        lexicon,
        countability,
        etymology,
        suffixed,
        unsuffixed,
        compounds_a,
        (compounds_b, compounds_c),
    ) = tokio::try_join!(
        load_table(&config, "concreteness.tsv", true, &tracker),
        load_table(&config, "pos_frequency.tsv", true, &tracker),
        load_table(&config, "lexicon.tsv", true, &tracker),
        load_table(&config, "countability.tsv", true, &tracker),
        load_table(&config, "etymology.tsv", true, &tracker),
        load_table(&config, "suffixed.tsv", true, &tracker),
        load_table(&config, "unsuffixed.tsv", true, &tracker),
        load_word_list(&config, "compounds_a.txt", &tracker),
        async {
            // Sequencing two of the word lists keeps try_join! arity in check
            let b = load_word_list(&config, "compounds_b.txt", &tracker).await?;
            let c = load_word_list(&config, "compounds_c.txt", &tracker).await?;
            Ok::<_, anyhow::Error>((b, c))
        },
    )?;
    Ok(Resources {
        norms,
        pos_frequency,
        lexicon,
        countability,
        etymology,
        suffixed,
        unsuffixed,
        compounds: [compounds_a, compounds_b, compounds_c],
    })
}

/// Load one TSV resource into typed rows
async fn load_table<R: DeserializeOwned>(
    config: &Config,
    file_name: &str,
    has_headers: bool,
    tracker: &ProgressTracker,
) -> Result<Vec<R>> {
    let (reader, display_name) = open_resource(config, file_name).await?;
    let mut records = AsyncReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .create_deserializer(reader)
        .into_deserialize::<R>();
    let mut rows = Vec::new();
    while let Some(row) = records.next().await {
        rows.push(row.with_context(|| format!("decoding a row of {display_name}"))?);
    }
    anyhow::ensure!(!rows.is_empty(), "resource {display_name} is empty");
    tracker.make_progress(1);
    Ok(rows)
}

/// Load one single-column word list
async fn load_word_list(
    config: &Config,
    file_name: &str,
    tracker: &ProgressTracker,
) -> Result<Vec<Word>> {
    let rows: Vec<WordRow> = load_table(config, file_name, false, tracker).await?;
    Ok(rows.into_iter().map(|row| row.word).collect())
}

/// Open a resource file, transparently decompressing a gzipped variant
///
/// The plain file name is tried first, then the same name with a .gz suffix.
async fn open_resource(
    config: &Config,
    file_name: &str,
) -> Result<(Box<dyn AsyncRead + Send + Unpin>, String)> {
    let plain = config.resource_path(file_name);
    if let Ok(file) = File::open(&plain).await {
        return Ok((Box::new(BufReader::new(file)), file_name.to_owned()));
    }
    let gz_name = format!("{file_name}.gz");
    let file = File::open(config.resource_path(&gz_name))
        .await
        .with_context(|| format!("opening the required resource {file_name}[.gz]"))?;
    Ok((
        Box::new(GzipDecoder::new(BufReader::new(file))),
        gz_name,
    ))
}
