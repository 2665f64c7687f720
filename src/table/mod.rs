//! The per-lemma working table that every analysis reads
//!
//! The table is built exactly once per run by [`builder::TableBuilder`] and
//! is immutable afterwards. Analysis subsets are borrowed views into the same
//! records, so a derived column computed at build time is automatically
//! present in every subset, and no analysis can perturb another by mutating
//! shared state.

pub mod builder;
pub mod rules;

use crate::Word;
use rules::EtymologyGroup;

/// One row of the working table, keyed by lemma
///
/// Absent auxiliary data is represented by `None` (the resource had no entry
/// for this lemma) or by [`Feature::NotApplicable`] (a derivation rule says
/// the value is undefined here); the two are deliberately kept distinct.
#[derive(Clone, Debug, PartialEq)]
pub struct WordRecord {
    /// Lemma form, unique across the table
    pub word: Word,

    /// Mean concreteness rating
    pub concreteness_mean: f64,

    /// Standard deviation of the concreteness ratings
    pub concreteness_sd: f64,

    /// Fraction of raters that knew the word
    pub percent_known: f64,

    /// Dominant part-of-speech tag, after collapsing
    pub pos_dominant: Option<Box<str>>,

    /// Every attested part-of-speech tag, after collapsing
    pub pos_all: Option<Box<[Box<str>]>>,

    /// Fraction of occurrences carrying the dominant tag
    pub pos_dominance_fraction: Option<f64>,

    /// Number of letters
    pub letters: Option<u32>,

    /// Number of phonemes
    pub phonemes: Option<u32>,

    /// Number of morphemes
    pub morpheme_count: Option<u32>,

    /// Raw language-of-origin label from the etymology resource
    pub etymology_raw: Option<Box<str>>,

    /// Etymological origin after the first collapsing pass
    pub etymology_group: Option<EtymologyGroup>,

    /// Etymological origin after the simplification pass (French vs Other)
    pub etymology_simplified: Option<EtymologyGroup>,

    /// Whether the raw etymology label is frequent across the whole table
    pub etymology_frequency_class: Option<FrequencyClass>,

    /// Morphological parse string
    pub morph_parse: Option<Box<str>>,

    /// Recognized derivational suffix, last matching rule wins
    pub suffix_label: Option<&'static str>,

    /// Suffix presence, defined only for words of at most two morphemes
    pub has_suffix: Feature<HasSuffix>,

    /// Suffix label extended with an explicit "monomorphemic" level
    pub suffix_or_monomorphemic: Option<&'static str>,

    /// Membership in any of the compound word lists
    pub is_compound: bool,

    /// Exclusive mass/count classification of the lemma
    pub mass_count_class: Feature<MassCount>,

    /// Dominant part-of-speech with Noun split into mass/count noun
    pub pos_with_noun_split: Option<Box<str>>,
}
//
impl WordRecord {
    /// Compound status as a reportable factor level
    pub fn compound_level(&self) -> &'static str {
        if self.is_compound {
            "compound"
        } else {
            "not compound"
        }
    }

    /// Record with nothing joined, for tests that fill in specific fields
    #[cfg(test)]
    pub(crate) fn blank(word: &str) -> Self {
        Self {
            word: word.into(),
            concreteness_mean: 0.0,
            concreteness_sd: 0.0,
            percent_known: 1.0,
            pos_dominant: None,
            pos_all: None,
            pos_dominance_fraction: None,
            letters: None,
            phonemes: None,
            morpheme_count: None,
            etymology_raw: None,
            etymology_group: None,
            etymology_simplified: None,
            etymology_frequency_class: None,
            morph_parse: None,
            suffix_label: None,
            has_suffix: Feature::Unknown,
            suffix_or_monomorphemic: None,
            is_compound: false,
            mass_count_class: Feature::Unknown,
            pos_with_noun_split: None,
        }
    }
}

/// Auxiliary feature value that keeps "no data" distinct from "undefined"
///
/// `Unknown` means the source resource had no entry; `NotApplicable` means a
/// derivation rule declares the value undefined for this record (e.g. suffix
/// presence for words of more than two morphemes). Models treat both as
/// missing, but reports may tell them apart.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Feature<T> {
    /// The value is defined and was found in the source resource
    Known(T),

    /// The source resource has no data for this record
    Unknown,

    /// A derivation rule declares the value undefined for this record
    NotApplicable,
}
//
impl<T> Feature<T> {
    /// The value, if defined and known
    pub fn known(&self) -> Option<&T> {
        match self {
            Feature::Known(value) => Some(value),
            Feature::Unknown | Feature::NotApplicable => None,
        }
    }
}

/// Exclusive countability classification of a noun lemma
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MassCount {
    /// Attested only as a mass noun
    Mass,

    /// Attested only as a count noun
    Count,
}
//
impl MassCount {
    /// Factor level used in reports and models
    pub fn as_str(self) -> &'static str {
        match self {
            MassCount::Mass => "mass",
            MassCount::Count => "count",
        }
    }
}

/// Suffix presence for words of at most two morphemes
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HasSuffix {
    /// A derivational suffix rule matched the parse
    Suffixed,

    /// The parse carries no recognized derivational suffix
    Unsuffixed,
}
//
impl HasSuffix {
    /// Factor level used in reports and models
    pub fn as_str(self) -> &'static str {
        match self {
            HasSuffix::Suffixed => "has suffix",
            HasSuffix::Unsuffixed => "no suffix",
        }
    }
}

/// Frequency class of a raw etymology label
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FrequencyClass {
    /// The raw label occurs more often than the configured cutoff
    Large,

    /// The raw label is rare across the table
    Small,
}
//
impl FrequencyClass {
    /// Factor level used in reports and models
    pub fn as_str(self) -> &'static str {
        match self {
            FrequencyClass::Large => "large",
            FrequencyClass::Small => "small",
        }
    }
}

/// The complete working table, immutable once built
#[derive(Debug, Default, PartialEq)]
pub struct WordTable(Box<[WordRecord]>);
//
impl WordTable {
    /// Wrap finalized records into the immutable table
    pub(crate) fn new(records: Vec<WordRecord>) -> Self {
        Self(records.into())
    }

    /// Records of the table, in normalized input order
    pub fn records(&self) -> &[WordRecord] {
        &self.0
    }

    /// Number of lemmas in the table
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Borrowed, read-only subset of the working table
///
/// Every analysis runs once per view with identical logic.
#[derive(Clone, Debug)]
pub struct TableView<'table> {
    /// Which analysis dataset this view represents
    pub label: &'static str,

    /// Selected records, in table order
    pub records: Vec<&'table WordRecord>,
}
//
impl<'table> TableView<'table> {
    /// View over the whole table
    pub fn whole(label: &'static str, table: &'table WordTable) -> Self {
        Self {
            label,
            records: table.records().iter().collect(),
        }
    }

    /// Sub-view retaining the records that pass a predicate
    pub fn retain(&self, label: &'static str, keep: impl Fn(&WordRecord) -> bool) -> Self {
        Self {
            label,
            records: self
                .records
                .iter()
                .copied()
                .filter(|record| keep(record))
                .collect(),
        }
    }

    /// Number of records in the view
    pub fn len(&self) -> usize {
        self.records.len()
    }
}
