//! Mechanism for building the [`WordTable`] by joining every auxiliary
//! lexical resource onto the normalized lemma list
//!
//! All joins are exact string-key lookups on the lemma. When an auxiliary
//! resource carries duplicate keys, the first occurrence wins and later ones
//! are ignored. A missing key is never an error: the affected feature stays
//! missing and the per-feature miss counts are logged once per build.

use super::{rules, Feature, FrequencyClass, HasSuffix, MassCount, WordRecord, WordTable};
use crate::{
    config::Config,
    progress::{ProgressReport, Work},
    tsv::{NormsRow, Resources},
    Word,
};
use std::{
    collections::{hash_map, HashMap, HashSet},
    sync::Arc,
};

/// Part-of-speech information retained from the frequency-norms resource
#[derive(Clone, Debug)]
struct PosEntry {
    /// Raw dominant tag
    dominant: Option<Box<str>>,

    /// Raw dot-separated tag list
    all: Option<Box<str>>,

    /// Fraction of occurrences carrying the dominant tag
    dominance: Option<f64>,
}

/// Length and morphology counts retained from the lexicon resource
#[derive(Clone, Debug)]
struct LexiconEntry {
    /// Raw tag, used as a fallback when the frequency norms have none
    pos: Option<Box<str>>,
    letters: Option<u32>,
    phonemes: Option<u32>,
    morphemes: Option<u32>,
}

/// Accumulator of per-feature missing-key counts, logged once per build
#[derive(Debug, Default)]
struct MissingCounts {
    pos: usize,
    lexicon: usize,
    etymology: usize,
    parse: usize,
    countability: usize,
}
//
impl MissingCounts {
    /// Report the aggregate miss counts for transparency
    fn log(&self, total: usize) {
        log::info!(
            "Joined {total} lemmas: {} without part-of-speech tags, \
             {} without lexicon counts, {} with unknown etymology, \
             {} without a morphological parse, {} absent from the \
             countability table",
            self.pos,
            self.lexicon,
            self.etymology,
            self.parse,
            self.countability,
        );
    }
}

/// One-shot builder of the working table
///
/// Constructed from the loaded resources, whose rows are digested into keyed
/// lookup maps, then consumed by [`build()`](Self::build) together with the
/// normalized rating rows.
#[derive(Debug)]
pub struct TableBuilder {
    /// Data collection configuration
    config: Arc<Config>,

    /// Per-lemma part-of-speech lookup
    pos_frequency: HashMap<Word, PosEntry>,

    /// Per-lemma length and morphology lookup
    lexicon: HashMap<Word, LexiconEntry>,

    /// Per-lemma exclusive countability class; the mapped value is `None`
    /// when the lemma is attested in more than one grammatical class
    countability: HashMap<Word, Option<MassCount>>,

    /// Per-lemma raw etymology label
    etymology: HashMap<Word, Box<str>>,

    /// Per-lemma morphological parse, suffixed resource taking precedence
    parses: HashMap<Word, Box<str>>,

    /// Union of the compound word lists, case as provided
    compounds: HashSet<Word>,
}
//
impl TableBuilder {
    /// Digest the loaded resources into lookup maps
    pub fn new(config: Arc<Config>, resources: &Resources) -> Self {
        let mut pos_frequency = HashMap::with_capacity(resources.pos_frequency.len());
        for row in &resources.pos_frequency {
            first_wins(
                &mut pos_frequency,
                row.word.clone(),
                PosEntry {
                    dominant: row.dominant.clone(),
                    all: row.all.clone(),
                    dominance: row.dominance,
                },
                "part-of-speech",
            );
        }

        let mut lexicon = HashMap::with_capacity(resources.lexicon.len());
        for row in &resources.lexicon {
            first_wins(
                &mut lexicon,
                row.word.clone(),
                LexiconEntry {
                    pos: row.pos.clone(),
                    letters: row.letters,
                    phonemes: row.phonemes,
                    morphemes: row.morphemes,
                },
                "lexicon",
            );
        }

        let mut countability = HashMap::with_capacity(resources.countability.len());
        for row in &resources.countability {
            first_wins(
                &mut countability,
                row.lemma.clone(),
                rules::mass_count_class(row),
                "countability",
            );
        }

        let mut etymology = HashMap::with_capacity(resources.etymology.len());
        for row in &resources.etymology {
            first_wins(
                &mut etymology,
                row.word.clone(),
                row.origin.clone(),
                "etymology",
            );
        }

        let mut parses =
            HashMap::with_capacity(resources.suffixed.len() + resources.unsuffixed.len());
        for row in resources.suffixed.iter().chain(&resources.unsuffixed) {
            first_wins(&mut parses, row.word.clone(), row.parse.clone(), "parse");
        }

        let compounds = (resources.compounds.iter().flatten())
            .cloned()
            .collect::<HashSet<_>>();

        Self {
            config,
            pos_frequency,
            lexicon,
            countability,
            etymology,
            parses,
            compounds,
        }
    }

    /// Join every feature onto the normalized rating rows
    pub fn build(self, norms: Vec<NormsRow>, progress: &ProgressReport) -> WordTable {
        // First pass: per-lemma lookups and derivations
        let tracker = progress.add("Joining lexical features", Work::PercentSteps(norms.len()));
        let mut missing = MissingCounts::default();
        let mut records = Vec::with_capacity(norms.len());
        for row in norms {
            records.push(self.join_one(row, &mut missing));
            tracker.make_progress(1);
        }

        // Second pass: the etymology frequency class needs label counts
        // across the whole table, so it can only be attached once every raw
        // label has been joined
        let mut label_counts = HashMap::<&str, u32>::new();
        for record in &records {
            if let Some(raw) = record.etymology_raw.as_deref() {
                *label_counts.entry(raw).or_insert(0) += 1;
            }
        }
        let classes = (records.iter())
            .map(|record| {
                record.etymology_raw.as_deref().map(|raw| {
                    if label_counts[raw] > self.config.etymology_cutoff {
                        FrequencyClass::Large
                    } else {
                        FrequencyClass::Small
                    }
                })
            })
            .collect::<Vec<_>>();
        for (record, class) in records.iter_mut().zip(classes) {
            record.etymology_frequency_class = class;
        }

        missing.log(records.len());
        WordTable::new(records)
    }

    /// Derive the full record for one lemma
    fn join_one(&self, norms: NormsRow, missing: &mut MissingCounts) -> WordRecord {
        let NormsRow {
            word,
            concreteness_mean,
            concreteness_sd,
            percent_known,
        } = norms;

        // Part-of-speech, with the frequency norms taking precedence and the
        // lexicon tag only filling in for untagged words
        let pos_entry = self.pos_frequency.get(&word);
        let lexicon = self.lexicon.get(&word);
        if pos_entry.is_none() {
            missing.pos += 1;
        }
        if lexicon.is_none() {
            missing.lexicon += 1;
        }
        let primary_pos = (pos_entry.and_then(|entry| entry.dominant.as_deref()))
            .and_then(rules::collapse_pos);
        let fallback_pos =
            (lexicon.and_then(|entry| entry.pos.as_deref())).and_then(rules::collapse_pos);
        let pos_dominant: Option<Box<str>> = primary_pos.or(fallback_pos).map(Into::into);
        let pos_all = (pos_entry.and_then(|entry| entry.all.as_deref()))
            .map(|tags| {
                (tags.split('.'))
                    .filter_map(rules::collapse_pos)
                    .map(Into::into)
                    .collect::<Box<[Box<str>]>>()
            })
            .filter(|tags| !tags.is_empty());
        let pos_dominance_fraction = pos_entry.and_then(|entry| entry.dominance);

        // Length and morphology counts
        let letters = lexicon.and_then(|entry| entry.letters);
        let phonemes = lexicon.and_then(|entry| entry.phonemes);
        let morpheme_count = lexicon.and_then(|entry| entry.morphemes);

        // Etymology; the frequency class is attached in a second pass
        let etymology_raw = self.etymology.get(&word).cloned();
        if etymology_raw.is_none() {
            missing.etymology += 1;
        }
        let etymology_group = etymology_raw.as_deref().and_then(rules::etymology_group);
        let etymology_simplified = etymology_group.map(rules::simplify_etymology);

        // Derivational suffixes
        let morph_parse = self.parses.get(&word).cloned();
        if morph_parse.is_none() {
            missing.parse += 1;
        }
        let suffix_label = morph_parse.as_deref().and_then(rules::suffix_label);
        let has_suffix = match (morpheme_count, &morph_parse) {
            // Suffix presence is undefined beyond bimorphemic words, even
            // when a suffix rule superficially matched the parse
            (Some(count), _) if count > 2 => Feature::NotApplicable,
            (Some(_), Some(_)) => Feature::Known(if suffix_label.is_some() {
                HasSuffix::Suffixed
            } else {
                HasSuffix::Unsuffixed
            }),
            (Some(_), None) | (None, _) => Feature::Unknown,
        };
        let suffix_or_monomorphemic = match morpheme_count {
            Some(1) => Some("monomorphemic"),
            Some(_) => suffix_label,
            None => None,
        };

        // Compounds and countability
        let is_compound = self.compounds.contains(&word);
        let mass_count_class = match self.countability.get(&word) {
            Some(Some(class)) => Feature::Known(*class),
            Some(None) => Feature::NotApplicable,
            None => {
                missing.countability += 1;
                Feature::Unknown
            }
        };

        // Split the Noun level by countability where it is known
        let pos_with_noun_split = pos_dominant.as_deref().map(|pos| {
            if pos == "Noun" {
                match mass_count_class.known() {
                    Some(MassCount::Count) => "count noun".into(),
                    Some(MassCount::Mass) => "mass noun".into(),
                    None => pos.into(),
                }
            } else {
                pos.into()
            }
        });

        WordRecord {
            word,
            concreteness_mean,
            concreteness_sd,
            percent_known,
            pos_dominant,
            pos_all,
            pos_dominance_fraction,
            letters,
            phonemes,
            morpheme_count,
            etymology_raw,
            etymology_group,
            etymology_simplified,
            etymology_frequency_class: None,
            morph_parse,
            suffix_label,
            has_suffix,
            suffix_or_monomorphemic,
            is_compound,
            mass_count_class,
            pos_with_noun_split,
        }
    }
}

/// Record a keyed row, ignoring later duplicates of the same key
fn first_wins<V>(map: &mut HashMap<Word, V>, key: Word, value: V, resource: &str) {
    match map.entry(key) {
        hash_map::Entry::Occupied(o) => {
            log::trace!("Ignored duplicate {resource} key {:?}", o.key());
        }
        hash_map::Entry::Vacant(v) => {
            v.insert(value);
        }
    }
}
