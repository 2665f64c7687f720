//! Normalization of rated words to deduplicated lemmas
//!
//! The concreteness norms rate surface forms, but every auxiliary resource is
//! keyed by base form, so the rated words are lemmatized before joining. The
//! lemmatizer itself is a black box behind the [`Lemmatizer`] trait: any
//! string-to-lemma function will do, and [`EnglishLemmatizer`] is the bundled
//! rule-based default.

use crate::{config::Config, tsv::NormsRow, Word};
use std::{
    collections::{HashMap, HashSet},
    sync::OnceLock,
};

/// Canonical base-form computation
///
/// A lemma keeps derivational morphology and strips inflectional morphology:
/// "berries" becomes "berry", but "happiness" stays "happiness".
pub trait Lemmatizer {
    /// Map a surface form to its lemma
    fn lemma(&self, word: &str) -> Word;
}

/// Normalize rated words to lemmas and deduplicate the rating rows
///
/// Words containing the configured exception substring keep their surface
/// form. When two distinct surface forms map to the same lemma, only the
/// first-encountered row survives; callers must accept this data-loss point,
/// and the collision count is logged for transparency.
pub fn normalize(
    rows: Vec<NormsRow>,
    lemmatizer: &impl Lemmatizer,
    config: &Config,
) -> Vec<NormsRow> {
    let mut seen = HashSet::with_capacity(rows.len());
    let mut normalized = Vec::with_capacity(rows.len());
    let mut collisions = 0usize;
    for mut row in rows {
        if !row.word.contains(&*config.lemma_exception) {
            let lemma = lemmatizer.lemma(&row.word);
            if lemma != row.word {
                log::trace!("Normalized rated word {:?} into lemma {lemma:?}", row.word);
                row.word = lemma;
            }
        }
        if seen.insert(row.word.clone()) {
            normalized.push(row);
        } else {
            log::trace!("Dropped rating row for duplicate lemma {:?}", row.word);
            collisions += 1;
        }
    }
    if collisions > 0 {
        log::info!(
            "Dropped {collisions} rating rows whose lemma was already present \
             (first occurrence wins)"
        );
    }
    normalized
}

/// Rule-based English lemmatizer
///
/// Strips regular plural, past-tense, progressive and third-person singular
/// endings, with consonant undoubling and a crude silent-e restoration, and
/// consults a fixed irregular-form table first. Good enough for the noun-heavy
/// vocabulary of rating studies; systematic failure cases (e.g. superlatives)
/// are expected to be routed around it via the exception pattern.
#[derive(Debug, Default)]
pub struct EnglishLemmatizer;
//
impl EnglishLemmatizer {
    /// Set up the lemmatizer
    pub fn new() -> Self {
        Self
    }
}
//
impl Lemmatizer for EnglishLemmatizer {
    fn lemma(&self, word: &str) -> Word {
        if let Some(lemma) = irregular_forms().get(word) {
            return (*lemma).into();
        }
        if let Some(stem) = strip_plural(word) {
            return stem;
        }
        if let Some(stem) = word.strip_suffix("ied").filter(|stem| stem.len() > 1) {
            // carried -> carry, studied -> study
            return format!("{stem}y").into();
        }
        if let Some(stem) = strip_verbal(word, "ed") {
            return stem;
        }
        if let Some(stem) = strip_verbal(word, "ing") {
            return stem;
        }
        word.into()
    }
}

/// Strip a regular plural or third-person singular ending, if any
fn strip_plural(word: &str) -> Option<Word> {
    if let Some(stem) = word.strip_suffix("ies") {
        // berries -> berry, but dies -> die is handled by the "s" rule below
        if stem.len() > 2 {
            return Some(format!("{stem}y").into());
        }
    }
    if let Some(stem) = word.strip_suffix("es") {
        // boxes -> box, churches -> church
        if ["s", "x", "z", "ch", "sh"].iter().any(|s| stem.ends_with(s)) {
            return Some(stem.into());
        }
    }
    if let Some(stem) = word.strip_suffix('s') {
        // cats -> cat, leaving -ss, -us and -is words (glass, bus, axis) alone
        if stem.len() > 1 && !["s", "u", "i"].iter().any(|s| stem.ends_with(s)) {
            return Some(stem.into());
        }
    }
    None
}

/// Strip a regular "-ed" or "-ing" verbal ending, if any
fn strip_verbal(word: &str, suffix: &str) -> Option<Word> {
    let stem = word.strip_suffix(suffix)?;
    let chars = stem.chars().collect::<Vec<_>>();
    let &last = chars.last()?;

    // Refuse stems too short or unpronounceable to be words ("sing", "bring")
    // and stems where the ending follows a vowel ("speed", "agreed")
    if chars.len() < 3 || !chars.iter().copied().any(is_vowel) || is_vowel(last) {
        return None;
    }

    // stopped -> stop, running -> run
    if chars[chars.len() - 2] == last {
        return Some(stem[..stem.len() - last.len_utf8()].into());
    }

    // loved -> love, making -> make: restore a silent e after a lone
    // consonant that follows a vowel
    if chars.len() >= 2 && is_vowel(chars[chars.len() - 2]) {
        return Some(format!("{stem}e").into());
    }

    // walked -> walk
    Some(stem.into())
}

/// Truth that a letter is an English vowel
fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Fixed table of irregular inflected forms and their lemmas
fn irregular_forms() -> &'static HashMap<&'static str, &'static str> {
    static LAZY: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    LAZY.get_or_init(|| {
        [
            // Irregular noun plurals
            ("children", "child"),
            ("men", "man"),
            ("women", "woman"),
            ("feet", "foot"),
            ("teeth", "tooth"),
            ("geese", "goose"),
            ("mice", "mouse"),
            ("lice", "louse"),
            ("oxen", "ox"),
            ("people", "person"),
            // -f/-fe plurals
            ("knives", "knife"),
            ("wives", "wife"),
            ("lives", "life"),
            ("leaves", "leaf"),
            ("halves", "half"),
            ("wolves", "wolf"),
            ("thieves", "thief"),
            ("shelves", "shelf"),
            ("loaves", "loaf"),
            ("scarves", "scarf"),
            ("calves", "calf"),
            ("hooves", "hoof"),
            // Common irregular verbs
            ("was", "be"),
            ("were", "be"),
            ("been", "be"),
            ("is", "be"),
            ("are", "be"),
            ("am", "be"),
            ("has", "have"),
            ("had", "have"),
            ("did", "do"),
            ("does", "do"),
            ("done", "do"),
            ("went", "go"),
            ("gone", "go"),
            ("goes", "go"),
            ("said", "say"),
            ("made", "make"),
            ("took", "take"),
            ("taken", "take"),
            ("gave", "give"),
            ("given", "give"),
            ("ran", "run"),
            ("came", "come"),
            ("saw", "see"),
            ("seen", "see"),
            ("grew", "grow"),
            ("grown", "grow"),
            ("knew", "know"),
            ("known", "know"),
            ("threw", "throw"),
            ("thrown", "throw"),
            ("wrote", "write"),
            ("written", "write"),
            ("spoke", "speak"),
            ("spoken", "speak"),
            ("broke", "break"),
            ("broken", "break"),
            ("chose", "choose"),
            ("chosen", "choose"),
            ("froze", "freeze"),
            ("frozen", "freeze"),
            ("ate", "eat"),
            ("eaten", "eat"),
            ("fell", "fall"),
            ("fallen", "fall"),
            ("flew", "fly"),
            ("flown", "fly"),
            ("drew", "draw"),
            ("drawn", "draw"),
            ("wore", "wear"),
            ("worn", "wear"),
            ("tore", "tear"),
            ("torn", "tear"),
            ("sang", "sing"),
            ("sung", "sing"),
            ("drank", "drink"),
            ("drunk", "drink"),
            ("swam", "swim"),
            ("swum", "swim"),
            ("began", "begin"),
            ("begun", "begin"),
        ]
        .into_iter()
        .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lemmatize(word: &str) -> Word {
        EnglishLemmatizer::new().lemma(word)
    }

    #[test]
    fn regular_inflections_are_stripped() {
        assert_eq!(&*lemmatize("cats"), "cat");
        assert_eq!(&*lemmatize("berries"), "berry");
        assert_eq!(&*lemmatize("boxes"), "box");
        assert_eq!(&*lemmatize("stopped"), "stop");
        assert_eq!(&*lemmatize("loved"), "love");
        assert_eq!(&*lemmatize("walked"), "walk");
        assert_eq!(&*lemmatize("running"), "run");
        assert_eq!(&*lemmatize("making"), "make");
    }

    #[test]
    fn lemma_like_forms_are_left_alone() {
        for word in ["glass", "bus", "axis", "sing", "bring", "string", "speed"] {
            assert_eq!(&*lemmatize(word), word);
        }
    }

    #[test]
    fn irregular_forms_use_the_table() {
        assert_eq!(&*lemmatize("children"), "child");
        assert_eq!(&*lemmatize("knives"), "knife");
        assert_eq!(&*lemmatize("went"), "go");
    }

    #[test]
    fn lemmatization_is_idempotent() {
        for word in [
            "cat", "cats", "berries", "boxes", "stopped", "running", "children", "speed",
            "house", "glass", "carried", "dies", "wolves", "singing",
        ] {
            let once = lemmatize(word);
            let twice = lemmatize(&once);
            assert_eq!(once, twice, "lemma of {word:?} is not a fixed point");
        }
    }

    #[test]
    fn normalize_deduplicates_first_occurrence_wins() {
        let row = |word: &str, mean: f64| NormsRow {
            word: word.into(),
            concreteness_mean: mean,
            concreteness_sd: 0.5,
            percent_known: 1.0,
        };
        let config = Config::default();
        let rows = vec![row("cats", 4.0), row("cat", 3.0), row("dog", 4.5)];
        let normalized = normalize(rows, &EnglishLemmatizer::new(), &config);
        assert_eq!(normalized.len(), 2);
        // "cats" lemmatizes to "cat" first, so the raw "cat" row is dropped
        assert_eq!(&*normalized[0].word, "cat");
        assert_eq!(normalized[0].concreteness_mean, 4.0);
        assert_eq!(&*normalized[1].word, "dog");
    }

    #[test]
    fn exception_words_bypass_the_lemmatizer() {
        let row = |word: &str| NormsRow {
            word: word.into(),
            concreteness_mean: 3.0,
            concreteness_sd: 0.5,
            percent_known: 1.0,
        };
        let config = Config::default();
        let normalized = normalize(
            vec![row("biggest"), row("nests")],
            &EnglishLemmatizer::new(),
            &config,
        );
        // Both contain "est" and must keep their surface form
        assert_eq!(&*normalized[0].word, "biggest");
        assert_eq!(&*normalized[1].word, "nests");
    }
}
