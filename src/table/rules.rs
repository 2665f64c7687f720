//! Fixed category-collapsing rules applied while joining features
//!
//! These tables reproduce the recoding scheme of the rating study exactly,
//! including its precedence quirks: part-of-speech lookups collapse function
//! words into one bucket, etymology labels collapse in two passes, and the
//! suffix rules form an ordered list where the last matching rule wins.

use super::MassCount;
use crate::tsv::CountabilityRow;

/// Part-of-speech tags collapsed into the single `Function` bucket
pub const FUNCTION_POS: &[&str] = &[
    "Conjunction",
    "Determiner",
    "Preposition",
    "Article",
    "Pronoun",
    "Ex",
    "To",
    "Not",
];

/// Part-of-speech tags treated as missing
pub const UNCLASSIFIED_POS: &[&str] = &[
    "#N/A",
    "Interjection",
    "Letter",
    "Name",
    "Number",
    "Unclassified",
];

/// Collapse a raw part-of-speech tag
///
/// Function-word tags merge into `Function`, uninterpretable tags become
/// missing, and every other tag passes through unchanged.
pub fn collapse_pos(raw: &str) -> Option<&str> {
    if FUNCTION_POS.contains(&raw) {
        Some("Function")
    } else if UNCLASSIFIED_POS.contains(&raw) {
        None
    } else {
        Some(raw)
    }
}

/// Coarse etymological origin bucket
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EtymologyGroup {
    French,
    Latin,
    English,
    Other,
}
//
impl EtymologyGroup {
    /// Factor level used in reports and models
    pub fn as_str(self) -> &'static str {
        match self {
            EtymologyGroup::French => "French",
            EtymologyGroup::Latin => "Latin",
            EtymologyGroup::English => "English",
            EtymologyGroup::Other => "Other",
        }
    }
}

/// Raw labels belonging to the French family
const FRENCH_FAMILY: &[&str] = &[
    "French",
    "Old French",
    "Middle French",
    "Anglo-French",
    "Anglo-Norman",
    "Norman French",
];

/// Raw labels belonging to the Latin family
const LATIN_FAMILY: &[&str] = &[
    "Latin",
    "Old Latin",
    "Late Latin",
    "Medieval Latin",
    "New Latin",
    "Vulgar Latin",
];

/// Raw labels belonging to the English/Germanic family
const ENGLISH_FAMILY: &[&str] = &[
    "English",
    "Old English",
    "Middle English",
    "Anglo-Saxon",
    "Germanic",
    "Old High German",
    "German",
    "Dutch",
    "Middle Dutch",
];

/// Raw labels mapped straight into the residual bucket
const OTHER_ORIGINS: &[&str] = &["Greek", "Italian", "Old Norse"];

/// First etymology collapsing pass: raw label to origin family
///
/// Labels outside every membership list stay unmapped, which downstream
/// treats as an unknown origin rather than an error.
pub fn etymology_group(raw: &str) -> Option<EtymologyGroup> {
    if FRENCH_FAMILY.contains(&raw) {
        Some(EtymologyGroup::French)
    } else if LATIN_FAMILY.contains(&raw) {
        Some(EtymologyGroup::Latin)
    } else if ENGLISH_FAMILY.contains(&raw) {
        Some(EtymologyGroup::English)
    } else if OTHER_ORIGINS.contains(&raw) {
        Some(EtymologyGroup::Other)
    } else {
        None
    }
}

/// Second etymology collapsing pass: Latinate French vs everything else
///
/// Merges Latin into French and English into Other, leaving the two buckets
/// with etymological content used by the combined model.
pub fn simplify_etymology(group: EtymologyGroup) -> EtymologyGroup {
    match group {
        EtymologyGroup::French | EtymologyGroup::Latin => EtymologyGroup::French,
        EtymologyGroup::English | EtymologyGroup::Other => EtymologyGroup::Other,
    }
}

/// Ordered derivational-suffix rules: parse marker to human-readable label
///
/// The order below is normative. When several markers occur in one parse, the
/// rule appearing last in this list wins.
pub const SUFFIX_RULES: &[(&str, &str)] = &[
    (">ly", "-ly"),
    (">y", "-y"),
    (">er", "-er"),
    (">ion", "-ion"),
    (">al", "-al"),
    (">ness", "-ness"),
    (">ic", "-ic"),
    (">ate", "-ate"),
    (">able", "-able"),
    (">est", "-est"),
    (">ious", "-ious"),
    (">ity", "-ity"),
    (">ive", "-ive"),
    (">ant", "-ant"),
    (">ist", "-ist"),
    (">ize", "-ize"),
    (">less", "-less"),
    (">ory", "-ory"),
    (">ful", "-ful"),
    (">ance", "-ance"),
];

/// Recognized derivational suffix of a morphological parse, if any
///
/// Evaluates the whole ordered rule list in one pass so that the last
/// matching rule overwrites any earlier match.
pub fn suffix_label(parse: &str) -> Option<&'static str> {
    let mut label = None;
    for (marker, human) in SUFFIX_RULES {
        if parse.contains(marker) {
            label = Some(*human);
        }
    }
    label
}

/// Exclusive mass/count classification from the incidence counts
///
/// A lemma is classified only when attested in exactly one grammatical
/// class; a lemma spread across several classes gets no label. This
/// deliberately conflates nothing: the caller distinguishes mixed usage from
/// absence of data.
pub fn mass_count_class(row: &CountabilityRow) -> Option<MassCount> {
    if row.countable >= 1 && row.uncountable == 0 && row.bipartite == 0 && row.plural_only == 0 {
        Some(MassCount::Count)
    } else if row.uncountable >= 1 && row.countable == 0 && row.bipartite == 0 && row.plural_only == 0
    {
        Some(MassCount::Mass)
    } else {
        None
    }
}
