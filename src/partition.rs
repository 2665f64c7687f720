//! Unique variance contributions of the predictors of a linear model
//!
//! For every predictor of a full model, the unique contribution is the drop
//! in R² observed when that predictor alone is removed and the model is
//! refitted on the same rows. The reduced refits are independent read-only
//! computations over the same records, so they are dispatched across worker
//! threads and joined back in declared predictor order.

use crate::{
    model::{self, Term},
    table::WordRecord,
};
use rayon::prelude::*;

/// Unique R² contribution of one predictor
#[derive(Clone, Debug)]
pub struct Contribution {
    /// Predictor the contribution belongs to
    pub term: &'static str,

    /// Full-model R² minus the R² of the model without this predictor
    pub unique_r_squared: f64,
}

/// Unique contribution of every predictor to the full model's R²
///
/// Rows incomplete for any predictor are dropped up front, so the full model
/// and every reduced model see exactly the same records. Output preserves
/// the declared predictor order. Removing the only predictor leaves the
/// intercept-only model, whose R² is zero by convention.
pub fn unique_contributions(
    records: &[&WordRecord],
    outcome: model::Outcome,
    terms: &[Term],
) -> crate::Result<Vec<Contribution>> {
    let rows = model::complete_cases(records, outcome, terms);
    let full = model::fit_linear(&rows, outcome, terms)?;

    let reduced = (0..terms.len())
        .into_par_iter()
        .map(|omitted| {
            let remaining = (terms.iter().copied())
                .enumerate()
                .filter(|&(i, _)| i != omitted)
                .map(|(_, term)| term)
                .collect::<Vec<_>>();
            if remaining.is_empty() {
                return Ok(0.0);
            }
            Ok(model::fit_linear(&rows, outcome, &remaining)?.r_squared)
        })
        .collect::<crate::Result<Vec<f64>>>()?;

    Ok((terms.iter().zip(reduced))
        .map(|(term, reduced_r_squared)| Contribution {
            term: term.name,
            unique_r_squared: full.r_squared - reduced_r_squared,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::WordRecord;

    fn blank_record(word: &str) -> WordRecord {
        WordRecord::blank(word)
    }

    fn outcome(record: &WordRecord) -> Option<f64> {
        Some(record.concreteness_mean)
    }

    fn morphemes(record: &WordRecord) -> Option<f64> {
        record.morpheme_count.map(f64::from)
    }

    fn letters(record: &WordRecord) -> Option<f64> {
        record.letters.map(f64::from)
    }

    #[test]
    fn dropping_the_only_predictor_leaves_exactly_zero() {
        let mut records = Vec::new();
        for count in 1..=5u32 {
            let mut record = blank_record(&format!("w{count}"));
            record.morpheme_count = Some(count);
            record.concreteness_mean = count as f64 * 0.3 + 1.0;
            records.push(record);
        }
        let refs = records.iter().collect::<Vec<_>>();
        let contributions =
            unique_contributions(&refs, outcome, &[Term::numeric("morphemes", morphemes)])
                .unwrap();
        assert_eq!(contributions.len(), 1);
        let full = model::fit_linear(&refs, outcome, &[Term::numeric("morphemes", morphemes)])
            .unwrap();
        // The reduced model is intercept-only with R² = 0 exactly, so the
        // unique contribution equals the full model's R²
        assert_eq!(contributions[0].unique_r_squared, full.r_squared);
    }

    #[test]
    fn contributions_are_bounded_and_ordered() {
        let mut records = Vec::new();
        for i in 0..20u32 {
            let mut record = blank_record(&format!("w{i}"));
            record.morpheme_count = Some(1 + i % 4);
            record.letters = Some(3 + (i * 7) % 5);
            record.concreteness_mean =
                1.0 + 0.6 * f64::from(1 + i % 4) + 0.1 * f64::from(3 + (i * 7) % 5);
            records.push(record);
        }
        let refs = records.iter().collect::<Vec<_>>();
        let terms = [
            Term::numeric("morphemes", morphemes),
            Term::numeric("letters", letters),
        ];
        let contributions = unique_contributions(&refs, outcome, &terms).unwrap();
        let full = model::fit_linear(&refs, outcome, &terms).unwrap();

        // Declared order is preserved
        assert_eq!(contributions[0].term, "morphemes");
        assert_eq!(contributions[1].term, "letters");

        // Each unique contribution is bounded by the full R² and cannot be
        // meaningfully negative on the same rows (nested models)
        for contribution in &contributions {
            assert!(contribution.unique_r_squared <= full.r_squared + 1e-12);
            assert!(contribution.unique_r_squared >= -1e-9);
        }
    }
}
