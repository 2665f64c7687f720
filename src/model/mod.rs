//! Linear model fitting over the working table
//!
//! Models are specified as an explicit, typed predictor list rather than a
//! textual formula: each [`Term`] pairs a display name with an accessor into
//! [`WordRecord`], and categorical terms are dummy-coded against their first
//! level in sorted order. This keeps predictor sets checkable at compile time
//! and makes the reduced-model refits of variance partitioning a matter of
//! slicing a slice.
//!
//! Fitting solves the ordinary-least-squares normal equations directly; with
//! at most a handful of predictors the X'X system is tiny regardless of how
//! many words the view holds.

pub mod compare;
pub mod glm;

use crate::table::WordRecord;
use anyhow::Context;
use ndarray::{Array1, Array2, Axis, Slice};
use ndarray_linalg::Solve;
use statrs::distribution::{ContinuousCDF, FisherSnedecor};
use std::{collections::BTreeSet, ops::Range};

/// Accessor extracting a numeric value from a record
pub type NumericAccessor = fn(&WordRecord) -> Option<f64>;

/// Accessor extracting a categorical level from a record
pub type LevelAccessor = fn(&WordRecord) -> Option<&str>;

/// Outcome variable of a model
pub type Outcome = NumericAccessor;

/// One named predictor of a model
#[derive(Clone, Copy, Debug)]
pub struct Term {
    /// Display name used in reports
    pub name: &'static str,

    /// Typed accessor for the predictor value
    pub kind: TermKind,
}
//
impl Term {
    /// Continuous predictor
    pub fn numeric(name: &'static str, accessor: NumericAccessor) -> Self {
        Self {
            name,
            kind: TermKind::Numeric(accessor),
        }
    }

    /// Categorical predictor, dummy-coded against its first sorted level
    pub fn categorical(name: &'static str, accessor: LevelAccessor) -> Self {
        Self {
            name,
            kind: TermKind::Categorical(accessor),
        }
    }

    /// Truth that the record carries a value for this predictor
    fn is_present(&self, record: &WordRecord) -> bool {
        match self.kind {
            TermKind::Numeric(accessor) => accessor(record).is_some(),
            TermKind::Categorical(accessor) => accessor(record).is_some(),
        }
    }
}

/// Typed predictor accessor
#[derive(Clone, Copy, Debug)]
pub enum TermKind {
    /// Continuous predictor
    Numeric(NumericAccessor),

    /// Categorical predictor
    Categorical(LevelAccessor),
}

/// One estimated model coefficient
#[derive(Clone, Debug)]
pub struct Coefficient {
    /// Coefficient name, e.g. `(Intercept)` or `pos: Verb`
    pub name: String,

    /// Estimated value
    pub estimate: f64,
}

/// One row of the sequential analysis-of-variance table
#[derive(Clone, Debug)]
pub struct AnovaRow {
    /// Predictor the row describes
    pub term: &'static str,

    /// Degrees of freedom consumed by the predictor
    pub df: usize,

    /// Sequential sum of squares attributed to the predictor
    pub sum_squares: f64,

    /// F statistic against the full-model residual
    pub f_statistic: f64,

    /// Upper tail probability of the F statistic
    pub p_value: f64,
}

/// Summary of a fitted linear model
#[derive(Clone, Debug)]
pub struct LinearFit {
    /// Number of complete-case records the fit used
    pub n_used: usize,

    /// Coefficient of determination
    pub r_squared: f64,

    /// Estimated coefficients, intercept first
    pub coefficients: Vec<Coefficient>,

    /// Sequential per-term significance
    pub anova: Vec<AnovaRow>,

    /// Variance inflation factor per non-intercept design column
    pub vif: Vec<(String, f64)>,
}

/// Fit a linear model of the outcome on the given predictor list
///
/// Records missing the outcome or any predictor are dropped (listwise
/// deletion). Degenerate inputs, such as a single-level categorical
/// predictor or a singular design, fail this fit alone with a descriptive
/// error so that the caller can skip the affected analysis and move on.
pub fn fit_linear(
    records: &[&WordRecord],
    outcome: Outcome,
    terms: &[Term],
) -> crate::Result<LinearFit> {
    anyhow::ensure!(!terms.is_empty(), "a model needs at least one predictor");
    let rows = complete_cases(records, outcome, terms);
    let design = Design::assemble(&rows, outcome, terms)?;

    // Full fit
    let n = design.outcome.len();
    let p = design.matrix.ncols();
    anyhow::ensure!(
        n > p,
        "{n} complete cases cannot identify {p} model coefficients"
    );
    let (beta, r_squared) = design.ols_prefix(p)?;
    let df_residual = n - p;
    let sst = design.total_sum_squares();
    let mse = sst * (1.0 - r_squared) / df_residual as f64;

    // Sequential per-term ANOVA from nested prefix fits
    let mut anova = Vec::with_capacity(terms.len());
    let mut previous_r_squared = 0.0;
    for (term, columns) in terms.iter().zip(&design.term_columns) {
        let (_beta, prefix_r_squared) = design.ols_prefix(columns.end)?;
        let df = columns.len();
        let sum_squares = (prefix_r_squared - previous_r_squared) * sst;
        let f_statistic = (sum_squares / df as f64) / mse;
        anova.push(AnovaRow {
            term: term.name,
            df,
            sum_squares,
            f_statistic,
            p_value: f_tail(f_statistic, df as f64, df_residual as f64)?,
        });
        previous_r_squared = prefix_r_squared;
    }

    let coefficients = (design.column_names.iter().cloned())
        .zip(beta.iter().copied())
        .map(|(name, estimate)| Coefficient { name, estimate })
        .collect();
    let vif = design.variance_inflation()?;
    Ok(LinearFit {
        n_used: n,
        r_squared,
        coefficients,
        anova,
        vif,
    })
}

/// Restrict records to complete cases for the outcome and every predictor
///
/// Variance partitioning relies on this being computed against the full
/// predictor list, so that every reduced model is fitted on exactly the same
/// rows as the full model.
pub fn complete_cases<'r>(
    records: &[&'r WordRecord],
    outcome: Outcome,
    terms: &[Term],
) -> Vec<&'r WordRecord> {
    (records.iter().copied())
        .filter(|record| {
            outcome(record).is_some() && terms.iter().all(|term| term.is_present(record))
        })
        .collect()
}

/// Dummy-coded design matrix with term-to-column bookkeeping
struct Design {
    /// Column names, intercept first
    column_names: Vec<String>,

    /// Column range of each term, in declared term order
    term_columns: Vec<Range<usize>>,

    /// The design matrix, one row per complete case
    matrix: Array2<f64>,

    /// Outcome values, aligned with the matrix rows
    outcome: Array1<f64>,
}
//
impl Design {
    /// Assemble the design matrix for complete-case records
    fn assemble(rows: &[&WordRecord], outcome: Outcome, terms: &[Term]) -> crate::Result<Self> {
        anyhow::ensure!(
            rows.len() >= 3,
            "only {} complete cases across the model variables",
            rows.len()
        );

        // Plan the columns of each term
        let mut column_names = vec!["(Intercept)".to_owned()];
        let mut term_columns = Vec::with_capacity(terms.len());
        let mut level_sets = Vec::with_capacity(terms.len());
        for term in terms {
            let start = column_names.len();
            match term.kind {
                TermKind::Numeric(_) => {
                    column_names.push(term.name.to_owned());
                    level_sets.push(None);
                }
                TermKind::Categorical(accessor) => {
                    let levels = (rows.iter())
                        .filter_map(|record| accessor(record))
                        .collect::<BTreeSet<_>>();
                    anyhow::ensure!(
                        levels.len() >= 2,
                        "categorical predictor {:?} has {} level(s) in this dataset",
                        term.name,
                        levels.len()
                    );
                    // The first sorted level is the dummy-coding reference
                    let levels = levels
                        .into_iter()
                        .map(Box::<str>::from)
                        .collect::<Vec<_>>();
                    for level in levels.iter().skip(1) {
                        column_names.push(format!("{}: {level}", term.name));
                    }
                    level_sets.push(Some(levels));
                }
            }
            term_columns.push(start..column_names.len());
        }

        // Fill the matrix
        let mut matrix = Array2::zeros((rows.len(), column_names.len()));
        let mut outcome_values = Array1::zeros(rows.len());
        for (r, record) in rows.iter().enumerate() {
            matrix[[r, 0]] = 1.0;
            outcome_values[r] =
                outcome(record).expect("complete cases were checked to have an outcome");
            for (term, (columns, levels)) in
                terms.iter().zip(term_columns.iter().zip(&level_sets))
            {
                match (term.kind, levels) {
                    (TermKind::Numeric(accessor), _) => {
                        matrix[[r, columns.start]] = accessor(record)
                            .expect("complete cases were checked to have every predictor");
                    }
                    (TermKind::Categorical(accessor), Some(levels)) => {
                        let level = accessor(record)
                            .expect("complete cases were checked to have every predictor");
                        // Reference level: all dummies stay zero
                        if let Some(idx) =
                            levels.iter().skip(1).position(|l| &**l == level)
                        {
                            matrix[[r, columns.start + idx]] = 1.0;
                        }
                    }
                    (TermKind::Categorical(_), None) => {
                        unreachable!("categorical terms always plan a level set")
                    }
                }
            }
        }
        Ok(Self {
            column_names,
            term_columns,
            matrix,
            outcome: outcome_values,
        })
    }

    /// Total sum of squares of the outcome
    fn total_sum_squares(&self) -> f64 {
        let mean = self.outcome.mean().unwrap_or(0.0);
        (self.outcome.iter()).map(|y| (y - mean).powi(2)).sum()
    }

    /// Ordinary least squares over the first `ncols` design columns
    ///
    /// Returns the coefficients and the coefficient of determination.
    fn ols_prefix(&self, ncols: usize) -> crate::Result<(Array1<f64>, f64)> {
        let x = self.matrix.slice_axis(Axis(1), Slice::from(0..ncols));
        let xtx = x.t().dot(&x);
        let xty = x.t().dot(&self.outcome);
        let beta = xtx
            .solve_into(xty)
            .context("solving the normal equations (is a predictor constant or aliased?)")?;
        let residuals = &self.outcome - &x.dot(&beta);
        let sse = residuals.dot(&residuals);
        let sst = self.total_sum_squares();
        anyhow::ensure!(sst > 0.0, "the outcome is constant across complete cases");
        Ok((beta, 1.0 - sse / sst))
    }

    /// Variance inflation factor of every non-intercept design column
    fn variance_inflation(&self) -> crate::Result<Vec<(String, f64)>> {
        let p = self.matrix.ncols();
        let mut vif = Vec::with_capacity(p.saturating_sub(1));
        for j in 1..p {
            // Regress column j on every other column, intercept included
            let others = (0..p).filter(|&c| c != j).collect::<Vec<_>>();
            let x = self.matrix.select(Axis(1), &others);
            let y = self.matrix.column(j).to_owned();
            let xtx = x.t().dot(&x);
            let xty = x.t().dot(&y);
            let beta = xtx
                .solve_into(xty)
                .context("computing a variance inflation factor")?;
            let residuals = &y - &x.dot(&beta);
            let sse = residuals.dot(&residuals);
            let mean = y.mean().unwrap_or(0.0);
            let sst = y.iter().map(|v| (v - mean).powi(2)).sum::<f64>();
            let r_squared = if sst > 0.0 { 1.0 - sse / sst } else { 0.0 };
            let inflation = if r_squared < 1.0 {
                1.0 / (1.0 - r_squared)
            } else {
                f64::INFINITY
            };
            vif.push((self.column_names[j].clone(), inflation));
        }
        Ok(vif)
    }
}

/// Upper tail probability of an F statistic
fn f_tail(f_statistic: f64, df_numerator: f64, df_denominator: f64) -> crate::Result<f64> {
    let distribution = FisherSnedecor::new(df_numerator, df_denominator)
        .context("setting up the F reference distribution")?;
    Ok(1.0 - distribution.cdf(f_statistic.max(0.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_record(word: &str) -> WordRecord {
        WordRecord::blank(word)
    }

    fn mean_outcome(record: &WordRecord) -> Option<f64> {
        Some(record.concreteness_mean)
    }

    fn morphemes(record: &WordRecord) -> Option<f64> {
        record.morpheme_count.map(f64::from)
    }

    fn pos(record: &WordRecord) -> Option<&str> {
        record.pos_dominant.as_deref()
    }

    #[test]
    fn simple_regression_recovers_a_perfect_line() {
        let records = (1..=5u32)
            .map(|count| {
                let mut record = blank_record(&format!("w{count}"));
                record.morpheme_count = Some(count);
                record.concreteness_mean = 2.0 + 0.5 * count as f64;
                record
            })
            .collect::<Vec<_>>();
        let refs = records.iter().collect::<Vec<_>>();
        let fit = fit_linear(
            &refs,
            mean_outcome,
            &[Term::numeric("morphemes", morphemes)],
        )
        .unwrap();
        assert_eq!(fit.n_used, 5);
        assert!((fit.r_squared - 1.0).abs() < 1e-9);
        assert!((fit.coefficients[0].estimate - 2.0).abs() < 1e-9);
        assert!((fit.coefficients[1].estimate - 0.5).abs() < 1e-9);
    }

    #[test]
    fn categorical_terms_are_dummy_coded_per_level() {
        let mut records = Vec::new();
        for (tag, mean) in [("Noun", 4.0), ("Noun", 4.2), ("Verb", 2.0), ("Verb", 2.4)] {
            let mut record = blank_record(&format!("w{}", records.len()));
            record.pos_dominant = Some(tag.into());
            record.concreteness_mean = mean;
            records.push(record);
        }
        let refs = records.iter().collect::<Vec<_>>();
        let fit = fit_linear(&refs, mean_outcome, &[Term::categorical("pos", pos)]).unwrap();
        // Intercept is the Noun (first sorted level) mean; the Verb dummy is
        // the difference of group means
        assert!((fit.coefficients[0].estimate - 4.1).abs() < 1e-9);
        assert_eq!(fit.coefficients[1].name, "pos: Verb");
        assert!((fit.coefficients[1].estimate + 1.9).abs() < 1e-9);
        assert_eq!(fit.anova.len(), 1);
        assert_eq!(fit.anova[0].df, 1);
    }

    #[test]
    fn listwise_deletion_drops_incomplete_records() {
        let mut records = Vec::new();
        for count in 1..=4u32 {
            let mut record = blank_record(&format!("w{count}"));
            record.morpheme_count = Some(count);
            record.concreteness_mean = count as f64;
            records.push(record);
        }
        records.push(blank_record("missing"));
        let refs = records.iter().collect::<Vec<_>>();
        let fit = fit_linear(
            &refs,
            mean_outcome,
            &[Term::numeric("morphemes", morphemes)],
        )
        .unwrap();
        assert_eq!(fit.n_used, 4);
    }

    #[test]
    fn single_level_factors_are_degenerate() {
        let mut records = Vec::new();
        for i in 0..4 {
            let mut record = blank_record(&format!("w{i}"));
            record.pos_dominant = Some("Noun".into());
            record.concreteness_mean = i as f64;
            records.push(record);
        }
        let refs = records.iter().collect::<Vec<_>>();
        let error = fit_linear(&refs, mean_outcome, &[Term::categorical("pos", pos)])
            .unwrap_err()
            .to_string();
        assert!(error.contains("level"), "unexpected error: {error}");
    }

    #[test]
    fn collinear_predictors_inflate_variance() {
        let mut records = Vec::new();
        for count in 1..=6u32 {
            let mut record = blank_record(&format!("w{count}"));
            record.morpheme_count = Some(count);
            record.letters = Some(count * 2);
            record.concreteness_mean = 1.0 + count as f64 + (count % 2) as f64;
            records.push(record);
        }
        let refs = records.iter().collect::<Vec<_>>();
        fn letters(record: &WordRecord) -> Option<f64> {
            record.letters.map(f64::from)
        }
        // letters is exactly twice morphemes: the design is aliased, which
        // either fails the solve or shows up as runaway inflation factors
        match fit_linear(
            &refs,
            mean_outcome,
            &[
                Term::numeric("morphemes", morphemes),
                Term::numeric("letters", letters),
            ],
        ) {
            Err(_) => {}
            Ok(fit) => assert!(fit.vif.iter().all(|(_name, vif)| *vif > 1e6)),
        }
    }
}
