//! Descriptive group summaries and classical two-group/association tests

use super::{LevelAccessor, Outcome};
use crate::table::WordRecord;
use anyhow::Context;
use statrs::distribution::{ChiSquared, ContinuousCDF, FisherSnedecor, StudentsT};
use std::collections::BTreeMap;

/// Per-level descriptive summary of an outcome
#[derive(Clone, Debug)]
pub struct GroupSummary {
    /// Factor level the summary describes
    pub level: String,

    /// Number of records carrying the level
    pub n: usize,

    /// Mean outcome within the level
    pub mean: f64,

    /// Sample standard deviation within the level (NaN below two records)
    pub sd: f64,
}

/// Group the outcome by a factor and summarize each level
///
/// Records missing either variable are skipped. Levels come out in sorted
/// order so that reports are deterministic.
pub fn group_summaries(
    records: &[&WordRecord],
    factor: impl Fn(&WordRecord) -> Option<String>,
    outcome: Outcome,
) -> Vec<GroupSummary> {
    let mut groups = BTreeMap::<String, Vec<f64>>::new();
    for record in records {
        if let (Some(level), Some(value)) = (factor(record), outcome(record)) {
            groups.entry(level).or_default().push(value);
        }
    }
    (groups.into_iter())
        .map(|(level, values)| GroupSummary {
            level,
            n: values.len(),
            mean: mean(&values),
            sd: sample_sd(&values),
        })
        .collect()
}

/// Outcome values of the records carrying one specific factor level
pub fn level_values(
    records: &[&WordRecord],
    factor: LevelAccessor,
    level: &str,
    outcome: Outcome,
) -> Vec<f64> {
    (records.iter())
        .filter(|record| factor(record) == Some(level))
        .filter_map(|record| outcome(record))
        .collect()
}

/// Result of a pooled-variance two-sample comparison
#[derive(Clone, Copy, Debug)]
pub struct TwoSampleComparison {
    /// Student's t statistic
    pub t_statistic: f64,

    /// Degrees of freedom (n1 + n2 - 2)
    pub df: usize,

    /// Two-sided p-value
    pub p_value: f64,

    /// Standardized mean difference against the pooled deviation
    pub cohens_d: f64,
}

/// Two-sample t-test under the equal-variance assumption, with effect size
pub fn pooled_t_test(a: &[f64], b: &[f64]) -> crate::Result<TwoSampleComparison> {
    anyhow::ensure!(
        a.len() >= 2 && b.len() >= 2,
        "both groups need at least two observations ({} and {} given)",
        a.len(),
        b.len()
    );
    let (n1, n2) = (a.len() as f64, b.len() as f64);
    let (m1, m2) = (mean(a), mean(b));
    let pooled_variance = ((n1 - 1.0) * sample_sd(a).powi(2) + (n2 - 1.0) * sample_sd(b).powi(2))
        / (n1 + n2 - 2.0);
    anyhow::ensure!(
        pooled_variance > 0.0,
        "both groups are constant, the comparison is degenerate"
    );
    let pooled_sd = pooled_variance.sqrt();
    let t_statistic = (m1 - m2) / (pooled_sd * (1.0 / n1 + 1.0 / n2).sqrt());
    let df = a.len() + b.len() - 2;
    let reference = StudentsT::new(0.0, 1.0, df as f64)
        .context("setting up the t reference distribution")?;
    Ok(TwoSampleComparison {
        t_statistic,
        df,
        p_value: 2.0 * (1.0 - reference.cdf(t_statistic.abs())),
        cohens_d: (m1 - m2) / pooled_sd,
    })
}

/// Result of a one-way analysis of variance
#[derive(Clone, Copy, Debug)]
pub struct OneWayAnova {
    /// F statistic
    pub f_statistic: f64,

    /// Between-group degrees of freedom
    pub df_between: usize,

    /// Within-group degrees of freedom
    pub df_within: usize,

    /// Upper tail probability of the F statistic
    pub p_value: f64,
}

/// One-way analysis of variance across the levels of a factor
pub fn one_way_anova(
    records: &[&WordRecord],
    factor: LevelAccessor,
    outcome: Outcome,
) -> crate::Result<OneWayAnova> {
    let mut groups = BTreeMap::<&str, Vec<f64>>::new();
    for record in records {
        if let (Some(level), Some(value)) = (factor(record), outcome(record)) {
            groups.entry(level).or_default().push(value);
        }
    }
    let k = groups.len();
    anyhow::ensure!(k >= 2, "analysis of variance needs at least two levels");
    let n: usize = groups.values().map(Vec::len).sum();
    anyhow::ensure!(n > k, "not enough observations for {k} levels");

    let grand_mean =
        groups.values().flatten().sum::<f64>() / n as f64;
    let ss_between: f64 = (groups.values())
        .map(|values| values.len() as f64 * (mean(values) - grand_mean).powi(2))
        .sum();
    let ss_within: f64 = (groups.values())
        .map(|values| {
            let group_mean = mean(values);
            values.iter().map(|v| (v - group_mean).powi(2)).sum::<f64>()
        })
        .sum();
    anyhow::ensure!(
        ss_within > 0.0,
        "no within-group variance, the comparison is degenerate"
    );

    let df_between = k - 1;
    let df_within = n - k;
    let f_statistic = (ss_between / df_between as f64) / (ss_within / df_within as f64);
    let reference = FisherSnedecor::new(df_between as f64, df_within as f64)
        .context("setting up the F reference distribution")?;
    Ok(OneWayAnova {
        f_statistic,
        df_between,
        df_within,
        p_value: 1.0 - reference.cdf(f_statistic),
    })
}

/// Result of a chi-square association test
#[derive(Clone, Copy, Debug)]
pub struct ChiSquareTest {
    /// Chi-square statistic
    pub statistic: f64,

    /// Degrees of freedom
    pub df: usize,

    /// Upper tail probability of the statistic
    pub p_value: f64,
}

/// Chi-square test of association between two categorical variables
pub fn chi_square(
    records: &[&WordRecord],
    rows: LevelAccessor,
    columns: LevelAccessor,
) -> crate::Result<ChiSquareTest> {
    // Contingency counts over records carrying both variables
    let mut counts = BTreeMap::<(&str, &str), f64>::new();
    let mut row_totals = BTreeMap::<&str, f64>::new();
    let mut column_totals = BTreeMap::<&str, f64>::new();
    let mut total = 0.0;
    for record in records {
        if let (Some(row), Some(column)) = (rows(record), columns(record)) {
            *counts.entry((row, column)).or_insert(0.0) += 1.0;
            *row_totals.entry(row).or_insert(0.0) += 1.0;
            *column_totals.entry(column).or_insert(0.0) += 1.0;
            total += 1.0;
        }
    }
    anyhow::ensure!(
        row_totals.len() >= 2 && column_totals.len() >= 2,
        "association needs at least two levels on each side ({}x{} given)",
        row_totals.len(),
        column_totals.len()
    );

    let mut statistic = 0.0;
    for (row, row_total) in &row_totals {
        for (column, column_total) in &column_totals {
            let expected = row_total * column_total / total;
            let observed = counts.get(&(*row, *column)).copied().unwrap_or(0.0);
            statistic += (observed - expected).powi(2) / expected;
        }
    }
    let df = (row_totals.len() - 1) * (column_totals.len() - 1);
    let reference =
        ChiSquared::new(df as f64).context("setting up the chi-square reference distribution")?;
    Ok(ChiSquareTest {
        statistic,
        df,
        p_value: 1.0 - reference.cdf(statistic),
    })
}

/// Arithmetic mean
fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation, NaN below two observations
fn sample_sd(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    ((values.iter()).map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pooled_t_test_matches_hand_computation() {
        // Two groups with means 2 and 4, pooled variance 1
        let a = [1.0, 2.0, 3.0];
        let b = [3.0, 4.0, 5.0];
        let result = pooled_t_test(&a, &b).unwrap();
        assert_eq!(result.df, 4);
        // t = (2 - 4) / (1 * sqrt(1/3 + 1/3))
        assert!((result.t_statistic - (-2.0 / (2.0f64 / 3.0).sqrt())).abs() < 1e-9);
        assert!((result.cohens_d - (-2.0)).abs() < 1e-9);
        assert!(result.p_value > 0.0 && result.p_value < 1.0);
    }

    #[test]
    fn degenerate_groups_are_rejected() {
        assert!(pooled_t_test(&[1.0], &[2.0, 3.0]).is_err());
        assert!(pooled_t_test(&[1.0, 1.0], &[2.0, 2.0]).is_err());
    }

    #[test]
    fn sample_sd_conventions() {
        assert!(sample_sd(&[1.0]).is_nan());
        assert!((sample_sd(&[1.0, 3.0]) - (2.0f64).sqrt()).abs() < 1e-9);
    }
}
