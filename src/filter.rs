//! Data-quality and variance-based subsetting of the working table
//!
//! Both subsets are borrowed views: the records themselves are shared with
//! the full table and are never copied or mutated.

use crate::{
    config::Config,
    table::{TableView, WordTable},
};

/// Retain the words that enough raters knew
///
/// Exclusion counts are logged so that reports can state how much data the
/// quality threshold removed.
pub fn quality_filter<'table>(table: &'table WordTable, config: &Config) -> TableView<'table> {
    let view = TableView::whole("full", table)
        .retain("full", |record| record.percent_known > config.min_known);
    let excluded = table.len() - view.len();
    log::info!(
        "Excluded {excluded} of {} words at or below the {:.0}% knowledge threshold \
         ({:.1}% of the table)",
        table.len(),
        config.min_known * 100.0,
        excluded as f64 / table.len().max(1) as f64 * 100.0,
    );
    view
}

/// Retain the words whose rating variability lies below the median
///
/// The split is strict: words whose rating SD ties the median are excluded
/// from the subset, matching quantile semantics at the 50th percentile.
pub fn low_variability<'table>(view: &TableView<'table>) -> TableView<'table> {
    let cutoff = median(
        (view.records.iter())
            .map(|record| record.concreteness_sd)
            .collect(),
    );
    let subset = view.retain("low-variability", |record| {
        record.concreteness_sd < cutoff
    });
    log::info!(
        "Low-variability subset keeps {} of {} words (rating SD < {cutoff:.3})",
        subset.len(),
        view.len(),
    );
    subset
}

/// Median with the usual mean-of-central-pair convention for even sizes
fn median(mut values: Vec<f64>) -> f64 {
    values.sort_unstable_by(|a, b| a.total_cmp(b));
    let n = values.len();
    if n == 0 {
        return f64::NAN;
    }
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}
