//! Writing of the analysis report tables
//!
//! Five TSV tables land in the output directory: a dump of the joined
//! working table, per-group outcome summaries, test statistics, fitted
//! model coefficients, and the unique variance contributions of the
//! combined model. Plot rendering is out of scope; these tables hold the
//! finalized per-group values a renderer needs.

use crate::{
    analysis::AnalysisReport,
    config::Config,
    table::{Feature, WordTable},
    Result,
};
use anyhow::Context;
use csv_async::{AsyncSerializer, AsyncWriterBuilder};
use serde::Serialize;
use tokio::fs::{self, File};

/// One row of the group summary table
#[derive(Debug, Serialize)]
struct GroupRow<'a> {
    analysis: &'a str,
    dataset: &'a str,
    level: &'a str,
    n: usize,
    mean: f64,
    sd: f64,
}

/// One row of the statistics table
#[derive(Debug, Serialize)]
struct StatRow<'a> {
    analysis: &'a str,
    dataset: &'a str,
    statistic: &'a str,
    value: f64,
    p_value: Option<f64>,
}

/// One row of the model coefficient table
#[derive(Debug, Serialize)]
struct CoefficientRow<'a> {
    analysis: &'a str,
    dataset: &'a str,
    coefficient: &'a str,
    estimate: f64,
}

/// One row of the variance partition table
#[derive(Debug, Serialize)]
struct PartitionRow<'a> {
    dataset: &'a str,
    predictor: &'a str,
    unique_r_squared: f64,
}

/// One row of the joined feature table dump
#[derive(Debug, Serialize)]
struct FeatureRow<'a> {
    word: &'a str,
    concreteness_mean: f64,
    concreteness_sd: f64,
    percent_known: f64,
    pos_dominant: Option<&'a str>,
    pos_all: Option<String>,
    pos_dominance_fraction: Option<f64>,
    letters: Option<u32>,
    phonemes: Option<u32>,
    morpheme_count: Option<u32>,
    etymology_raw: Option<&'a str>,
    etymology_group: Option<&'static str>,
    etymology_simplified: Option<&'static str>,
    etymology_frequency_class: Option<&'static str>,
    morph_parse: Option<&'a str>,
    suffix_label: Option<&'static str>,
    has_suffix: Option<&'static str>,
    suffix_or_monomorphemic: Option<&'static str>,
    is_compound: bool,
    mass_count_class: Option<&'static str>,
    pos_with_noun_split: Option<&'a str>,
}

/// Dump the joined working table itself, one row per lemma
///
/// The dump keeps the distinction between a feature that is unknown (empty
/// cell) and one that a derivation rule declares undefined ("not
/// applicable").
pub async fn write_word_table(config: &Config, table: &WordTable) -> Result<()> {
    fs::create_dir_all(&config.output_dir)
        .await
        .context("setting up the output directory")?;
    let mut writer = serializer(config, "word_features.tsv").await?;
    for record in table.records() {
        writer
            .serialize(FeatureRow {
                word: &record.word,
                concreteness_mean: record.concreteness_mean,
                concreteness_sd: record.concreteness_sd,
                percent_known: record.percent_known,
                pos_dominant: record.pos_dominant.as_deref(),
                pos_all: (record.pos_all.as_deref())
                    .map(|tags| tags.join(".")),
                pos_dominance_fraction: record.pos_dominance_fraction,
                letters: record.letters,
                phonemes: record.phonemes,
                morpheme_count: record.morpheme_count,
                etymology_raw: record.etymology_raw.as_deref(),
                etymology_group: record.etymology_group.map(|group| group.as_str()),
                etymology_simplified: record.etymology_simplified.map(|group| group.as_str()),
                etymology_frequency_class: (record.etymology_frequency_class)
                    .map(|class| class.as_str()),
                morph_parse: record.morph_parse.as_deref(),
                suffix_label: record.suffix_label,
                has_suffix: feature_label(&record.has_suffix, |presence| presence.as_str()),
                suffix_or_monomorphemic: record.suffix_or_monomorphemic,
                is_compound: record.is_compound,
                mass_count_class: feature_label(&record.mass_count_class, |class| {
                    class.as_str()
                }),
                pos_with_noun_split: record.pos_with_noun_split.as_deref(),
            })
            .await
            .context("writing a feature row")?;
    }
    writer.flush().await.context("closing the feature table")?;
    Ok(())
}

/// Reportable label of a three-state feature
fn feature_label<T>(
    feature: &Feature<T>,
    label: impl Fn(&T) -> &'static str,
) -> Option<&'static str> {
    match feature {
        Feature::Known(value) => Some(label(value)),
        Feature::Unknown => None,
        Feature::NotApplicable => Some("not applicable"),
    }
}

/// Write every report table to the output directory
pub async fn write_reports(config: &Config, reports: &[AnalysisReport]) -> Result<()> {
    fs::create_dir_all(&config.output_dir)
        .await
        .context("setting up the output directory")?;

    let mut groups = serializer(config, "group_summaries.tsv").await?;
    let mut stats = serializer(config, "statistics.tsv").await?;
    let mut coefficients = serializer(config, "model_fits.tsv").await?;
    let mut partition = serializer(config, "variance_partition.tsv").await?;

    for report in reports {
        for group in &report.groups {
            groups
                .serialize(GroupRow {
                    analysis: report.analysis,
                    dataset: report.view,
                    level: &group.level,
                    n: group.n,
                    mean: group.mean,
                    sd: group.sd,
                })
                .await
                .context("writing a group summary row")?;
        }
        for line in &report.stats {
            stats
                .serialize(StatRow {
                    analysis: report.analysis,
                    dataset: report.view,
                    statistic: &line.statistic,
                    value: line.value,
                    p_value: line.p_value,
                })
                .await
                .context("writing a statistic row")?;
        }
        for coefficient in &report.coefficients {
            coefficients
                .serialize(CoefficientRow {
                    analysis: report.analysis,
                    dataset: report.view,
                    coefficient: &coefficient.name,
                    estimate: coefficient.estimate,
                })
                .await
                .context("writing a coefficient row")?;
        }
        for contribution in &report.partition {
            partition
                .serialize(PartitionRow {
                    dataset: report.view,
                    predictor: contribution.term,
                    unique_r_squared: contribution.unique_r_squared,
                })
                .await
                .context("writing a variance partition row")?;
        }
    }

    for writer in [&mut groups, &mut stats, &mut coefficients, &mut partition] {
        writer.flush().await.context("closing a report table")?;
    }
    log::info!(
        "Wrote {} analysis reports to {:?}",
        reports.len(),
        config.output_dir
    );
    Ok(())
}

/// Open one report table for writing
async fn serializer(config: &Config, file_name: &str) -> Result<AsyncSerializer<File>> {
    let path = config.report_path(file_name);
    let file = File::create(&path)
        .await
        .with_context(|| format!("creating the report table {file_name}"))?;
    Ok(AsyncWriterBuilder::new()
        .delimiter(b'\t')
        .create_serializer(file))
}
