//! The linguistic-factor analyses
//!
//! Every analysis follows the same shape: optionally restrict the view,
//! summarize the outcome per factor level, then run the factor-appropriate
//! test (pooled t-test with effect size for binary factors, analysis of
//! variance plus a linear model for wider factors, regression for numeric
//! predictors). Each analysis runs once per dataset view with identical
//! logic, and a failing analysis is logged and skipped without aborting the
//! remaining ones.

use crate::{
    model::{
        self,
        compare::{self, GroupSummary},
        glm, Coefficient, Term,
    },
    partition::{self, Contribution},
    progress::{ProgressReport, Work},
    table::{
        rules::EtymologyGroup, FrequencyClass, TableView, WordRecord,
    },
    Result,
};

/// One reported statistic of an analysis
#[derive(Clone, Debug)]
pub struct StatLine {
    /// Name of the statistic, e.g. "t" or "unique R²: morpheme count"
    pub statistic: String,

    /// Value of the statistic
    pub value: f64,

    /// Significance, where the statistic has one
    pub p_value: Option<f64>,
}
//
impl StatLine {
    /// Statistic without an associated significance level
    fn plain(statistic: impl Into<String>, value: f64) -> Self {
        Self {
            statistic: statistic.into(),
            value,
            p_value: None,
        }
    }

    /// Statistic with an associated significance level
    fn tested(statistic: impl Into<String>, value: f64, p_value: f64) -> Self {
        Self {
            statistic: statistic.into(),
            value,
            p_value: Some(p_value),
        }
    }
}

/// Everything one analysis produced on one dataset view
///
/// These are the finalized values that the report tables (and from there any
/// plot renderer) consume.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    /// Name of the analysis
    pub analysis: &'static str,

    /// Label of the dataset view the analysis ran on
    pub view: &'static str,

    /// Per-level outcome summaries
    pub groups: Vec<GroupSummary>,

    /// Test statistics and model summaries
    pub stats: Vec<StatLine>,

    /// Fitted model coefficients, where the analysis fits a model
    pub coefficients: Vec<Coefficient>,

    /// Unique variance contributions, for the combined analysis
    pub partition: Vec<Contribution>,
}

/// The fixed sequence of analyses
const ANALYSES: &[(&str, fn(&TableView) -> Result<AnalysisReport>)] = &[
    ("part of speech", pos_analysis),
    ("morpheme count", morpheme_analysis),
    ("compounding", compound_analysis),
    ("suffixation", suffix_analysis),
    ("etymology", etymology_analysis),
    ("countability", mass_count_analysis),
    ("combined model", combined_analysis),
];

/// Run every analysis on both dataset views
///
/// A failing analysis is reported and skipped; only its results are missing
/// from the output.
pub fn run_all(
    full: &TableView,
    low_variability: &TableView,
    progress: &ProgressReport,
) -> Vec<AnalysisReport> {
    let tracker = progress.add("Running analyses", Work::Steps(ANALYSES.len() * 2));
    let mut reports = Vec::with_capacity(ANALYSES.len() * 2);
    for view in [full, low_variability] {
        for (name, run) in ANALYSES {
            match run(view) {
                Ok(report) => reports.push(report),
                Err(error) => log::error!(
                    "Analysis {name:?} failed on the {:?} dataset: {error:#}",
                    view.label
                ),
            }
            tracker.make_progress(1);
        }
    }
    reports
}

// Accessors shared by the analyses below

fn concreteness(record: &WordRecord) -> Option<f64> {
    Some(record.concreteness_mean)
}

fn morphemes(record: &WordRecord) -> Option<f64> {
    record.morpheme_count.map(f64::from)
}

fn pos_dominant(record: &WordRecord) -> Option<&str> {
    record.pos_dominant.as_deref()
}

fn pos_with_noun_split(record: &WordRecord) -> Option<&str> {
    record.pos_with_noun_split.as_deref()
}

fn etymology_group(record: &WordRecord) -> Option<&str> {
    record.etymology_group.map(EtymologyGroup::as_str)
}

fn etymology_simplified(record: &WordRecord) -> Option<&str> {
    record.etymology_simplified.map(EtymologyGroup::as_str)
}

fn etymology_frequency(record: &WordRecord) -> Option<&str> {
    record.etymology_frequency_class.map(FrequencyClass::as_str)
}

fn compound_level(record: &WordRecord) -> Option<&str> {
    Some(record.compound_level())
}

fn has_suffix_level(record: &WordRecord) -> Option<&str> {
    record.has_suffix.known().map(|presence| presence.as_str())
}

fn suffix_or_monomorphemic(record: &WordRecord) -> Option<&str> {
    record.suffix_or_monomorphemic
}

fn mass_count_level(record: &WordRecord) -> Option<&str> {
    record.mass_count_class.known().map(|class| class.as_str())
}

/// Adapt a level accessor to the owning interface of the group summaries
fn owned(accessor: model::LevelAccessor) -> impl Fn(&WordRecord) -> Option<String> {
    move |record: &WordRecord| accessor(record).map(str::to_owned)
}

/// Pooled two-group comparison reported as statistic lines
fn two_group_stats(
    records: &[&WordRecord],
    factor: model::LevelAccessor,
    first: &str,
    second: &str,
) -> Result<Vec<StatLine>> {
    let a = compare::level_values(records, factor, first, concreteness);
    let b = compare::level_values(records, factor, second, concreteness);
    let test = compare::pooled_t_test(&a, &b)?;
    Ok(vec![
        StatLine::tested("t", test.t_statistic, test.p_value),
        StatLine::plain("df", test.df as f64),
        StatLine::plain("Cohen's d", test.cohens_d),
    ])
}

/// Concreteness by collapsed part of speech
fn pos_analysis(view: &TableView) -> Result<AnalysisReport> {
    let records = &view.records;
    let groups = compare::group_summaries(records, owned(pos_dominant), concreteness);
    let anova = compare::one_way_anova(records, pos_dominant, concreteness)?;
    let fit = model::fit_linear(
        records,
        concreteness,
        &[Term::categorical("part of speech", pos_dominant)],
    )?;
    Ok(AnalysisReport {
        analysis: "part of speech",
        view: view.label,
        groups,
        stats: vec![
            StatLine::tested("F", anova.f_statistic, anova.p_value),
            StatLine::plain("df between", anova.df_between as f64),
            StatLine::plain("df within", anova.df_within as f64),
            StatLine::plain("R²", fit.r_squared),
            StatLine::plain("n", fit.n_used as f64),
        ],
        coefficients: fit.coefficients,
        partition: Vec::new(),
    })
}

/// Concreteness by morpheme count, restricted to non-compounds
///
/// Compounds carry the morphology of two content words at once, so they are
/// set aside here and analyzed separately.
fn morpheme_analysis(view: &TableView) -> Result<AnalysisReport> {
    let restricted = view.retain(view.label, |record| !record.is_compound);
    let records = &restricted.records;
    let groups = compare::group_summaries(
        records,
        |record: &WordRecord| record.morpheme_count.map(|count| count.to_string()),
        concreteness,
    );
    let fit = model::fit_linear(
        records,
        concreteness,
        &[Term::numeric("morpheme count", morphemes)],
    )?;
    let slope = fit.anova[0].clone();
    Ok(AnalysisReport {
        analysis: "morpheme count",
        view: view.label,
        groups,
        stats: vec![
            StatLine::plain("R²", fit.r_squared),
            StatLine::tested("F", slope.f_statistic, slope.p_value),
            StatLine::plain("n", fit.n_used as f64),
        ],
        coefficients: fit.coefficients,
        partition: Vec::new(),
    })
}

/// Concreteness of compounds against non-compounds
fn compound_analysis(view: &TableView) -> Result<AnalysisReport> {
    let records = &view.records;
    let groups = compare::group_summaries(records, owned(compound_level), concreteness);
    let stats = two_group_stats(records, compound_level, "compound", "not compound")?;
    Ok(AnalysisReport {
        analysis: "compounding",
        view: view.label,
        groups,
        stats,
        coefficients: Vec::new(),
        partition: Vec::new(),
    })
}

/// Concreteness by derivational suffix status
///
/// Suffix presence is only defined up to bimorphemic words, so the two-group
/// comparison is implicitly restricted to them; the wider factor with one
/// level per suffix (plus "monomorphemic") gets an analysis of variance.
fn suffix_analysis(view: &TableView) -> Result<AnalysisReport> {
    let records = &view.records;
    let groups = compare::group_summaries(records, owned(suffix_or_monomorphemic), concreteness);
    let mut stats = two_group_stats(records, has_suffix_level, "has suffix", "no suffix")?;
    let anova = compare::one_way_anova(records, suffix_or_monomorphemic, concreteness)?;
    stats.push(StatLine::tested(
        "F (suffix or monomorphemic)",
        anova.f_statistic,
        anova.p_value,
    ));
    Ok(AnalysisReport {
        analysis: "suffixation",
        view: view.label,
        groups,
        stats,
        coefficients: Vec::new(),
        partition: Vec::new(),
    })
}

/// Concreteness by etymological origin
///
/// Reports the four-way origin groups descriptively, compares the simplified
/// French/Other contrast, checks the association of origin with part of
/// speech and of label frequency with suffixation, and models morpheme
/// counts on origin with a log-link Poisson regression.
fn etymology_analysis(view: &TableView) -> Result<AnalysisReport> {
    let records = &view.records;
    let groups = compare::group_summaries(records, owned(etymology_group), concreteness);
    let mut stats = two_group_stats(records, etymology_simplified, "French", "Other")?;

    let anova = compare::one_way_anova(records, etymology_group, concreteness)?;
    stats.push(StatLine::tested(
        "F (origin groups)",
        anova.f_statistic,
        anova.p_value,
    ));

    let pos_association = compare::chi_square(records, etymology_simplified, pos_dominant)?;
    stats.push(StatLine::tested(
        "χ² (origin × part of speech)",
        pos_association.statistic,
        pos_association.p_value,
    ));
    stats.push(StatLine::plain(
        "χ² df (origin × part of speech)",
        pos_association.df as f64,
    ));
    let suffix_association = compare::chi_square(records, etymology_frequency, has_suffix_level)?;
    stats.push(StatLine::tested(
        "χ² (label frequency × suffix)",
        suffix_association.statistic,
        suffix_association.p_value,
    ));
    stats.push(StatLine::plain(
        "χ² df (label frequency × suffix)",
        suffix_association.df as f64,
    ));

    let poisson = glm::fit_poisson(
        records,
        morphemes,
        &[Term::categorical("etymology (simplified)", etymology_simplified)],
    )?;
    stats.push(StatLine::plain("Poisson deviance", poisson.deviance));
    stats.push(StatLine::plain(
        "Poisson null deviance",
        poisson.null_deviance,
    ));
    stats.push(StatLine::plain("Poisson n", poisson.n_used as f64));

    Ok(AnalysisReport {
        analysis: "etymology",
        view: view.label,
        groups,
        stats,
        coefficients: poisson.coefficients,
        partition: Vec::new(),
    })
}

/// Concreteness of mass nouns against count nouns
fn mass_count_analysis(view: &TableView) -> Result<AnalysisReport> {
    let nouns = view.retain(view.label, |record| {
        record.pos_dominant.as_deref() == Some("Noun")
    });
    let records = &nouns.records;
    let groups = compare::group_summaries(records, owned(mass_count_level), concreteness);
    let stats = two_group_stats(records, mass_count_level, "mass", "count")?;
    Ok(AnalysisReport {
        analysis: "countability",
        view: view.label,
        groups,
        stats,
        coefficients: Vec::new(),
        partition: Vec::new(),
    })
}

/// The predictors of the combined model, in declared order
fn combined_terms() -> [Term; 3] {
    [
        Term::categorical("part of speech (noun split)", pos_with_noun_split),
        Term::numeric("morpheme count", morphemes),
        Term::categorical("etymology (simplified)", etymology_simplified),
    ]
}

/// Simultaneous model of concreteness on all retained predictors
///
/// Reports the overall fit, per-term significance, collinearity diagnostics,
/// and the unique variance contribution of every predictor.
fn combined_analysis(view: &TableView) -> Result<AnalysisReport> {
    let records = &view.records;
    let terms = combined_terms();
    let fit = model::fit_linear(records, concreteness, &terms)?;
    let mut stats = vec![
        StatLine::plain("R²", fit.r_squared),
        StatLine::plain("n", fit.n_used as f64),
    ];
    for row in &fit.anova {
        stats.push(StatLine::tested(
            format!("F: {}", row.term),
            row.f_statistic,
            row.p_value,
        ));
        stats.push(StatLine::plain(
            format!("SS: {}", row.term),
            row.sum_squares,
        ));
        stats.push(StatLine::plain(format!("df: {}", row.term), row.df as f64));
    }
    for (column, inflation) in &fit.vif {
        if *inflation > 10.0 {
            log::warn!(
                "High collinearity in the combined model on the {:?} dataset: \
                 VIF of {column} is {inflation:.1}",
                view.label
            );
        }
        stats.push(StatLine::plain(format!("VIF: {column}"), *inflation));
    }
    let partition = partition::unique_contributions(records, concreteness, &terms)?;
    Ok(AnalysisReport {
        analysis: "combined model",
        view: view.label,
        groups: Vec::new(),
        stats,
        coefficients: fit.coefficients,
        partition,
    })
}
