//! End-to-end checks of the whole pipeline over a small fixture directory

use crate::{
    analysis,
    config::Config,
    filter,
    lemma::{self, EnglishLemmatizer},
    progress::ProgressReport,
    report,
    table::{builder::TableBuilder, rules::EtymologyGroup, Feature, WordTable},
    tsv,
};
use std::sync::Arc;
use tempfile::TempDir;
use tokio::io::AsyncWriteExt;

/// Write one fixture resource, gzipping it when the name ends in .gz
async fn write_resource(dir: &TempDir, file_name: &str, contents: &str) {
    let path = dir.path().join(file_name);
    if file_name.ends_with(".gz") {
        let file = tokio::fs::File::create(&path).await.unwrap();
        let mut encoder = async_compression::tokio::write::GzipEncoder::new(file);
        encoder.write_all(contents.as_bytes()).await.unwrap();
        encoder.shutdown().await.unwrap();
    } else {
        tokio::fs::write(&path, contents).await.unwrap();
    }
}

/// Lay down the complete fixture input directory
async fn write_fixtures(dir: &TempDir) {
    write_resource(
        dir,
        "concreteness.tsv",
        "Word\tConc.M\tConc.SD\tPercent_known\n\
         the\t1.5\t0.4\t1.0\n\
         castle\t4.8\t0.5\t1.0\n\
         mud\t4.6\t0.6\t0.99\n\
         house\t4.9\t0.3\t1.0\n\
         firefly\t4.7\t0.7\t1.0\n\
         kindness\t2.2\t1.1\t0.99\n\
         carelessness\t2.0\t1.2\t0.97\n\
         walk\t3.5\t0.9\t1.0\n\
         justice\t1.8\t1.3\t0.96\n\
         zibzab\t3.0\t1.0\t0.50\n\
         cats\t4.9\t0.2\t1.0\n\
         cat\t4.8\t0.25\t1.0\n\
         smallest\t2.5\t0.8\t1.0\n\
         happiness\t2.1\t1.0\t1.0\n\
         snow\t4.8\t0.45\t1.0\n\
         mirror\t4.6\t0.55\t1.0\n",
    )
    .await;
    write_resource(
        dir,
        "pos_frequency.tsv",
        "Word\tDominant_PoS\tAll_PoS\tPercentage_dominant\n\
         the\tDeterminer\tDeterminer\t1.0\n\
         castle\tNoun\tNoun\t0.98\n\
         mud\tNoun\tNoun\t0.97\n\
         house\tNoun\tNoun.Verb\t0.92\n\
         firefly\tNoun\tNoun\t1.0\n\
         kindness\tNoun\tNoun\t1.0\n\
         carelessness\tNoun\tNoun\t1.0\n\
         walk\tVerb\tVerb.Noun\t0.6\n\
         justice\tNoun\tNoun\t1.0\n\
         zibzab\tNoun\tNoun\t1.0\n\
         cat\tNoun\tNoun\t0.99\n\
         smallest\tAdjective\tAdjective\t1.0\n\
         happiness\tNoun\tNoun\t1.0\n\
         snow\tNoun\tNoun.Verb\t0.95\n\
         mirror\tNoun\tNoun.Verb\t0.93\n",
    )
    .await;
    write_resource(
        dir,
        "lexicon.tsv",
        "Word\tPoS\tLength\tNPhon\tNMorph\n\
         the\tDeterminer\t3\t2\t1\n\
         castle\tNoun\t6\t5\t1\n\
         mud\tNoun\t3\t3\t1\n\
         house\tNoun\t5\t4\t1\n\
         firefly\tNoun\t7\t6\t2\n\
         kindness\tNoun\t8\t7\t2\n\
         carelessness\tNoun\t12\t10\t3\n\
         walk\tVerb\t4\t3\t1\n\
         justice\tNoun\t7\t6\t2\n\
         cat\tNoun\t3\t3\t1\n\
         smallest\tAdjective\t8\t7\t2\n\
         happiness\tNoun\t9\t8\t2\n\
         snow\tNoun\t4\t3\t1\n\
         mirror\tNoun\t6\t5\t1\n",
    )
    .await;
    write_resource(
        dir,
        "countability.tsv",
        "Lemma\tCountable\tUncountable\tBipartite\tPluralOnly\n\
         castle\t5\t0\t0\t0\n\
         mud\t0\t4\t0\t0\n\
         house\t9\t0\t0\t0\n\
         cat\t7\t0\t0\t0\n\
         snow\t0\t6\t0\t0\n\
         justice\t1\t1\t0\t0\n",
    )
    .await;
    write_resource(
        dir,
        "etymology.tsv",
        "Word\tOrigin\n\
         castle\tOld French\n\
         mud\tOld English\n\
         house\tOld English\n\
         walk\tOld English\n\
         cat\tOld Norse\n\
         kindness\tOld English\n\
         happiness\tOld English\n\
         justice\tLatin\n\
         snow\tOld English\n\
         mirror\tOld French\n",
    )
    .await;
    write_resource(
        dir,
        "suffixed.tsv",
        "Word\tParse\n\
         kindness\t{(kind)>ness>}\n\
         carelessness\t{(care)>less>ness>}\n\
         happiness\t{(happ>y)>ness>}\n",
    )
    .await;
    // The unsuffixed list doubles as the gzip decoding check
    write_resource(
        dir,
        "unsuffixed.tsv.gz",
        "Word\tParse\n\
         walk\t{(walk)}\n\
         castle\t{(castle)}\n\
         mud\t{(mud)}\n\
         house\t{(house)}\n\
         cat\t{(cat)}\n\
         justice\t{(justice)}\n\
         snow\t{(snow)}\n\
         mirror\t{(mirror)}\n",
    )
    .await;
    write_resource(dir, "compounds_a.txt", "bookcase\n").await;
    write_resource(dir, "compounds_b.txt", "firefly\n").await;
    write_resource(dir, "compounds_c.txt", "doghouse\n").await;
}

/// Run the pipeline up to the built table
async fn build_table(config: &Arc<Config>) -> WordTable {
    let progress = ProgressReport::new();
    let resources = tsv::load_resources(config.clone(), &progress).await.unwrap();
    let norms = lemma::normalize(resources.norms.clone(), &EnglishLemmatizer::new(), config);
    TableBuilder::new(config.clone(), &resources).build(norms, &progress)
}

fn fixture_config(input: &TempDir, output: &TempDir) -> Arc<Config> {
    Arc::new(Config {
        input_dir: input.path().into(),
        output_dir: output.path().into(),
        etymology_cutoff: 2,
        ..Config::default()
    })
}

#[tokio::test]
async fn missing_resources_are_fatal_and_named() {
    let input = TempDir::new().unwrap();
    let config = Arc::new(Config {
        input_dir: input.path().into(),
        ..Config::default()
    });
    let error = tsv::load_resources(config, &ProgressReport::new())
        .await
        .unwrap_err();
    assert!(
        format!("{error:#}").contains("required resource"),
        "error: {error:#}"
    );
}

#[tokio::test]
async fn joining_applies_every_collapsing_rule() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixtures(&input).await;
    let config = fixture_config(&input, &output);
    let table = build_table(&config).await;

    // The duplicate "cat" surface form was dropped in favor of the earlier
    // "cats" row, whose lemma arrived first
    assert_eq!(table.len(), 15);
    let record = |word: &str| {
        (table.records().iter())
            .find(|record| &*record.word == word)
            .unwrap_or_else(|| panic!("no record for {word:?}"))
    };
    assert_eq!(record("cat").concreteness_mean, 4.9);

    // Function-word collapsing
    assert_eq!(record("the").pos_dominant.as_deref(), Some("Function"));

    // Etymology collapsing, both passes
    assert_eq!(
        record("castle").etymology_group,
        Some(EtymologyGroup::French)
    );
    assert_eq!(
        record("mud").etymology_group,
        Some(EtymologyGroup::English)
    );
    assert_eq!(
        record("mud").etymology_simplified,
        Some(EtymologyGroup::Other)
    );
    assert_eq!(
        record("justice").etymology_simplified,
        Some(EtymologyGroup::French)
    );

    // Compound membership is the union of the lists
    assert!(record("firefly").is_compound);
    assert!(!record("house").is_compound);

    // Suffix presence is forced undefined beyond two morphemes
    assert_eq!(record("carelessness").suffix_label, Some("-ness"));
    assert_eq!(record("carelessness").has_suffix, Feature::NotApplicable);
    assert!(record("kindness").has_suffix.known().is_some());

    // Countability: exclusive classes only, mixed usage stays unlabeled
    assert_eq!(
        record("castle").pos_with_noun_split.as_deref(),
        Some("count noun")
    );
    assert_eq!(
        record("mud").pos_with_noun_split.as_deref(),
        Some("mass noun")
    );
    assert_eq!(record("justice").mass_count_class, Feature::NotApplicable);
    assert_eq!(
        record("justice").pos_with_noun_split.as_deref(),
        Some("Noun")
    );
    assert_eq!(record("firefly").mass_count_class, Feature::Unknown);

    // Lemmatization exception: superlative-looking words keep their form
    assert!(table.records().iter().any(|r| &*r.word == "smallest"));
}

#[tokio::test]
async fn filtering_and_analyses_run_end_to_end() {
    let input = TempDir::new().unwrap();
    let output = TempDir::new().unwrap();
    write_fixtures(&input).await;
    let config = fixture_config(&input, &output);
    let table = build_table(&config).await;

    // Knowledge threshold: exclusion and retention counts add up
    let full = filter::quality_filter(&table, &config);
    assert_eq!(full.len(), 14);
    assert_eq!(table.len() - full.len(), 1);
    assert!(full.records.iter().all(|r| r.percent_known > 0.95));

    // Strict median split over the 14 retained rating SDs
    let low_variability = filter::low_variability(&full);
    assert_eq!(low_variability.len(), 7);
    assert!(low_variability
        .records
        .iter()
        .all(|r| r.concreteness_sd < 0.65));

    let progress = ProgressReport::new();
    let reports = analysis::run_all(&full, &low_variability, &progress);

    // The compound list has a single member here, so that comparison is
    // degenerate and must be skipped without taking down the run
    assert!(!reports.iter().any(|r| r.analysis == "compounding"));
    let find = |analysis: &str, view: &str| {
        (reports.iter()).find(|r| r.analysis == analysis && r.view == view)
    };
    assert!(find("part of speech", "full").is_some());
    assert!(find("morpheme count", "full").is_some());
    assert!(find("suffixation", "full").is_some());
    assert!(find("etymology", "full").is_some());
    assert!(find("countability", "full").is_some());

    // The combined model reports one ordered contribution per predictor,
    // each bounded by the full model's R²
    let combined = find("combined model", "full").unwrap();
    let r_squared = (combined.stats.iter())
        .find(|line| line.statistic == "R²")
        .unwrap()
        .value;
    assert_eq!(combined.partition.len(), 3);
    assert_eq!(combined.partition[0].term, "part of speech (noun split)");
    assert_eq!(combined.partition[1].term, "morpheme count");
    assert_eq!(combined.partition[2].term, "etymology (simplified)");
    for contribution in &combined.partition {
        assert!(contribution.unique_r_squared <= r_squared + 1e-12);
        assert!(contribution.unique_r_squared >= -1e-9);
    }

    // Report tables land in the output directory with stable headers
    report::write_word_table(&config, &table).await.unwrap();
    report::write_reports(&config, &reports).await.unwrap();
    let features = tokio::fs::read_to_string(output.path().join("word_features.tsv"))
        .await
        .unwrap();
    assert!(features.starts_with("word\t"));
    // Unknown and rule-undefined cells stay distinguishable in the dump
    let careless = (features.lines())
        .find(|line| line.starts_with("carelessness\t"))
        .unwrap();
    assert!(careless.contains("not applicable"));
    let summaries = tokio::fs::read_to_string(output.path().join("group_summaries.tsv"))
        .await
        .unwrap();
    assert!(summaries.starts_with("analysis\tdataset\tlevel\tn\tmean\tsd\n"));
    let partition = tokio::fs::read_to_string(output.path().join("variance_partition.tsv"))
        .await
        .unwrap();
    assert!(partition.contains("morpheme count"));
}
