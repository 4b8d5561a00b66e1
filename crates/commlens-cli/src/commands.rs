use std::path::Path;

use anyhow::{Context, Result};
use commlens_model::Platform;
use commlens_stats::ShapOptions;
use commlens_transform::{compare_language_distributions, declared_language_counts};
use tracing::info_span;

use commlens_cli::analysis::{
    DEFAULT_FEATURES, DEFAULT_TARGET, PlatformSummary, attribute, compare, load_canonical,
    run_platform,
};
use commlens_cli::config::AnalysisConfig;
use commlens_cli::summary::{
    attribution_table, filtering_line, language_table, metrics_table, print_comparison,
};

use crate::cli::{AttributeArgs, CompareArgs, LanguagesArgs, RulesArgs};

/// Communities listed by `rules`.
const METRICS_ROWS: usize = 20;

pub fn run_compare(args: &CompareArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = AnalysisConfig::load(config_path)?;
    if let Some(method) = args.method {
        config.correlation_method = method.into();
    }
    if let Some(iterations) = args.iterations {
        config.bootstrap_iterations = iterations;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.override_servers.extend(&args.override_servers);
    config.keep_common_only |= args.common_only;

    let mastodon = run_platform(&args.mastodon, Platform::Mastodon, &config)?;
    let reddit = run_platform(&args.reddit, Platform::Reddit, &config)?;
    let report = compare(&mastodon, &reddit, &config);

    if args.json {
        let json = serde_json::to_string_pretty(&report).context("serialize report")?;
        println!("{json}");
    } else {
        print_comparison(&report);
    }
    Ok(())
}

pub fn run_rules(args: &RulesArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = AnalysisConfig::load(config_path)?;
    config.override_servers.extend(&args.override_servers);
    let run = run_platform(&args.csv, args.platform.into(), &config)?;

    println!("{}", filtering_line(&PlatformSummary::from(&run)));
    println!("{}", metrics_table(&run.output, METRICS_ROWS));
    Ok(())
}

pub fn run_languages(args: &LanguagesArgs, config_path: Option<&Path>) -> Result<()> {
    let config = AnalysisConfig::load(config_path)?;
    let mastodon = load_canonical(&args.mastodon, Platform::Mastodon, &config)?;
    let reddit = load_canonical(&args.reddit, Platform::Reddit, &config)?;

    let rows = compare_language_distributions(
        &declared_language_counts(&mastodon),
        &declared_language_counts(&reddit),
    );
    println!("{}", language_table(&rows));
    Ok(())
}

pub fn run_attribute(args: &AttributeArgs, config_path: Option<&Path>) -> Result<()> {
    let platform = Platform::from(args.platform);
    let span = info_span!("attribute", platform = %platform);
    let _guard = span.enter();

    let config = AnalysisConfig::load(config_path)?;
    let run = run_platform(&args.csv, platform, &config)?;

    let features: Vec<&str> = if args.features.is_empty() {
        DEFAULT_FEATURES.to_vec()
    } else {
        args.features.iter().map(String::as_str).collect()
    };
    let target = args.target.as_deref().unwrap_or(DEFAULT_TARGET);
    let interaction = match args.interaction.as_deref() {
        Some([first, second]) => Some((first.as_str(), second.as_str())),
        _ => None,
    };

    let mut options = ShapOptions {
        seed: args.seed.unwrap_or(config.seed),
        ..ShapOptions::default()
    };
    options.forest.seed = options.seed;
    if let Some(trees) = args.trees {
        options.forest.n_trees = trees;
    }

    let report = attribute(&run, &features, target, interaction, &options)?;
    println!(
        "{platform}: {target} explained on {} held-out communities (base value {:.3})",
        report.test_rows, report.base_value
    );
    println!("{}", attribution_table(&report));
    Ok(())
}
