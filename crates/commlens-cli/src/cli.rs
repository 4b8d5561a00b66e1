//! CLI argument definitions for commlens.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use commlens_model::Platform;
use commlens_stats::CorrelationMethod;

#[derive(Parser)]
#[command(
    name = "commlens",
    version,
    about = "Compare rule-making across Mastodon and Reddit communities",
    long_about = "Normalize Mastodon instance and Reddit community exports, keep the \
                  English rules, and compare how rule counts relate to community size.\n\n\
                  Reports correlations, a Fisher z-test, a bootstrap test and a Welch \
                  t-test on rule counts."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Analysis settings (TOML). Flags override values from the file.
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run both platforms through the pipeline and compare them.
    Compare(CompareArgs),

    /// Show English filtering counts and per-community rule metrics.
    Rules(RulesArgs),

    /// Show declared language distributions side by side.
    Languages(LanguagesArgs),

    /// Rank community features by SHAP attribution to a target metric.
    Attribute(AttributeArgs),
}

#[derive(Parser)]
pub struct CompareArgs {
    /// Mastodon instance export (CSV).
    #[arg(long = "mastodon", value_name = "CSV")]
    pub mastodon: PathBuf,

    /// Reddit community export (CSV).
    #[arg(long = "reddit", value_name = "CSV")]
    pub reddit: PathBuf,

    /// Correlation method.
    #[arg(long = "method", value_enum)]
    pub method: Option<MethodArg>,

    /// Bootstrap resamples.
    #[arg(long = "iterations", value_name = "N")]
    pub iterations: Option<usize>,

    /// Seed for the bootstrap.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Mastodon server whose rules are filtered one by one (repeatable).
    #[arg(long = "override-server", value_name = "ID")]
    pub override_servers: Vec<usize>,

    /// Keep only the canonical columns after normalization.
    #[arg(long = "common-only")]
    pub common_only: bool,

    /// Print the report as JSON instead of tables.
    #[arg(long = "json")]
    pub json: bool,
}

#[derive(Parser)]
pub struct RulesArgs {
    /// Platform export (CSV).
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    #[arg(long = "platform", value_enum)]
    pub platform: PlatformArg,

    /// Server whose rules are filtered one by one (repeatable).
    #[arg(long = "override-server", value_name = "ID")]
    pub override_servers: Vec<usize>,
}

#[derive(Parser)]
pub struct LanguagesArgs {
    #[arg(long = "mastodon", value_name = "CSV")]
    pub mastodon: PathBuf,

    #[arg(long = "reddit", value_name = "CSV")]
    pub reddit: PathBuf,
}

#[derive(Parser)]
pub struct AttributeArgs {
    /// Platform export (CSV).
    #[arg(value_name = "CSV")]
    pub csv: PathBuf,

    #[arg(long = "platform", value_enum)]
    pub platform: PlatformArg,

    /// Column to explain (default: rule_count).
    #[arg(long = "target")]
    pub target: Option<String>,

    /// Feature columns, comma-separated.
    #[arg(long = "features", value_delimiter = ',')]
    pub features: Vec<String>,

    /// Two features whose SHAP interaction is reported.
    #[arg(long = "interaction", num_args = 2, value_names = ["FIRST", "SECOND"])]
    pub interaction: Option<Vec<String>>,

    /// Seed for the split and the forest.
    #[arg(long = "seed")]
    pub seed: Option<u64>,

    /// Number of trees in the forest.
    #[arg(long = "trees", value_name = "N")]
    pub trees: Option<usize>,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PlatformArg {
    Mastodon,
    Reddit,
}

impl From<PlatformArg> for Platform {
    fn from(arg: PlatformArg) -> Self {
        match arg {
            PlatformArg::Mastodon => Platform::Mastodon,
            PlatformArg::Reddit => Platform::Reddit,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum MethodArg {
    Pearson,
    Spearman,
    Kendall,
}

impl From<MethodArg> for CorrelationMethod {
    fn from(arg: MethodArg) -> Self {
        match arg {
            MethodArg::Pearson => CorrelationMethod::Pearson,
            MethodArg::Spearman => CorrelationMethod::Spearman,
            MethodArg::Kendall => CorrelationMethod::Kendall,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
