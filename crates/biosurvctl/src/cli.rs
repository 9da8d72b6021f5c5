//! Command-line definition

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub const VERSION: &str = env!("BIOSURV_VERSION");

#[derive(Parser, Debug)]
#[command(name = "biosurvctl")]
#[command(about = "Biosurveillance dashboard - escalations, surveillance data and AI action plans", long_about = None)]
#[command(version = VERSION)]
pub struct Cli {
    /// Config file (default: $BIOSURV_CONFIG or ~/.config/biosurv/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show the active escalation
    Status,

    /// Poll the active escalation until interrupted
    Watch {
        /// Poll interval in seconds (default from config)
        #[arg(long)]
        interval: Option<u64>,
    },

    /// Escalate an alert one level up
    Escalate {
        /// Alert JSON file
        #[arg(long)]
        alert: PathBuf,

        /// Level the alert is currently owned at
        #[arg(long, value_enum, default_value_t = LevelArg::District)]
        from: LevelArg,

        /// Also generate an action plan for the receiving level
        #[arg(long)]
        plan: bool,
    },

    /// Acknowledge an escalated alert
    Acknowledge {
        id: String,

        #[arg(long, default_value = "operator")]
        by: String,
    },

    /// Resolve an escalated alert
    Resolve { id: String },

    /// National overview
    National {
        #[arg(long, value_enum, default_value_t = CountryArg::Us)]
        country: CountryArg,
    },

    /// State detail, or one district with --district
    State {
        name: String,

        #[arg(long)]
        district: Option<String>,
    },

    /// All surveillance streams
    Surveillance,

    /// Response readiness inventory
    Readiness,

    /// Generate an AI action plan or analysis from a JSON input file
    Plan {
        #[arg(value_enum)]
        kind: PlanKind,

        #[arg(long)]
        input: PathBuf,

        /// Render as HTML instead of Markdown
        #[arg(long)]
        html: bool,
    },

    /// One-line AI summaries for a list of alerts
    Summarize {
        #[arg(long)]
        input: PathBuf,
    },

    /// Generate and play an outbreak simulation
    Simulate {
        #[arg(long)]
        pathogen: String,

        #[arg(long)]
        region: String,

        /// Print the scenario without playing it
        #[arg(long)]
        no_play: bool,
    },

    /// Compute the One Health Index
    Index {
        #[arg(long)]
        human: f64,

        #[arg(long)]
        zoonotic: f64,

        #[arg(long)]
        environmental: f64,

        /// Region name used in the AI briefing
        #[arg(long)]
        region: Option<String>,

        /// Ask the AI for a leadership briefing
        #[arg(long)]
        brief: bool,
    },

    /// Show effective configuration and API key status
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LevelArg {
    District,
    State,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountryArg {
    Us,
    India,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanKind {
    /// Input: escalated alert
    Escalation,
    /// Input: alert
    Outbreak,
    /// Input: alert
    Biothreat,
    /// Input: zoonotic event
    Zoonotic,
    /// Input: environmental reading
    Environmental,
    /// Input: genomic variant
    Genomic,
    /// Input: sentinel signal
    Wastewater,
    /// Input: list of readiness statuses
    Readiness,
    /// Input: district data
    District,
}
