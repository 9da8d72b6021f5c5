//! Command handlers

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use biosurv_common::model_call::SimulationScenario;
use biosurv_common::one_health::{self, OneHealthWeights};
use biosurv_common::progress::ProgressState;
use biosurv_common::types::{
    Alert, Country, DistrictData, EnvironmentalReading, EscalatedAlert, GenomicVariant, Level,
    OneHealthScores, ReadinessStatus, SentinelSignal, ZoonoticEvent,
};
use biosurv_common::{
    markdown, EscalationBoard, EscalationPoller, EscalationSource, ProviderError,
    SimulationProgress,
};

use crate::cli::{Commands, CountryArg, LevelArg, PlanKind};
use crate::context::AppContext;
use crate::output;

pub async fn run(ctx: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Status => status(ctx).await,
        Commands::Watch { interval } => watch(ctx, interval).await,
        Commands::Escalate { alert, from, plan } => escalate(ctx, &alert, from, plan).await,
        Commands::Acknowledge { id, by } => acknowledge(ctx, &id, &by).await,
        Commands::Resolve { id } => resolve(ctx, &id).await,
        Commands::National { country } => national(ctx, country).await,
        Commands::State { name, district } => state(ctx, &name, district.as_deref()).await,
        Commands::Surveillance => surveillance(ctx).await,
        Commands::Readiness => readiness(ctx).await,
        Commands::Plan { kind, input, html } => plan(ctx, kind, &input, html).await,
        Commands::Summarize { input } => summarize(ctx, &input).await,
        Commands::Simulate {
            pathogen,
            region,
            no_play,
        } => simulate(ctx, &pathogen, &region, !no_play).await,
        Commands::Index {
            human,
            zoonotic,
            environmental,
            region,
            brief,
        } => {
            let scores = OneHealthScores {
                human,
                zoonotic,
                environmental,
            };
            index(ctx, scores, region.as_deref(), brief).await
        }
        Commands::Config => show_config(ctx),
    }
}

/// Read a JSON input file into a typed value
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Surface an AI failure with the user-facing text on top and the provider
/// error kept in the chain for the exit code
fn ai<T>(feature: &str, result: Result<T, ProviderError>) -> Result<T> {
    result.map_err(|e| {
        error!("AI call '{}' failed ({}): {}", feature, e.kind.as_str(), e);
        let message = e.user_message();
        anyhow::Error::new(e).context(message)
    })
}

fn print_plan(text: &str, html: bool) {
    if html {
        print!("{}", markdown::to_html(text));
    } else {
        println!("{}", text);
    }
}

// ============================================================================
// Escalation workflow
// ============================================================================

async fn status(ctx: &AppContext) -> Result<()> {
    let backend = ctx.backend()?;
    let active = backend
        .active_escalation()
        .await
        .context("Failed to fetch active escalation")?;
    match active {
        Some(e) => print!("{}", output::render_escalation(&e)),
        None => println!("{}", "No active escalation".green()),
    }
    Ok(())
}

async fn watch(ctx: &AppContext, interval: Option<u64>) -> Result<()> {
    let interval = match interval {
        Some(secs) => {
            let polling = biosurv_common::config::PollingConfig {
                escalation_interval_secs: secs,
            };
            if polling.interval_was_clamped() {
                warn!("Poll interval {}s out of range, using {}s", secs, polling.effective_interval().as_secs());
            }
            polling.effective_interval()
        }
        None => ctx.config.polling.effective_interval(),
    };

    let source: Arc<dyn EscalationSource> = Arc::new(ctx.backend()?);
    info!("Watching active escalation every {}s", interval.as_secs());
    let poller = EscalationPoller::start(source, interval);
    let mut updates = poller.subscribe();

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print!("{}", output::render_snapshot(&snapshot));
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}

async fn escalate(ctx: &AppContext, alert_path: &Path, from: LevelArg, with_plan: bool) -> Result<()> {
    let alert: Alert = read_json(alert_path)?;
    let origin = match from {
        LevelArg::District => Level::District,
        LevelArg::State => Level::State,
    };

    let mut board = EscalationBoard::new();
    let escalated = board.raise(alert, origin)?.clone();

    let backend = ctx.backend()?;
    let stored = backend
        .escalate(&escalated)
        .await
        .context("Failed to record escalation")?;
    print!("{}", output::render_escalation(&stored));

    if with_plan {
        let planner = ctx.planner()?;
        let plan = ai("escalation plan", planner.escalation_action_plan(&stored).await)?;
        println!();
        print_plan(&plan, false);
    }
    Ok(())
}

async fn acknowledge(ctx: &AppContext, id: &str, by: &str) -> Result<()> {
    let backend = ctx.backend()?;
    let current = backend
        .active_escalation()
        .await
        .context("Failed to fetch active escalation")?;

    // Check the transition locally when the backend tells us the current state
    if let Some(current) = current.filter(|c| c.alert.id == id) {
        let mut board = EscalationBoard::new();
        board.track(current);
        board.acknowledge(id, by)?;
    }

    let updated = backend
        .acknowledge(id, by)
        .await
        .with_context(|| format!("Failed to acknowledge {}", id))?;
    print!("{}", output::render_escalation(&updated));
    Ok(())
}

async fn resolve(ctx: &AppContext, id: &str) -> Result<()> {
    let backend = ctx.backend()?;
    backend
        .resolve(id)
        .await
        .with_context(|| format!("Failed to resolve {}", id))?;
    println!("{} {}", "Resolved".green(), id);
    Ok(())
}

// ============================================================================
// Dashboard views
// ============================================================================

async fn national(ctx: &AppContext, country: CountryArg) -> Result<()> {
    let country = match country {
        CountryArg::Us => Country::Us,
        CountryArg::India => Country::India,
    };
    let overview = ctx
        .backend()?
        .national_overview(country)
        .await
        .context("Failed to load national overview")?;
    print!("{}", output::render_national(&overview));
    Ok(())
}

async fn state(ctx: &AppContext, name: &str, district: Option<&str>) -> Result<()> {
    let backend = ctx.backend()?;
    match district {
        Some(district) => {
            let data = backend
                .district(name, district)
                .await
                .with_context(|| format!("Failed to load district {}, {}", district, name))?;
            print!("{}", output::render_district(&data));
        }
        None => {
            let data = backend
                .state_detail(name)
                .await
                .with_context(|| format!("Failed to load state {}", name))?;
            print!("{}", output::render_state(&data));
        }
    }
    Ok(())
}

async fn surveillance(ctx: &AppContext) -> Result<()> {
    let data = ctx
        .backend()?
        .surveillance_all()
        .await
        .context("Failed to load surveillance data")?;
    print!("{}", output::render_surveillance(&data));
    Ok(())
}

async fn readiness(ctx: &AppContext) -> Result<()> {
    let items = ctx
        .backend()?
        .readiness()
        .await
        .context("Failed to load readiness status")?;
    print!("{}", output::render_readiness(&items));
    Ok(())
}

// ============================================================================
// AI features
// ============================================================================

async fn plan(ctx: &AppContext, kind: PlanKind, input: &Path, html: bool) -> Result<()> {
    let planner = ctx.planner()?;
    let text = match kind {
        PlanKind::Escalation => {
            let e: EscalatedAlert = read_json(input)?;
            ai("escalation plan", planner.escalation_action_plan(&e).await)?
        }
        PlanKind::Outbreak => {
            let a: Alert = read_json(input)?;
            ai("outbreak plan", planner.outbreak_response_plan(&a).await)?
        }
        PlanKind::Biothreat => {
            let a: Alert = read_json(input)?;
            ai("biothreat plan", planner.biothreat_response_plan(&a).await)?
        }
        PlanKind::Zoonotic => {
            let z: ZoonoticEvent = read_json(input)?;
            ai("zoonotic plan", planner.zoonotic_spillover_plan(&z).await)?
        }
        PlanKind::Environmental => {
            let r: EnvironmentalReading = read_json(input)?;
            ai("environmental plan", planner.environmental_hazard_plan(&r).await)?
        }
        PlanKind::Genomic => {
            let v: GenomicVariant = read_json(input)?;
            ai("genomic analysis", planner.genomic_variant_analysis(&v).await)?
        }
        PlanKind::Wastewater => {
            let s: SentinelSignal = read_json(input)?;
            ai("wastewater analysis", planner.wastewater_signal_analysis(&s).await)?
        }
        PlanKind::Readiness => {
            let items: Vec<ReadinessStatus> = read_json(input)?;
            ai("readiness plan", planner.readiness_gap_plan(&items).await)?
        }
        PlanKind::District => {
            let d: DistrictData = read_json(input)?;
            ai("district report", planner.district_situation_report(&d).await)?
        }
    };
    print_plan(&text, html);
    Ok(())
}

async fn summarize(ctx: &AppContext, input: &Path) -> Result<()> {
    let alerts: Vec<Alert> = read_json(input)?;
    if alerts.is_empty() {
        println!("No alerts to summarize");
        return Ok(());
    }
    let planner = ctx.planner()?;
    let summaries = ai("threat summaries", planner.threat_summaries(&alerts).await)?;
    print!("{}", output::render_summaries(&summaries));
    Ok(())
}

async fn simulate(ctx: &AppContext, pathogen: &str, region: &str, play: bool) -> Result<()> {
    if pathogen.trim().is_empty() || region.trim().is_empty() {
        bail!("Pathogen and region are required");
    }
    let planner = ctx.planner()?;
    let scenario = ai("simulation", planner.simulation_scenario(pathogen, region).await)?;
    print!("{}", output::render_scenario(&scenario));
    if play {
        play_scenario(&scenario, ctx.config.simulation_duration()).await;
    }
    Ok(())
}

/// Phase that is current at `percent` of the run
pub fn phase_at(scenario: &SimulationScenario, percent: f64) -> Option<usize> {
    let last_day = scenario.phases.iter().map(|p| p.day).max()?;
    if last_day == 0 {
        return Some(0);
    }
    let day = percent.clamp(0.0, 100.0) / 100.0 * last_day as f64;
    scenario.phases.iter().rposition(|p| p.day as f64 <= day).or(Some(0))
}

async fn play_scenario(scenario: &SimulationScenario, duration: Duration) {
    let mut progress = SimulationProgress::new(duration);
    let mut shown: Option<usize> = None;
    let mut ticker = tokio::time::interval(Duration::from_millis(250));
    progress.start();

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                progress.pause();
                println!("\nSimulation stopped at {:.0}%", progress.percent());
                return;
            }
        }

        let percent = progress.percent();
        let current = phase_at(scenario, percent);
        if current != shown {
            if let Some(phase) = current.and_then(|i| scenario.phases.get(i)) {
                println!(
                    "{} day {} {} - {} projected cases",
                    output::progress_bar(percent, 20),
                    phase.day,
                    phase.name.bold(),
                    phase.projected_cases
                );
            }
            shown = current;
        }
        if progress.state() == ProgressState::Complete {
            println!("{}", output::progress_bar(100.0, 20));
            return;
        }
    }
}

async fn index(ctx: &AppContext, scores: OneHealthScores, region: Option<&str>, brief: bool) -> Result<()> {
    for (name, value) in [
        ("human", scores.human),
        ("zoonotic", scores.zoonotic),
        ("environmental", scores.environmental),
    ] {
        if !(0.0..=100.0).contains(&value) {
            bail!("{} score must be between 0 and 100, got {}", name, value);
        }
    }
    let index = one_health::compute(&scores, &OneHealthWeights::default());
    print!("{}", output::render_index(&index));

    if brief {
        let planner = ctx.planner()?;
        let region = region.unwrap_or("the region");
        let text = ai("one health briefing", planner.one_health_briefing(region, &index).await)?;
        println!();
        print_plan(&text, false);
    }
    Ok(())
}

fn show_config(ctx: &AppContext) -> Result<()> {
    print!(
        "{}",
        output::render_config(&ctx.config, &ctx.config.ai.api_key_status())
    );
    Ok(())
}
