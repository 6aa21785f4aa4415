// AlertLens CLI - Command-line interface for Oracle alert log analysis

use alertlens_core::{
    build_sheets, compare, ora_code_counts, ora_frequency, top_warnings, AlertLens, AlertLogSet,
    AnalysisSummary, AlertSeverity, Comparison, Config, EventFilter, Extraction, Granularity,
    InstanceEventKind, InstanceSummary, KillSessionStats, OraError,
};
use anyhow::Result;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "alertlens")]
#[command(about = "Extract and analyze events from Oracle alert logs", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./.alertlens.toml, then ~/.config/alertlens/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Time range and keyword options shared by the event views.
#[derive(clap::Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Keep events at or after this time
    #[arg(long)]
    from: Option<String>,

    /// Keep events at or before this time; a bare date covers the whole day
    #[arg(long)]
    to: Option<String>,

    /// Case-insensitive keyword matched against event fields
    #[arg(long)]
    search: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract ORA errors, warnings and kill sessions with summary statistics
    Analyze {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Number of warning messages to rank
        #[arg(long, default_value = "20")]
        top: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show instance metadata and lifecycle events
    Instances {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare the ORA errors of two alert logs
    Compare {
        /// Baseline log
        a: PathBuf,

        /// Log compared against the baseline
        b: PathBuf,

        /// Print the comparison as JSON
        #[arg(long)]
        json: bool,
    },

    /// Count ORA errors per code in hourly or daily buckets
    Frequency {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        filter: FilterArgs,

        /// Only count errors from this source file name
        #[arg(long)]
        source: Option<String>,

        /// Bucket by day instead of by hour
        #[arg(long)]
        daily: bool,
    },

    /// Print the export sheets as JSON
    Export {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Ask the configured AI provider to summarize one alert log
    #[cfg(feature = "ai-providers")]
    Summarize {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// What the summary should focus on
        #[arg(long)]
        instruction: String,

        /// Source file name to summarize (defaults to the first file)
        #[arg(long)]
        source: Option<String>,

        /// Send the whole log instead of the filtered events' context
        #[arg(long)]
        full_log: bool,

        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Serialize)]
struct AnalyzeReport<'a> {
    summary: AnalysisSummary,
    severity: AlertSeverity,
    ora_code_counts: Vec<(String, usize)>,
    top_warnings: Vec<(String, usize)>,
    kill_sessions: KillSessionStats,
    events: &'a Extraction,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout is reserved for reports
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("alertlens=info".parse().unwrap())
                .add_directive("alertlens_core=info".parse().unwrap()),
        )
        .init();

    if let Err(e) = run(cli).await {
        error!("Command failed: {:#}", e);
        eprintln!("\n✗ {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    let lens = AlertLens::with_config(config)?;

    match cli.command {
        Commands::Analyze {
            files,
            filter,
            top,
            json,
        } => {
            let set = AlertLogSet::from_paths(&files)?;
            let event_filter = build_filter(&lens, &filter)?;
            let events = lens.filter_extraction(&lens.extract(&set), &event_filter);
            info!(
                "Analysis found {} ORA errors, {} warnings, {} kill sessions",
                events.ora_errors.len(),
                events.warnings.len(),
                events.kill_sessions.len()
            );

            let summary = AnalysisSummary::from_extraction(&events, set.len());
            let report = AnalyzeReport {
                severity: summary.severity(),
                summary,
                ora_code_counts: ora_code_counts(&events.ora_errors),
                top_warnings: top_warnings(&events.warnings, top),
                kill_sessions: KillSessionStats::from_events(&events.kill_sessions),
                events: &events,
            };

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_analysis(&report);
            }
            Ok(())
        }

        Commands::Instances {
            files,
            filter,
            json,
        } => {
            let set = AlertLogSet::from_paths(&files)?;
            let event_filter = build_filter(&lens, &filter)?;
            let summary = lens.instances(&set).filtered(&event_filter);

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_instances(&summary);
            }
            Ok(())
        }

        Commands::Compare { a, b, json } => {
            let set = AlertLogSet::from_paths(&[&a, &b])?;
            let names: Vec<&str> = set.names().collect();
            let extraction = lens.extract(&set);
            let side_a = extraction.for_source(names[0]);
            let side_b = extraction.for_source(names[1]);
            let comparison = compare(&side_a.ora_errors, &side_b.ora_errors);

            if json {
                println!("{}", serde_json::to_string_pretty(&comparison)?);
            } else {
                print_comparison(names[0], names[1], &comparison);
            }
            Ok(())
        }

        Commands::Frequency {
            files,
            filter,
            source,
            daily,
        } => {
            let set = AlertLogSet::from_paths(&files)?;
            let granularity = if daily { Granularity::Daily } else { Granularity::Hourly };
            let event_filter = build_filter(&lens, &filter)?;
            let mut extraction = lens.filter_extraction(&lens.extract(&set), &event_filter);
            if let Some(name) = &source {
                set.require(name)?;
                extraction = extraction.for_source(name);
            }
            let buckets = ora_frequency(&extraction.ora_errors, granularity, lens.normalizer());

            if buckets.is_empty() {
                println!("\nNo timestamped ORA errors found.");
                return Ok(());
            }

            let label = if daily { "%Y-%m-%d" } else { "%Y-%m-%d %H:00" };
            println!("\nORA Error Frequency ({}):", if daily { "daily" } else { "hourly" });
            for bucket in &buckets {
                println!(
                    "  {:<18} {:<10} {:>5}  {}",
                    bucket.bucket_start.format(label).to_string(),
                    bucket.code,
                    bucket.count,
                    bucket.samples.join(", ")
                );
            }
            Ok(())
        }

        Commands::Export { files } => {
            let set = AlertLogSet::from_paths(&files)?;
            let extraction = lens.extract(&set);
            let sheets = build_sheets(&extraction, lens.normalizer());
            println!("{}", serde_json::to_string_pretty(&sheets)?);
            Ok(())
        }

        #[cfg(feature = "ai-providers")]
        Commands::Summarize {
            files,
            instruction,
            source,
            full_log,
            filter,
        } => {
            use alertlens_core::{summarize_with_config, PromptBuilder};
            use anyhow::bail;

            let set = AlertLogSet::from_paths(&files)?;
            let source = match source {
                Some(name) => name,
                None => match set.names().next() {
                    Some(name) => name.to_string(),
                    None => bail!("No alert log loaded"),
                },
            };
            let lines = set.require(&source)?;

            let event_filter = build_filter(&lens, &filter)?;
            let filtered = lens.filter_extraction(&lens.extract(&set).for_source(&source), &event_filter);

            let prompt = PromptBuilder::from_settings(&lens.config().ai).build(
                &instruction,
                &source,
                lines,
                &filtered,
                !full_log,
            );
            let Some(prompt) = prompt else {
                bail!("Nothing to summarize: the instruction is blank or no log content matched");
            };

            info!("Summarizing {} with {}", source, lens.config().ai.provider);
            println!("{}", summarize_with_config(lens.config(), &prompt).await);
            Ok(())
        }
    }
}

fn build_filter(lens: &AlertLens, args: &FilterArgs) -> Result<EventFilter> {
    Ok(lens.event_filter(args.from.as_deref(), args.to.as_deref(), args.search.as_deref())?)
}

fn print_analysis(report: &AnalyzeReport) {
    let summary = &report.summary;
    println!("\nAlert Log Analysis:");
    println!("  Files:            {}", summary.files);
    println!("  ORA errors:       {}", summary.ora_errors);
    println!("  Unique ORA codes: {}", summary.unique_ora_codes);
    println!("  Warnings:         {}", summary.warnings);
    println!("  Kill sessions:    {}", summary.kill_sessions);
    println!("  Severity:         {}", report.severity);

    if !report.ora_code_counts.is_empty() {
        println!("\nORA Codes:");
        for (code, count) in &report.ora_code_counts {
            println!("  {:<12} {}", code, count);
        }
    }

    if !report.top_warnings.is_empty() {
        println!("\nTop Warnings:");
        for (message, count) in &report.top_warnings {
            println!("  {:>4}  {}", count, message);
        }
    }

    let kills = &report.kill_sessions;
    if kills.total > 0 {
        println!("\nKill Sessions:");
        println!("  Total:       {}", kills.total);
        println!("  Unique SIDs: {}", kills.unique_sids);
        println!("  Top mode:    {}", kills.most_common_mode.as_deref().unwrap_or("-"));
        println!("  Top reason:  {}", kills.most_common_reason.as_deref().unwrap_or("-"));
    }

    print_ora_errors("ORA Errors", &report.events.ora_errors);

    if !report.events.warnings.is_empty() {
        println!("\nWarnings:");
        for w in &report.events.warnings {
            println!("  {}  {}  [{}]  {}", w.timestamp, w.message, w.source, w.trace_file);
        }
    }

    if !report.events.kill_sessions.is_empty() {
        println!("\nKill Session Events:");
        for k in &report.events.kill_sessions {
            println!(
                "  {}  sid={} serial={}  mode={}  reason={}  result={}  [{}]",
                k.timestamp, k.sid, k.serial, k.mode, k.reason, k.result, k.source
            );
        }
    }
}

fn print_ora_errors(title: &str, errors: &[OraError]) {
    if errors.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for e in errors {
        println!(
            "  {}  {:<10} {}  [{}]  {}",
            e.timestamp, e.code, e.message, e.source, e.trace_file
        );
    }
}

fn print_instances(summary: &InstanceSummary) {
    let join = |set: &std::collections::BTreeSet<String>| {
        if set.is_empty() {
            "-".to_string()
        } else {
            set.iter().cloned().collect::<Vec<_>>().join(", ")
        }
    };

    println!("\nInstance Details:");
    println!("  Instance names: {}", join(&summary.instance_names));
    println!("  Hosts:          {}", join(&summary.hostnames));
    println!("  Releases:       {}", join(&summary.releases));

    for kind in InstanceEventKind::ALL {
        let events = summary.events(kind);
        println!("\n{} ({}):", kind.label(), events.len());
        for event in events {
            println!("  {}  {}  [{}]", event.timestamp, event.line_text, event.source);
        }
    }
}

fn print_comparison(name_a: &str, name_b: &str, comparison: &Comparison<OraError>) {
    if comparison.counts.is_empty() {
        println!("\nNo ORA errors in either log.");
        return;
    }

    println!("\nORA Error Counts:");
    println!("  {:<12} {:>10} {:>10}", "Code", "A", "B");
    for row in &comparison.counts {
        println!("  {:<12} {:>10} {:>10}", row.key, row.count_a, row.count_b);
    }
    println!("\n  A = {}\n  B = {}", name_a, name_b);

    print_ora_errors("New in B", &comparison.new_in_b);
    print_ora_errors("Only in A", &comparison.new_in_a);

    if comparison.is_identical() {
        println!("\nBoth logs report the same ORA errors.");
    }
}
