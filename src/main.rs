use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{info, warn};
use serde::Serialize;

use polo_stats::aggregate::{aggregate, Dimension};
use polo_stats::config::StatsConfig;
use polo_stats::csv_io;
use polo_stats::density::{density_map, CoordinateSource, DensityQuery, HeatmapCategory};
use polo_stats::event::{EventFilter, EventRecord, EventType, Period, ShotType, Team};
use polo_stats::fake_match::{simulate_match, SimOptions};
use polo_stats::metrics::{save_table, scoreboard, shot_type_breakdown, success_rates_for, RateDimension};
use polo_stats::passes::{attribute_passes, pass_links, play_summaries, DEFAULT_ANCHORS};
use polo_stats::persist;
use polo_stats::radar::{radar_profile, RadarCategory};
use polo_stats::report_export::export_match_report;
use polo_stats::store::{EventLog, Snapshot};

#[derive(Parser)]
#[command(name = "polo_stats")]
#[command(about = "Water polo match statistics from logged events", long_about = None)]
struct Cli {
    /// CSV to read (events only, or a combined export). Defaults to the session cache.
    #[arg(short, long, global = true)]
    input: Option<PathBuf>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone, Default)]
struct FilterArgs {
    #[arg(long, value_parser = parse_team)]
    team: Option<Team>,
    #[arg(long, value_parser = parse_period)]
    period: Option<Period>,
    #[arg(long = "event-type", value_parser = parse_event_type)]
    event_type: Option<EventType>,
    #[arg(long = "match")]
    match_id: Option<String>,
    #[arg(long = "shot-type", value_parser = parse_shot_type)]
    shot_type: Option<ShotType>,
}

impl FilterArgs {
    fn to_filter(&self) -> EventFilter {
        let mut filter = EventFilter::all();
        if let Some(team) = self.team {
            filter = filter.team(team);
        }
        if let Some(period) = self.period {
            filter = filter.period(period);
        }
        if let Some(event_type) = self.event_type {
            filter = filter.event_type(event_type);
        }
        if let Some(id) = &self.match_id {
            filter = filter.match_id(id.clone());
        }
        if let Some(shot_type) = self.shot_type {
            filter = filter.shot_type(shot_type);
        }
        filter
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum RateBy {
    Event,
    Subevent,
}

#[derive(Subcommand)]
enum Commands {
    /// Event counts grouped by up to four dimensions
    Summary {
        /// Dimensions, e.g. team,event_type,outcome
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_values = ["team", "event_type", "outcome"],
            value_parser = parse_dimension
        )]
        by: Vec<Dimension>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Attack success rates per team
    Rates {
        #[arg(long, value_enum, default_value = "event")]
        by: RateBy,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Goalkeeper save percentages
    Saves {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Shots and goals per shot type
    Shots {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Shot-location density grid for one team and category
    Heatmap {
        #[arg(long, value_parser = parse_team)]
        team: Team,
        /// Category label, see `categories`
        #[arg(long)]
        category: String,
        #[arg(long = "match")]
        match_id: Option<String>,
        /// Use goal-mouth coordinates instead of pitch coordinates
        #[arg(long)]
        goal: bool,
        /// Write the full grid as JSON
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Percentile radar for one or more players
    Radar {
        #[arg(required = true)]
        players: Vec<String>,
        /// Category labels (comma separated); all when omitted
        #[arg(long, value_delimiter = ',')]
        categories: Vec<String>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// List heatmap and radar categories
    Categories,
    /// Pass links and play lengths
    Passes {
        /// Fill missing passer/receiver from the default anchors
        #[arg(long)]
        attribute: bool,
    },
    /// Write an xlsx workbook of the derived tables
    Report {
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Generate a synthetic match
    Simulate {
        #[arg(long, default_value = "7")]
        seed: u64,
        #[arg(long, default_value = "120")]
        events: usize,
        #[arg(long, default_value = "12")]
        plays: usize,
        #[arg(long = "match", default_value = "sim-1")]
        match_id: String,
        /// Write a combined CSV here
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Store the result as the session cache
        #[arg(long)]
        save: bool,
    },
    /// Session cache management
    Cache {
        #[command(subcommand)]
        action: CacheCommands,
    },
}

#[derive(Subcommand)]
enum CacheCommands {
    /// Show what the cache holds
    Show,
    /// Merge a CSV into the cache
    Import { path: PathBuf },
    /// Write the cache as a combined CSV
    Export { path: PathBuf },
    /// Delete the cache file
    Clear,
}

fn parse_team(raw: &str) -> Result<Team, String> {
    Team::parse(raw).ok_or_else(|| format!("unknown team {raw:?}"))
}

fn parse_period(raw: &str) -> Result<Period, String> {
    Period::parse(raw).ok_or_else(|| format!("unknown period {raw:?}"))
}

fn parse_event_type(raw: &str) -> Result<EventType, String> {
    EventType::parse(raw).ok_or_else(|| format!("unknown event type {raw:?}"))
}

fn parse_shot_type(raw: &str) -> Result<ShotType, String> {
    ShotType::parse(raw).ok_or_else(|| format!("unknown shot type {raw:?}"))
}

fn parse_dimension(raw: &str) -> Result<Dimension, String> {
    Dimension::parse(raw).ok_or_else(|| format!("unknown dimension {raw:?}"))
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cli = Cli::parse();
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = StatsConfig::from_env();
    let json = cli.json;

    match cli.command {
        Commands::Summary { by, filter } => {
            let events = load_events(cli.input.as_deref(), &config, &filter)?;
            let agg = aggregate(&events, &by)?;
            if json {
                return print_json(&agg);
            }
            let mut head = by.iter().map(|d| d.to_string()).collect::<Vec<_>>();
            head.push("count".to_string());
            let rows = agg
                .buckets
                .iter()
                .map(|b| {
                    let mut row = b.key.iter().map(|v| v.to_string()).collect::<Vec<_>>();
                    row.push(b.count.to_string());
                    row
                })
                .collect::<Vec<_>>();
            print_table(&head, &rows);
            println!("total: {}", agg.total);
        }
        Commands::Rates { by, filter } => {
            let snapshot = load_log(cli.input.as_deref(), &config)?.snapshot();
            let by = match by {
                RateBy::Event => RateDimension::EventType,
                RateBy::Subevent => RateDimension::Subevent,
            };
            let rates = success_rates_for(snapshot.events(), by, &filter.to_filter());
            if json {
                return print_json(&rates);
            }
            let rows = rates
                .iter()
                .map(|m| {
                    vec![
                        m.team.to_string(),
                        m.category.label().to_string(),
                        m.attempts.to_string(),
                        m.goals.to_string(),
                        m.exclusions_drawn.to_string(),
                        format!("{:.1}", m.rate),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(
                &["team", "category", "attempts", "goals", "excl", "success %"],
                &rows,
            );
        }
        Commands::Saves { filter } => {
            let events = load_events(cli.input.as_deref(), &config, &filter)?;
            let table = save_table(&events);
            if json {
                return print_json(&table);
            }
            let rows = table
                .iter()
                .map(|r| {
                    vec![
                        r.team.to_string(),
                        r.event_type.to_string(),
                        r.subevent.clone().unwrap_or_default(),
                        r.goalkeeper.clone(),
                        format!("{}/{}", r.saves, r.shots_faced),
                        r.save_pct.map(|v| format!("{v:.1}")).unwrap_or_else(|| "-".to_string()),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(
                &["team", "event", "subevent", "goalkeeper", "saves", "save %"],
                &rows,
            );
        }
        Commands::Shots { filter } => {
            let events = load_events(cli.input.as_deref(), &config, &filter)?;
            let table = shot_type_breakdown(&events);
            if json {
                return print_json(&table);
            }
            let rows = table
                .iter()
                .map(|r| {
                    vec![
                        r.team.to_string(),
                        r.shot_type.to_string(),
                        r.shots.to_string(),
                        r.goals.to_string(),
                    ]
                })
                .collect::<Vec<_>>();
            print_table(&["team", "shot type", "shots", "goals"], &rows);
        }
        Commands::Heatmap {
            team,
            category,
            match_id,
            goal,
            out,
        } => {
            let events = load_events(cli.input.as_deref(), &config, &FilterArgs::default())?;
            let category = HeatmapCategory::from_label(&category)?;
            let source = if goal {
                CoordinateSource::Goal
            } else {
                CoordinateSource::Pitch
            };
            let mut query = DensityQuery::new(team, category).source(source);
            if let Some(id) = match_id.as_deref() {
                query = query.in_match(id);
            }
            let grid = match density_map(&events, &query, &config) {
                Ok(grid) => grid,
                Err(err) if err.is_no_data() => {
                    println!("No data for {category} ({team}): {err}");
                    return Ok(());
                }
                Err(err) => return Err(err.into()),
            };
            if let Some(path) = out {
                let file = File::create(&path)
                    .with_context(|| format!("create {}", path.display()))?;
                serde_json::to_writer(BufWriter::new(file), &grid)
                    .with_context(|| format!("write {}", path.display()))?;
                info!("wrote {0}x{0} grid to {1}", grid.x.len(), path.display());
            }
            println!(
                "{category} ({team}): {} point(s), bandwidth {}, peak density {:.4}",
                grid.points, grid.bandwidth, grid.max
            );
        }
        Commands::Radar {
            players,
            categories,
            filter,
        } => {
            let snapshot = load_log(cli.input.as_deref(), &config)?.snapshot();
            let categories = if categories.is_empty() {
                RadarCategory::ALL.to_vec()
            } else {
                categories
                    .iter()
                    .map(|c| RadarCategory::from_label(c))
                    .collect::<Result<Vec<_>, _>>()?
            };
            let chart = radar_profile(
                snapshot.events(),
                &players,
                &categories,
                &filter.to_filter(),
                &config,
            )?;
            if json {
                return print_json(&chart);
            }
            let mut head = vec!["category".to_string()];
            head.extend(chart.series.iter().map(|s| s.player.clone()));
            let rows = chart
                .axes
                .iter()
                .enumerate()
                .map(|(idx, axis)| {
                    let mut row = vec![axis.to_string()];
                    row.extend(chart.series.iter().map(|s| match s.values[idx] {
                        Some(r) => format!("{:.1} ({})", r.percentile, r.raw_count),
                        None => "-".to_string(),
                    }));
                    row
                })
                .collect::<Vec<_>>();
            print_table(&head, &rows);
            println!("radial max: {:.1}", chart.radial_max);
        }
        Commands::Categories => {
            if json {
                #[derive(Serialize)]
                struct Registry {
                    heatmap: &'static [HeatmapCategory],
                    radar: &'static [RadarCategory],
                }
                return print_json(&Registry {
                    heatmap: HeatmapCategory::ALL,
                    radar: RadarCategory::ALL,
                });
            }
            println!("Heatmap categories:");
            for c in HeatmapCategory::ALL {
                println!("  {c}");
            }
            println!("Radar categories:");
            for c in RadarCategory::ALL {
                println!("  {c}");
            }
        }
        Commands::Passes { attribute } => {
            let snapshot = load_log(cli.input.as_deref(), &config)?.snapshot();
            let passes = if attribute {
                attribute_passes(snapshot.passes(), &DEFAULT_ANCHORS)
            } else {
                snapshot.passes().to_vec()
            };
            let links = pass_links(&passes);
            let plays = play_summaries(&passes);
            if json {
                return print_json(&serde_json::json!({ "links": links, "plays": plays }));
            }
            let rows = links
                .iter()
                .map(|l| vec![l.play_type.to_string(), l.from.clone(), l.to.clone(), l.count.to_string()])
                .collect::<Vec<_>>();
            print_table(&["play type", "from", "to", "passes"], &rows);
            println!("{} play(s), {} pass(es)", plays.len(), passes.len());
        }
        Commands::Report { out, filter } => {
            let snapshot = load_log(cli.input.as_deref(), &config)?.snapshot();
            let filter = filter.to_filter();
            let path = out.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "polo_report_{}.xlsx",
                    chrono::Local::now().format("%Y%m%d_%H%M%S")
                ))
            });
            let report = export_match_report(&path, snapshot.events(), &filter)?;
            let board = scoreboard(&filter.select(snapshot.events()));
            info!(
                "report {}: {} events, {} rate rows, {} save rows, {} shot rows, {} defensive rows",
                path.display(),
                report.events,
                report.rate_rows,
                report.save_rows,
                report.shot_type_rows,
                report.defensive_rows
            );
            println!("Home {} - {} Away -> {}", board.home, board.away, path.display());
        }
        Commands::Simulate {
            seed,
            events,
            plays,
            match_id,
            out,
            save,
        } => {
            let log = simulate_match(&SimOptions {
                seed,
                events,
                plays,
                match_id,
            })?;
            let snapshot = log.snapshot();
            if let Some(path) = out {
                write_combined(&path, &snapshot)?;
                info!("wrote {} record(s) to {}", log.len(), path.display());
            }
            if save {
                let path = require_cache_path(&config)?;
                persist::save_snapshot(&path, &snapshot)?;
                info!("session saved to {}", path.display());
            }
            let board = scoreboard(snapshot.events());
            println!(
                "Simulated {} event(s), {} pass(es): Home {} - {} Away",
                snapshot.events().len(),
                snapshot.passes().len(),
                board.home,
                board.away
            );
        }
        Commands::Cache { action } => run_cache(action, &config)?,
    }
    Ok(())
}

fn run_cache(action: CacheCommands, config: &StatsConfig) -> Result<()> {
    let path = require_cache_path(config)?;
    match action {
        CacheCommands::Show => match persist::load_snapshot(&path)? {
            Some(session) => {
                let snap = session.log.snapshot();
                println!("{}", path.display());
                println!("saved at: {}", session.saved_at.to_rfc3339());
                println!(
                    "events: {}, passes: {}, lineups: {}, substitutions: {}",
                    snap.events().len(),
                    snap.passes().len(),
                    snap.lineups().len(),
                    snap.substitutions().len()
                );
                let ids = snap.match_ids();
                if !ids.is_empty() {
                    println!("matches: {}", ids.join(", "));
                }
            }
            None => println!("No session cached at {}", path.display()),
        },
        CacheCommands::Import { path: csv_path } => {
            let incoming = csv_io::load_combined_file(&csv_path)
                .with_context(|| format!("read {}", csv_path.display()))?;
            let mut log = persist::load_snapshot(&path)?
                .map(|s| s.log)
                .unwrap_or_default();
            let added = log.merge(&incoming.snapshot())?;
            persist::save_snapshot(&path, &log.snapshot())?;
            println!("Imported {added} new record(s), {} total", log.len());
        }
        CacheCommands::Export { path: csv_path } => {
            let log = persist::load_snapshot(&path)?
                .map(|s| s.log)
                .ok_or_else(|| anyhow!("no session cached at {}", path.display()))?;
            write_combined(&csv_path, &log.snapshot())?;
            println!("Exported {} record(s) to {}", log.len(), csv_path.display());
        }
        CacheCommands::Clear => {
            if persist::clear(&path)? {
                println!("Removed {}", path.display());
            } else {
                println!("Nothing cached at {}", path.display());
            }
        }
    }
    Ok(())
}

fn require_cache_path(config: &StatsConfig) -> Result<PathBuf> {
    persist::cache_path(config)
        .ok_or_else(|| anyhow!("no cache directory; set POLO_CACHE_DIR or HOME"))
}

fn load_log(input: Option<&Path>, config: &StatsConfig) -> Result<EventLog> {
    if let Some(path) = input {
        return csv_io::load_combined_file(path)
            .with_context(|| format!("read {}", path.display()));
    }
    let Some(path) = persist::cache_path(config) else {
        warn!("no cache directory available, starting empty");
        return Ok(EventLog::new());
    };
    match persist::load_snapshot(&path)? {
        Some(session) => Ok(session.log),
        None => {
            warn!("no session cached at {}; pass --input or run `simulate --save`", path.display());
            Ok(EventLog::new())
        }
    }
}

fn load_events(input: Option<&Path>, config: &StatsConfig, filter: &FilterArgs) -> Result<Vec<EventRecord>> {
    let snapshot = load_log(input, config)?.snapshot();
    Ok(filter.to_filter().select(snapshot.events()))
}

fn write_combined(path: &Path, snapshot: &Snapshot) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    csv_io::write_combined(BufWriter::new(file), snapshot)
        .with_context(|| format!("write {}", path.display()))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value).context("write json")?;
    writeln!(out)?;
    Ok(())
}

fn print_table<S: AsRef<str>>(head: &[S], rows: &[Vec<String>]) {
    let mut widths = head.iter().map(|h| h.as_ref().len()).collect::<Vec<_>>();
    for row in rows {
        for (idx, cell) in row.iter().enumerate() {
            if let Some(w) = widths.get_mut(idx) {
                *w = (*w).max(cell.chars().count());
            }
        }
    }
    let line = |cells: Vec<&str>| {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, &w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
    };
    println!("{}", line(head.iter().map(|h| h.as_ref()).collect()));
    for row in rows {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}
