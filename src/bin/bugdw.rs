use clap::{Parser, Subcommand};

use bugdw::reports;
use bugdw::storage::repository;

#[derive(Parser)]
#[command(name = "bugdw", about = "Bug warehouse analytics CLI")]
struct Cli {
    /// Database path (default: ~/.bugdw/bugdw.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bug-fix trend over the last N days
    Trends {
        /// Number of days to look back (1-365)
        #[arg(long, default_value = "10")]
        days: u32,
        /// Project id or name
        #[arg(long)]
        project: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List currently active bugs
    Active {
        /// Project id or name
        #[arg(long)]
        project: Option<String>,
        /// Filter by severity: Low, Medium, High, Critical
        #[arg(long)]
        severity: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List bugs with an exact status
    ByStatus {
        /// Bug status (e.g. New, Active, Closed)
        status: String,
        /// Project id or name
        #[arg(long)]
        project: Option<String>,
        /// Maximum results (1-500)
        #[arg(long, default_value = "50")]
        limit: u32,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Cross-cutting bug statistics
    Stats {
        /// Project id or name
        #[arg(long)]
        project: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List active projects
    Projects {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show warehouse status
    Status,
    /// Populate the warehouse with the sample dataset
    Seed,
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Get a config value
    Get { key: String },
    /// Set a config value
    Set { key: String, value: String },
    /// List all config values
    List,
}

/// Split a `--project` argument into (id, name): all-digit input is an id,
/// anything else a name.
fn project_args(arg: Option<&str>) -> (Option<i64>, Option<String>) {
    match arg {
        Some(s) => match s.parse::<i64>() {
            Ok(id) => (Some(id), None),
            Err(_) => (None, Some(s.to_string())),
        },
        None => (None, None),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => bugdw::Database::open_at(path).await?,
        None => bugdw::Database::open().await?,
    };

    match cli.command {
        Commands::Trends {
            days,
            project,
            json,
        } => {
            let (project_id, project_name) = project_args(project.as_deref());
            let response = reports::fix_trends(
                &db,
                &bugdw::FixTrendsRequest {
                    days_back: days,
                    project_id,
                    project_name,
                },
            )
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_trends(&response);
            }
        }
        Commands::Active {
            project,
            severity,
            json,
        } => {
            let (project_id, project_name) = project_args(project.as_deref());
            let response = reports::active_bugs(
                &db,
                &bugdw::ActiveBugsRequest {
                    project_id,
                    project_name,
                    severity,
                },
            )
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{} active bugs", response.total_active_bugs);
                print_bugs(&response.bugs);
            }
        }
        Commands::ByStatus {
            status,
            project,
            limit,
            json,
        } => {
            let (project_id, project_name) = project_args(project.as_deref());
            let response = reports::bugs_by_status(
                &db,
                &bugdw::BugsByStatusRequest {
                    status,
                    project_id,
                    project_name,
                    limit,
                },
            )
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{} bugs with status {}", response.total_count, response.status);
                print_bugs(&response.bugs);
            }
        }
        Commands::Stats { project, json } => {
            let (project_id, project_name) = project_args(project.as_deref());
            let response = reports::statistics(
                &db,
                &bugdw::StatisticsRequest {
                    project_id,
                    project_name,
                },
            )
            .await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                print_stats(&response);
            }
        }
        Commands::Projects { json } => {
            let projects = db.reader().call(|conn| repository::list_projects(conn)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&projects)?);
            } else if projects.is_empty() {
                println!("No projects. Run 'bugdw seed' to load the sample dataset.");
            } else {
                for p in &projects {
                    println!(
                        "{:>4}  {}  {}",
                        p.project_id,
                        p.name,
                        p.description.as_deref().unwrap_or("")
                    );
                }
            }
        }
        Commands::Status => {
            let (projects, work_items, bugs) = db
                .reader()
                .call(|conn| repository::warehouse_counts(conn))
                .await?;
            println!("Warehouse Status");
            println!("  Projects:   {projects}");
            println!("  Work items: {work_items}");
            println!("  Bugs:       {bugs}");
        }
        Commands::Seed => {
            db.writer()
                .call(|conn| bugdw::storage::seed::seed_demo_data(conn))
                .await?;
            println!("Sample dataset loaded.");
        }
        Commands::Config { action } => {
            handle_config(&db, action).await?;
        }
    }

    Ok(())
}

fn print_trends(response: &bugdw::FixTrendsResponse) {
    match &response.project_name {
        Some(name) => println!(
            "Bug fixes {} to {} for {name}",
            response.period_start, response.period_end
        ),
        None => println!(
            "Bug fixes {} to {} across all projects",
            response.period_start, response.period_end
        ),
    }
    for trend in &response.daily_aggregation {
        println!("  {}  {}", trend.date, trend.fixed_count);
    }
    println!("Total fixed: {}", response.total_fixed_bugs);
}

fn print_bugs(bugs: &[bugdw::BugItem]) {
    for b in bugs {
        println!(
            "  #{} [{}] {} ({}, {})",
            b.bug_id,
            b.azure_bug_id,
            b.title,
            b.severity.as_deref().unwrap_or("no severity"),
            b.status
        );
    }
}

fn print_stats(response: &bugdw::StatisticsResponse) {
    let stats = &response.statistics;
    match &response.project_name {
        Some(name) => println!("Bug statistics for {name}"),
        None => println!("Bug statistics (all projects)"),
    }
    println!("  Total:  {}", stats.total_bugs);
    println!("  New:    {}", stats.new_bugs);
    println!("  Active: {}", stats.active_bugs);
    println!("  Closed: {}", stats.closed_bugs);
    if !stats.by_severity.is_empty() {
        println!("  By severity:");
        for (severity, count) in &stats.by_severity {
            println!("    {severity}: {count}");
        }
    }
    println!("  By project:");
    for p in &stats.by_project {
        println!("    {} ({}): {}", p.project_name, p.project_id, p.bug_count);
    }
    println!("Generated at {}", response.generated_at);
}

async fn handle_config(db: &bugdw::Database, action: ConfigAction) -> anyhow::Result<()> {
    match action {
        ConfigAction::Get { key } => {
            let val: Option<String> = db
                .reader()
                .call({
                    let key = key.clone();
                    move |conn| repository::get_config(conn, &key)
                })
                .await?;
            match val {
                Some(v) => println!("{key} = {v}"),
                None => println!("{key} is not set"),
            }
        }
        ConfigAction::Set { key, value } => {
            db.writer()
                .call(move |conn| {
                    repository::set_config(conn, &key, &value)?;
                    Ok::<(), rusqlite::Error>(())
                })
                .await?;
            println!("Config updated.");
        }
        ConfigAction::List => {
            let items: Vec<(String, String)> = db
                .reader()
                .call(|conn| repository::list_config(conn))
                .await?;
            if items.is_empty() {
                println!("No configuration set.");
            } else {
                for (k, v) in items {
                    println!("{k} = {v}");
                }
            }
        }
    }
    Ok(())
}
