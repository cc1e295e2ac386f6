//! Command-line entry point for the attribution engine.
//!
//! # Responsibility
//! - Expose read-side attribution use-cases over a SQLite database file.
//! - Print results as JSON for scripting; `ping` keeps a linkage probe.

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;
use worktrack_core::{
    load_config, open_db, sqlite_service, AttributionConfig, DetectionHints, MonthPeriod,
};

#[derive(Parser)]
#[command(name = "worktrack")]
#[command(version)]
#[command(about = "Multi-company work context and attribution engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// SQLite database file; created and migrated on first use
    #[arg(long, global = true, default_value = "worktrack.sqlite3")]
    db: PathBuf,

    /// Tenant owning the companies and employees
    #[arg(long, global = true)]
    tenant: Option<Uuid>,

    /// JSON configuration file (defaults apply when omitted)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Absolute directory for rolling log files
    #[arg(long, global = true)]
    log_dir: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print core linkage probe and version
    Ping,

    /// Resolve the companies an employee may work for
    Context {
        #[arg(long)]
        employee: Uuid,
    },

    /// Detect the company an activity belongs to
    Detect {
        #[arg(long)]
        employee: Uuid,
        #[arg(long)]
        company: Option<Uuid>,
        #[arg(long)]
        import_source: Option<String>,
        #[arg(long)]
        project_code: Option<String>,
        #[arg(long)]
        client_id: Option<String>,
    },

    /// Aggregate one ISO week of hours by company
    Distribution {
        #[arg(long)]
        employee: Uuid,
        #[arg(long)]
        year: i32,
        #[arg(long)]
        week: u32,
    },

    /// Print the employer/project tree with monthly statistics
    Hierarchy {
        #[arg(long)]
        year: i32,
        #[arg(long)]
        month: u32,
        /// Create the configured seed employer when none exists
        #[arg(long)]
        seed: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    if let Some(log_dir) = cli.log_dir.as_deref() {
        worktrack_core::init_logging(worktrack_core::default_log_level(), log_dir)?;
    }

    if let Commands::Ping = cli.command {
        println!("worktrack_core ping={}", worktrack_core::ping());
        println!("worktrack_core version={}", worktrack_core::core_version());
        return Ok(());
    }

    let tenant_id = cli.tenant.ok_or("--tenant is required for this command")?;
    let config = match cli.config.as_deref() {
        Some(path) => load_config(path)?,
        None => AttributionConfig::default(),
    };
    let conn = open_db(&cli.db)?;
    let service = sqlite_service(&conn, tenant_id, config)?;

    let output = match cli.command {
        Commands::Ping => return Ok(()),
        Commands::Context { employee } => {
            serde_json::to_string_pretty(&service.resolve_work_context(employee)?)?
        }
        Commands::Detect {
            employee,
            company,
            import_source,
            project_code,
            client_id,
        } => {
            let hints = DetectionHints {
                company_id: company,
                import_source,
                project_code,
                client_id,
            };
            serde_json::to_string_pretty(&service.detect_company(employee, &hints)?)?
        }
        Commands::Distribution {
            employee,
            year,
            week,
        } => serde_json::to_string_pretty(
            &service.get_timesheet_distribution(employee, week, year)?,
        )?,
        Commands::Hierarchy { year, month, seed } => {
            let period = MonthPeriod::new(year, month)
                .ok_or_else(|| format!("invalid month {year}-{month:02}"))?;
            if seed {
                service.ensure_default_employer()?;
            }
            serde_json::to_string_pretty(&service.resolve_hierarchy(period)?)?
        }
    };
    println!("{output}");
    Ok(())
}
