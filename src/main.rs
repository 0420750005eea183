use clap::{Args, Parser, Subcommand};
use colored::*;
use eyre::{Context, Result, eyre};
use std::path::PathBuf;
use std::time::Duration;
use tasklist::{
    BatchReport, Config, SortKey, SortOrder, SqliteTaskStore, StatusFilter, TaskController, TaskId, TaskRecord,
    TaskStatus,
};
use tracing::{Level, info, warn};

#[derive(Parser)]
#[command(name = "tasklist")]
#[command(about = "tasklist - Single-user task list with search, filtering and CSV export")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Optional config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Path to the task database (overrides config)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        /// Task title (required, non-empty)
        title: String,

        /// Optional description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Initial status (pending, completed)
        #[arg(short, long, default_value = "pending")]
        status: TaskStatus,
    },

    /// List tasks matching a search and status filter
    List {
        #[command(flatten)]
        view: ViewArgs,

        /// Print the rows as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a single task
    Show { id: TaskId },

    /// Edit a task, replacing the given fields
    Edit {
        id: TaskId,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New status (pending, completed)
        #[arg(short, long)]
        status: Option<TaskStatus>,
    },

    /// Mark one or more tasks completed
    Complete {
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },

    /// Delete one or more tasks
    Delete {
        #[arg(required = true)]
        ids: Vec<TaskId>,
    },

    /// Export the matching tasks to a CSV file
    Export {
        /// Destination file (default from config, tasks.csv)
        file: Option<PathBuf>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print task counts
    Summary {
        /// Filter label to show alongside the counts
        #[arg(short, long, default_value = "all")]
        filter: StatusFilter,
    },
}

#[derive(Args)]
struct ViewArgs {
    /// Free-text search over title, description and status
    #[arg(short, long, default_value = "")]
    query: String,

    /// Status filter (all, pending, completed)
    #[arg(short, long, default_value = "all")]
    filter: StatusFilter,

    /// Sort by column (id, title, status)
    #[arg(long)]
    sort: Option<SortKey>,

    /// Reverse the sort order
    #[arg(long)]
    desc: bool,
}

fn setup_logging(cli: &Cli, config: &Config) {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        config
            .log_level
            .as_deref()
            .and_then(|l| l.parse::<Level>().ok())
            .unwrap_or(Level::WARN)
    };

    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, skipped) = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(&cli, &config);

    // Logging was not up while the fallback chain ran
    for skip in &skipped {
        warn!(path = %skip.path.display(), error = %skip.error, "Ignored unusable config file");
    }

    let db_path = cli.db.clone().unwrap_or_else(|| config.storage.database.clone());
    let store = SqliteTaskStore::open_with_timeout(&db_path, Duration::from_millis(config.storage.busy_timeout_ms))
        .context(format!("Failed to open task database at {}", db_path.display()))?;
    info!(path = %db_path.display(), "Using task database");

    let mut tasks = TaskController::new(store);

    match cli.command {
        Commands::Add {
            title,
            description,
            status,
        } => {
            let id = tasks.add(&title, &description, status)?;
            println!("{} task {}", "Added".green(), id);
        }
        Commands::List { view, json } => {
            apply_view(&mut tasks, &view);
            let rows = tasks.visible();
            if json {
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for row in &rows {
                    print_row(row);
                }
                let active = tasks.active_query();
                if !active.text.trim().is_empty() {
                    println!("{}", format!("Search: \"{}\" ({} shown)", active.text.trim(), rows.len()).dimmed());
                }
                println!("{}", tasks.summary().to_string().dimmed());
            }
        }
        Commands::Show { id } => {
            let record = tasks.get(id).ok_or_else(|| eyre!("Task {} not found", id))?;
            println!("{}      {}", "ID:".bold(), record.id);
            println!("{}   {}", "Title:".bold(), record.title);
            println!("{}  {}", "Status:".bold(), colored_status(record.status));
            println!("{}", "Description:".bold());
            println!("{}", record.description);
        }
        Commands::Edit {
            id,
            title,
            description,
            status,
        } => {
            let current = tasks
                .get(id)
                .cloned()
                .ok_or_else(|| eyre!("Task {} not found", id))?;
            tasks.edit(
                id,
                title.as_deref().unwrap_or(&current.title),
                description.as_deref().unwrap_or(&current.description),
                status.unwrap_or(current.status),
            )?;
            println!("{} task {}", "Updated".green(), id);
        }
        Commands::Complete { ids } => {
            let report = tasks.mark_completed(&ids);
            report_batch("Completed", &report)?;
        }
        Commands::Delete { ids } => {
            let report = tasks.delete(&ids);
            report_batch("Deleted", &report)?;
        }
        Commands::Export { file, view } => {
            apply_view(&mut tasks, &view);
            let path = file.unwrap_or_else(|| config.export.default_file.clone());
            let count = tasks.export(&path)?;
            println!("{} {} tasks to {}", "Exported".green(), count, path.display());
        }
        Commands::Summary { filter } => {
            tasks.set_status_filter(filter);
            println!("{}", tasks.summary());
        }
    }

    Ok(())
}

fn apply_view(tasks: &mut TaskController<SqliteTaskStore>, view: &ViewArgs) {
    tasks.set_search(view.query.clone());
    tasks.set_status_filter(view.filter);
    let order = if view.desc {
        SortOrder::Descending
    } else {
        SortOrder::Ascending
    };
    tasks.set_sort(view.sort.map(|key| (key, order)));
}

fn colored_status(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Pending => status.as_str().yellow(),
        TaskStatus::Completed => status.as_str().green(),
    }
}

fn print_row(record: &TaskRecord) {
    let status = format!("{:<9}", record.status.as_str());
    let status = match record.status {
        TaskStatus::Pending => status.yellow(),
        TaskStatus::Completed => status.green(),
    };
    if record.description.is_empty() {
        println!("{:>5}  {}  {}", record.id, status, record.title.bold());
    } else {
        println!(
            "{:>5}  {}  {}  {}",
            record.id,
            status,
            record.title.bold(),
            record.description.dimmed()
        );
    }
}

fn report_batch(verb: &str, report: &BatchReport) -> Result<()> {
    if !report.succeeded.is_empty() {
        println!("{} {} task(s)", verb.green(), report.succeeded.len());
    }
    for (id, err) in &report.failed {
        eprintln!("{} task {}: {}", "Failed".red(), id, err);
    }
    if report.is_clean() {
        Ok(())
    } else {
        Err(eyre!(
            "{} of {} task(s) failed",
            report.failed.len(),
            report.failed.len() + report.succeeded.len()
        ))
    }
}
