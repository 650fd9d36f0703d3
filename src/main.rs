//! CLI entry point for the artboard earnings report tool.
//!
//! Provides subcommands for summarizing and comparing marketplace earnings
//! exports, listing items that never sold, and managing the keyword bank.

mod infra;
mod services;

use crate::infra::bank::{LocalStore, backup_to_local, connect_remote, connect_store, migrate_from_local};
use crate::infra::config::{KeywordConfig, SupabaseConfig, bank_path_from_env};
use crate::services::theme_store::{
    NewTheme, ThemeFilter, ThemeStore, filter_themes, parse_import, parse_keywords,
};
use anyhow::{Context, Result, anyhow};
use artboard_report::analyzers::sort::{
    ComparisonColumn, ComparisonSort, SortDirection, SummaryKey, SummarySort,
};
use artboard_report::columns::ColumnRoles;
use artboard_report::loader::load_sources;
use artboard_report::output::{
    comparison_records, summary_records, to_json, write_comparison_items, write_comparison_table,
    write_csv, write_csv_file, write_summary_items, write_summary_table, write_unpopular_table,
};
use artboard_report::session::Session;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "artboard_report")]
#[command(about = "Earnings reports for marketplace design exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Total earnings per artboard label
    Summary {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Column to sort by
        #[arg(long, value_enum, default_value_t = SummaryKey::TotalValue)]
        sort_key: SummaryKey,

        /// Sort direction
        #[arg(long, value_enum, default_value_t = SortDirection::Descending)]
        direction: SortDirection,

        /// List each label's items under the table
        #[arg(long, default_value_t = false)]
        items: bool,
    },
    /// Per-label earnings side by side for every source
    Compare {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        render: RenderArgs,

        /// Compare this source against all others pooled together (needs --no-merge)
        #[arg(long)]
        baseline: Option<String>,

        /// Index of the source whose figures drive the sort order
        #[arg(long, default_value_t = 0)]
        source_index: usize,

        /// Figure to sort by
        #[arg(long, value_enum, default_value_t = ComparisonColumn::Total)]
        by: ComparisonColumn,

        /// Sort direction
        #[arg(long, value_enum, default_value_t = SortDirection::Descending)]
        direction: SortDirection,

        /// List each label's items per source under the table
        #[arg(long, default_value_t = false)]
        items: bool,

        /// Only include these labels (repeatable)
        #[arg(long = "label", value_name = "LABEL")]
        labels: Vec<String>,
    },
    /// Items whose earnings add up to exactly zero
    Unpopular {
        #[command(flatten)]
        input: InputArgs,

        #[command(flatten)]
        render: RenderArgs,
    },
    /// Every label found in the data
    Labels {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Suggest new keywords from titles that fell into generic labels
    Suggest {
        #[command(flatten)]
        input: InputArgs,
    },
    /// Manage the keyword bank
    Bank {
        #[command(subcommand)]
        command: BankCommands,
    },
}

#[derive(Subcommand)]
enum BankCommands {
    /// List themes, alphabetically unless --latest
    List {
        /// Filter by theme name
        #[arg(long)]
        theme: Option<String>,

        /// Filter by keyword
        #[arg(long)]
        keyword: Option<String>,

        /// Filter by exact category
        #[arg(long)]
        category: Option<String>,

        /// Newest first
        #[arg(long, default_value_t = false)]
        latest: bool,

        /// Print as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Show one theme
    Get { id: i64 },
    /// Add a theme
    Add {
        theme: String,

        /// Comma-separated keywords
        #[arg(short, long)]
        keywords: String,

        #[arg(short, long, default_value = "")]
        category: String,
    },
    /// Replace the fields of a theme
    Update {
        id: i64,

        theme: String,

        /// Comma-separated keywords
        #[arg(short, long)]
        keywords: String,

        #[arg(short, long, default_value = "")]
        category: String,
    },
    /// Delete one or more themes
    Remove {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Delete every theme
    Clear {
        /// Required confirmation
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    /// Import themes from a JSON file
    Import {
        #[arg(value_name = "FILE")]
        path: String,
    },
    /// Print every theme as JSON
    Export,
    /// Copy the local keyword bank into the hosted table
    Migrate,
    /// Save the hosted keyword bank to the local file
    Backup,
}

/// Sources and classification settings shared by every analysis command.
#[derive(Args, Debug)]
struct InputArgs {
    /// CSV files or URLs to analyze
    #[arg(value_name = "FILE_OR_URL", required = true)]
    sources: Vec<String>,

    /// Maximum number of concurrent source reads
    #[arg(short, long, default_value_t = 5)]
    concurrency: usize,

    /// Keep sources separate instead of combining them
    #[arg(long, default_value_t = false)]
    no_merge: bool,

    /// JSON file with the keyword list, replacing the built-in one
    #[arg(short, long, value_name = "FILE")]
    keywords: Option<String>,

    /// Extra keyword (repeatable)
    #[arg(long, value_name = "KEYWORD")]
    add_keyword: Vec<String>,

    /// Keyword to drop (repeatable)
    #[arg(long, value_name = "KEYWORD")]
    remove_keyword: Vec<String>,

    #[arg(long)]
    title_column: Option<String>,

    #[arg(long)]
    value_column: Option<String>,

    #[arg(long)]
    id_column: Option<String>,

    #[arg(long)]
    url_column: Option<String>,

    #[arg(long)]
    category_column: Option<String>,
}

#[derive(Args, Debug)]
struct RenderArgs {
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write to this file instead of stdout
    #[arg(short, long)]
    output: Option<String>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/artboard_report.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("artboard_report.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Summary {
            input,
            render,
            sort_key,
            direction,
            items,
        } => {
            let mut session = load_session(&input).await?;
            session.summary_sort = SummarySort {
                key: sort_key,
                direction,
            };
            let rows = session.summary();
            info!(groups = rows.len(), "Summary computed");

            match render.format {
                OutputFormat::Table => emit(&render, |out| {
                    write_summary_table(out, &rows)?;
                    if items {
                        writeln!(out)?;
                        write_summary_items(out, &rows)?;
                    }
                    Ok(())
                })?,
                OutputFormat::Json => emit(&render, |out| write_json(out, &rows))?,
                OutputFormat::Csv => export_csv(&render, &summary_records(&rows))?,
            }
        }
        Commands::Compare {
            input,
            render,
            baseline,
            source_index,
            by,
            direction,
            items,
            labels,
        } => {
            let mut session = load_session(&input).await?;
            if baseline.is_some() && session.merge {
                warn!("--baseline only applies with --no-merge, ignoring it");
            }
            session.baseline = baseline;
            session.comparison_sort = ComparisonSort {
                source_index,
                column: by,
                direction,
            };
            if !labels.is_empty() {
                session.selected = Some(labels.into_iter().collect::<HashSet<_>>());
            }
            let report = session.comparison();
            info!(
                groups = report.rows.len(),
                sources = report.source_names.len(),
                "Comparison computed"
            );

            match render.format {
                OutputFormat::Table => emit(&render, |out| {
                    write_comparison_table(out, &report)?;
                    if items {
                        write_comparison_items(out, &report)?;
                    }
                    Ok(())
                })?,
                OutputFormat::Json => emit(&render, |out| write_json(out, &report))?,
                OutputFormat::Csv => export_csv(&render, &comparison_records(&report))?,
            }
        }
        Commands::Unpopular { input, render } => {
            let session = load_session(&input).await?;
            let report = session.unpopular();
            info!(items = report.items.len(), "Unpopular items found");

            match render.format {
                OutputFormat::Table => emit(&render, |out| write_unpopular_table(out, &report))?,
                OutputFormat::Json => emit(&render, |out| write_json(out, &report))?,
                OutputFormat::Csv => export_csv(&render, &report.items)?,
            }
        }
        Commands::Labels { input } => {
            let session = load_session(&input).await?;
            for label in session.labels() {
                println!("{label}");
            }
        }
        Commands::Suggest { input } => {
            let session = load_session(&input).await?;
            let suggestions = session.suggest_keywords();
            if suggestions.is_empty() {
                println!("No new keyword suggestions.");
            }
            for word in suggestions {
                println!("{word}");
            }
        }
        Commands::Bank { command } => run_bank(command).await?,
    }

    Ok(())
}

/// Loads every source and builds the session the analysis commands share.
#[tracing::instrument(skip(input), fields(sources = input.sources.len(), merge = !input.no_merge))]
async fn load_session(input: &InputArgs) -> Result<Session> {
    let mut session = Session::new();
    if let Some(path) = &input.keywords {
        let keywords = KeywordConfig::load(path)?.into_keywords();
        info!(path = %path, count = keywords.len(), "Keyword list loaded");
        session = session.with_keywords(keywords);
    }
    for keyword in &input.add_keyword {
        session.add_keyword(keyword);
    }
    for keyword in &input.remove_keyword {
        session.remove_keyword(keyword);
    }

    session.merge = !input.no_merge;
    session.overrides = ColumnRoles {
        title: input.title_column.clone(),
        value: input.value_column.clone(),
        id: input.id_column.clone(),
        url: input.url_column.clone(),
        category: input.category_column.clone(),
    };

    let datasets = load_sources(&input.sources, input.concurrency).await;
    if let Some(warning) = session.load(datasets) {
        eprintln!("Warning: {warning}");
    }
    Ok(session)
}

/// Runs `render_fn` against stdout or the `--output` file.
fn emit<F>(render: &RenderArgs, render_fn: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    match &render.output {
        Some(path) => {
            if let Some(parent) = Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("failed to create directory {}", parent.display())
                    })?;
                }
            }
            let mut file =
                std::fs::File::create(path).with_context(|| format!("failed to create {path}"))?;
            render_fn(&mut file)?;
            info!(path = %path, "Report written");
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            render_fn(&mut lock)?;
        }
    }
    Ok(())
}

fn write_json(out: &mut dyn Write, value: &impl Serialize) -> Result<()> {
    writeln!(out, "{}", to_json(value)?)?;
    Ok(())
}

fn export_csv<T: Serialize>(render: &RenderArgs, records: &[T]) -> Result<()> {
    match &render.output {
        Some(path) => {
            write_csv_file(path, records)?;
            info!(path = %path, records = records.len(), "CSV written");
            Ok(())
        }
        None => write_csv(std::io::stdout().lock(), records),
    }
}

/// Dispatches keyword-bank subcommands against the configured store.
#[tracing::instrument(skip(command))]
async fn run_bank(command: BankCommands) -> Result<()> {
    let bank_path = bank_path_from_env();
    let remote_config = SupabaseConfig::from_env();

    match command {
        BankCommands::Migrate => {
            let config = remote_config
                .ok_or_else(|| anyhow!("SUPABASE_URL and SUPABASE_ANON_KEY must be set to migrate"))?;
            let remote = connect_remote(&config).await?;
            let local = LocalStore::new(&bank_path);
            let count = migrate_from_local(&local, &remote).await?;
            println!("Migrated {count} themes from {bank_path}.");
            return Ok(());
        }
        BankCommands::Backup => {
            let config = remote_config
                .ok_or_else(|| anyhow!("SUPABASE_URL and SUPABASE_ANON_KEY must be set to back up"))?;
            let remote = connect_remote(&config).await?;
            let local = LocalStore::new(&bank_path);
            let count = backup_to_local(&remote, &local).await?;
            println!("Backed up {count} themes to {bank_path}.");
            return Ok(());
        }
        _ => {}
    }

    let store = connect_store(remote_config.as_ref(), &bank_path).await;
    info!(backend = store.backend(), "Keyword bank ready");
    run_store_command(store.as_ref(), command).await
}

async fn run_store_command(store: &dyn ThemeStore, command: BankCommands) -> Result<()> {
    match command {
        BankCommands::List {
            theme,
            keyword,
            category,
            latest,
            json,
        } => {
            let filter = ThemeFilter {
                theme,
                keyword,
                category,
                latest,
            };
            let themes = filter_themes(store.list().await?, &filter);
            if json {
                println!("{}", to_json(&themes)?);
            } else {
                for t in &themes {
                    println!("{:>5}  {} [{}]: {}", t.id, t.theme, t.category, t.keywords.join(", "));
                }
                println!("{} themes", themes.len());
            }
        }
        BankCommands::Get { id } => match store.get(id).await? {
            Some(theme) => println!("{}", to_json(&theme)?),
            None => return Err(anyhow!("theme {id} not found")),
        },
        BankCommands::Add {
            theme,
            keywords,
            category,
        } => {
            let new = validated_theme(&theme, &category, &keywords)?;
            let created = store.create(new).await?;
            println!("Added theme {} ({}).", created.id, created.theme);
        }
        BankCommands::Update {
            id,
            theme,
            keywords,
            category,
        } => {
            let new = validated_theme(&theme, &category, &keywords)?;
            let updated = store.update(id, new).await?;
            println!("Updated theme {} ({}).", updated.id, updated.theme);
        }
        BankCommands::Remove { ids } => {
            store.delete_many(&ids).await?;
            println!("Removed {} themes.", ids.len());
        }
        BankCommands::Clear { yes } => {
            if !yes {
                return Err(anyhow!("refusing to clear the keyword bank without --yes"));
            }
            store.delete_all().await?;
            println!("Keyword bank cleared.");
        }
        BankCommands::Import { path } => {
            let content = tokio::fs::read_to_string(&path).await?;
            let themes = parse_import(&content)?;
            if themes.is_empty() {
                return Err(anyhow!("no valid themes found in {path}"));
            }
            let created = store.create_many(themes).await?;
            println!("Imported {} themes.", created.len());
        }
        BankCommands::Export => {
            println!("{}", to_json(&store.list().await?)?);
        }
        BankCommands::Migrate | BankCommands::Backup => {
            return Err(anyhow!("migrate and backup need the hosted keyword bank"));
        }
    }
    Ok(())
}

/// Builds a theme from CLI input; name and at least one keyword are required.
fn validated_theme(theme: &str, category: &str, keywords: &str) -> Result<NewTheme> {
    let keywords = parse_keywords(keywords);
    if theme.trim().is_empty() {
        return Err(anyhow!("theme name must not be empty"));
    }
    if keywords.is_empty() {
        return Err(anyhow!("at least one keyword is required"));
    }
    Ok(NewTheme::new(theme, category, keywords))
}
