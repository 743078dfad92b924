use anyhow::{Context as _, Result};
use chrono::{DateTime, Local};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tabletalk::ai::OpenAiModel;
use tabletalk::analysis::{AnalysisCache, ColumnAnalyzer as _, ColumnClassifier};
use tabletalk::config::Settings;
use tabletalk::pipeline::{CancellationToken, Outcome, QueryPipeline};
use tabletalk::store::{SchemaStore as _, SqliteStore, ingest};

#[derive(Parser)]
#[command(
    name = "tabletalk",
    version,
    about = "Ask questions of a SQLite table in plain language"
)]
pub struct Cli {
    /// Settings file (JSON). Defaults to the platform config directory.
    #[arg(long, global = true, env = "TABLETALK_CONFIG")]
    pub config: Option<PathBuf>,

    /// SQLite database file, overriding the configured path
    #[arg(long, global = true, env = "TABLETALK_DB")]
    pub db: Option<PathBuf>,

    /// Table to query, overriding the configured table
    #[arg(long, global = true, env = "TABLETALK_TABLE")]
    pub table: Option<String>,

    /// Show the generated SQL and the full result, and log at info level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load a CSV file into the table, replacing its contents
    Load {
        /// CSV to load. Defaults to the configured `database.csv_path`.
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
    /// Answer a question about the table
    Ask {
        /// The question, in plain language
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
    },
    /// List tables and their columns
    Schema,
    /// Show the categorical/numerical classification of the table's columns
    Analyze,
    /// Check that the language model endpoint answers
    Check,
}

pub async fn run_command(cli: Cli, cancel: CancellationToken) -> Result<()> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if let Some(db) = cli.db {
        settings.database.path = db;
    }
    if let Some(table) = cli.table {
        settings.database.table = table;
    }
    settings.validate()?;

    match cli.command {
        Commands::Load { file } => handle_load(&settings, file).await,
        Commands::Ask { question } => {
            handle_ask(&settings, &question.join(" "), cli.verbose, cancel).await
        }
        Commands::Schema => handle_schema(&settings).await,
        Commands::Analyze => handle_analyze(&settings).await,
        Commands::Check => handle_check(&settings).await,
    }
}

fn classifier_cache(
    settings: &Settings,
    store: &Arc<SqliteStore>,
) -> Result<AnalysisCache<ColumnClassifier<SqliteStore>>> {
    let classifier = ColumnClassifier::new(Arc::clone(store), settings.analysis.categorical_threshold);
    AnalysisCache::new(classifier, store.path(), &settings.analysis.cache_dir)
        .context("Failed to set up the analysis cache")
}

async fn handle_load(settings: &Settings, file: Option<PathBuf>) -> Result<()> {
    let csv_path = file.unwrap_or_else(|| settings.database.csv_path.clone());
    let table = &settings.database.table;
    let store = SqliteStore::new(&settings.database.path);

    println!(
        "Loading {} into table '{table}' of {}...",
        csv_path.display(),
        store.path().display()
    );
    let rows = ingest::load_csv(&store, &csv_path, table)
        .await
        .with_context(|| format!("Failed to load {}", csv_path.display()))?;

    println!("Successfully loaded {rows} rows.");
    Ok(())
}

async fn handle_ask(
    settings: &Settings,
    question: &str,
    verbose: bool,
    cancel: CancellationToken,
) -> Result<()> {
    let store = Arc::new(SqliteStore::new(&settings.database.path));
    let analyzer = classifier_cache(settings, &store)?;
    let pipeline = QueryPipeline::new(
        store,
        analyzer,
        OpenAiModel::new(&settings.llm),
        &settings.database.table,
        settings.pipeline.clone(),
    )
    .with_cancellation(cancel);

    match pipeline.ask(question).await? {
        Outcome::Answered(answer) => {
            if verbose {
                println!("Generated SQL:\n{}\n", answer.sql);
                println!("{}\n", answer.result.render_table());
            }
            println!("Answer:\n{}", answer.explanation);
        }
        Outcome::NoData { sql } => {
            if verbose {
                println!("Generated SQL:\n{sql}\n");
            }
            println!("The query returned no rows, so there is nothing to explain.");
        }
    }
    Ok(())
}

async fn handle_schema(settings: &Settings) -> Result<()> {
    let store = SqliteStore::new(&settings.database.path);
    if !store.path().exists() {
        println!(
            "No database at {}. Run `tabletalk load` first.",
            store.path().display()
        );
        return Ok(());
    }

    let tables = store.tables().await?;
    if tables.is_empty() {
        println!("{} contains no tables.", store.path().display());
    }
    for table in tables {
        println!("{table}");
        for column in store.columns(&table).await? {
            println!("  {column}");
        }
    }
    Ok(())
}

async fn handle_analyze(settings: &Settings) -> Result<()> {
    let store = Arc::new(SqliteStore::new(&settings.database.path));
    let table = &settings.database.table;
    if !store.table_exists(table).await? {
        anyhow::bail!(
            "Table '{table}' does not exist in {}",
            store.path().display()
        );
    }

    let cache = classifier_cache(settings, &store)?;
    let analysis = cache.analyze(table).await?;

    if let Some(written) = cache.written_at(table) {
        let written: DateTime<Local> = written.into();
        println!(
            "Analysis of '{table}' (cached {})",
            written.format("%Y-%m-%d %H:%M:%S")
        );
    }
    println!("Categorical columns:");
    for (column, values) in &analysis.categorical {
        println!("  {column}: {}", values.join(", "));
    }
    println!("Numerical columns:");
    for column in &analysis.numerical {
        println!("  {column}");
    }
    Ok(())
}

async fn handle_check(settings: &Settings) -> Result<()> {
    let model = OpenAiModel::new(&settings.llm);
    model
        .test_connection()
        .await
        .with_context(|| format!("Model endpoint {} did not answer", settings.llm.api_base))?;

    println!(
        "Model '{}' at {} is reachable.",
        model.model_name(),
        settings.llm.api_base
    );
    Ok(())
}
