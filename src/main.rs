//! Glide Tables - command-line entry point
//!
//! Runs one table operation against the Glide API using configuration from
//! `GLIDE_*` environment variables, overridable with flags.
//!
//! Usage:
//! ```bash
//! export GLIDE_TOKEN=your_token_here
//! export GLIDE_APP_ID=your_app_id
//! export GLIDE_TABLE_NAME=native-table-xxxx
//! glide_tables query
//! glide_tables add columns.json rows.json
//! glide_tables update columns.json rows.json --columns quantity,discount
//! glide_tables delete rows.json
//! glide_tables create-table People schema.json rows.json
//! glide_tables overwrite-table <tableID> schema.json rows.json
//! ```

use anyhow::{bail, Context};
use glide_tables::config::GlideConfig;
use glide_tables::glide::{ColumnMap, GlideClient, MutationKind, Row, StashClient, TableColumn};
use log::warn;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::path::Path;
use tokio_stream::StreamExt;

/// Rows uploaded per stash batch
const STASH_BATCH_ROWS: usize = 500;

const USAGE: &str = "\
Usage: glide_tables [--appId ID] [--table NAME] [--token TOKEN] [--apiRoot URL] [--maxPages N] <command>

Commands:
  query                                       Fetch all rows of the table
  add     <columns.json> <rows.json> [--columns a,b]
  update  <columns.json> <rows.json> [--columns a,b]
  delete  <rows.json>
  create-table    <name> <schema.json> <rows.json>
  overwrite-table <tableID> <schema.json> <rows.json>";

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if let Err(e) = run(&args).await {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: &[String]) -> anyhow::Result<()> {
    let mut config = GlideConfig::from_lookup(|key| std::env::var(key).ok())?;
    let rest = config.apply_args(args)?;
    print_config_info(&config);

    let Some((command, operands)) = rest.split_first() else {
        bail!("No command given\n\n{}", USAGE);
    };

    match command.as_str() {
        "query" => query(&config).await,
        "add" => mutate(&config, MutationKind::Add, operands).await,
        "update" => mutate(&config, MutationKind::Update, operands).await,
        "delete" => mutate(&config, MutationKind::Delete, operands).await,
        "create-table" => stash_table(&config, StashTarget::Create, operands).await,
        "overwrite-table" => stash_table(&config, StashTarget::Overwrite, operands).await,
        other => bail!("Unknown command '{}'\n\n{}", other, USAGE),
    }
}

/// Print configuration info for debugging
fn print_config_info(config: &GlideConfig) {
    eprintln!("App ID: {}", or_unset(&config.app_id));
    eprintln!("Table: {}", or_unset(&config.table_name));
    if config.token.is_empty() {
        eprintln!("Token: <not set>");
    } else {
        let prefix: String = config.token.chars().take(8).collect();
        eprintln!(
            "Token: {}{}",
            prefix,
            if config.token.len() > prefix.len() { "***" } else { "" }
        );
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() {
        "<not set>"
    } else {
        value
    }
}

fn read_json<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    let path = Path::new(path);
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

async fn query(config: &GlideConfig) -> anyhow::Result<()> {
    let client = GlideClient::from_config(config)?;

    let mut pages = Box::pin(client.pages(&config.table_name));
    let mut rows: Vec<Value> = Vec::new();
    let mut page_count = 0;
    while let Some(page) = pages.next().await {
        let page = page?;
        page_count += 1;
        rows.extend(page.rows);
    }

    eprintln!(
        "✓ Fetched {} rows in {} pages from table {}",
        rows.len(),
        page_count,
        config.table_name
    );
    println!("{}", serde_json::to_string_pretty(&rows)?);
    Ok(())
}

async fn mutate(
    config: &GlideConfig,
    kind: MutationKind,
    operands: &[String],
) -> anyhow::Result<()> {
    let (column_map, rows_path, flags) = match (kind, operands) {
        (MutationKind::Delete, [rows_path, flags @ ..]) => (ColumnMap::new(), rows_path, flags),
        (_, [columns_path, rows_path, flags @ ..]) => {
            (read_json::<ColumnMap>(columns_path)?, rows_path, flags)
        }
        _ => bail!("Missing file arguments\n\n{}", USAGE),
    };

    let duplicates = column_map.duplicate_names();
    if !duplicates.is_empty() {
        warn!("Column map has duplicate column names: {:?}", duplicates);
    }

    let column_map = match flags {
        [] => column_map,
        [flag, names] if flag == "--columns" => {
            let names: Vec<&str> = names.split(',').map(str::trim).collect();
            column_map.restrict(&names)?
        }
        _ => bail!("Unexpected arguments {:?}\n\n{}", flags, USAGE),
    };

    let rows: Vec<Row> = read_json(rows_path)?;
    let client = GlideClient::from_config(config)?;
    client
        .apply(kind, &config.table_name, &column_map, &rows)
        .await?;

    eprintln!("✓ {} rows submitted", rows.len());
    Ok(())
}

#[derive(Clone, Copy)]
enum StashTarget {
    Create,
    Overwrite,
}

async fn stash_table(
    config: &GlideConfig,
    target: StashTarget,
    operands: &[String],
) -> anyhow::Result<()> {
    let [name_or_id, schema_path, rows_path] = operands else {
        bail!("Expected <name|tableID> <schema.json> <rows.json>\n\n{}", USAGE);
    };

    let columns: Vec<TableColumn> = read_json(schema_path)?;
    let rows: Vec<Value> = read_json(rows_path)?;

    let mut stash = StashClient::new(config.require_token()?);
    for batch in rows.chunks(STASH_BATCH_ROWS) {
        stash.stash_rows(batch).await?;
    }

    match target {
        StashTarget::Create => {
            let table_id = stash.create_table(name_or_id, &columns).await?;
            eprintln!("✓ Created table {}", table_id);
            println!("{}", table_id);
        }
        StashTarget::Overwrite => {
            stash.overwrite_table(name_or_id, &columns).await?;
            eprintln!("✓ Overwrote table {}", name_or_id);
        }
    }
    Ok(())
}
