//! # Env Subcommand
//!
//! Lists the configuration paths a schema declares and the environment
//! variable that overrides each one.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use confguard_core::{env_var_name, ConfigPath};
use confguard_schema::{list_schema_paths, SchemaLoader, SchemaPath};

use crate::{runtime, EXIT_OK};

/// Arguments for the `confguard env` subcommand.
#[derive(Args, Debug)]
pub struct EnvArgs {
    /// Schema location: a filesystem path, a `file://` URL or an
    /// `http(s)://` URL.
    #[arg(long, short)]
    pub schema: String,

    /// Prefix for derived environment variable names.
    #[arg(long)]
    pub env_prefix: Option<String>,

    /// Print a JSON array instead of a table.
    #[arg(long)]
    pub json: bool,
}

/// One row of the listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvRow {
    pub path: ConfigPath,
    pub env_var: String,
    pub declared_type: String,
}

/// Execute the env subcommand.
pub fn run_env(args: &EnvArgs) -> Result<u8> {
    let document = runtime()?
        .block_on(SchemaLoader::new().load_from_url(&args.schema))
        .context("failed to load schema")?;
    let rows = env_rows(document.content(), args.env_prefix.as_deref())?;

    let stdout = std::io::stdout();
    write_rows(&rows, args.json, &mut stdout.lock())?;
    Ok(EXIT_OK)
}

/// Rows for every leaf path `content` declares, in declaration order.
pub fn env_rows(content: &[u8], prefix: Option<&str>) -> Result<Vec<EnvRow>> {
    let paths = list_schema_paths(content).context("schema cannot be walked")?;
    Ok(paths
        .into_iter()
        .map(|SchemaPath { path, declared_type }| EnvRow {
            env_var: env_var_name(prefix, &path),
            declared_type: declared_type.to_string(),
            path,
        })
        .collect())
}

fn write_rows<W: Write>(rows: &[EnvRow], json: bool, out: &mut W) -> Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(rows)?)?;
        return Ok(());
    }

    let path_width = rows.iter().map(|r| r.path.as_str().len()).max().unwrap_or(0);
    let var_width = rows.iter().map(|r| r.env_var.len()).max().unwrap_or(0);
    for row in rows {
        writeln!(
            out,
            "{:path_width$}  {:var_width$}  {}",
            row.path.as_str(),
            row.env_var,
            row.declared_type
        )?;
    }
    Ok(())
}
