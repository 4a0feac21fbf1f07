//! # Check Subcommand
//!
//! Loads a configuration file into a [`LayeredConfig`], validates it (with
//! the environment overrides the schema declares) and reports violations
//! keyed by configuration path.
//!
//! Violations are logged as `error` events by default. With `--json` the
//! translated fields are printed to stdout as a single JSON object.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use confguard_core::{EnvSource, LayeredConfig, ProcessEnv};
use confguard_schema::{
    log_validation_error, translate_for_logging, validate_from_url, ConfigValidationError,
    SchemaLoader,
};

use crate::{runtime, EXIT_ERROR, EXIT_INVALID, EXIT_OK};

/// Arguments for the `confguard check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Schema location: a filesystem path, a `file://` URL or an
    /// `http(s)://` URL.
    #[arg(long, short)]
    pub schema: String,

    /// Configuration file (JSON or YAML). Without it only defaults and
    /// environment variables are validated.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Prefix for derived environment variable names (`APP` makes
    /// `service.port` read `APP_SERVICE_PORT`).
    #[arg(long)]
    pub env_prefix: Option<String>,

    /// Print translated fields as JSON on stdout instead of logging them.
    #[arg(long)]
    pub json: bool,
}

/// Execute the check subcommand against the process environment.
///
/// Returns exit code: 0 on success, 1 on validation failure, 2 when the
/// schema could not be loaded or compiled.
pub fn run_check(args: &CheckArgs) -> Result<u8> {
    let config = build_config(args, ProcessEnv)?;
    let stdout = std::io::stdout();
    execute(args, config, &mut stdout.lock())
}

/// Assemble the provider for a check: the configuration file layered under
/// `env`.
pub fn build_config(args: &CheckArgs, env: impl EnvSource + 'static) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::new().with_env(env);
    if let Some(prefix) = &args.env_prefix {
        config = config.with_env_prefix(prefix.clone());
    }
    if let Some(path) = &args.config {
        config
            .load_file(path)
            .with_context(|| format!("failed to load configuration file {}", path.display()))?;
    }
    Ok(config)
}

/// Validate `config` and write the outcome to `out`.
pub fn execute<W: Write>(args: &CheckArgs, mut config: LayeredConfig, out: &mut W) -> Result<u8> {
    let loader = SchemaLoader::new();
    let result = runtime()?.block_on(validate_from_url(&loader, &mut config, &args.schema));

    let error = match result {
        Ok(()) => {
            if args.json {
                writeln!(out, "{{}}")?;
            } else {
                writeln!(out, "ok: configuration conforms to {}", args.schema)?;
            }
            return Ok(EXIT_OK);
        }
        Err(error) => error,
    };

    if args.json {
        let fields = translate_for_logging(&error, &config);
        writeln!(out, "{}", serde_json::to_string_pretty(&fields)?)?;
    } else {
        log_validation_error(&error, &config);
    }
    Ok(exit_code(&error))
}

fn exit_code(error: &ConfigValidationError) -> u8 {
    match error {
        ConfigValidationError::Validation { .. } => EXIT_INVALID,
        _ => EXIT_ERROR,
    }
}
