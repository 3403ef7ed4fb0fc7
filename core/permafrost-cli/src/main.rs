//! permafrost — synchronize file trees with cold object storage.
//!
//! ```text
//! permafrost [--secrets=<path>] [--storage-class=<class>] sync <source-uri> <target-uri>
//! permafrost --secrets=<path> [--restore-request=<json>] restore <target-uri>
//! ```
//!
//! URIs take the form `[enc+](file|s3)://<path>`. Options must be given as
//! `--key=value`; a missing `=` or an empty value is a usage error. The
//! process exits 0 on success and 1 on any failure, usage errors included.

mod secrets;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use permafrost_store::{connect, ConnectOptions, RestoreSpec, DEFAULT_STORAGE_CLASS};
use permafrost_sync::{run_restore, run_sync};
use tracing_subscriber::EnvFilter;

/// Synchronize a file tree with cold object storage, optionally through
/// client-side encryption.
#[derive(Parser)]
#[command(name = "permafrost", version, about, long_about = None)]
struct Cli {
    /// Path to a JSON secrets file (password, accessKeyId, secretAccessKey,
    /// sessionToken, region)
    #[arg(long, global = true, require_equals = true, value_parser = non_empty_path)]
    secrets: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Make the target endpoint's contents equal to the source's
    Sync {
        /// Storage class for object-store writes
        #[arg(
            long,
            default_value = DEFAULT_STORAGE_CLASS,
            require_equals = true,
            value_parser = NonEmptyStringValueParser::new()
        )]
        storage_class: String,

        /// Source URI: [enc+](file|s3)://...
        source: String,

        /// Target URI: [enc+](file|s3)://...
        target: String,
    },

    /// Request archive retrieval for every archived object at the target
    Restore {
        /// Restore request document, e.g.
        /// '{"Days": 5, "GlacierJobParameters": {"Tier": "Bulk"}}'
        #[arg(long, require_equals = true, value_parser = NonEmptyStringValueParser::new())]
        restore_request: Option<String>,

        /// Target URI: [enc+]s3://...
        target: String,
    },
}

/// Rejects `--secrets=` with nothing after the equals sign.
fn non_empty_path(raw: &str) -> Result<PathBuf, String> {
    if raw.is_empty() {
        return Err("expected a non-empty path".to_string());
    }
    Ok(PathBuf::from(raw))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // clap's default error path exits 2; usage errors must exit 1 like any
    // other failure. Help and version output still exit 0.
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            std::process::exit(if err.use_stderr() { 1 } else { 0 });
        }
    };

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let secrets = secrets::load(cli.secrets.as_deref())?;

    match cli.command {
        Commands::Sync {
            storage_class,
            source,
            target,
        } => {
            let opts = ConnectOptions {
                storage_class: Some(storage_class),
                ..ConnectOptions::default()
            };
            let source = connect(&source, &secrets, &opts)?;
            let target = connect(&target, &secrets, &opts)?;

            let stats = run_sync(source.as_ref(), target.as_ref()).await?;
            println!("{stats}");
        }

        Commands::Restore {
            restore_request,
            target,
        } => {
            let restore_request = restore_request
                .map(|raw| {
                    serde_json::from_str::<RestoreSpec>(&raw)
                        .context("invalid --restore-request JSON")
                })
                .transpose()?;
            let opts = ConnectOptions {
                restore_request,
                ..ConnectOptions::default()
            };
            let target = connect(&target, &secrets, &opts)?;

            let stats = run_restore(target.as_ref()).await?;
            println!("{stats}");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_require_the_equals_form() {
        assert!(Cli::try_parse_from([
            "permafrost",
            "--secrets=/tmp/s.json",
            "sync",
            "file:///a",
            "file:///b",
        ])
        .is_ok());

        // The space-separated form is a usage error.
        assert!(Cli::try_parse_from([
            "permafrost",
            "--secrets",
            "/tmp/s.json",
            "sync",
            "file:///a",
            "file:///b",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "permafrost",
            "sync",
            "--storage-class",
            "GLACIER",
            "file:///a",
            "file:///b",
        ])
        .is_err());
    }

    #[test]
    fn empty_option_values_are_usage_errors() {
        assert!(Cli::try_parse_from([
            "permafrost",
            "--secrets=",
            "sync",
            "file:///a",
            "file:///b",
        ])
        .is_err());
        assert!(Cli::try_parse_from([
            "permafrost",
            "sync",
            "--storage-class=",
            "file:///a",
            "file:///b",
        ])
        .is_err());
        assert!(Cli::try_parse_from(["permafrost", "restore", "--restore-request=", "s3://b"])
            .is_err());
    }

    #[test]
    fn equals_form_values_are_parsed() {
        let cli = Cli::try_parse_from([
            "permafrost",
            "sync",
            "--storage-class=GLACIER",
            "file:///a",
            "file:///b",
        ])
        .unwrap();
        match cli.command {
            Commands::Sync { storage_class, .. } => assert_eq!(storage_class, "GLACIER"),
            _ => panic!("expected the sync subcommand"),
        }
    }
}
