//! Pull and push command implementations.
//!
//! Both commands load the configuration, apply the selection flags, and run
//! the engine against MongoDB on a fresh tokio runtime. Ctrl-C stops the run
//! after the collection in flight.

use std::path::{Path, PathBuf};

use colored::Colorize;
use tracing::info;

use crate::cli::SelectionArgs;
use crate::config::{self, RageConfiguration};
use crate::error::{Error, Result};
use crate::remote::MongoStore;
use crate::selection::{self, DatabaseSelection};
use crate::sync::{CancelFlag, FailureKind, SyncEngine, SyncOperation, SyncSummary};

/// Everything a run needs, resolved from the config file and flags.
pub(crate) struct RunContext {
    pub config: RageConfiguration,
    pub selection: DatabaseSelection,
    pub mirror_root: PathBuf,
}

/// Load the configuration and resolve the selection and mirror root.
pub(crate) fn load_run_context(
    args: &SelectionArgs,
    config_path: Option<&Path>,
    mirror: Option<&Path>,
) -> Result<RunContext> {
    let path = config::resolve_config_path(config_path)?;
    let config = config::load_config(&path)?;
    let mirror_root = config::resolve_mirror_root(mirror, &config)?;

    let selection = selection::resolve(&config.selection(), args.to_override().as_ref());
    if selection.secret.is_empty() {
        return Err(Error::Config(
            "No secret: set databaseSpecificSettings.secretKey or pass --secret".into(),
        ));
    }

    info!(
        config = %path.display(),
        method = %config.method,
        databases = ?selection.databases,
        excluded = ?selection.excluded_collections,
        "Configuration loaded"
    );

    Ok(RunContext {
        config,
        selection,
        mirror_root,
    })
}

/// Cancel `flag` when Ctrl-C is received. Must be called inside a runtime.
pub(crate) fn cancel_on_ctrl_c(flag: &CancelFlag) {
    let flag = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current collection");
            flag.cancel();
        }
    });
}

/// Execute the pull command.
///
/// # Errors
///
/// Returns an error if the configuration is unusable, the remote store is
/// unreachable, or the run was cancelled.
pub fn execute_pull(
    args: &SelectionArgs,
    config_path: Option<&Path>,
    mirror: Option<&Path>,
    json: bool,
) -> Result<()> {
    execute(SyncOperation::Pull, args, config_path, mirror, json)
}

/// Execute the push command.
///
/// # Errors
///
/// Returns an error if the configuration is unusable, the remote store is
/// unreachable, or the run was cancelled.
pub fn execute_push(
    args: &SelectionArgs,
    config_path: Option<&Path>,
    mirror: Option<&Path>,
    json: bool,
) -> Result<()> {
    execute(SyncOperation::Push, args, config_path, mirror, json)
}

fn execute(
    operation: SyncOperation,
    args: &SelectionArgs,
    config_path: Option<&Path>,
    mirror: Option<&Path>,
    json: bool,
) -> Result<()> {
    let ctx = load_run_context(args, config_path, mirror)?;

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;

    let summary = rt.block_on(async {
        let cancel = CancelFlag::new();
        cancel_on_ctrl_c(&cancel);

        let engine = SyncEngine::new(MongoStore).with_cancel_flag(cancel);
        match operation {
            SyncOperation::Pull => engine.pull(&ctx.selection, &ctx.mirror_root).await,
            SyncOperation::Push => engine.push(&ctx.selection, &ctx.mirror_root).await,
        }
    })?;

    report(&summary, &ctx.mirror_root, json)?;

    if summary.cancelled {
        return Err(Error::Cancelled);
    }
    Ok(())
}

/// Print a summary as JSON or as a human-readable report.
pub(crate) fn report(summary: &SyncSummary, mirror_root: &Path, json: bool) -> Result<()> {
    if json {
        let output = serde_json::json!({
            "success": summary.is_clean(),
            "mirror": mirror_root.display().to_string(),
            "summary": summary,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_summary(summary, mirror_root);
    }
    Ok(())
}

fn print_summary(summary: &SyncSummary, mirror_root: &Path) {
    let title = match summary.operation {
        SyncOperation::Pull => "Pull",
        SyncOperation::Push => "Push",
    };
    let state = if summary.cancelled {
        "cancelled".yellow()
    } else if summary.is_clean() {
        "complete".green()
    } else {
        "completed with failures".yellow()
    };

    println!("{} {state}", title.bold());
    println!("  Mirror: {}", mirror_root.display());
    println!();

    for synced in &summary.synced {
        let mut note = String::new();
        if synced.unchanged == Some(true) {
            note.push_str(" (unchanged)");
        }
        if synced.created {
            note.push_str(" (created)");
        }
        println!(
            "  {} {}/{}: {} documents{}",
            "✓".green(),
            synced.database,
            synced.collection,
            synced.documents,
            note.dimmed()
        );
    }

    for skipped in &summary.skipped {
        println!(
            "  {} {}/{}: excluded",
            "-".dimmed(),
            skipped.database,
            skipped.collection
        );
    }

    for failure in &summary.failures {
        let target = failure.collection.as_ref().map_or_else(
            || failure.database.clone(),
            |c| format!("{}/{c}", failure.database),
        );
        let kind = match failure.kind {
            FailureKind::Io => "io",
            FailureKind::Data => "data",
            FailureKind::Remote => "remote",
            FailureKind::Insert => "insert",
        };
        println!("  {} {target} [{kind}]: {}", "✗".red(), failure.message);
    }

    println!();
    println!(
        "  Synced: {}  Skipped: {}  Failed: {}",
        summary.synced_count(),
        summary.skipped_count(),
        summary.failed_count()
    );
    println!("  Documents: {}", summary.documents_transferred);
    if summary.documents_failed > 0 {
        println!(
            "  {}",
            format!("Documents failed: {}", summary.documents_failed).red()
        );
    }
}
