use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::Connection;
use tracing::{info, warn};

use crate::cli::StatusArgs;
use crate::commands::convert::store::count_rows;
use crate::commands::inventory;
use crate::model::{ConvertRunManifest, PdfInventoryManifest};
use crate::util::read_json;

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let inventory_path = inventory::default_manifest_path(&args.cache_root);

    info!(cache_root = %args.cache_root.display(), "status requested");

    if inventory_path.exists() {
        let inventory: PdfInventoryManifest = read_json(&inventory_path)?;
        info!(
            generated_at = %inventory.generated_at,
            pdf_count = inventory.pdf_count,
            skipped_html = inventory.skipped_html_count,
            "loaded inventory manifest"
        );
    } else {
        warn!(path = %inventory_path.display(), "inventory manifest missing");
    }

    let mut recorded_db_path = None;
    match latest_run_manifest(&manifest_dir)? {
        Some(path) => {
            let manifest: ConvertRunManifest = read_json(&path)?;
            recorded_db_path = Some(manifest.paths.db_path.clone());
            info!(
                path = %path.display(),
                run_id = %manifest.run_id,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                converted = manifest.counts.documents_converted,
                failed = manifest.counts.documents_failed,
                records = manifest.counts.records_written,
                diagnostics = manifest.counts.diagnostics,
                "loaded last convert run"
            );
            for outcome in manifest.documents.iter().filter(|doc| doc.status != "converted") {
                warn!(
                    doc_id = %outcome.doc_id,
                    reason = %outcome.failure_reason.clone().unwrap_or_default(),
                    "document failed in last run"
                );
            }
        }
        None => warn!(path = %manifest_dir.display(), "no convert run manifest found"),
    }

    let db_path = database_path(&args.cache_root, recorded_db_path.as_deref());
    if db_path.exists() {
        let conn = Connection::open(&db_path)
            .with_context(|| format!("failed to open {}", db_path.display()))?;
        let documents = count_rows(&conn, "SELECT COUNT(*) FROM documents").unwrap_or(0);
        let records = count_rows(&conn, "SELECT COUNT(*) FROM records").unwrap_or(0);

        info!(
            path = %db_path.display(),
            documents,
            records,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// The last run knows where it wrote; otherwise fall back to the default
/// convert location.
fn database_path(cache_root: &Path, recorded: Option<&str>) -> PathBuf {
    recorded
        .map(PathBuf::from)
        .unwrap_or_else(|| cache_root.join("vacancies.sqlite"))
}

/// Run manifests carry a compact UTC stamp, so the greatest name is the
/// newest run.
fn latest_run_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read {}", manifest_dir.display()))?
    {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", manifest_dir.display()))?
            .path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| name.starts_with("convert_run_") && name.ends_with(".json"))
            .unwrap_or(false);
        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}
