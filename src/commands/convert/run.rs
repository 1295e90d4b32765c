use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::Connection;
use serde::Serialize;
use tracing::{error, info, warn};

use super::assemble::{Totals, VacancyRecord};
use super::pipeline::{ParsedDocument, parse_pdf};
use super::store::{
    DB_SCHEMA_VERSION, DocumentRow, configure_connection, count_rows, ensure_schema,
    replace_document_records,
};
use crate::cli::ConvertArgs;
use crate::commands::inventory;
use crate::model::{
    ConvertCounts, ConvertPaths, ConvertRunManifest, DocumentOutcome, PdfInventoryManifest,
    ToolVersions,
};
use crate::util::{
    ensure_directory, now_utc_string, read_json, sha256_file, utc_compact_string,
    write_json_pretty,
};

struct ConvertTarget {
    doc_id: String,
    path: PathBuf,
    sha256: String,
}

#[derive(Serialize)]
struct RecordDump<'a> {
    doc_id: &'a str,
    totals: Totals,
    records: &'a [VacancyRecord],
}

pub fn run(args: ConvertArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let run_manifest_path = args.run_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!("convert_run_{}.json", utc_compact_string(started_ts)))
    });
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join("vacancies.sqlite"));
    let debug_dir = args.debug_annotations.then(|| cache_root.join("debug"));

    info!(cache_root = %cache_root.display(), run_id = %run_id, "starting convert");

    let targets = resolve_targets(&args)?;
    let tool_versions = collect_tool_versions();

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let mut counts = ConvertCounts {
        documents_requested: targets.len(),
        ..ConvertCounts::default()
    };
    let mut documents = Vec::with_capacity(targets.len());
    let mut warnings = Vec::new();

    for target in &targets {
        let source_path = target.path.display().to_string();
        info!(doc_id = %target.doc_id, path = %source_path, "converting document");

        let converted = convert_document(
            &mut connection,
            target,
            debug_dir.as_deref(),
            args.json_dir.as_deref(),
        );

        match converted {
            Ok(parsed) => {
                let output = &parsed.output;
                counts.documents_converted += 1;
                counts.records_written += output.records.len();
                counts.overrides_applied += parsed.overrides_applied;
                counts.diagnostics += output.diagnostics.len();
                for (class, count) in &output.row_counts {
                    *counts.rows_by_class.entry(class.to_string()).or_insert(0) += count;
                }

                if !output.diagnostics.is_empty() {
                    warn!(
                        doc_id = %target.doc_id,
                        diagnostics = output.diagnostics.len(),
                        "rows skipped or kept raw"
                    );
                }
                warnings.extend(
                    output
                        .diagnostics
                        .iter()
                        .map(|diagnostic| format!("{}: {diagnostic}", target.doc_id)),
                );

                info!(
                    doc_id = %target.doc_id,
                    pages = parsed.page_count,
                    records = output.records.len(),
                    "document converted"
                );
                documents.push(DocumentOutcome {
                    doc_id: target.doc_id.clone(),
                    source_path,
                    status: "converted".to_string(),
                    page_count: parsed.page_count,
                    fragment_count: parsed.fragment_count,
                    record_count: output.records.len(),
                    total_vacancies: output.totals.vacancies,
                    total_nominees_pending: output.totals.nominees_pending,
                    failure_reason: None,
                });
            }
            Err(err) => {
                counts.documents_failed += 1;
                error!(doc_id = %target.doc_id, error = %format!("{err:#}"), "document failed");
                documents.push(DocumentOutcome {
                    doc_id: target.doc_id.clone(),
                    source_path,
                    status: "failed".to_string(),
                    page_count: 0,
                    fragment_count: 0,
                    record_count: 0,
                    total_vacancies: None,
                    total_nominees_pending: None,
                    failure_reason: Some(format!("{err:#}")),
                });
            }
        }
    }

    let records_total = count_rows(&connection, "SELECT COUNT(*) FROM records")?;
    let status = if counts.documents_failed == 0 {
        "completed"
    } else {
        "completed_with_failures"
    };

    let manifest = ConvertRunManifest {
        manifest_version: 1,
        run_id,
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_convert_command(&args),
        tool_versions,
        paths: ConvertPaths {
            cache_root: cache_root.display().to_string(),
            db_path: db_path.display().to_string(),
            debug_dir: debug_dir.map(|path| path.display().to_string()),
            json_dir: args.json_dir.as_ref().map(|path| path.display().to_string()),
        },
        counts,
        documents,
        warnings,
    };

    write_json_pretty(&run_manifest_path, &manifest)?;

    info!(path = %run_manifest_path.display(), "wrote convert run manifest");
    info!(
        converted = manifest.counts.documents_converted,
        failed = manifest.counts.documents_failed,
        records_total,
        "convert completed"
    );

    Ok(())
}

/// One document, start to finish. Any error leaves the stored rows of that
/// document untouched and does not stop the batch.
fn convert_document(
    connection: &mut Connection,
    target: &ConvertTarget,
    debug_dir: Option<&Path>,
    json_dir: Option<&Path>,
) -> Result<ParsedDocument> {
    let parsed = parse_pdf(&target.path, debug_dir.is_some())
        .with_context(|| format!("failed to parse {}", target.path.display()))?;
    store_document(connection, target, &parsed, debug_dir, json_dir)?;
    Ok(parsed)
}

/// Side files go first; the database transaction is the last step that can
/// fail.
fn store_document(
    connection: &mut Connection,
    target: &ConvertTarget,
    parsed: &ParsedDocument,
    debug_dir: Option<&Path>,
    json_dir: Option<&Path>,
) -> Result<()> {
    if let (Some(dir), Some(annotations)) = (debug_dir, parsed.annotations.as_ref()) {
        let path = dir.join(format!("{}.annotations.json", target.doc_id));
        write_json_pretty(&path, annotations)?;
        info!(path = %path.display(), annotations = annotations.annotations.len(), "wrote debug annotations");
    }

    if let Some(dir) = json_dir {
        let path = dir.join(format!("{}.json", target.doc_id));
        write_json_pretty(
            &path,
            &RecordDump {
                doc_id: &target.doc_id,
                totals: parsed.output.totals,
                records: &parsed.output.records,
            },
        )?;
    }

    let source_path = target.path.display().to_string();
    let converted_at = now_utc_string();
    replace_document_records(
        connection,
        &DocumentRow {
            doc_id: &target.doc_id,
            source_path: &source_path,
            sha256: &target.sha256,
            converted_at: &converted_at,
            page_count: parsed.page_count,
            totals: parsed.output.totals,
        },
        &parsed.output.records,
    )?;

    Ok(())
}

fn resolve_targets(args: &ConvertArgs) -> Result<Vec<ConvertTarget>> {
    if !args.files.is_empty() {
        return args
            .files
            .iter()
            .map(|path| -> Result<ConvertTarget> {
                let doc_id = inventory::report_id_for(path)
                    .with_context(|| format!("cannot derive report id from {}", path.display()))?;
                Ok(ConvertTarget {
                    doc_id,
                    path: path.clone(),
                    sha256: sha256_file(path)?,
                })
            })
            .collect();
    }

    let inventory_path = inventory::default_manifest_path(&args.cache_root);
    let inventory = load_or_refresh_inventory(&args.raw_root, &inventory_path, args.refresh_inventory)?;

    Ok(inventory
        .pdfs
        .into_iter()
        .map(|pdf| ConvertTarget {
            doc_id: pdf.report_id,
            path: PathBuf::from(pdf.path),
            sha256: pdf.sha256,
        })
        .collect())
}

fn load_or_refresh_inventory(
    raw_root: &Path,
    inventory_path: &Path,
    refresh_inventory: bool,
) -> Result<PdfInventoryManifest> {
    if refresh_inventory || !inventory_path.exists() {
        let manifest = inventory::build_manifest(raw_root)?;
        write_json_pretty(inventory_path, &manifest)?;
        info!(
            path = %inventory_path.display(),
            pdf_count = manifest.pdf_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let manifest: PdfInventoryManifest = read_json(inventory_path)?;
    info!(
        path = %inventory_path.display(),
        pdf_count = manifest.pdf_count,
        "loaded existing inventory manifest"
    );
    Ok(manifest)
}

fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: command_version("pdftotext", &["-v"]).unwrap_or_else(|| {
            warn!("pdftotext not found; every document will fail to convert");
            "unavailable".to_string()
        }),
    }
}

// pdftotext prints its version on stderr.
fn command_version(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}

fn render_convert_command(args: &ConvertArgs) -> String {
    let mut command = vec![
        "vacancy-tables".to_string(),
        "convert".to_string(),
        "--raw-root".to_string(),
        args.raw_root.display().to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];

    if let Some(path) = &args.db_path {
        command.push("--db-path".to_string());
        command.push(path.display().to_string());
    }
    if let Some(path) = &args.run_manifest_path {
        command.push("--run-manifest-path".to_string());
        command.push(path.display().to_string());
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }
    if args.debug_annotations {
        command.push("--debug-annotations".to_string());
    }
    if let Some(path) = &args.json_dir {
        command.push("--json-dir".to_string());
        command.push(path.display().to_string());
    }
    command.extend(args.files.iter().map(|path| path.display().to_string()));

    command.join(" ")
}
