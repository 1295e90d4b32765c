use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use regex::Regex;
use tracing::{debug, info};

use crate::cli::InventoryArgs;
use crate::model::{PdfEntry, PdfInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

const REPORT_FILE_STEM: &str = "vacancies";

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.raw_root)?;

    if args.dry_run {
        info!(
            pdf_count = manifest.pdf_count,
            skipped_html = manifest.skipped_html_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(pdf_count = manifest.pdf_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(cache_root: &Path) -> PathBuf {
    cache_root.join("manifests").join("pdf_inventory.json")
}

pub fn build_manifest(raw_root: &Path) -> Result<PdfInventoryManifest> {
    let pattern = report_id_regex()?;

    let (mut pdf_paths, skipped_html_count) = discover_reports(raw_root)?;
    pdf_paths.sort();

    if pdf_paths.is_empty() {
        bail!("no vacancy PDFs found in {}", raw_root.display());
    }

    let mut pdfs = Vec::with_capacity(pdf_paths.len());
    for path in pdf_paths {
        let report_id = report_id_for(&path)
            .with_context(|| format!("cannot derive report id from {}", path.display()))?;
        let (year, month) = parse_year_month(&report_id, &pattern);
        let sha256 = sha256_file(&path)?;

        pdfs.push(PdfEntry {
            report_id,
            path: path.display().to_string(),
            year,
            month,
            sha256,
        });
    }

    pdfs.sort_by(|a, b| a.report_id.cmp(&b.report_id).then(a.path.cmp(&b.path)));

    Ok(PdfInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: raw_root.display().to_string(),
        pdf_count: pdfs.len(),
        skipped_html_count,
        pdfs,
    })
}

pub fn report_id_regex() -> Result<Regex> {
    Regex::new(r"^(\d{4})[_-](\d{2})").context("failed to compile report id regex")
}

/// `raw/2019_04/vacancies.pdf` is report `2019_04`; a flat
/// `raw/2019_04.pdf` is report `2019_04` too.
pub fn report_id_for(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    if stem.eq_ignore_ascii_case(REPORT_FILE_STEM) {
        let parent = path.parent()?.file_name()?.to_str()?;
        return Some(parent.to_string());
    }
    Some(stem.to_string())
}

pub fn parse_year_month(report_id: &str, pattern: &Regex) -> (Option<u32>, Option<u32>) {
    let Some(captures) = pattern.captures(report_id) else {
        return (None, None);
    };

    let year = captures.get(1).and_then(|m| m.as_str().parse::<u32>().ok());
    let month = captures
        .get(2)
        .and_then(|m| m.as_str().parse::<u32>().ok())
        .filter(|month| (1..=12).contains(month));
    (year, month)
}

fn discover_reports(raw_root: &Path) -> Result<(Vec<PathBuf>, usize)> {
    let mut pdfs = Vec::new();
    let mut skipped_html = 0usize;

    let entries =
        fs::read_dir(raw_root).with_context(|| format!("failed to read {}", raw_root.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", raw_root.display()))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?;

        let candidates = if file_type.is_dir() {
            report_files_in(&path)?
        } else if file_type.is_file() {
            vec![path]
        } else {
            continue;
        };

        for candidate in candidates {
            match extension_of(&candidate).as_deref() {
                Some("pdf") => pdfs.push(candidate),
                Some("html") | Some("htm") => {
                    debug!(path = %candidate.display(), "skipping HTML report");
                    skipped_html += 1;
                }
                _ => {}
            }
        }
    }

    Ok((pdfs, skipped_html))
}

fn report_files_in(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry
            .with_context(|| format!("failed to read entry in {}", dir.display()))?
            .path();
        let is_report = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(|stem| stem.eq_ignore_ascii_case(REPORT_FILE_STEM))
            .unwrap_or(false);
        if is_report && path.is_file() {
            files.push(path);
        }
    }
    Ok(files)
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_ids_come_from_directory_or_flat_file_name() {
        assert_eq!(
            report_id_for(Path::new("raw/2019_04/vacancies.pdf")).as_deref(),
            Some("2019_04")
        );
        assert_eq!(
            report_id_for(Path::new("raw/2003-08.pdf")).as_deref(),
            Some("2003-08")
        );
    }

    #[test]
    fn year_and_month_are_read_from_report_ids() {
        let pattern = report_id_regex().unwrap();
        assert_eq!(parse_year_month("2019_04", &pattern), (Some(2019), Some(4)));
        assert_eq!(parse_year_month("2003-13", &pattern), (Some(2003), None));
        assert_eq!(parse_year_month("latest", &pattern), (None, None));
    }
}
