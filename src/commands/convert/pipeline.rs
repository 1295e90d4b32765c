use std::path::Path;

use super::annotate::{Annotator, RecordingAnnotator};
use super::assemble::{DocumentRecords, assemble_records};
use super::layout::{convert_pdf_to_layout, extract_fragments};
use super::overrides::apply_entry_overrides;
use super::rows::group_rows;
use crate::error::ExtractError;

#[derive(Debug)]
pub struct ParsedDocument {
    pub page_count: usize,
    pub fragment_count: usize,
    pub overrides_applied: usize,
    pub output: DocumentRecords,
    pub annotations: Option<RecordingAnnotator>,
}

pub fn parse_pdf(pdf_path: &Path, record_annotations: bool) -> Result<ParsedDocument, ExtractError> {
    let xhtml = convert_pdf_to_layout(pdf_path)?;
    parse_layout_document(&xhtml, record_annotations)
}

/// Fragments, rows, then records. Nothing is returned for a document whose
/// layout cannot be read.
pub fn parse_layout_document(
    xhtml: &str,
    record_annotations: bool,
) -> Result<ParsedDocument, ExtractError> {
    let layout = extract_fragments(xhtml)?;
    let page_count = layout.pages.len();
    let fragment_count = layout.fragments.len();

    let mut annotations =
        record_annotations.then(|| RecordingAnnotator::new(layout.pages.clone()));
    let sink = annotations
        .as_mut()
        .map(|annotator| annotator as &mut dyn Annotator);

    let mut output = assemble_records(group_rows(layout.fragments), sink);
    let overrides_applied = output
        .records
        .iter_mut()
        .filter_map(|record| apply_entry_overrides(record).then_some(()))
        .count();

    Ok(ParsedDocument {
        page_count,
        fragment_count,
        overrides_applied,
        output,
        annotations,
    })
}
