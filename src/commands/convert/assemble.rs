use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use super::annotate::{AnnotationTag, Annotator};
use super::classify::{RowClass, RowView, TOTAL_VACANCIES_PREFIX, classify};
use super::columns::ColumnMap;
use super::dates::parse_field_date;
use super::layout::Fragment;
use super::rows::{RowGroup, row_text};
use crate::error::Diagnostic;

pub const CIRCUIT_FIELD: &str = "Circuit";
pub const COURT_FIELD: &str = "Court";
pub const NOMINEE_FIELD: &str = "Nominee";
pub const NOMINATION_FIELD: &str = "Nomination";
pub const VACANCY_DATE_FIELD: &str = "Vacancy Date";
pub const UNCATEGORIZED_FIELD: &str = "Uncategorized";

const DATE_FIELDS: [&str; 2] = [VACANCY_DATE_FIELD, NOMINATION_FIELD];
const NOMINEES_MARKER: &str = "Total Nominees Pending";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(NaiveDate),
}

impl FieldValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(date) => Some(*date),
            Self::Text(_) => None,
        }
    }
}

/// One vacancy line of the table. `fields` is keyed by column label; a
/// `None` value is a column the row left empty.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VacancyRecord {
    pub page: usize,
    pub fields: BTreeMap<String, Option<FieldValue>>,
    pub circuit: Option<String>,
    pub date: Option<NaiveDate>,
}

impl VacancyRecord {
    pub fn field(&self, label: &str) -> Option<&FieldValue> {
        self.fields.get(label).and_then(Option::as_ref)
    }

    pub fn text(&self, label: &str) -> Option<&str> {
        self.field(label).and_then(FieldValue::as_text)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub vacancies: Option<u32>,
    pub nominees_pending: Option<u32>,
}

/// Running state while walking the rows of one document.
#[derive(Debug, Default)]
pub struct ParsingContext {
    pub date: Option<NaiveDate>,
    pub circuit: Option<String>,
    pub court: Option<String>,
    pub totals: Totals,
    pub stop_collecting: bool,
    pub columns: Option<ColumnMap>,
}

#[derive(Debug, Default)]
pub struct DocumentRecords {
    pub records: Vec<VacancyRecord>,
    pub diagnostics: Vec<Diagnostic>,
    pub totals: Totals,
    pub row_counts: BTreeMap<&'static str, usize>,
}

/// What became of a row classified as data. Only `Record` rows count as
/// `data_row` in the per-class tallies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DataRowOutcome {
    Record,
    SubCourt,
    BeforeHeader,
    Blank,
}

impl DataRowOutcome {
    fn as_str(self) -> &'static str {
        match self {
            Self::Record => "data_row",
            Self::SubCourt => "sub_court",
            Self::BeforeHeader => "data_row_before_header",
            Self::Blank => "blank_row",
        }
    }
}

/// Walks the rows of a single document and turns its data rows into
/// records. Build a fresh one per document.
pub struct RecordAssembler<'a> {
    context: ParsingContext,
    annotator: Option<&'a mut dyn Annotator>,
    output: DocumentRecords,
}

impl<'a> RecordAssembler<'a> {
    pub fn new(annotator: Option<&'a mut dyn Annotator>) -> Self {
        Self {
            context: ParsingContext::default(),
            annotator,
            output: DocumentRecords::default(),
        }
    }

    #[cfg(test)]
    pub fn context(&self) -> &ParsingContext {
        &self.context
    }

    pub fn push_row(&mut self, row: RowGroup) -> RowClass {
        if row.is_empty() {
            return RowClass::Unclassified;
        }

        let view = RowView::new(&row);
        let class = classify(&view, self.context.stop_collecting);
        let mut counted_as = class.as_str();

        match class {
            RowClass::Banner | RowClass::PageFooter => {
                self.annotate_group(&row, AnnotationTag::Structural);
            }
            RowClass::Total => {
                self.annotate_group(&row, AnnotationTag::Context);
                self.apply_totals(&view.text, row[0].page);
            }
            RowClass::Header => self.apply_header(&row),
            RowClass::DateMarker(date) => {
                self.annotate_group(&row, AnnotationTag::Context);
                self.context.date = Some(date);
            }
            RowClass::SectionHeader => {
                self.annotate_group(&row, AnnotationTag::Context);
                self.context.circuit = Some(view.text.clone());
                self.context.court = None;
            }
            RowClass::EndMarker => {
                self.annotate_group(&row, AnnotationTag::Structural);
                self.context.stop_collecting = true;
            }
            RowClass::DataRow => counted_as = self.assemble_record(&row).as_str(),
            RowClass::Unclassified => {
                debug!(page = row[0].page + 1, text = %view.text, "ignoring row past end of table");
            }
        }

        *self.output.row_counts.entry(counted_as).or_insert(0) += 1;
        class
    }

    pub fn finish(mut self) -> DocumentRecords {
        self.output.totals = self.context.totals;
        self.output
    }

    fn apply_totals(&mut self, text: &str, page: usize) {
        let Some(count) = text
            .split_whitespace()
            .last()
            .and_then(|token| token.parse::<u32>().ok())
        else {
            self.diagnose(Diagnostic::UnclassifiedRow {
                page,
                text: text.to_string(),
                reason: "total line without a trailing count, skipped",
            });
            return;
        };

        if text.starts_with(TOTAL_VACANCIES_PREFIX) {
            self.context.totals.vacancies = Some(count);
            // Combined line: both totals take the last count.
            if text.contains(NOMINEES_MARKER) {
                self.context.totals.nominees_pending = Some(count);
            }
        } else {
            self.context.totals.nominees_pending = Some(count);
        }
    }

    fn apply_header(&mut self, row: &[Fragment]) {
        if let Some(annotator) = self.annotator.as_deref_mut() {
            for cell in row {
                annotator.annotate_text(cell, AnnotationTag::HeaderCell);
            }
        }

        let columns = ColumnMap::from_header(row);
        debug!(
            page = row[0].page + 1,
            columns = %columns.labels().collect::<Vec<&str>>().join(" | "),
            "rebuilt column map"
        );

        if let Some(annotator) = self.annotator.as_deref_mut() {
            annotator.annotate_columns(&columns.boundaries(), row[0].page);
        }
        self.context.columns = Some(columns);
    }

    fn assemble_record(&mut self, row: &[Fragment]) -> DataRowOutcome {
        let page = row[0].page;
        let Some(columns) = self.context.columns.as_ref() else {
            self.diagnose(Diagnostic::UnclassifiedRow {
                page,
                text: row_text(row),
                reason: "data row before any column header, skipped",
            });
            return DataRowOutcome::BeforeHeader;
        };

        let mut raw = BTreeMap::<String, String>::new();
        let mut stray_text = false;
        for fragment in row.iter().filter(|fragment| !fragment.text.is_empty()) {
            let label = columns.column_for(fragment.x_min).unwrap_or_else(|| {
                stray_text = true;
                UNCATEGORIZED_FIELD
            });
            raw.entry(label.to_string())
                .and_modify(|value| {
                    value.push(' ');
                    value.push_str(&fragment.text);
                })
                .or_insert_with(|| fragment.text.clone());
        }

        if raw.is_empty() {
            return DataRowOutcome::Blank;
        }

        if stray_text {
            self.diagnose(Diagnostic::UnclassifiedRow {
                page,
                text: row_text(row),
                reason: "text left of the first column, kept as uncategorized",
            });
        }

        if raw.len() == 1 && raw.contains_key(COURT_FIELD) {
            self.context.court = raw.remove(COURT_FIELD);
            self.annotate_group(row, AnnotationTag::SubCourt);
            return DataRowOutcome::SubCourt;
        }

        let mut fields = raw
            .into_iter()
            .map(|(label, value)| (label, Some(FieldValue::Text(value))))
            .collect::<BTreeMap<String, Option<FieldValue>>>();

        for label in [NOMINEE_FIELD, NOMINATION_FIELD] {
            fields.entry(label.to_string()).or_insert(None);
        }

        let row_circuit = fields
            .get(CIRCUIT_FIELD)
            .and_then(Option::as_ref)
            .and_then(FieldValue::as_text)
            .map(str::to_owned);
        match row_circuit {
            Some(circuit) => self.context.court = Some(circuit),
            None => {
                fields.insert(
                    CIRCUIT_FIELD.to_string(),
                    self.context.court.clone().map(FieldValue::Text),
                );
            }
        }

        for label in DATE_FIELDS {
            let Some(slot) = fields.get_mut(label) else {
                continue;
            };
            let Some(FieldValue::Text(text)) = slot.as_ref() else {
                continue;
            };

            match parse_field_date(text) {
                Some(date) => *slot = Some(FieldValue::Date(date)),
                None => {
                    let diagnostic = Diagnostic::DateParseFailure {
                        page,
                        field: label.to_string(),
                        raw: text.clone(),
                    };
                    self.diagnose(diagnostic);
                }
            }
        }

        let record = VacancyRecord {
            page,
            fields,
            circuit: self.context.circuit.clone(),
            date: self.context.date,
        };

        self.annotate_group(row, AnnotationTag::Record);
        self.output.records.push(record);
        DataRowOutcome::Record
    }

    fn annotate_group(&mut self, row: &[Fragment], tag: AnnotationTag) {
        if let Some(annotator) = self.annotator.as_deref_mut() {
            annotator.annotate_group(row, tag);
        }
    }

    fn diagnose(&mut self, diagnostic: Diagnostic) {
        debug!(%diagnostic, "row diagnostic");
        self.output.diagnostics.push(diagnostic);
    }
}

/// Feeds every row through a fresh assembler.
pub fn assemble_records(
    rows: impl IntoIterator<Item = RowGroup>,
    annotator: Option<&mut dyn Annotator>,
) -> DocumentRecords {
    let mut assembler = RecordAssembler::new(annotator);
    for row in rows {
        assembler.push_row(row);
    }
    assembler.finish()
}
