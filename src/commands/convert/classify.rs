use chrono::NaiveDate;

use super::dates::parse_section_date;
use super::layout::Fragment;
use super::rows::row_text;

pub const BANNER_PREFIX: &str = "Vacancies in the Federal Judiciary";
pub const TOTAL_VACANCIES_PREFIX: &str = "Total Vacancies:";
pub const TOTAL_NOMINEES_PREFIX: &str = "Total Nominees Pending:";
pub const HEADER_FIRST_CELLS: [&str; 2] = ["Circuit", "Court"];
pub const CIRCUIT_SUFFIX: &str = " Circuit";
pub const TRADE_COURT_SECTION: &str = "International Trade";
pub const END_MARKER: &str = "VACANCIES";
pub const FOOTER_PREFIXES: [&str; 2] = ["Federal Judicial Vacancies", "http:"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowClass {
    Banner,
    Total,
    Header,
    DateMarker(NaiveDate),
    SectionHeader,
    EndMarker,
    PageFooter,
    DataRow,
    Unclassified,
}

impl RowClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Banner => "banner",
            Self::Total => "total",
            Self::Header => "header",
            Self::DateMarker(_) => "date_marker",
            Self::SectionHeader => "section_header",
            Self::EndMarker => "end_marker",
            Self::PageFooter => "page_footer",
            Self::DataRow => "data_row",
            Self::Unclassified => "unclassified",
        }
    }
}

/// The pieces of a row every rule looks at.
pub struct RowView<'a> {
    pub text: String,
    pub first: &'a str,
    pub cells: usize,
}

impl<'a> RowView<'a> {
    pub fn new(row: &'a [Fragment]) -> Self {
        Self {
            text: row_text(row),
            first: row.first().map(|fragment| fragment.text.as_str()).unwrap_or(""),
            cells: row.len(),
        }
    }
}

type Rule = fn(&RowView<'_>) -> Option<RowClass>;

/// Checked top to bottom; the first rule that matches decides the class.
const RULES: [Rule; 7] = [
    banner, total, header, date_marker, section_header, end_marker, page_footer,
];

pub fn classify(view: &RowView<'_>, stop_collecting: bool) -> RowClass {
    RULES
        .iter()
        .find_map(|rule| rule(view))
        .unwrap_or(if stop_collecting {
            RowClass::Unclassified
        } else {
            RowClass::DataRow
        })
}

fn banner(view: &RowView<'_>) -> Option<RowClass> {
    view.text
        .starts_with(BANNER_PREFIX)
        .then_some(RowClass::Banner)
}

fn total(view: &RowView<'_>) -> Option<RowClass> {
    (view.text.starts_with(TOTAL_VACANCIES_PREFIX) || view.text.starts_with(TOTAL_NOMINEES_PREFIX))
        .then_some(RowClass::Total)
}

fn header(view: &RowView<'_>) -> Option<RowClass> {
    HEADER_FIRST_CELLS
        .contains(&view.first)
        .then_some(RowClass::Header)
}

fn date_marker(view: &RowView<'_>) -> Option<RowClass> {
    parse_section_date(&view.text).map(RowClass::DateMarker)
}

// Only a lone cell counts. A data row such as
// `First Circuit | District of Maine | Jane Doe` starts with a circuit name
// in its Circuit column and must still become a record.
fn section_header(view: &RowView<'_>) -> Option<RowClass> {
    let circuit_title = view.cells == 1 && view.first.ends_with(CIRCUIT_SUFFIX);
    (circuit_title || view.text == TRADE_COURT_SECTION).then_some(RowClass::SectionHeader)
}

fn end_marker(view: &RowView<'_>) -> Option<RowClass> {
    (view.text == END_MARKER).then_some(RowClass::EndMarker)
}

fn page_footer(view: &RowView<'_>) -> Option<RowClass> {
    FOOTER_PREFIXES
        .iter()
        .any(|prefix| view.text.starts_with(prefix))
        .then_some(RowClass::PageFooter)
}
