use chrono::NaiveDate;

/// Formats accepted for a whole-row "as of" date line, tried in order.
pub const SECTION_DATE_FORMATS: [&str; 2] = ["%b %d, %Y", "%B %d, %Y"];

/// Formats accepted inside date-typed cells. Two-digit years come first so
/// `7/15/03` is not read as year 3.
pub const FIELD_DATE_FORMATS: [&str; 6] = [
    "%m/%d/%y",
    "%m/%d/%Y",
    "%b %d, %Y",
    "%B %d, %Y",
    "%Y-%m-%d",
    "%d-%b-%y",
];

pub fn parse_section_date(text: &str) -> Option<NaiveDate> {
    parse_with(text, &SECTION_DATE_FORMATS)
}

pub fn parse_field_date(text: &str) -> Option<NaiveDate> {
    parse_with(text, &FIELD_DATE_FORMATS)
}

fn parse_with(text: &str, formats: &[&str]) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    formats
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
}
