use std::collections::BTreeMap;

use super::assemble::{CIRCUIT_FIELD, FieldValue, NOMINATION_FIELD, VACANCY_DATE_FIELD, VacancyRecord};
use super::dates::parse_field_date;

/// A hand-checked replacement for a row the reports print wrongly.
struct EntryOverride {
    circuit: &'static str,
    fields: &'static [(&'static str, &'static str)],
}

const ENTRY_OVERRIDES: &[EntryOverride] = &[EntryOverride {
    circuit: "PL 107-273",
    fields: &[
        (CIRCUIT_FIELD, "NC-W"),
        ("Vacancy Created By", "PL 107-273"),
        ("Reason", "New Position"),
        (VACANCY_DATE_FIELD, "7/15/03"),
        ("Nominee", "Conrad, Robert Jr."),
        (NOMINATION_FIELD, "4/28/03"),
    ],
}];

/// Replaces the fields of a record that matches a known bad entry. Context
/// (section circuit, date, page) is left alone. Returns whether anything
/// was rewritten.
pub fn apply_entry_overrides(record: &mut VacancyRecord) -> bool {
    let Some(entry) = ENTRY_OVERRIDES
        .iter()
        .find(|entry| record.text(CIRCUIT_FIELD) == Some(entry.circuit))
    else {
        return false;
    };

    record.fields = entry
        .fields
        .iter()
        .map(|(label, value)| {
            let value = match *label {
                VACANCY_DATE_FIELD | NOMINATION_FIELD => parse_field_date(value)
                    .map(FieldValue::Date)
                    .unwrap_or_else(|| FieldValue::Text(value.to_string())),
                _ => FieldValue::Text(value.to_string()),
            };
            (label.to_string(), Some(value))
        })
        .collect::<BTreeMap<String, Option<FieldValue>>>();

    true
}
