use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use super::assemble::{CIRCUIT_FIELD, FieldValue, Totals, VACANCY_DATE_FIELD, VacancyRecord};

pub const DB_SCHEMA_VERSION: &str = "0.1.0";

pub struct DocumentRow<'a> {
    pub doc_id: &'a str,
    pub source_path: &'a str,
    pub sha256: &'a str,
    pub converted_at: &'a str,
    pub page_count: usize,
    pub totals: Totals,
}

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS metadata (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS documents (
              doc_id TEXT PRIMARY KEY,
              source_path TEXT NOT NULL,
              sha256 TEXT NOT NULL,
              converted_at TEXT NOT NULL,
              page_count INTEGER NOT NULL,
              record_count INTEGER NOT NULL,
              total_vacancies INTEGER,
              total_nominees_pending INTEGER
            );

            CREATE TABLE IF NOT EXISTS records (
              doc_id TEXT NOT NULL,
              seq INTEGER NOT NULL,
              page_pdf INTEGER NOT NULL,
              circuit_context TEXT,
              section_date TEXT,
              court TEXT,
              vacancy_date TEXT,
              fields_json TEXT NOT NULL,
              PRIMARY KEY(doc_id, seq),
              FOREIGN KEY(doc_id) REFERENCES documents(doc_id)
            );

            CREATE INDEX IF NOT EXISTS idx_records_section_date ON records(section_date);
            ",
        )
        .context("failed to create schema")?;

    connection
        .execute(
            "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            [DB_SCHEMA_VERSION],
        )
        .context("failed to record schema version")?;

    Ok(())
}

/// Swaps out everything stored for one document in a single transaction.
pub fn replace_document_records(
    connection: &mut Connection,
    document: &DocumentRow<'_>,
    records: &[VacancyRecord],
) -> Result<usize> {
    let tx = connection.transaction()?;
    tx.execute("DELETE FROM records WHERE doc_id = ?1", [document.doc_id])?;

    tx.execute(
        "
        INSERT INTO documents(
          doc_id, source_path, sha256, converted_at, page_count, record_count,
          total_vacancies, total_nominees_pending
        )
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ON CONFLICT(doc_id) DO UPDATE SET
          source_path=excluded.source_path,
          sha256=excluded.sha256,
          converted_at=excluded.converted_at,
          page_count=excluded.page_count,
          record_count=excluded.record_count,
          total_vacancies=excluded.total_vacancies,
          total_nominees_pending=excluded.total_nominees_pending
        ",
        params![
            document.doc_id,
            document.source_path,
            document.sha256,
            document.converted_at,
            document.page_count as i64,
            records.len() as i64,
            document.totals.vacancies,
            document.totals.nominees_pending,
        ],
    )
    .with_context(|| format!("failed to upsert document {}", document.doc_id))?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO records(
              doc_id, seq, page_pdf, circuit_context, section_date, court, vacancy_date,
              fields_json
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ",
        )?;

        for (seq, record) in records.iter().enumerate() {
            let fields_json = serde_json::to_string(&record.fields)
                .context("failed to serialize record fields")?;
            statement.execute(params![
                document.doc_id,
                seq as i64,
                (record.page + 1) as i64,
                record.circuit,
                record.date,
                record.text(CIRCUIT_FIELD),
                record.field(VACANCY_DATE_FIELD).and_then(FieldValue::as_date),
                fields_json,
            ])?;
        }
    }

    tx.commit()
        .with_context(|| format!("failed to commit records for {}", document.doc_id))?;
    Ok(records.len())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use chrono::NaiveDate;

    use super::*;

    fn record(court: &str) -> VacancyRecord {
        let mut fields = BTreeMap::new();
        fields.insert(
            CIRCUIT_FIELD.to_string(),
            Some(FieldValue::Text(court.to_string())),
        );
        fields.insert("Nominee".to_string(), None);
        VacancyRecord {
            page: 0,
            fields,
            circuit: Some("First Circuit".to_string()),
            date: NaiveDate::from_ymd_opt(2020, 1, 1),
        }
    }

    fn document(totals: Totals) -> DocumentRow<'static> {
        DocumentRow {
            doc_id: "2020_01",
            source_path: "raw/2020_01/vacancies.pdf",
            sha256: "abc",
            converted_at: "2020-02-01T00:00:00Z",
            page_count: 3,
            totals,
        }
    }

    #[test]
    fn reconverting_a_document_replaces_its_records() {
        let mut connection = Connection::open_in_memory().unwrap();
        ensure_schema(&connection).unwrap();

        let totals = Totals {
            vacancies: Some(42),
            nominees_pending: Some(7),
        };
        replace_document_records(
            &mut connection,
            &document(totals),
            &[record("ME"), record("MA")],
        )
        .unwrap();
        replace_document_records(&mut connection, &document(totals), &[record("NH")]).unwrap();

        assert_eq!(count_rows(&connection, "SELECT COUNT(*) FROM documents").unwrap(), 1);
        assert_eq!(count_rows(&connection, "SELECT COUNT(*) FROM records").unwrap(), 1);

        let (court, section_date, fields_json): (String, String, String) = connection
            .query_row(
                "SELECT court, section_date, fields_json FROM records WHERE doc_id = '2020_01'",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .unwrap();
        assert_eq!(court, "NH");
        assert_eq!(section_date, "2020-01-01");
        assert_eq!(fields_json, r#"{"Circuit":"NH","Nominee":null}"#);

        let vacancies: i64 = connection
            .query_row("SELECT total_vacancies FROM documents", [], |row| row.get(0))
            .unwrap();
        assert_eq!(vacancies, 42);
    }
}
