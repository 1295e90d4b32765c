//! Rebuilds the vacancy table of a report PDF from positioned text.
//!
//! `pdftotext -bbox-layout` gives text blocks with bounding boxes and no
//! table structure. Blocks become [`layout::Fragment`]s, fragments are
//! chained into visual rows, a header row yields column boundaries, and a
//! small state machine walks the rows carrying circuit, court and date
//! context into every record it emits.

pub mod annotate;
pub mod assemble;
pub mod classify;
pub mod columns;
pub mod dates;
pub mod layout;
pub mod overrides;
pub mod pipeline;
pub mod rows;
mod run;
pub mod store;

pub use run::run;
