//! ecddfeed - WHO ECDD substance records: TRS parsing and CSV feed generation
//!
//! This crate extracts structured information about regulated substances from
//! WHO Expert Committee on Drug Dependence (ECDD) source material: cleaned-up
//! Technical Report Series (TRS) text files and the substance review
//! spreadsheet. It merges the per-session spreadsheet rows into one record per
//! substance and emits a CSV feed ready for the CMS "Substance record
//! importer".
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use ecddfeed::FeedBuilder;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Create a feed generator with default settings
//!     let feed = FeedBuilder::new()
//!         .with_trs_dir("extracted_from_trs")
//!         .build()?;
//!
//!     // Read the substances spreadsheet and write the import CSV
//!     let output = File::create("substances.csv")?;
//!     let report = feed.generate_file("substances.xlsx", output)?;
//!
//!     // Recoverable problems come back as warnings, not errors
//!     for warning in &report.warnings {
//!         eprintln!("{}", warning);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! For in-memory generation, use `Cursor`:
//!
//! ```rust,no_run
//! use std::io::Cursor;
//! use ecddfeed::FeedBuilder;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = FeedBuilder::new().build()?;
//! let sheet_data: Vec<u8> = vec![]; // Your xlsx file bytes
//! let mut csv_output = Vec::new();
//! feed.generate(Cursor::new(sheet_data), &mut csv_output)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Parsing a TRS text
//!
//! The TRS parser recovers the category / drug / section hierarchy from a
//! cleaned-up `pdftotext` dump and is usable on its own:
//!
//! ```rust
//! use ecddfeed::trs::parse_report;
//!
//! # fn main() -> Result<(), ecddfeed::FeedError> {
//! let report = parse_report("\n1.1 Opioids\n\n1.1.1 Fentanyl\nSummary\nShort text.\n")?;
//!
//! for (category, drugs) in report.iter() {
//!     for (drug, sections) in drugs.iter() {
//!         println!("{} / {}: {} sections", category, drug, sections.len());
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod builder;
mod error;
mod security;
mod types;

pub mod console;
pub mod feed;
pub mod lookup;
pub mod record;
pub mod sheet;
pub mod split;
pub mod trs;

// 公開API
pub use builder::{Feed, FeedBuilder, FeedReport};
pub use error::FeedError;
pub use types::{DrugMap, OrderedMap, SectionMap, TrsReport};
