//! Testing utilities for code that splits CSV files.
//!
//! - **Fixtures**: generate sample rows and write them to temporary CSV files
//! - **Assertions**: read split outputs back and check them against the input
//!
//! # Quick Start
//!
//! ```no_run
//! use datashear::Splitter;
//! use datashear::testing::*;
//!
//! # fn main() -> anyhow::Result<()> {
//! let ws = CsvWorkspace::new()?;
//! let rows = people_rows(10);
//! let input = ws.write_csv("people.csv", &people_header(), &rows)?;
//!
//! let summary = Splitter::new(&input, ws.path().join("out"))?
//!     .run(datashear::SplitPolicy::by_row_count(3)?)?;
//!
//! assert_row_counts(&summary, &[3, 3, 3, 1]);
//! assert_partition(&summary, &rows)?;
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
