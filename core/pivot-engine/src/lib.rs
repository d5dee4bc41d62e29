//! FILENAME: core/pivot-engine/src/lib.rs
//! Pivot Table subsystem for ResultBox.
//!
//! Layers:
//! - `definition`: What a table IS (values, axes, aggregation)
//! - `cache`: Interned labels and accumulators (HOW we compute)
//! - `view`: The tabulated output and its text rendering (WHAT we display)
//! - `engine`: Cross-tabulation (`tabulate`)
//! - `vector`: Curves resampled onto common points (`vector_table`)
//! - `export`: CSV output

pub mod definition;
pub mod cache;
pub mod view;
pub mod engine;
pub mod vector;
pub mod export;
pub mod error;

pub use definition::*;
pub use cache::{AggregateAccumulator, CacheValue, FieldCache, GroupKey, ValueId};
pub use view::{label_text, Axis, Table};
pub use engine::{tabulate, TableCalculator};
pub use vector::vector_table;
pub use export::{table_records, to_csv, write_csv};
pub use error::TableError;
