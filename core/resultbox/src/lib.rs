//! FILENAME: core/resultbox/src/lib.rs
//! Result container for analysis runs.
//!
//! Each row pairs an independent mapping (the inputs of a run) with a
//! dependent mapping (its outputs). Rows sharing the same inputs are merged
//! into combined records as they are appended.
//!
//! Layers:
//! - `variable`, `store`, `aliases`, `namespace`: Key metadata and naming
//! - `value`, `row`: The data model
//! - `result_box`, `combiner`: Storage and the combined view
//! - `query`: Filtering and projection
//! - `utils`: Formatting and interpolation helpers

pub mod error;
pub mod key;
pub mod value;
pub mod variable;
pub mod store;
pub mod aliases;
pub mod namespace;
pub mod row;
pub mod combiner;
pub mod result_box;
pub mod query;
pub mod utils;

pub use error::{BoxError, Result};
pub use key::Key;
pub use value::{sorted_unique, try_cmp_slices, try_sort_by, ArrayData, DType, NdArray, Record, Value};
pub use variable::{Variable, VariableAttrs, DEFAULT_SEP};
pub use store::{similarity, Store};
pub use aliases::Aliases;
pub use namespace::{AliasNamespace, Namespace, StoreNamespace};
pub use row::{CombinedRecord, Entry, ResultRow};
pub use combiner::{fingerprint, Combiner, Fingerprint};
pub use result_box::{show_rows, validate_row, BoxSettings, Payload, ResultBox};
pub use query::{
    Group, GroupLabel, GroupLabels, LabelStyle, Labels, Series, VectorOptions, Vectors,
};
