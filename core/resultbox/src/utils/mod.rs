//! FILENAME: core/resultbox/src/utils/mod.rs
//! Numeric and string helpers shared by the box, tables and persistence.

pub mod format;
pub mod interp;

pub use format::{
    dict_to_str, ensure_ext, format_g, format_value, list_to_str, safe_fname, str_to_dict,
    strip_unit, val_to_str, DictFormat, StrFormat,
};
pub use interp::{
    cosort, deduplicate_xs, interp, interp_rows, interp_value, linspace_step, orient,
    orient_value, unpack, Fill, InterpOptions, Orientation,
};
