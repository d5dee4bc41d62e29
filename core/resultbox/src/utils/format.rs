//! FILENAME: core/resultbox/src/utils/format.rs
//! String formatting for values, labels and file names.

use serde::{Deserialize, Serialize};

use crate::error::{BoxError, Result};
use crate::key::Key;
use crate::value::{Record, Value};

// ============================================================================
// NUMBERS
// ============================================================================

/// Formats a float like printf `%.{precision}g`.
pub fn format_g(x: f64, precision: usize) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0" } else { "0" }.to_string();
    }
    let p = precision.max(1);
    // Rounding to p significant digits decides the exponent
    let sci = format!("{:.*e}", p - 1, x);
    let (mantissa, exp) = match sci.split_once('e') {
        Some((m, e)) => (m.to_string(), e.parse::<i32>().unwrap_or(0)),
        None => (sci.clone(), 0),
    };
    if exp < -4 || exp >= p as i32 {
        let sign = if exp < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", strip_zeros(&mantissa), sign, exp.abs())
    } else {
        let decimals = (p as i32 - 1 - exp).max(0) as usize;
        strip_zeros(&format!("{:.*}", decimals, x))
    }
}

fn strip_zeros(s: &str) -> String {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        s.to_string()
    }
}

// ============================================================================
// VALUES
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StrFormat {
    /// Significant digits for floats.
    pub precision: usize,
    pub list_sep: String,
    /// Lists longer than three items are cut to this many characters.
    pub length: usize,
}

impl Default for StrFormat {
    fn default() -> Self {
        StrFormat {
            precision: 3,
            list_sep: " ".to_string(),
            length: 18,
        }
    }
}

/// A compact, human-readable rendering of a value.
pub fn val_to_str(value: &Value) -> String {
    format_value(value, &StrFormat::default())
}

pub fn format_value(value: &Value, fmt: &StrFormat) -> String {
    match value {
        Value::None => "None".to_string(),
        Value::Bool(b) => (if *b { "True" } else { "False" }).to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format_g(*x, fmt.precision),
        Value::Text(s) => s.clone(),
        Value::List(items) => list_to_str(items, fmt, true),
        Value::Map(map) => {
            let dict_fmt = DictFormat {
                list_sep: fmt.list_sep.clone(),
                length: fmt.length,
                ..DictFormat::default()
            };
            dict_to_str(map, &dict_fmt)
        }
        Value::Array(a) => match a.scalar() {
            Some(item) => format_g(item.as_f64().unwrap_or(f64::NAN), fmt.precision),
            None => {
                let flat: Vec<Value> = a.to_f64_vec().into_iter().map(Value::Float).collect();
                list_to_str(&flat, fmt, true)
            }
        },
    }
}

pub fn list_to_str(items: &[Value], fmt: &StrFormat, brackets: bool) -> String {
    let parts: Vec<String> = items.iter().map(|v| format_value(v, fmt)).collect();
    let mut s = parts.join(&fmt.list_sep);
    if s.chars().count() > fmt.length && items.len() > 3 {
        s = s.chars().take(fmt.length).collect();
        s.push_str("...");
    }
    if brackets {
        format!("[{}]", s)
    } else {
        s
    }
}

// ============================================================================
// MAPPINGS
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DictFormat {
    /// Between a key and its value.
    pub val_sep: String,
    /// Between key-value pairs.
    pub key_sep: String,
    pub list_sep: String,
    pub length: usize,
}

impl Default for DictFormat {
    fn default() -> Self {
        DictFormat {
            val_sep: " ".to_string(),
            key_sep: " ".to_string(),
            list_sep: ",".to_string(),
            length: 18,
        }
    }
}

impl DictFormat {
    /// `a=1, b=2`, used for row labels.
    pub fn label() -> Self {
        DictFormat {
            val_sep: "=".to_string(),
            key_sep: ", ".to_string(),
            ..DictFormat::default()
        }
    }

    /// `name=a;unit=mm`, the attribute string form.
    pub fn attributes() -> Self {
        DictFormat {
            val_sep: "=".to_string(),
            key_sep: ";".to_string(),
            ..DictFormat::default()
        }
    }
}

pub fn dict_to_str(map: &Record, fmt: &DictFormat) -> String {
    let value_fmt = StrFormat {
        list_sep: fmt.list_sep.clone(),
        length: fmt.length,
        ..StrFormat::default()
    };
    map.iter()
        .map(|(k, v)| format!("{}{}{}", k, fmt.val_sep, format_value(v, &value_fmt)))
        .collect::<Vec<_>>()
        .join(&fmt.key_sep)
}

/// Parses `key{val_sep}value` pairs separated by `key_sep`.
///
/// `None` becomes `Value::None`, `[a,b]` a list, digits an integer, other
/// numbers a float, and anything else text.
pub fn str_to_dict(s: &str, fmt: &DictFormat) -> Result<Record> {
    let mut out = Record::new();
    for pair in s.split(fmt.key_sep.as_str()) {
        let (key, val) = pair.split_once(fmt.val_sep.as_str()).ok_or_else(|| {
            BoxError::InvalidValue(format!("\"{}\" has no \"{}\" separator", pair, fmt.val_sep))
        })?;
        out.insert(Key::from(key), interpret(val, &fmt.list_sep));
    }
    Ok(out)
}

fn interpret(val: &str, list_sep: &str) -> Value {
    if val == "None" {
        Value::None
    } else if val.starts_with('[') {
        let inner = val.trim_matches(|c| c == '[' || c == ']');
        Value::List(inner.split(list_sep).map(|item| interpret(item, list_sep)).collect())
    } else if !val.is_empty() && val.chars().all(|c| c.is_ascii_digit()) {
        val.parse::<i64>().map(Value::Int).unwrap_or_else(|_| Value::from(val))
    } else if let Ok(x) = val.parse::<f64>() {
        Value::Float(x)
    } else {
        Value::from(val)
    }
}

// ============================================================================
// FILE NAMES
// ============================================================================

/// Removes bracketed units, e.g. `"force [N]"` becomes `"force"`.
pub fn strip_unit(s: &str) -> String {
    let mut s = s.to_string();
    loop {
        let (start, end) = match (s.find('['), s.find(']')) {
            (Some(start), Some(end)) if start > 0 && end > start => (start, end),
            _ => return s,
        };
        s = format!("{}{}", s[..start].trim_end(), s[end + 1..].trim_end());
    }
}

/// A string usable as a file name: units stripped, reserved characters replaced.
pub fn safe_fname(fname: &str) -> String {
    strip_unit(fname)
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c => c,
        })
        .collect()
}

/// Appends `ext` unless the name already ends with it.
pub fn ensure_ext(fname: &str, ext: &str) -> String {
    let ext = if ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    };
    if fname.ends_with(&ext) {
        fname.to_string()
    } else {
        format!("{}{}", fname, ext)
    }
}
