//! FILENAME: core/pivot-engine/src/view.rs
//! Table View - The tabulated output.
//!
//! A Table is a grid of optional cell values with a (possibly hierarchical)
//! row axis and column axis. Its Display renders the familiar dataframe
//! text layout:
//! - One header line per column level, the level name in the index area
//! - An index-name line when the row axis is named
//! - Repeated outer labels blanked on both axes

use std::fmt;

use resultbox::{BoxError, Value};

// ============================================================================
// AXIS
// ============================================================================

/// One axis of a table: level names and one label tuple per row or column.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Axis {
    pub names: Vec<String>,
    pub labels: Vec<Vec<Value>>,
}

impl Axis {
    pub fn new(names: Vec<String>, labels: Vec<Vec<Value>>) -> Self {
        Axis { names, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn nlevels(&self) -> usize {
        self.names.len()
    }

    pub fn is_hierarchical(&self) -> bool {
        self.nlevels() > 1
    }

    pub fn position(&self, label: &[Value]) -> Option<usize> {
        self.labels.iter().position(|l| l.as_slice() == label)
    }

    /// Labels at one level, in axis order.
    pub fn level_values(&self, level: usize) -> Vec<&Value> {
        self.labels.iter().filter_map(|l| l.get(level)).collect()
    }

    /// Label text with repeats blanked. The innermost level is never blanked.
    pub fn sparsified(&self) -> Vec<Vec<Option<String>>> {
        let n = self.nlevels();
        self.labels
            .iter()
            .enumerate()
            .map(|(i, label)| {
                (0..n)
                    .map(|level| {
                        let repeated = level + 1 < n
                            && i > 0
                            && self.labels[i - 1][..=level] == label[..=level];
                        if repeated {
                            None
                        } else {
                            Some(label_text(&label[level]))
                        }
                    })
                    .collect()
            })
            .collect()
    }

    /// Moves levels so that their names follow `names`.
    pub fn reorder_levels(&mut self, names: &[&str]) -> Result<(), BoxError> {
        let mut order = Vec::with_capacity(names.len());
        for name in names {
            let matches: Vec<usize> = self
                .names
                .iter()
                .enumerate()
                .filter(|(_, n)| n.as_str() == *name)
                .map(|(i, _)| i)
                .collect();
            match matches.as_slice() {
                [i] if !order.contains(i) => order.push(*i),
                _ => {
                    return Err(BoxError::InvalidValue(format!(
                        "cannot reorder levels {:?} to {:?}",
                        self.names, names
                    )))
                }
            }
        }
        if order.len() != self.nlevels() {
            return Err(BoxError::InvalidValue(format!(
                "cannot reorder levels {:?} to {:?}",
                self.names, names
            )));
        }
        self.names = order.iter().map(|&i| self.names[i].clone()).collect();
        for label in &mut self.labels {
            *label = order.iter().map(|&i| label[i].clone()).collect();
        }
        Ok(())
    }
}

// ============================================================================
// TABLE
// ============================================================================

/// Row axis, column axis and the grid between them. Missing cells are `None`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub row_axis: Axis,
    pub col_axis: Axis,
    pub cells: Vec<Vec<Option<Value>>>,
}

impl Table {
    pub fn new(row_axis: Axis, col_axis: Axis, cells: Vec<Vec<Option<Value>>>) -> Self {
        Table {
            row_axis,
            col_axis,
            cells,
        }
    }

    /// (rows, columns)
    pub fn shape(&self) -> (usize, usize) {
        (self.row_axis.len(), self.col_axis.len())
    }

    /// The cell at a row label and column label.
    pub fn get(&self, row: &[Value], col: &[Value]) -> Option<&Value> {
        let r = self.row_axis.position(row)?;
        let c = self.col_axis.position(col)?;
        self.cells.get(r)?.get(c)?.as_ref()
    }

    /// The grid with missing cells as NaN.
    pub fn values(&self) -> Vec<Vec<Value>> {
        self.cells
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| cell.clone().unwrap_or(Value::Float(f64::NAN)))
                    .collect()
            })
            .collect()
    }

    pub fn transpose(&self) -> Table {
        let (nrows, ncols) = self.shape();
        let cells = (0..ncols)
            .map(|c| (0..nrows).map(|r| self.cells[r][c].clone()).collect())
            .collect();
        Table {
            row_axis: self.col_axis.clone(),
            col_axis: self.row_axis.clone(),
            cells,
        }
    }

    pub fn is_hierarchical(&self) -> bool {
        self.row_axis.is_hierarchical() || self.col_axis.is_hierarchical()
    }

    pub fn reorder_row_levels(&mut self, names: &[&str]) -> Result<(), BoxError> {
        self.row_axis.reorder_levels(names)
    }

    pub fn reorder_col_levels(&mut self, names: &[&str]) -> Result<(), BoxError> {
        self.col_axis.reorder_levels(names)
    }
}

// ============================================================================
// RENDERING
// ============================================================================

/// Text of a label or cell: text as-is, missing as NaN.
pub fn label_text(value: &Value) -> String {
    match value {
        Value::Text(s) => s.clone(),
        Value::Float(x) if x.is_nan() => "NaN".to_string(),
        other => other.to_string(),
    }
}

fn cell_text(cell: &Option<Value>) -> String {
    match cell {
        Some(value) => label_text(value),
        None => "NaN".to_string(),
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad_right(s: &str, w: usize) -> String {
    format!("{}{}", s, " ".repeat(w.saturating_sub(width(s))))
}

fn pad_left(s: &str, w: usize) -> String {
    format!("{}{}", " ".repeat(w.saturating_sub(width(s))), s)
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rows = &self.row_axis;
        let cols = &self.col_axis;
        let row_labels = rows.sparsified();
        let col_labels = cols.sparsified();
        let cells: Vec<Vec<String>> = self
            .cells
            .iter()
            .map(|row| row.iter().map(cell_text).collect())
            .collect();

        // Index area: one column per row level, widened to fit column-level names
        let mut index_widths: Vec<usize> = (0..rows.nlevels())
            .map(|level| {
                rows.level_values(level)
                    .iter()
                    .map(|v| width(&label_text(v)))
                    .chain(std::iter::once(width(&rows.names[level])))
                    .max()
                    .unwrap_or(0)
            })
            .collect();
        let mut index_total =
            index_widths.iter().sum::<usize>() + index_widths.len().saturating_sub(1);
        let name_width = cols.names.iter().map(|n| width(n)).max().unwrap_or(0);
        if name_width > index_total {
            if let Some(last) = index_widths.last_mut() {
                *last += name_width - index_total;
            }
            index_total = name_width;
        }

        let col_widths: Vec<usize> = (0..cols.len())
            .map(|j| {
                col_labels[j]
                    .iter()
                    .flatten()
                    .map(|s| width(s))
                    .chain(cells.iter().filter_map(|row| row.get(j)).map(|s| width(s)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let mut lines = Vec::new();
        for (level, name) in cols.names.iter().enumerate() {
            let mut line = pad_right(name, index_total);
            for (j, w) in col_widths.iter().enumerate() {
                line.push_str("  ");
                line.push_str(&pad_left(col_labels[j][level].as_deref().unwrap_or(""), *w));
            }
            lines.push(line);
        }

        if rows.names.iter().any(|n| !n.is_empty()) {
            let mut line = rows
                .names
                .iter()
                .zip(&index_widths)
                .map(|(n, w)| pad_right(n, *w))
                .collect::<Vec<_>>()
                .join(" ");
            for w in &col_widths {
                line.push_str("  ");
                line.push_str(&" ".repeat(*w));
            }
            lines.push(line);
        }

        for (i, labels) in row_labels.iter().enumerate() {
            let mut line = labels
                .iter()
                .zip(&index_widths)
                .map(|(l, w)| pad_right(l.as_deref().unwrap_or(""), *w))
                .collect::<Vec<_>>()
                .join(" ");
            for (j, w) in col_widths.iter().enumerate() {
                line.push_str("  ");
                line.push_str(&pad_left(cells[i].get(j).map(String::as_str).unwrap_or("NaN"), *w));
            }
            lines.push(line);
        }

        write!(f, "{}", lines.join("\n"))
    }
}
