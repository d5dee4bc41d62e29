//! FILENAME: core/pivot-engine/src/vector.rs
//! Vector Tables - Records whose values are sampled curves.
//!
//! Each record holds a vector of values and a vector of sample points. The
//! curves are resampled onto one set of common points, which become the row
//! axis, and every record (and component, for 2D values) becomes a column.

use resultbox::utils::interp::{interp, linspace_step, orient_value, Orientation};
use resultbox::{BoxError, Entry, Key, Record, ResultBox, Value};

use crate::definition::{Orient, VectorTableSpec};
use crate::error::TableError;
use crate::view::{Axis, Table};

/// One record's curve: its column label, sample points and value rows
/// (one row per component; a single row for 1D values).
struct Curve {
    independent: Record,
    points: Vec<f64>,
    raw_points: Vec<Value>,
    rows: Vec<Vec<Value>>,
}

/// Resamples every record's `values` vector onto common sample points.
pub fn vector_table(result_box: &ResultBox, spec: &VectorTableSpec) -> Result<Table, TableError> {
    // Step 1: Records carrying both keys
    let entries: Vec<(Record, Record)> = if spec.combine {
        result_box
            .combined()
            .iter()
            .map(|c| (c.independent.clone(), c.to_minimal()))
            .collect()
    } else {
        result_box
            .iter()
            .map(|r| (r.independent.clone(), r.to_minimal()))
            .collect()
    };
    let entries: Vec<(Record, Record)> = entries
        .into_iter()
        .filter(|(_, flat)| {
            flat.contains_key(spec.values.as_str()) && flat.contains_key(spec.index.as_str())
        })
        .collect();
    if entries.is_empty() {
        return Err(BoxError::EmptyResult(format!(
            "no records contain values={} index={}",
            spec.values, spec.index
        ))
        .into());
    }

    // Step 2: Components for 2D values
    let first_values = entries
        .iter()
        .find_map(|(_, flat)| flat.get(spec.values.as_str()))
        .cloned()
        .unwrap_or_default();
    let components = match first_values.ndim() {
        2 => Some(component_names(spec)?),
        _ => None,
    };

    // Step 3: Curves
    let curves = entries
        .into_iter()
        .map(|(independent, flat)| load_curve(independent, &flat, spec, components.as_deref()))
        .collect::<Result<Vec<_>, BoxError>>()?;

    // Step 4: Common sample points
    let identical = curves.windows(2).all(|w| w[0].points == w[1].points);
    let (points, labels) = match &spec.index_vals {
        Some(index_vals) => (index_vals.clone(), point_labels(index_vals, &curves)),
        None if identical => {
            let first = &curves[0];
            (first.points.clone(), first.raw_points.clone())
        }
        None => {
            let points = spanning_points(&curves, spec.step)?;
            let labels = point_labels(&points, &curves);
            (points, labels)
        }
    };
    let resample = spec.index_vals.is_some() || !identical;
    log::debug!(
        target: "PIVOT",
        "vector_table values={} index={}: {} records onto {} points{}",
        spec.values,
        spec.index,
        curves.len(),
        points.len(),
        if resample { " (interpolated)" } else { "" }
    );

    // Step 5: One column per record and component
    let mut col_names: Vec<String> = Vec::new();
    for curve in &curves {
        for key in curve.independent.keys() {
            let excluded = key == &spec.values || key == &spec.index;
            if !excluded && !col_names.iter().any(|n| n == key.as_str()) {
                col_names.push(key.to_string());
            }
        }
    }
    let component_labels: Option<Vec<Value>> = components.as_ref().map(|components| {
        let variable = spec.values.variable();
        components
            .iter()
            .map(|c| match variable {
                Some(v) => Value::Text(v.component_label(c)),
                None => Value::Text(c.clone()),
            })
            .collect()
    });
    let numbered = col_names.is_empty() && component_labels.is_none();

    let mut col_labels: Vec<Vec<Value>> = Vec::new();
    let mut columns: Vec<Vec<Option<Value>>> = Vec::new();
    for (position, curve) in curves.iter().enumerate() {
        let base: Vec<Value> = col_names
            .iter()
            .map(|n| curve.independent.get(n.as_str()).cloned().unwrap_or_default())
            .collect();
        for (i, row) in curve.rows.iter().enumerate() {
            let mut label = base.clone();
            if let Some(component_labels) = &component_labels {
                label.push(component_labels[i].clone());
            }
            if numbered {
                label.push(Value::Int(position as i64));
            }
            col_labels.push(label);
            columns.push(if resample {
                resample_row(&curve.points, row, &points, spec)?
            } else {
                row.iter().cloned().map(Some).collect()
            });
        }
    }
    if components.is_some() {
        col_names.push(component_level_name(&spec.values));
    }
    if numbered {
        col_names.push(String::new());
    }

    // Step 6: Assemble, sample points down the rows
    let cells: Vec<Vec<Option<Value>>> = (0..points.len())
        .map(|r| columns.iter().map(|col| col.get(r).cloned().flatten()).collect())
        .collect();
    let row_axis = Axis::new(
        vec![spec.index.to_string()],
        labels.into_iter().map(|l| vec![l]).collect(),
    );
    let table = Table::new(row_axis, Axis::new(col_names, col_labels), cells);
    Ok(match spec.orient {
        Orient::Rows => table,
        Orient::Cols => table.transpose(),
    })
}

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

fn component_names(spec: &VectorTableSpec) -> Result<Vec<String>, BoxError> {
    if let Some(components) = &spec.components {
        return Ok(components.clone());
    }
    match spec.values.components() {
        Some(components) => Ok(components.to_vec()),
        None => Err(BoxError::ComponentRequired {
            key: spec.values.to_string(),
        }),
    }
}

fn component_level_name(values: &Key) -> String {
    match values.variable() {
        Some(variable) => variable.label(),
        None => format!("{}:", values),
    }
}

fn load_curve(
    independent: Record,
    flat: &Record,
    spec: &VectorTableSpec,
    components: Option<&[String]>,
) -> Result<Curve, BoxError> {
    let index_value = flat.get(spec.index.as_str()).cloned().unwrap_or_default();
    let values = flat.get(spec.values.as_str()).cloned().unwrap_or_default();
    let points = index_value.to_f64_vec().ok_or_else(|| {
        BoxError::InvalidValue(format!(
            "sample points \"{}\" must be numeric: {}",
            spec.index,
            index_value.repr()
        ))
    })?;
    let n = points.len();

    let rows = match components {
        Some(components) => {
            if values.ndim() != 2 {
                return Err(BoxError::shape(
                    format!("\"{}\" components", spec.values),
                    components.len(),
                    values.shape(),
                ));
            }
            let rows: Vec<Vec<Value>> = orient_value(&values, n, Orientation::Cols)?
                .elements()
                .iter()
                .map(Value::elements)
                .collect();
            if rows.len() != components.len() {
                return Err(BoxError::shape(
                    format!("\"{}\" components", spec.values),
                    components.len(),
                    values.shape(),
                ));
            }
            rows
        }
        None => {
            if values.ndim() > 1 {
                return Err(BoxError::ComponentRequired {
                    key: spec.values.to_string(),
                });
            }
            let row = values.elements();
            if row.len() != n {
                return Err(BoxError::shape(
                    format!("\"{}\" against \"{}\"", spec.values, spec.index),
                    n,
                    values.shape(),
                ));
            }
            vec![row]
        }
    };
    Ok(Curve {
        independent,
        points,
        raw_points: index_value.elements(),
        rows,
    })
}

/// Evenly spaced points over the range of all curves.
fn spanning_points(curves: &[Curve], step: Option<f64>) -> Result<Vec<f64>, BoxError> {
    let all = curves.iter().flat_map(|c| c.points.iter().copied());
    let lo = all.clone().fold(f64::INFINITY, f64::min);
    let hi = all.fold(f64::NEG_INFINITY, f64::max);
    let step = match step {
        Some(step) => step,
        None => curves
            .iter()
            .filter(|c| c.points.len() > 1)
            .map(|c| {
                let min = c.points.iter().copied().fold(f64::INFINITY, f64::min);
                let max = c.points.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                (max - min) / (c.points.len() - 1) as f64
            })
            .filter(|s| *s > 0.0)
            .fold(None, |acc: Option<f64>, s| Some(acc.map_or(s, |a| a.min(s))))
            .ok_or_else(|| {
                BoxError::AmbiguousInterpolationInput(
                    "sample points differ between records and no step can be inferred".to_string(),
                )
            })?,
    };
    linspace_step(lo, hi, step)
}

/// Integer labels when every record's sample points are integers and so are
/// the common points; floats otherwise.
fn point_labels(points: &[f64], curves: &[Curve]) -> Vec<Value> {
    let int_inputs = curves
        .iter()
        .all(|c| c.raw_points.iter().all(|p| matches!(p, Value::Int(_))));
    let integral = points.iter().all(|p| p.is_finite() && p.fract() == 0.0);
    points
        .iter()
        .map(|&p| {
            if int_inputs && integral {
                Value::Int(p as i64)
            } else {
                Value::Float(p)
            }
        })
        .collect()
}

fn resample_row(
    xs: &[f64],
    row: &[Value],
    points: &[f64],
    spec: &VectorTableSpec,
) -> Result<Vec<Option<Value>>, BoxError> {
    let ys = row
        .iter()
        .map(Value::as_f64)
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| {
            BoxError::InvalidValue(format!("\"{}\" must be numeric to interpolate", spec.values))
        })?;
    Ok(interp(xs, &ys, points, &spec.interp)?
        .into_iter()
        .map(|y| Some(Value::Float(y)))
        .collect())
}
