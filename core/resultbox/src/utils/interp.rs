//! FILENAME: core/resultbox/src/utils/interp.rs
//! Sorting, orientation and linear interpolation of sampled data.
//!
//! Interpolation works in four steps:
//! 1. Co-sort the (x, y) pairs by x
//! 2. Drop points closer than `min_diff` to the previous retained point
//! 3. Interpolate linearly between neighbouring points
//! 4. Resolve points outside the sampled range with the fill policy

use serde::{Deserialize, Serialize};

use crate::error::{BoxError, Result};
use crate::value::{NdArray, Value};

// ============================================================================
// OPTIONS
// ============================================================================

/// What to return for points outside the sampled x range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Fill {
    Nan,
    /// Clamp to the first or last sampled value.
    Bounds,
    Constant(f64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InterpOptions {
    /// Minimum step by which retained x values must increase.
    pub min_diff: f64,
    pub fill: Fill,
}

impl Default for InterpOptions {
    fn default() -> Self {
        InterpOptions {
            min_diff: 1e-4,
            fill: Fill::Bounds,
        }
    }
}

/// Which axis of a 2D value must have the requested length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Rows,
    Cols,
}

// ============================================================================
// SORTING
// ============================================================================

/// Sorts paired vectors by x. With `min_diff`, near-duplicate xs are dropped.
pub fn cosort<T: Clone>(xs: &[f64], ys: &[T], min_diff: Option<f64>) -> (Vec<f64>, Vec<T>) {
    let mut pairs: Vec<(f64, T)> = xs.iter().copied().zip(ys.iter().cloned()).collect();
    // Stable, so the first of equal xs stays first
    pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
    if let Some(min_diff) = min_diff {
        pairs = deduplicate_xs(pairs, min_diff);
    }
    pairs.into_iter().unzip()
}

/// Keeps a point only if its x exceeds the previous retained x by more than
/// `min_diff`. Input must already be sorted by x.
pub fn deduplicate_xs<T>(pairs: Vec<(f64, T)>, min_diff: f64) -> Vec<(f64, T)> {
    let mut out: Vec<(f64, T)> = Vec::with_capacity(pairs.len());
    for (x, y) in pairs {
        match out.last() {
            Some((prev, _)) if x <= prev + min_diff => continue,
            _ => out.push((x, y)),
        }
    }
    out
}

// ============================================================================
// ORIENTATION
// ============================================================================

fn transpose<T: Clone>(matrix: &[Vec<T>]) -> Vec<Vec<T>> {
    let ncols = matrix.first().map(|r| r.len()).unwrap_or(0);
    (0..ncols)
        .map(|c| matrix.iter().map(|row| row[c].clone()).collect())
        .collect()
}

/// Orients a matrix so it has `n` rows (`Rows`) or `n` columns (`Cols`).
///
/// When both axes have length `n` the second axis is taken as the match.
pub fn orient<T: Clone>(matrix: &[Vec<T>], n: usize, orientation: Orientation) -> Result<Vec<Vec<T>>> {
    let shape = vec![matrix.len(), matrix.first().map(|r| r.len()).unwrap_or(0)];
    let axis = if shape[1] == n {
        1
    } else if shape[0] == n {
        0
    } else {
        return Err(BoxError::shape("orient", n, shape));
    };
    let keep = matches!(
        (orientation, axis),
        (Orientation::Rows, 0) | (Orientation::Cols, 1)
    );
    Ok(if keep { matrix.to_vec() } else { transpose(matrix) })
}

fn as_2d(value: &Value) -> Vec<Vec<Value>> {
    match value.ndim() {
        0 => vec![vec![value.clone()]],
        1 => vec![value.elements()],
        _ => value.elements().iter().map(|row| row.elements()).collect(),
    }
}

/// Orients a value the way `orient` does a matrix, keeping array-vs-list.
/// Scalars and 1D values are treated as a single row.
pub fn orient_value(value: &Value, n: usize, orientation: Orientation) -> Result<Value> {
    if value.ndim() > 2 {
        return Err(BoxError::InvalidValue(format!(
            "expected at most 2 dimensions, got shape {:?}",
            value.shape()
        )));
    }
    let oriented = orient(&as_2d(value), n, orientation)?;
    let as_array = matches!(value, Value::Array(_));
    let rows: Vec<Value> = oriented
        .into_iter()
        .map(|row| rebuild_row(row, as_array))
        .collect();
    if as_array {
        if let Some(array) = Value::List(rows.clone()).to_array() {
            return Ok(Value::Array(array));
        }
    }
    Ok(Value::List(rows))
}

fn rebuild_row(row: Vec<Value>, as_array: bool) -> Value {
    let list = Value::List(row);
    if as_array {
        if let Some(array) = list.to_array() {
            return Value::Array(array);
        }
    }
    list
}

/// Splits a 2D value into `n` vectors, whatever its orientation.
pub fn unpack(value: &Value, n: usize) -> Result<Vec<Value>> {
    Ok(orient_value(value, n, Orientation::Rows)?.elements())
}

// ============================================================================
// INTERPOLATION
// ============================================================================

/// Linearly interpolates `ys(xs)` at `new_xs`.
pub fn interp(xs: &[f64], ys: &[f64], new_xs: &[f64], options: &InterpOptions) -> Result<Vec<f64>> {
    if xs.len() != ys.len() {
        return Err(BoxError::shape("interp ys", xs.len(), vec![ys.len()]));
    }
    if xs.is_empty() {
        return Err(BoxError::InvalidValue("no points to interpolate".to_string()));
    }
    let (xs, ys) = cosort(xs, ys, Some(options.min_diff));
    let last = xs.len() - 1;
    let below = match options.fill {
        Fill::Nan => f64::NAN,
        Fill::Bounds => ys[0],
        Fill::Constant(c) => c,
    };
    let above = match options.fill {
        Fill::Nan => f64::NAN,
        Fill::Bounds => ys[last],
        Fill::Constant(c) => c,
    };
    Ok(new_xs
        .iter()
        .map(|&x| {
            if x.is_nan() {
                f64::NAN
            } else if x < xs[0] {
                below
            } else if x > xs[last] {
                above
            } else {
                let i = xs.partition_point(|&v| v <= x);
                if i > last {
                    return ys[last];
                }
                let (x0, x1, y0, y1) = (xs[i - 1], xs[i], ys[i - 1], ys[i]);
                y0 + (y1 - y0) * (x - x0) / (x1 - x0)
            }
        })
        .collect())
}

/// Interpolates each row of a 2D value. The axis whose length matches `xs`
/// is the one interpolated along.
pub fn interp_rows(xs: &[f64], ys: &[Vec<f64>], new_xs: &[f64], options: &InterpOptions) -> Result<Vec<Vec<f64>>> {
    orient(ys, xs.len(), Orientation::Cols)?
        .iter()
        .map(|row| interp(xs, row, new_xs, options))
        .collect()
}

/// Interpolates a 1D or 2D value, preserving array-vs-list representation.
pub fn interp_value(xs: &Value, ys: &Value, new_xs: &[f64], options: &InterpOptions) -> Result<Value> {
    let xs = flat_f64(xs)?;
    let as_array = matches!(ys, Value::Array(_));
    match ys.ndim() {
        1 => {
            let ys = ys
                .to_f64_vec()
                .ok_or_else(|| BoxError::InvalidValue("ys must be numeric".to_string()))?;
            let out = interp(&xs, &ys, new_xs, options)?;
            Ok(if as_array {
                Value::Array(NdArray::from_vec(out))
            } else {
                Value::from(out)
            })
        }
        2 => {
            let rows = ys
                .to_f64_rows()
                .ok_or_else(|| BoxError::InvalidValue("ys must be numeric".to_string()))?;
            let out = interp_rows(&xs, &rows, new_xs, options)?;
            if as_array {
                Ok(Value::Array(NdArray::from_rows(out)?))
            } else {
                Ok(Value::List(out.into_iter().map(Value::from).collect()))
            }
        }
        n => Err(BoxError::InvalidValue(format!(
            "ys must have 1 or 2 dimensions, got {}",
            n
        ))),
    }
}

fn flat_f64(value: &Value) -> Result<Vec<f64>> {
    match value {
        Value::Array(a) => Ok(a.to_f64_vec()),
        other => other
            .to_f64_vec()
            .ok_or_else(|| BoxError::InvalidValue(format!("xs must be a numeric vector: {}", other))),
    }
}

/// Evenly spaced points from `start` by `step`, extended to reach `stop`.
pub fn linspace_step(start: f64, stop: f64, step: f64) -> Result<Vec<f64>> {
    if step.is_nan() || step <= 0.0 || !start.is_finite() || !stop.is_finite() {
        return Err(BoxError::InvalidValue(format!(
            "cannot span {}..{} with step {}",
            start, stop, step
        )));
    }
    if stop < start {
        return Ok(vec![start]);
    }
    let tolerance = step * 1e-9;
    let mut n = ((stop - start) / step + 1e-9).floor() as usize + 1;
    if start + (n - 1) as f64 * step < stop - tolerance {
        n += 1;
    }
    Ok((0..n).map(|i| start + i as f64 * step).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn test_cosort_drops_repeated_xs() {
        let xs = [0.0, 1.0, 2.0, 1.0, 2.0, 3.0];
        let ys = [5, 8, 10, 6, 7, 9];
        let (xs_sorted, ys_sorted) = cosort(&xs, &ys, Some(0.0));
        assert_eq!(xs_sorted, vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(ys_sorted, vec![5, 8, 10, 9]);
    }

    #[test]
    fn test_cosort_without_dedup_keeps_all() {
        let (xs, ys) = cosort(&[2.0, 1.0, 1.0], &['a', 'b', 'c'], None);
        assert_eq!(xs, vec![1.0, 1.0, 2.0]);
        assert_eq!(ys, vec!['b', 'c', 'a']);
    }

    #[test]
    fn test_deduplicate_against_retained_point() {
        let pairs = vec![(0.0, 0), (0.6, 1), (1.2, 2), (1.3, 3)];
        let out = deduplicate_xs(pairs, 1.0);
        let xs: Vec<f64> = out.iter().map(|p| p.0).collect();
        assert_eq!(xs, vec![0.0, 1.2]);
    }

    #[test]
    fn test_interp_bounds() {
        let out = interp(
            &[0.0, 1.0, 2.0, 3.0],
            &[5.0, 6.0, 7.0, 8.0],
            &[-0.5, 0.5, 1.5, 2.5, 3.5],
            &InterpOptions::default(),
        )
        .unwrap();
        assert!(close(&out, &[5.0, 5.5, 6.5, 7.5, 8.0]));
    }

    #[test]
    fn test_interp_nan_and_constant_fill() {
        let opts = InterpOptions { fill: Fill::Nan, ..InterpOptions::default() };
        let out = interp(&[0.0, 1.0], &[0.0, 10.0], &[-1.0, 0.25, 2.0], &opts).unwrap();
        assert!(out[0].is_nan());
        assert!((out[1] - 2.5).abs() < 1e-12);
        assert!(out[2].is_nan());

        let opts = InterpOptions { fill: Fill::Constant(-1.0), ..InterpOptions::default() };
        let out = interp(&[0.0, 1.0], &[0.0, 10.0], &[2.0], &opts).unwrap();
        assert_eq!(out, vec![-1.0]);
    }

    #[test]
    fn test_interp_unsorted_input() {
        let out = interp(&[3.0, 1.0, 2.0], &[30.0, 10.0, 20.0], &[1.5, 3.0], &InterpOptions::default()).unwrap();
        assert!(close(&out, &[15.0, 30.0]));
    }

    #[test]
    fn test_interp_rows_orients_along_xs() {
        // 3 samples of 2 components, given as columns
        let ys = vec![vec![0.0, 10.0], vec![1.0, 11.0], vec![2.0, 12.0]];
        let out = interp_rows(&[0.0, 1.0, 2.0], &ys, &[0.5, 1.5], &InterpOptions::default()).unwrap();
        assert_eq!(out.len(), 2);
        assert!(close(&out[0], &[0.5, 1.5]));
        assert!(close(&out[1], &[10.5, 11.5]));
    }

    #[test]
    fn test_interp_value_preserves_kind() {
        let xs = Value::from(vec![0.0, 1.0]);
        let array = Value::Array(NdArray::from_vec(vec![0.0, 2.0]));
        let out = interp_value(&xs, &array, &[0.5], &InterpOptions::default()).unwrap();
        assert_eq!(out, Value::Array(NdArray::from_vec(vec![1.0])));

        let list = Value::from(vec![0.0, 2.0]);
        let out = interp_value(&xs, &list, &[0.5], &InterpOptions::default()).unwrap();
        assert_eq!(out, Value::from(vec![1.0]));
    }

    #[test]
    fn test_orient() {
        let m = vec![vec![1, 2, 3], vec![4, 5, 6]];
        assert_eq!(orient(&m, 2, Orientation::Rows).unwrap(), m);
        assert_eq!(
            orient(&m, 2, Orientation::Cols).unwrap(),
            vec![vec![1, 4], vec![2, 5], vec![3, 6]]
        );
        assert_eq!(orient(&m, 3, Orientation::Rows).unwrap().len(), 3);
        assert!(matches!(
            orient(&m, 4, Orientation::Rows),
            Err(BoxError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn test_unpack_either_orientation() {
        let wide = Value::from(vec![vec![1, 2, 3], vec![4, 5, 6]]);
        let tall = wide.transposed().unwrap();
        assert_eq!(unpack(&wide, 2).unwrap(), unpack(&tall, 2).unwrap());
        assert_eq!(unpack(&wide, 2).unwrap()[1], Value::from(vec![4, 5, 6]));
    }

    #[test]
    fn test_linspace_step() {
        assert!(close(&linspace_step(0.0, 1.0, 0.25).unwrap(), &[0.0, 0.25, 0.5, 0.75, 1.0]));
        assert!(close(&linspace_step(0.0, 1.0, 0.4).unwrap(), &[0.0, 0.4, 0.8, 1.2]));
        assert!(linspace_step(0.0, 1.0, 0.0).is_err());
    }
}
