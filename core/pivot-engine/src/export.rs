//! FILENAME: core/pivot-engine/src/export.rs
//! CSV export of tables.
//!
//! Layout: one header row per column level (level name, blanks under the
//! index, then labels), an index-name row, then one row per table row with
//! every index label written out. A flat column axis gets one extra blank
//! field on the index-name row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use resultbox::Variable;

use crate::error::TableError;
use crate::view::{label_text, Table};

/// Writes a table to a CSV file, optionally preceded by a Variable's key and doc.
pub fn to_csv(table: &Table, path: impl AsRef<Path>, variable: Option<&Variable>) -> Result<(), TableError> {
    let path = path.as_ref();
    let file = File::create(path)?;
    write_csv(table, BufWriter::new(file), variable)?;
    log::info!(target: "PIVOT", "Wrote table {:?} to {}", table.shape(), path.display());
    Ok(())
}

/// Writes a table as CSV to any writer.
pub fn write_csv<W: Write>(table: &Table, mut writer: W, variable: Option<&Variable>) -> Result<(), TableError> {
    if let Some(variable) = variable {
        writeln!(writer, "{}", variable.key())?;
        writeln!(writer, "{}", variable.doc())?;
        writeln!(writer)?;
    }

    let mut out = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);
    for record in table_records(table) {
        out.write_record(&record)?;
    }
    out.flush()?;
    Ok(())
}

/// The CSV rows of a table, as text fields.
pub fn table_records(table: &Table) -> Vec<Vec<String>> {
    let rows = &table.row_axis;
    let cols = &table.col_axis;
    let index_width = rows.nlevels().max(1);
    let mut records = Vec::with_capacity(cols.nlevels() + 1 + rows.len());

    for (level, name) in cols.names.iter().enumerate() {
        let mut record = vec![name.clone()];
        record.extend(std::iter::repeat(String::new()).take(index_width - 1));
        record.extend(cols.labels.iter().map(|l| label_text(&l[level])));
        records.push(record);
    }

    let mut names = rows.names.clone();
    names.resize(index_width, String::new());
    let blanks = cols.len() + usize::from(!cols.is_hierarchical());
    names.extend(std::iter::repeat(String::new()).take(blanks));
    records.push(names);

    for (labels, cells) in rows.labels.iter().zip(&table.cells) {
        let mut record: Vec<String> = labels.iter().map(label_text).collect();
        record.extend(cells.iter().map(|cell| match cell {
            Some(value) => label_text(value),
            None => String::new(),
        }));
        records.push(record);
    }
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Axis;
    use resultbox::Value;

    fn table() -> Table {
        let rows = Axis::new(vec!["a".into()], vec![vec![Value::Int(1)], vec![Value::Int(2)]]);
        let cols = Axis::new(vec!["c".into()], vec![vec![Value::from("x")]]);
        Table::new(rows, cols, vec![vec![Some(Value::Float(0.5))], vec![None]])
    }

    #[test]
    fn test_flat_columns_get_extra_blank() {
        let mut out = Vec::new();
        write_csv(&table(), &mut out, None).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "c,x\na,,\n1,0.5\n2,\n");
    }

    #[test]
    fn test_preamble() {
        let var = Variable::new("d").with_doc("Doc");
        let mut out = Vec::new();
        write_csv(&table(), &mut out, Some(&var)).unwrap();
        assert!(String::from_utf8(out).unwrap().starts_with("d\nDoc\n\nc,x\n"));
    }
}
