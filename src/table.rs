//! Row and column views of hourly observations
//!
//! `extract` turns records into a row-major [`FieldTable`] and `transpose`
//! flips any rectangular table into column-major form, which is what the
//! chart builders and the ET requests consume.

use crate::models::{FieldValue, ObservationRecord};
use crate::{IrrigationError, Result};

/// One row per record, one column per requested field
pub type FieldTable = Vec<Vec<FieldValue>>;

/// One vector per field, each as long as the source table
pub type ColumnTable<T = FieldValue> = Vec<Vec<T>>;

/// Pick `field_names` out of every record, preserving record and field order.
///
/// Fails on the first record lacking a requested field; nothing is returned
/// for the records before it.
pub fn extract<S: AsRef<str>>(
    records: &[ObservationRecord],
    field_names: &[S],
) -> Result<FieldTable> {
    records
        .iter()
        .enumerate()
        .map(|(row, record)| {
            field_names
                .iter()
                .map(|name| {
                    let name = name.as_ref();
                    record
                        .get(name)
                        .cloned()
                        .ok_or_else(|| IrrigationError::missing_field(name, row))
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

/// Row-major to column-major. All rows must have the length of the first one.
pub fn transpose<T: Clone>(rows: &[Vec<T>]) -> Result<ColumnTable<T>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let width = first.len();

    if let Some((row, ragged)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
        return Err(IrrigationError::RaggedTable {
            row,
            expected: width,
            found: ragged.len(),
        });
    }

    let mut columns: ColumnTable<T> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();
    for row in rows {
        for (column, value) in columns.iter_mut().zip(row) {
            column.push(value.clone());
        }
    }
    Ok(columns)
}
