use crate::{IrrigationError, Result};

/// Split `items` into contiguous groups of `size`; the last group holds the remainder.
///
/// Borrowed slices, single pass.
pub fn chunk<T>(items: &[T], size: usize) -> Result<Vec<&[T]>> {
    if size == 0 {
        return Err(IrrigationError::InvalidChunkSize { size });
    }
    Ok(items.chunks(size).collect())
}
