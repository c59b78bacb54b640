//! Partitioning - split the square grid into one rectangle per worker
//!
//! Rows of the grid are cut into horizontal bands, and each band into
//! columns, so every partition is a contiguous rectangle and together they
//! cover the grid exactly once. Leftover rows/columns go to the first bands
//! and columns, keeping sizes within one cell of each other.

use crate::core::{Boundaries, SimError};

pub fn partition_grid(size: u32, workers: usize) -> Result<Vec<Boundaries>, SimError> {
    let cells = size as usize * size as usize;
    if workers == 0 || workers > cells {
        return Err(SimError::Config(format!(
            "cannot split a {}x{} grid across {} workers",
            size, size, workers
        )));
    }

    let bands = ((workers as f64).sqrt().ceil() as usize).clamp(1, size as usize);
    let mut out = Vec::with_capacity(workers);
    let mut y0 = 0u32;
    for band in 0..bands {
        let band_height = split(size, bands, band);
        let columns = workers / bands + usize::from(band < workers % bands);
        let mut x0 = 0u32;
        for col in 0..columns {
            let width = split(size, columns, col);
            out.push(Boundaries::new(
                x0 as i64,
                (x0 + width) as i64,
                y0 as i64,
                (y0 + band_height) as i64,
            )?);
            x0 += width;
        }
        y0 += band_height;
    }
    Ok(out)
}

/// Length of part `i` when `total` is split into `parts` near-equal pieces.
#[inline]
fn split(total: u32, parts: usize, i: usize) -> u32 {
    let parts = parts as u32;
    total / parts + u32::from((i as u32) < total % parts)
}
