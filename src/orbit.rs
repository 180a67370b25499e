// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Orbit accumulation for the Buddhabrot.  Each value an escaping
//! point passes through is itself a coordinate on the complex plane;
//! map it back to the nearest pixel and count the visit.

use crate::error::{zeroed, RenderError};
use crate::planes::PlaneMapper;
use num::Complex;

/// Per-pixel visit counters, row-major, one per pixel of the raster.
#[derive(Clone, Debug, PartialEq)]
pub struct Heatmap {
    width: usize,
    height: usize,
    cells: Vec<u32>,
}

impl Heatmap {
    /// A zeroed heatmap of `width` x `height` cells.
    pub fn new(width: usize, height: usize) -> Result<Heatmap, RenderError> {
        let len = width.checked_mul(height).ok_or(RenderError::Allocation {
            buffer: "heatmap",
            cells: usize::max_value(),
        })?;
        Ok(Heatmap {
            width,
            height,
            cells: zeroed("heatmap", len)?,
        })
    }

    /// Width in cells.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in cells.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The counters, row-major.
    pub fn cells(&self) -> &[u32] {
        &self.cells
    }

    /// The count at (x, y), if that cell exists.
    pub fn get(&self, x: usize, y: usize) -> Option<u32> {
        if x < self.width && y < self.height {
            Some(self.cells[y * self.width + x])
        } else {
            None
        }
    }

    /// Sum of all counters.
    pub fn total(&self) -> u64 {
        self.cells.iter().map(|&c| u64::from(c)).sum()
    }

    /// The largest single count.
    pub fn max(&self) -> u32 {
        self.cells.iter().cloned().max().unwrap_or(0)
    }

    /// Fold another heatmap of the same shape into this one, cell by
    /// cell.  Used to combine the private heatmaps of render workers.
    pub fn merge(&mut self, other: &Heatmap) {
        assert!(self.width == other.width && self.height == other.height);
        for (mine, theirs) in self.cells.iter_mut().zip(other.cells.iter()) {
            *mine = mine.saturating_add(*theirs);
        }
    }
}

/// Given an orbit, increment every heatmap cell one of its values
/// lands on.  Values outside the raster are dropped.  Returns the
/// number of increments actually applied.
pub fn accumulate(orbit: &[Complex<f64>], plane: &PlaneMapper, heatmap: &mut Heatmap) -> usize {
    debug_assert!(heatmap.width == plane.width() && heatmap.height == plane.height());
    let mut applied = 0;
    for z in orbit {
        if let Some(offset) = plane.point_to_offset(z) {
            let cell = &mut heatmap.cells[offset];
            *cell = cell.saturating_add(1);
            applied += 1;
        }
    }
    applied
}
