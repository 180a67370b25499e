// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The things that can go wrong during a render.  There are very few
//! of them: the computation itself is pure arithmetic, so everything
//! here is either a bad parameter caught before we start, or a local
//! resource failure (memory, the output file) that ends the run.

use failure::Fail;
use std::io;

/// Every failure the renderer reports upward.
#[derive(Debug, Fail)]
pub enum RenderError {
    /// The integral plane and the complex plane cannot be mapped onto
    /// one another: zero-sized raster, corners in the wrong order, or a
    /// non-finite or non-positive zoom.
    #[fail(display = "invalid viewport: {}", _0)]
    InvalidViewport(String),

    /// A rendering parameter is out of range.
    #[fail(display = "invalid configuration: {}", _0)]
    InvalidConfig(String),

    /// The raster or heatmap could not be allocated.
    #[fail(display = "could not allocate {} cells for the {}", cells, buffer)]
    Allocation {
        /// Which buffer we were trying to allocate.
        buffer: &'static str,
        /// How many elements were requested.
        cells: usize,
    },

    /// One of the scoped render threads panicked.
    #[fail(display = "a render worker panicked")]
    WorkerPanicked,

    /// The output file could not be created, written or finalized.
    #[fail(display = "could not write {}: {}", path, cause)]
    Encode {
        /// Destination path, as given.
        path: String,
        /// The underlying I/O failure.
        #[cause]
        cause: io::Error,
    },
}

/// Allocate a zeroed buffer of `cells` elements, reporting failure
/// instead of aborting the process.
pub(crate) fn zeroed<T: Copy + Default>(
    buffer: &'static str,
    cells: usize,
) -> Result<Vec<T>, RenderError> {
    let mut v: Vec<T> = Vec::new();
    v.try_reserve_exact(cells)
        .map_err(|_| RenderError::Allocation { buffer, cells })?;
    v.resize(cells, T::default());
    Ok(v)
}
