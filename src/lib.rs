#![deny(missing_docs)]
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Escape-time fractal renderer
//!
//! The Mandelbrot set, its Julia sets and the Burning Ship are all
//! drawn the same way: take a point on the complex plane, iterate a
//! simple formula on it, and count how many steps it takes to get
//! further than 2 from the origin.  That count, cycled through a small
//! palette, is the pixel's color.  Points that never get that far are
//! left black.
//!
//! The Buddhabrot turns this inside out.  Instead of coloring the
//! starting point, it follows every value an escaping point passes
//! through, maps each one back to the nearest pixel, and counts the
//! visits.  The picture is of where escaping orbits go, not of how
//! fast they leave.
//!
//! The pieces, from the bottom up: `planes` maps pixels to complex
//! numbers and back, `formula` iterates and classifies, `palette`
//! picks colors, `orbit` accumulates visit counts, and `render` drives
//! the loops and owns the buffers.

extern crate crossbeam;
extern crate failure;
extern crate image;
extern crate itertools;
#[macro_use]
extern crate log;
extern crate num;

#[cfg(test)]
extern crate rand;
#[cfg(test)]
extern crate tempfile;

pub mod config;
pub mod error;
pub mod formula;
pub mod orbit;
pub mod output;
pub mod palette;
pub mod planes;
pub mod render;

pub use config::{Fractal, RenderConfig};
pub use error::RenderError;
pub use formula::{classify, classify_orbit, Escape, Formula};
pub use orbit::{accumulate, Heatmap};
pub use output::write_png;
pub use palette::{Palette, DEFAULT_PALETTE};
pub use planes::{Pixel, PlaneMapper};
pub use render::{EscapeRenderer, Raster, RenderStats, Rendering, Style};

/// Render the fractal a configuration describes.
pub fn render(config: &RenderConfig) -> Result<Rendering, RenderError> {
    EscapeRenderer::from_config(config)?.render(config.threads)
}
