// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Raster assembly.  There are two shapes of render:
//!
//! * Direct: every pixel is mapped to the complex plane, classified,
//!   and colored by its escape time.  Bounded pixels stay black.
//!
//! * Density (the Buddhabrot): every pixel is used as a sample; the
//!   orbits of the samples that escape are plotted into a heatmap, and
//!   a second pass colors the heatmap by visit count.
//!
//! Both shapes can be split across threads.  Direct renders hand each
//! worker its own band of rows, so no two workers touch the same
//! pixel.  Density renders give each worker a private heatmap and sum
//! them once all the workers are done.

use crossbeam::thread::ScopedJoinHandle;
use itertools::iproduct;
use num::Complex;
use std::ops::{AddAssign, Range};
use std::sync::Mutex;
use std::time::Instant;

use crate::config::RenderConfig;
use crate::error::{zeroed, RenderError};
use crate::formula::{classify, classify_orbit, Escape, Formula};
use crate::orbit::{accumulate, Heatmap};
use crate::palette::{Palette, Rgb};
use crate::planes::{Pixel, PlaneMapper};

/// Bytes per pixel in the raster.
pub const CHANNELS: usize = 3;

/// A row-major RGB8 image, initialized to black.
#[derive(Clone, Debug, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    /// An all-black raster.
    pub fn new(width: usize, height: usize) -> Result<Raster, RenderError> {
        let len = width
            .checked_mul(height)
            .and_then(|n| n.checked_mul(CHANNELS))
            .ok_or(RenderError::Allocation {
                buffer: "raster",
                cells: usize::max_value(),
            })?;
        Ok(Raster {
            width,
            height,
            pixels: zeroed("raster", len)?,
        })
    }

    /// Width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The raw RGB8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// The color at (x, y), if that pixel exists.
    pub fn get(&self, x: usize, y: usize) -> Option<Rgb> {
        if x < self.width && y < self.height {
            let i = (y * self.width + x) * CHANNELS;
            Some([self.pixels[i], self.pixels[i + 1], self.pixels[i + 2]])
        } else {
            None
        }
    }

    /// True if every pixel is still black.
    pub fn is_blank(&self) -> bool {
        self.pixels.iter().all(|&b| b == 0)
    }
}

/// Whether a fractal is drawn by escape time or by orbit density.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Style {
    /// One classification and at most one write per pixel.
    Direct,
    /// Accumulate escaping orbits, then colorize the heatmap.
    Density,
}

/// Counters gathered during a render.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderStats {
    /// Samples that escaped.
    pub escaped: usize,
    /// Samples that did not.
    pub bounded: usize,
    /// Sum over escaping samples of their orbit length (k + 1).
    /// Density renders only.
    pub orbit_points: u64,
    /// Heatmap increments actually applied; orbit points that fell
    /// outside the raster are not counted.  Density renders only.
    pub increments: u64,
}

impl AddAssign for RenderStats {
    fn add_assign(&mut self, other: RenderStats) {
        self.escaped += other.escaped;
        self.bounded += other.bounded;
        self.orbit_points += other.orbit_points;
        self.increments += other.increments;
    }
}

/// The result of a render: the image, and for density renders the
/// heatmap it was colored from.
#[derive(Debug)]
pub struct Rendering {
    /// The finished image.
    pub raster: Raster,
    /// Visit counts, for density renders.
    pub heatmap: Option<Heatmap>,
    /// What happened along the way.
    pub stats: RenderStats,
}

/// Holds everything fixed for the duration of one render: the mapping
/// between the raster and the complex plane, the formula, the
/// iteration limit and the palette.
#[derive(Debug, Clone)]
pub struct EscapeRenderer {
    plane: PlaneMapper,
    formula: Formula,
    limit: usize,
    palette: Palette,
    style: Style,
}

impl EscapeRenderer {
    /// A renderer using the default palette.
    pub fn new(plane: PlaneMapper, formula: Formula, limit: usize, style: Style) -> Self {
        EscapeRenderer {
            plane,
            formula,
            limit,
            palette: Palette::default(),
            style,
        }
    }

    /// Validate a configuration and build the renderer it describes.
    pub fn from_config(config: &RenderConfig) -> Result<Self, RenderError> {
        config.validate()?;
        let plane = PlaneMapper::centered(config.width, config.height, config.center, config.zoom)?;
        let fractal = config.fractal;
        Ok(EscapeRenderer::new(
            plane,
            fractal.formula(config.julia_constant),
            config.max_iterations,
            fractal.style(),
        ))
    }

    /// Replace the palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }

    /// The plane mapping in use.
    pub fn plane(&self) -> &PlaneMapper {
        &self.plane
    }

    /// Render with the configured style, on `threads` workers.  One
    /// thread runs the plain sequential loops.
    pub fn render(&self, threads: usize) -> Result<Rendering, RenderError> {
        let started = Instant::now();
        info!(
            "rendering {:?} {}x{} ({:?}, {} iterations, {} thread(s))",
            self.formula,
            self.plane.width(),
            self.plane.height(),
            self.style,
            self.limit,
            threads
        );

        let rendering = match self.style {
            Style::Direct => {
                let (raster, stats) = if threads > 1 {
                    self.direct(threads)?
                } else {
                    self.direct_single()?
                };
                Rendering {
                    raster,
                    heatmap: None,
                    stats,
                }
            }
            Style::Density => {
                let (heatmap, stats) = if threads > 1 {
                    self.heatmap(threads)?
                } else {
                    self.heatmap_single()?
                };
                let raster = self.colorize(&heatmap)?;
                Rendering {
                    raster,
                    heatmap: Some(heatmap),
                    stats,
                }
            }
        };

        let elapsed = started.elapsed();
        info!(
            "rendered in {}.{:03}s: {} escaped, {} bounded",
            elapsed.as_secs(),
            elapsed.subsec_millis(),
            rendering.stats.escaped,
            rendering.stats.bounded
        );
        if let Some(ref heatmap) = rendering.heatmap {
            info!(
                "heatmap: {} of {} orbit points plotted, hottest cell {}",
                rendering.stats.increments,
                rendering.stats.orbit_points,
                heatmap.max()
            );
        }
        Ok(rendering)
    }

    // Map a pixel to the plane and classify it.
    #[inline]
    fn sample(&self, pixel: Pixel) -> Escape {
        let point = self.plane.pixel_to_point(&pixel);
        if self.formula.known_bounded(point) {
            return Escape::Bounded;
        }
        let (z, c) = self.formula.seed(point);
        classify(z, c, self.formula, self.limit)
    }

    // Draw the rows of `band`, which starts at raster row `first_row`.
    fn render_band(&self, first_row: usize, band: &mut [u8]) -> RenderStats {
        let width = self.plane.width();
        let rows = band.len() / (width * CHANNELS);
        let mut stats = RenderStats::default();
        let pixels = iproduct!(first_row..first_row + rows, 0..width);
        for ((row, column), out) in pixels.zip(band.chunks_mut(CHANNELS)) {
            match self.sample(Pixel(column, row)) {
                Escape::Escaped(i) => {
                    out.copy_from_slice(&self.palette.color_for(i));
                    stats.escaped += 1;
                }
                Escape::Bounded => stats.bounded += 1,
            }
        }
        stats
    }

    /// Direct render on the calling thread.
    pub fn direct_single(&self) -> Result<(Raster, RenderStats), RenderError> {
        let mut raster = Raster::new(self.plane.width(), self.plane.height())?;
        let stats = self.render_band(0, &mut raster.pixels);
        Ok((raster, stats))
    }

    /// Direct render split into `threads` bands of rows.
    pub fn direct(&self, threads: usize) -> Result<(Raster, RenderStats), RenderError> {
        let threads = threads.max(1);
        let mut raster = Raster::new(self.plane.width(), self.plane.height())?;
        let band_rows = (self.plane.height() + threads - 1) / threads;
        let band_len = band_rows * self.plane.width() * CHANNELS;

        let results = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<RenderStats>> = raster
                .pixels
                .chunks_mut(band_len)
                .enumerate()
                .map(|(i, band)| spawner.spawn(move |_| self.render_band(i * band_rows, band)))
                .collect();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        })
        .map_err(|_| RenderError::WorkerPanicked)?;

        let mut stats = RenderStats::default();
        for result in results {
            stats += result.map_err(|_| RenderError::WorkerPanicked)?;
        }
        Ok((raster, stats))
    }

    // Trace every sample in `rows`, plotting escaping orbits.  `orbit`
    // is scratch space, reused for every sample.
    fn trace_rows(
        &self,
        rows: Range<usize>,
        heatmap: &mut Heatmap,
        orbit: &mut Vec<Complex<f64>>,
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        for (row, column) in iproduct!(rows, 0..self.plane.width()) {
            let point = self.plane.pixel_to_point(&Pixel(column, row));
            if self.formula.known_bounded(point) {
                stats.bounded += 1;
                continue;
            }
            let (z, c) = self.formula.seed(point);
            match classify_orbit(z, c, self.formula, self.limit, orbit) {
                Escape::Escaped(_) => {
                    stats.escaped += 1;
                    stats.orbit_points += orbit.len() as u64;
                    stats.increments += accumulate(orbit, &self.plane, heatmap) as u64;
                }
                Escape::Bounded => stats.bounded += 1,
            }
        }
        stats
    }

    // Scratch space for one worker's orbits.
    fn orbit_buffer(&self) -> Result<Vec<Complex<f64>>, RenderError> {
        let mut orbit = Vec::new();
        orbit
            .try_reserve_exact(self.limit)
            .map_err(|_| RenderError::Allocation {
                buffer: "orbit",
                cells: self.limit,
            })?;
        Ok(orbit)
    }

    /// The accumulation pass of a density render, on the calling
    /// thread.
    pub fn heatmap_single(&self) -> Result<(Heatmap, RenderStats), RenderError> {
        let mut heatmap = Heatmap::new(self.plane.width(), self.plane.height())?;
        let mut orbit = self.orbit_buffer()?;
        let stats = self.trace_rows(0..self.plane.height(), &mut heatmap, &mut orbit);
        Ok((heatmap, stats))
    }

    /// The accumulation pass of a density render across `threads`
    /// workers.  Rows are handed out from a shared queue; each worker
    /// plots into its own heatmap, and the heatmaps are summed at the
    /// end.  The result is identical to `heatmap_single`.
    pub fn heatmap(&self, threads: usize) -> Result<(Heatmap, RenderStats), RenderError> {
        let threads = threads.max(1);
        let (width, height) = (self.plane.width(), self.plane.height());

        let mut workspaces = Vec::with_capacity(threads);
        for _ in 0..threads {
            workspaces.push((Heatmap::new(width, height)?, self.orbit_buffer()?));
        }

        let rows = Mutex::new(0..height);
        let rows = &rows;
        let results = crossbeam::scope(|spawner| {
            let handles: Vec<ScopedJoinHandle<(Heatmap, RenderStats)>> = workspaces
                .into_iter()
                .map(|(mut heatmap, mut orbit)| {
                    spawner.spawn(move |_| {
                        let mut stats = RenderStats::default();
                        loop {
                            // A poisoned queue means another worker died;
                            // stop here and let the join report it.
                            let row = match rows.lock() {
                                Ok(mut rows) => rows.next(),
                                Err(_) => None,
                            };
                            match row {
                                Some(row) => {
                                    stats += self.trace_rows(row..row + 1, &mut heatmap, &mut orbit)
                                }
                                None => break,
                            }
                        }
                        (heatmap, stats)
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join()).collect::<Vec<_>>()
        })
        .map_err(|_| RenderError::WorkerPanicked)?;

        let mut merged = Heatmap::new(width, height)?;
        let mut stats = RenderStats::default();
        for result in results {
            let (heatmap, worker_stats) = result.map_err(|_| RenderError::WorkerPanicked)?;
            merged.merge(&heatmap);
            stats += worker_stats;
        }
        Ok((merged, stats))
    }

    /// The second pass of a density render: every cell that was
    /// visited at least once gets the palette color for its count.
    pub fn colorize(&self, heatmap: &Heatmap) -> Result<Raster, RenderError> {
        let mut raster = Raster::new(heatmap.width(), heatmap.height())?;
        for (&count, out) in heatmap
            .cells()
            .iter()
            .zip(raster.pixels.chunks_mut(CHANNELS))
        {
            if count > 0 {
                out.copy_from_slice(&self.palette.color_for(count as usize));
            }
        }
        Ok(raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::palette::DEFAULT_PALETTE;

    fn renderer(width: usize, height: usize, formula: Formula, style: Style) -> EscapeRenderer {
        let plane = PlaneMapper::centered(width, height, Complex::new(-0.5, 0.0), 1.0).unwrap();
        EscapeRenderer::new(plane, formula, 50, style)
    }

    #[test]
    fn raster_starts_black() {
        let raster = Raster::new(3, 2).unwrap();
        assert_eq!(raster.pixels().len(), 18);
        assert!(raster.is_blank());
        assert_eq!(raster.get(2, 1), Some([0, 0, 0]));
        assert_eq!(raster.get(3, 1), None);
    }

    #[test]
    fn oversized_rasters_are_an_allocation_error() {
        match Raster::new(usize::max_value(), 2) {
            Err(RenderError::Allocation { buffer, .. }) => assert_eq!(buffer, "raster"),
            other => panic!("unexpected {:?}", other.map(|r| r.width())),
        }
    }

    #[test]
    fn direct_render_colors_by_escape_time() {
        let r = renderer(64, 64, Formula::Quadratic, Style::Direct);
        let (raster, stats) = r.direct_single().unwrap();
        assert_eq!(stats.escaped + stats.bounded, 64 * 64);
        // The corner at -2 - 1.5i escapes on the first step.
        assert_eq!(raster.get(0, 0), Some(DEFAULT_PALETTE.color_for(0)));
        // Pixel (43, 32) is at 0.015625 + 0i, deep in the cardioid.
        assert_eq!(raster.get(43, 32), Some([0, 0, 0]));
    }

    #[test]
    fn every_direct_pixel_matches_its_classification() {
        let r = renderer(32, 24, Formula::BurningShip, Style::Direct);
        let (raster, _) = r.direct_single().unwrap();
        for (y, x) in iproduct!(0..24, 0..32) {
            let expected = match r.sample(Pixel(x, y)) {
                Escape::Escaped(i) => DEFAULT_PALETTE.color_for(i),
                Escape::Bounded => [0, 0, 0],
            };
            assert_eq!(raster.get(x, y), Some(expected), "pixel {},{}", x, y);
        }
    }

    #[test]
    fn burning_ship_pixels_escape_where_the_fold_says() {
        // Half-unit pixels over [-2, 2] x [-2, 2].
        let plane = PlaneMapper::new(8, 8, Complex::new(-2.0, -2.0), Complex::new(2.0, 2.0)).unwrap();
        let r = EscapeRenderer::new(plane, Formula::BurningShip, 50, Style::Direct);
        let (raster, _) = r.direct_single().unwrap();

        // c = -2 - 2i: folds to 2 + 2i, squares to 8i, lands on -2 + 6i.
        assert_eq!(raster.get(0, 0), Some(DEFAULT_PALETTE.color_for(0)));
        // c = -1 + 0.5i: -0.25 + 1.5i after one step, then the fold
        // gives -3.1875 + 1.25i.  Without the fold z would still be
        // inside the radius (-1.1875 + 0.75i).
        assert_eq!(raster.get(2, 5), Some(DEFAULT_PALETTE.color_for(1)));
        let c = Complex::new(-1.0, 0.5);
        assert_ne!(classify(c, c, Formula::Quadratic, 50), Escape::Escaped(1));
        // c = 0 stays put.
        assert_eq!(raster.get(4, 4), Some([0, 0, 0]));
    }

    #[test]
    fn palettes_can_be_swapped() {
        let plain = renderer(32, 24, Formula::Quadratic, Style::Direct);
        let red = match Palette::new(&[[255, 0, 0]]) {
            Some(palette) => plain.clone().with_palette(palette),
            None => panic!("a one-color table is a palette"),
        };
        let (expected, _) = plain.direct_single().unwrap();
        let (raster, _) = red.direct_single().unwrap();
        for (y, x) in iproduct!(0..24, 0..32) {
            let color = match expected.get(x, y) {
                Some([0, 0, 0]) => [0, 0, 0],
                _ => [255, 0, 0],
            };
            assert_eq!(raster.get(x, y), Some(color), "pixel {},{}", x, y);
        }
        assert_eq!(raster.get(0, 0), Some([255, 0, 0]));
    }

    #[test]
    fn threaded_direct_matches_single() {
        for formula in &[Formula::Quadratic, Formula::Julia(Complex::new(-0.8, 0.156))] {
            let r = renderer(37, 29, *formula, Style::Direct);
            let single = r.direct_single().unwrap();
            for &threads in &[2, 3, 8, 64] {
                assert_eq!(r.direct(threads).unwrap(), single);
            }
        }
    }

    #[test]
    fn precheck_does_not_change_the_picture() {
        let r = renderer(48, 48, Formula::Quadratic, Style::Direct);
        for (y, x) in iproduct!(0..48, 0..48) {
            let point = r.plane.pixel_to_point(&Pixel(x, y));
            assert_eq!(
                r.sample(Pixel(x, y)),
                classify(point, point, Formula::Quadratic, 50)
            );
        }
    }

    #[test]
    fn heatmap_totals_match_the_orbits() {
        let r = renderer(96, 96, Formula::Quadratic, Style::Density);
        let (heatmap, stats) = r.heatmap_single().unwrap();
        assert!(stats.escaped > 0);
        assert_eq!(heatmap.total(), stats.increments);
        assert!(stats.increments <= stats.orbit_points);

        // Recount independently: every escaping sample offers k + 1
        // points, and only those that land on the raster count.
        let mut orbit = Vec::new();
        let (mut offered, mut landed) = (0u64, 0u64);
        for (y, x) in iproduct!(0..96, 0..96) {
            let c = r.plane.pixel_to_point(&Pixel(x, y));
            if let Escape::Escaped(k) = classify_orbit(c, c, Formula::Quadratic, 50, &mut orbit) {
                offered += (k + 1) as u64;
                landed += orbit
                    .iter()
                    .filter(|z| r.plane.point_to_offset(z).is_some())
                    .count() as u64;
            }
        }
        assert_eq!(stats.orbit_points, offered);
        assert_eq!(heatmap.total(), landed);
    }

    #[test]
    fn bounded_samples_leave_no_trace() {
        // A view entirely inside the main cardioid: nothing escapes.
        let plane = PlaneMapper::centered(64, 64, Complex::new(-0.2, 0.0), 0.1).unwrap();
        let r = EscapeRenderer::new(plane, Formula::Quadratic, 50, Style::Density);
        let rendering = r.render(1).unwrap();
        assert_eq!(rendering.stats.escaped, 0);
        assert_eq!(rendering.stats.bounded, 64 * 64);
        assert_eq!(rendering.heatmap.unwrap().total(), 0);
        assert!(rendering.raster.is_blank());
    }

    #[test]
    fn threaded_heatmap_matches_single() {
        let r = renderer(40, 30, Formula::Quadratic, Style::Density);
        let single = r.heatmap_single().unwrap();
        for &threads in &[2, 5] {
            assert_eq!(r.heatmap(threads).unwrap(), single);
        }
    }

    #[test]
    fn colorize_only_touches_visited_cells() {
        let r = renderer(4, 4, Formula::Quadratic, Style::Density);
        let mut heatmap = Heatmap::new(4, 4).unwrap();
        let plane = r.plane().clone();
        // (-0.5, 0) is the center of the view, pixel (2, 2).
        accumulate(&[Complex::new(-0.5, 0.0); 17], &plane, &mut heatmap);
        let raster = r.colorize(&heatmap).unwrap();
        assert_eq!(raster.get(2, 2), Some(DEFAULT_PALETTE.color_for(17)));
        assert_eq!(raster.get(2, 2), Some(DEFAULT_PALETTE.color_for(1)));
        let lit = iproduct!(0..4, 0..4)
            .filter(|&(y, x)| raster.get(x, y) != Some([0, 0, 0]))
            .count();
        assert_eq!(lit, 1);
    }

    #[test]
    fn stats_add_up() {
        let mut a = RenderStats {
            escaped: 1,
            bounded: 2,
            orbit_points: 3,
            increments: 4,
        };
        a += a;
        assert_eq!(
            a,
            RenderStats {
                escaped: 2,
                bounded: 4,
                orbit_points: 6,
                increments: 8,
            }
        );
    }
}
