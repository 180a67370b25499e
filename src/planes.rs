// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Contains the PlaneMapper struct, which describes a relationship
//! between a rectangle on the integral plane with an origin at 0,0,
//! and a rectangle on the complex plane (the viewport) defined by its
//! left-lower and right-upper corners.
use crate::error::RenderError;
use num::Complex;

/// How many units of the imaginary axis lie between the center of the
/// viewport and its top edge at a zoom factor of 1.  Together with the
/// default Mandelbrot center of -0.5 this yields the classic
/// [-2, 1] x [-1.5, 1.5] view on a square raster.
pub const BASE_HALF_HEIGHT: f64 = 1.5;

/// Describes the width and height of an integral plane that is assumed
/// to start at 0,0.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntegralPlane(pub usize, pub usize);

/// Describes the lower-left corner and upper-right corner of the
/// complex plane, treating the real part of each value as the
/// x-component and the imaginary part as the y-component.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ComplexPlane(pub Complex<f64>, pub Complex<f64>);

impl ComplexPlane {
    /// Derive the viewport from a center point, a zoom-out factor and
    /// the aspect ratio of the raster.  The vertical extent is fixed by
    /// the zoom; the horizontal extent follows the aspect ratio so that
    /// pixels stay square.
    pub fn centered(
        center: Complex<f64>,
        zoom: f64,
        width: usize,
        height: usize,
    ) -> Result<ComplexPlane, RenderError> {
        if !(zoom.is_finite() && zoom > 0.0) {
            return Err(RenderError::InvalidViewport(format!(
                "zoom must be a positive number, got {}",
                zoom
            )));
        }
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport(format!(
                "raster of {}x{} has no pixels",
                width, height
            )));
        }
        let half_height = BASE_HALF_HEIGHT * zoom;
        let half_width = half_height * (width as f64) / (height as f64);
        Ok(ComplexPlane(
            Complex::new(center.re - half_width, center.im - half_height),
            Complex::new(center.re + half_width, center.im + half_height),
        ))
    }

    /// xmin
    pub fn left(&self) -> f64 {
        self.0.re
    }

    /// xmax
    pub fn right(&self) -> f64 {
        self.1.re
    }

    /// ymin
    pub fn bottom(&self) -> f64 {
        self.0.im
    }

    /// ymax
    pub fn top(&self) -> f64 {
        self.1.im
    }
}

/// Describes the x, y of a pixel in the integral plane.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Pixel(pub usize, pub usize);

/// Contains the definitions of two planes: an integral cartesian plane,
/// and a complex cartesian plane.  Maps points from one to the other.
/// Computed once per render and never modified afterwards.
#[derive(Debug, Clone)]
pub struct PlaneMapper {
    /// The right-upper hand corner of the integral cartesian plane.
    /// The left-lower is assumed to be at 0,0
    pub integral_plane: IntegralPlane,
    /// The two coordinates defining the complex cartesian plane,
    /// left-lower and right-upper
    pub complex_plane: ComplexPlane,
    // Size of one pixel along each axis, in complex-plane units.
    steps: (f64, f64),
}

impl PlaneMapper {
    /// Constructor.  Takes the size of the integral plane and the two
    /// corners describing the complex plane.
    pub fn new(
        width: usize,
        height: usize,
        leftlower: Complex<f64>,
        rightupper: Complex<f64>,
    ) -> Result<PlaneMapper, RenderError> {
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidViewport(format!(
                "raster of {}x{} has no pixels",
                width, height
            )));
        }

        let finite = |c: Complex<f64>| c.re.is_finite() && c.im.is_finite();
        if !finite(leftlower) || !finite(rightupper) {
            return Err(RenderError::InvalidViewport(
                "viewport corners must be finite".to_string(),
            ));
        }

        if rightupper.re <= leftlower.re {
            return Err(RenderError::InvalidViewport(
                "The left lower corner is not to the left of the right upper corner.".to_string(),
            ));
        }

        if rightupper.im <= leftlower.im {
            return Err(RenderError::InvalidViewport(
                "The left lower corner is not lower than the right upper corner".to_string(),
            ));
        }

        let steps = (
            (rightupper.re - leftlower.re) / (width as f64),
            (rightupper.im - leftlower.im) / (height as f64),
        );

        debug!(
            "viewport x:[{}, {}] y:[{}, {}] on {}x{}, step {:e}x{:e}",
            leftlower.re, rightupper.re, leftlower.im, rightupper.im, width, height, steps.0, steps.1
        );

        Ok(PlaneMapper {
            integral_plane: IntegralPlane(width, height),
            complex_plane: ComplexPlane(leftlower, rightupper),
            steps,
        })
    }

    /// Build a mapper for a viewport derived from a center and zoom.
    pub fn centered(
        width: usize,
        height: usize,
        center: Complex<f64>,
        zoom: f64,
    ) -> Result<PlaneMapper, RenderError> {
        if !(center.re.is_finite() && center.im.is_finite()) {
            return Err(RenderError::InvalidViewport(
                "viewport center must be finite".to_string(),
            ));
        }
        let plane = ComplexPlane::centered(center, zoom, width, height)?;
        PlaneMapper::new(width, height, plane.0, plane.1)
    }

    /// Raster width in pixels.
    pub fn width(&self) -> usize {
        self.integral_plane.0
    }

    /// Raster height in pixels.
    pub fn height(&self) -> usize {
        self.integral_plane.1
    }

    /// Per-axis pixel size in complex-plane units.
    pub fn steps(&self) -> (f64, f64) {
        self.steps
    }

    /// Given a pixel on the integral cartesian plane, return the
    /// complex number at its location: `xmin + px * stepx`,
    /// `ymin + py * stepy`.
    pub fn pixel_to_point(&self, pixel: &Pixel) -> Complex<f64> {
        Complex::new(
            self.complex_plane.0.re + (pixel.0 as f64) * self.steps.0,
            self.complex_plane.0.im + (pixel.1 as f64) * self.steps.1,
        )
    }

    // Fractional pixel coordinates of a point, before rounding.
    #[inline]
    fn scaled(&self, point: &Complex<f64>) -> (f64, f64) {
        let ComplexPlane(ll, ru) = self.complex_plane;
        (
            (self.integral_plane.0 as f64) * (point.re - ll.re) / (ru.re - ll.re),
            (self.integral_plane.1 as f64) * (point.im - ll.im) / (ru.im - ll.im),
        )
    }

    /// Map a complex number back to the nearest pixel.  The result is
    /// not range checked: points outside the viewport produce
    /// coordinates outside the raster, including negative ones.
    pub fn point_to_pixel(&self, point: &Complex<f64>) -> (i64, i64) {
        let (left, top) = self.scaled(point);
        (left.round() as i64, top.round() as i64)
    }

    /// Since the Buddhabrot tracks the progress of a complex number as
    /// it orbits, we have to map those complex numbers back to the
    /// pixel plane.  This function takes a point, maps it to pixel
    /// coordinates, and returns the linear offset from the root of the
    /// image buffer in memory, or None if the point lands outside the
    /// raster.
    #[inline]
    pub fn point_to_offset(&self, point: &Complex<f64>) -> Option<usize> {
        let (left, top) = self.scaled(point);
        let (left, top) = (left.round(), top.round());
        // Negated so that NaN falls through to None.
        if !(left >= 0.0
            && left < (self.integral_plane.0 as f64)
            && top >= 0.0
            && top < (self.integral_plane.1 as f64))
        {
            return None;
        }
        Some((top as usize) * self.integral_plane.0 + (left as usize))
    }
}
