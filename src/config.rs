// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Rendering parameters.  A `RenderConfig` is assembled once, from the
//! defaults for a fractal and whatever the command line overrides, and
//! is not changed after validation.

use num::Complex;
use std::fmt;
use std::str::FromStr;

use crate::error::RenderError;
use crate::formula::Formula;
use crate::render::{Style, CHANNELS};

/// Default raster width and height.
pub const DEFAULT_SIZE: (usize, usize) = (800, 800);

/// Default iteration limit.
pub const DEFAULT_ITERATIONS: usize = 1000;

/// Default Julia constant.
pub const DEFAULT_JULIA_CONSTANT: Complex<f64> = Complex {
    re: -0.8,
    im: 0.156,
};

/// The fractals we can draw.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fractal {
    /// z -> z^2 + c
    Mandelbrot,
    /// z -> z^2 + k for a fixed k
    Julia,
    /// z -> (|Re z| + i|Im z|)^2 + c
    BurningShip,
    /// Orbit density of the escaping Mandelbrot points.
    Buddhabrot,
}

impl Fractal {
    /// Every variant, in the order the command line lists them.
    pub const ALL: [Fractal; 4] = [
        Fractal::Mandelbrot,
        Fractal::Julia,
        Fractal::BurningShip,
        Fractal::Buddhabrot,
    ];

    /// The command name, which is also the stem of the output file.
    pub fn name(self) -> &'static str {
        match self {
            Fractal::Mandelbrot => "mandelbrot",
            Fractal::Julia => "julia",
            Fractal::BurningShip => "burningship",
            Fractal::Buddhabrot => "buddhabrot",
        }
    }

    /// Where the render is written unless told otherwise.
    pub fn default_output(self) -> String {
        format!("{}.png", self.name())
    }

    /// The point the view is centered on by default.
    pub fn default_center(self) -> Complex<f64> {
        match self {
            Fractal::Mandelbrot | Fractal::Buddhabrot => Complex::new(-0.5, 0.0),
            Fractal::Julia => Complex::new(0.0, 0.0),
            Fractal::BurningShip => Complex::new(-0.5, -0.5),
        }
    }

    /// The iteration formula; `julia_constant` is only used by Julia.
    pub fn formula(self, julia_constant: Complex<f64>) -> Formula {
        match self {
            Fractal::Mandelbrot | Fractal::Buddhabrot => Formula::Quadratic,
            Fractal::Julia => Formula::Julia(julia_constant),
            Fractal::BurningShip => Formula::BurningShip,
        }
    }

    /// Direct or density rendering.
    pub fn style(self) -> Style {
        match self {
            Fractal::Buddhabrot => Style::Density,
            _ => Style::Direct,
        }
    }
}

impl fmt::Display for Fractal {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fractal {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fractal::ALL
            .iter()
            .cloned()
            .find(|f| f.name() == s)
            .ok_or_else(|| RenderError::InvalidConfig(format!("unknown fractal '{}'", s)))
    }
}

/// Everything one render needs to know.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RenderConfig {
    /// Which fractal to draw.
    pub fractal: Fractal,
    /// Raster width in pixels.
    pub width: usize,
    /// Raster height in pixels.
    pub height: usize,
    /// Iteration cap per sample.
    pub max_iterations: usize,
    /// Center of the view on the complex plane.
    pub center: Complex<f64>,
    /// Zoom-out factor; 1.0 shows three units of the imaginary axis.
    pub zoom: f64,
    /// The fixed constant for Julia renders.
    pub julia_constant: Complex<f64>,
    /// Worker threads; 1 renders on the calling thread.
    pub threads: usize,
}

impl RenderConfig {
    /// The defaults for a fractal.
    pub fn new(fractal: Fractal) -> RenderConfig {
        RenderConfig {
            fractal,
            width: DEFAULT_SIZE.0,
            height: DEFAULT_SIZE.1,
            max_iterations: DEFAULT_ITERATIONS,
            center: fractal.default_center(),
            zoom: 1.0,
            julia_constant: DEFAULT_JULIA_CONSTANT,
            threads: 1,
        }
    }

    /// Check every parameter before anything is allocated.
    pub fn validate(&self) -> Result<(), RenderError> {
        let invalid = |msg: String| Err(RenderError::InvalidConfig(msg));
        if self.width == 0 || self.height == 0 {
            return invalid(format!(
                "image size must be at least 1x1, got {}x{}",
                self.width, self.height
            ));
        }
        if self
            .width
            .checked_mul(self.height)
            .and_then(|n| n.checked_mul(CHANNELS))
            .is_none()
        {
            return invalid(format!("image size {}x{} is too large", self.width, self.height));
        }
        if self.max_iterations == 0 {
            return invalid("iteration count must be at least 1".to_string());
        }
        if !(self.zoom.is_finite() && self.zoom > 0.0) {
            return invalid(format!("zoom must be a positive number, got {}", self.zoom));
        }
        if !(self.center.re.is_finite() && self.center.im.is_finite()) {
            return invalid(format!("center {} is not a finite point", self.center));
        }
        if !(self.julia_constant.re.is_finite() && self.julia_constant.im.is_finite()) {
            return invalid(format!("julia constant {} is not finite", self.julia_constant));
        }
        if self.threads == 0 {
            return invalid("thread count must be at least 1".to_string());
        }
        Ok(())
    }
}
