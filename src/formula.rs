// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The dynamical systems.  Every fractal here is the same loop: apply
//! a formula to z, check whether z has left the circle of radius 2,
//! repeat up to some limit.  Only the formula and the seed differ.

use num::Complex;

/// Squared escape radius.  Comparing |z|^2 against this saves us a
/// square root per iteration.
pub const ESCAPE_RADIUS_SQR: f64 = 4.0;

/// The iteration formulas we know how to run.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum Formula {
    /// z -> z^2 + c, with c taken from the pixel.
    Quadratic,
    /// z -> z^2 + k, with a fixed k and z seeded from the pixel.
    Julia(Complex<f64>),
    /// z -> (|Re z| + i|Im z|)^2 + c.
    BurningShip,
}

impl Formula {
    /// One step of the dynamical system.
    #[inline]
    pub fn apply(&self, z: Complex<f64>, c: Complex<f64>) -> Complex<f64> {
        match *self {
            Formula::Quadratic | Formula::Julia(_) => z * z + c,
            Formula::BurningShip => {
                let folded = Complex::new(z.re.abs(), z.im.abs());
                folded * folded + c
            }
        }
    }

    /// Given the point a pixel maps to, returns the starting value of z
    /// and the constant added at every step.
    #[inline]
    pub fn seed(&self, point: Complex<f64>) -> (Complex<f64>, Complex<f64>) {
        match *self {
            Formula::Quadratic | Formula::BurningShip => (point, point),
            Formula::Julia(k) => (point, k),
        }
    }

    /// True when the point is already known never to escape, so the
    /// caller can skip iterating it.  Only the quadratic formula has a
    /// closed-form test (see `in_main_bulbs`); the others always answer
    /// false.
    #[inline]
    pub fn known_bounded(&self, point: Complex<f64>) -> bool {
        match *self {
            Formula::Quadratic => in_main_bulbs(point),
            _ => false,
        }
    }
}

/// The terminal classification of one sample.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Escape {
    /// |z|^2 exceeded the escape radius after the step with this
    /// 0-based index.
    Escaped(usize),
    /// The iteration limit was reached without escaping.
    Bounded,
}

/// This is our classic iterator function: starting from `seed`,
/// repeatedly apply `formula`, and report the step at which z leaves
/// the escape radius, or `Bounded` if it never does within
/// `max_iterations` steps.
#[inline]
pub fn classify(
    seed: Complex<f64>,
    constant: Complex<f64>,
    formula: Formula,
    max_iterations: usize,
) -> Escape {
    let mut z = seed;
    for i in 0..max_iterations {
        z = formula.apply(z, constant);
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            return Escape::Escaped(i);
        }
    }
    Escape::Bounded
}

/// The same as `classify`, but every value z takes is recorded in
/// `orbit`, up to and including the escaping one.  `orbit` is cleared
/// first so that one buffer can be reused across samples without
/// allocating in the hot loop.  On `Escaped(k)` the orbit holds exactly
/// k + 1 values; on `Bounded` its contents are meaningless.
pub fn classify_orbit(
    seed: Complex<f64>,
    constant: Complex<f64>,
    formula: Formula,
    max_iterations: usize,
    orbit: &mut Vec<Complex<f64>>,
) -> Escape {
    orbit.clear();
    let mut z = seed;
    for i in 0..max_iterations {
        z = formula.apply(z, constant);
        orbit.push(z);
        if z.norm_sqr() > ESCAPE_RADIUS_SQR {
            return Escape::Escaped(i);
        }
    }
    Escape::Bounded
}

const D4: f64 = 1.0 / 4.0;
const D16: f64 = D4 / 4.0;

/// The two halves of this test are the closed forms for the main
/// cardioid and the period-2 bulb of the Mandelbrot set.  A point for
/// which this returns true is guaranteed never to escape under z^2 + c.
/// It is not a membership test: plenty of bounded points lie outside
/// both regions and still have to be iterated.
pub fn in_main_bulbs(point: Complex<f64>) -> bool {
    let y = point.im * point.im;
    let q = (point.re - D4) * (point.re - D4) + y;
    q * (q + point.re - D4) < y * D4 || (point.re + 1.0) * (point.re + 1.0) + y < D16
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const ORIGIN: Complex<f64> = Complex { re: 0.0, im: 0.0 };

    #[test]
    fn origin_never_escapes() {
        for &limit in &[1, 2, 10, 1000] {
            assert_eq!(classify(ORIGIN, ORIGIN, Formula::Quadratic, limit), Escape::Bounded);
        }
    }

    #[test]
    fn far_points_escape_immediately() {
        let c = Complex::new(3.0, 0.0);
        assert_eq!(classify(c, c, Formula::Quadratic, 50), Escape::Escaped(0));
        let c = Complex::new(2.0, 0.0);
        assert_eq!(classify(c, c, Formula::Quadratic, 50), Escape::Escaped(0));
    }

    #[test]
    fn zero_iterations_are_bounded() {
        let c = Complex::new(3.0, 0.0);
        assert_eq!(classify(c, c, Formula::Quadratic, 0), Escape::Bounded);
    }

    #[test]
    fn escape_is_strictly_outside_the_radius() {
        // c = -2 is the tip of the set: z goes -2 -> 2 -> 2 -> ... and
        // |z|^2 sits exactly on 4 forever.
        let c = Complex::new(-2.0, 0.0);
        assert_eq!(classify(c, c, Formula::Quadratic, 100), Escape::Bounded);
    }

    #[test]
    fn escape_step_counts_from_zero() {
        // z: 1 -> 2 -> 5, so |z|^2 first exceeds 4 on the second step.
        let c = Complex::new(1.0, 0.0);
        assert_eq!(classify(c, c, Formula::Quadratic, 100), Escape::Escaped(1));
    }

    #[test]
    fn classify_is_deterministic() {
        let mut rng = rand::thread_rng();
        for _ in 0..500 {
            let c = Complex::new(rng.gen_range(-2.5, 1.5), rng.gen_range(-1.5, 1.5));
            for formula in &[Formula::Quadratic, Formula::BurningShip, Formula::Julia(c)] {
                let (z, k) = formula.seed(c);
                assert_eq!(classify(z, k, *formula, 200), classify(z, k, *formula, 200));
            }
        }
    }

    #[test]
    fn orbit_has_one_value_per_step() {
        let c = Complex::new(0.5, 0.5);
        let mut orbit = Vec::new();
        match classify_orbit(c, c, Formula::Quadratic, 1000, &mut orbit) {
            Escape::Escaped(k) => {
                assert_eq!(orbit.len(), k + 1);
                assert!(orbit[k].norm_sqr() > ESCAPE_RADIUS_SQR);
                assert!(orbit[..k].iter().all(|z| z.norm_sqr() <= ESCAPE_RADIUS_SQR));
            }
            Escape::Bounded => panic!("0.5+0.5i is outside the set"),
        }
        assert_eq!(
            classify_orbit(c, c, Formula::Quadratic, 1000, &mut orbit),
            classify(c, c, Formula::Quadratic, 1000)
        );
    }

    #[test]
    fn orbit_buffer_is_reused() {
        let mut orbit = Vec::new();
        let far = Complex::new(3.0, 0.0);
        classify_orbit(ORIGIN, ORIGIN, Formula::Quadratic, 64, &mut orbit);
        assert_eq!(orbit.len(), 64);
        classify_orbit(far, far, Formula::Quadratic, 64, &mut orbit);
        assert_eq!(orbit, vec![Complex::new(12.0, 0.0)]);
    }

    #[test]
    fn julia_uses_the_fixed_constant() {
        let k = Complex::new(-0.8, 0.156);
        let formula = Formula::Julia(k);
        let pixel = Complex::new(0.1, 0.2);
        assert_eq!(formula.seed(pixel), (pixel, k));
        assert_eq!(formula.apply(ORIGIN, k), k);
    }

    #[test]
    fn burning_ship_folds_before_squaring() {
        let z = Complex::new(-1.0, -2.0);
        let c = Complex::new(0.5, 0.25);
        // (1 + 2i)^2 = -3 + 4i
        assert_eq!(Formula::BurningShip.apply(z, c), Complex::new(-2.5, 4.25));
        // Mixed signs are where the fold shows.
        let z = Complex::new(-1.0, 2.0);
        assert_eq!(Formula::Quadratic.apply(z, ORIGIN), Complex::new(-3.0, -4.0));
        assert_eq!(Formula::BurningShip.apply(z, ORIGIN), Complex::new(-3.0, 4.0));
    }

    #[test]
    fn main_bulbs_never_escape() {
        let mut rng = rand::thread_rng();
        let mut checked = 0;
        while checked < 200 {
            let c = Complex::new(rng.gen_range(-1.5, 0.5), rng.gen_range(-0.7, 0.7));
            if in_main_bulbs(c) {
                assert_eq!(classify(c, c, Formula::Quadratic, 2000), Escape::Bounded, "{}", c);
                checked += 1;
            }
        }
    }

    #[test]
    fn main_bulbs_exclude_outside_points() {
        assert!(in_main_bulbs(ORIGIN));
        assert!(in_main_bulbs(Complex::new(-1.0, 0.0)));
        assert!(!in_main_bulbs(Complex::new(0.5, 0.5)));
        assert!(!in_main_bulbs(Complex::new(-2.0, 0.0)));
        assert!(!Formula::BurningShip.known_bounded(ORIGIN));
        assert!(Formula::Quadratic.known_bounded(ORIGIN));
    }
}
