// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate env_logger;
extern crate escapetime;
#[macro_use]
extern crate log;
extern crate num;
extern crate num_cpus;

use clap::{App, AppSettings, Arg, ArgMatches, ErrorKind, SubCommand};
use escapetime::{write_png, EscapeRenderer, Fractal, RenderConfig, RenderError};
use num::Complex;
use std::env;
use std::process;
use std::str::FromStr;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn parse_complex(s: &str) -> Option<Complex<f64>> {
    match parse_pair(s, ',') {
        Some((re, im)) => Some(Complex { re, im }),
        None => None,
    }
}

fn validate_complex(s: &str, err: &str) -> Result<(), String> {
    match parse_complex(s) {
        Some(c) if c.re.is_finite() && c.im.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + PartialOrd>(
    s: &str,
    low: T,
    high: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low && i <= high {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_finite(s: &str, err: &str) -> Result<(), String> {
    match f64::from_str(s) {
        Ok(f) if f.is_finite() => Ok(()),
        _ => Err(err.to_string()),
    }
}

const OUTPUT: &str = "output";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const ITERATIONS: &str = "iterations";
const CENTER_X: &str = "center-x";
const CENTER_Y: &str = "center-y";
const ZOOM: &str = "zoom";
const CONSTANT: &str = "constant";
const THREADS: &str = "threads";

fn render_args<'a, 'b>(fractal: Fractal) -> Vec<Arg<'a, 'b>> {
    let max_threads = num_cpus::get();
    vec![
        Arg::with_name(OUTPUT)
            .long(OUTPUT)
            .short("o")
            .takes_value(true)
            .help("Output file [default: <fractal>.png]"),
        Arg::with_name(WIDTH)
            .long(WIDTH)
            .short("W")
            .takes_value(true)
            .default_value("800")
            .validator(|s| {
                validate_range(
                    &s,
                    1usize,
                    65_535,
                    "Could not parse image width",
                    "Image width must be between 1 and 65535",
                )
            })
            .help("Width of output image"),
        Arg::with_name(HEIGHT)
            .long(HEIGHT)
            .short("H")
            .takes_value(true)
            .default_value("800")
            .validator(|s| {
                validate_range(
                    &s,
                    1usize,
                    65_535,
                    "Could not parse image height",
                    "Image height must be between 1 and 65535",
                )
            })
            .help("Height of output image"),
        Arg::with_name(ITERATIONS)
            .long(ITERATIONS)
            .alias("max-iterations")
            .short("i")
            .takes_value(true)
            .default_value("1000")
            .validator(|s| {
                validate_range(
                    &s,
                    1usize,
                    10_000_000,
                    "Could not parse iteration count",
                    "Iteration count must be between 1 and 10000000",
                )
            })
            .help("Maximum number of iterations per point"),
        Arg::with_name(CENTER_X)
            .long(CENTER_X)
            .short("x")
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(|s| validate_finite(&s, "Could not parse center x"))
            .help(match fractal {
                Fractal::Julia => "Real part of the view center [default: 0]",
                _ => "Real part of the view center [default: -0.5]",
            }),
        Arg::with_name(CENTER_Y)
            .long(CENTER_Y)
            .short("y")
            .takes_value(true)
            .allow_hyphen_values(true)
            .validator(|s| validate_finite(&s, "Could not parse center y"))
            .help(match fractal {
                Fractal::BurningShip => "Imaginary part of the view center [default: -0.5]",
                _ => "Imaginary part of the view center [default: 0]",
            }),
        Arg::with_name(ZOOM)
            .long(ZOOM)
            .short("z")
            .takes_value(true)
            .default_value("1.0")
            .validator(|s| match f64::from_str(&s) {
                Ok(z) if z.is_finite() && z > 0.0 => Ok(()),
                _ => Err("Zoom must be a positive number".to_string()),
            })
            .help("Zoom-out factor; 1.0 shows 3 units of the imaginary axis"),
        Arg::with_name(THREADS)
            .long(THREADS)
            .short("t")
            .takes_value(true)
            .default_value("1")
            .validator(move |s| {
                validate_range(
                    &s,
                    1,
                    max_threads,
                    "Could not parse thread count",
                    &format!("Thread count must be between 1 and {}", max_threads),
                )
            })
            .help("Number of threads to use in solver"),
    ]
}

fn app<'a, 'b>() -> App<'a, 'b> {
    let mut app = App::new("escapetime")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Escape-time fractal renderer")
        .setting(AppSettings::VersionlessSubcommands);
    for &fractal in &Fractal::ALL {
        let about = match fractal {
            Fractal::Mandelbrot => "Render the Mandelbrot set",
            Fractal::Julia => "Render a Julia set",
            Fractal::BurningShip => "Render the Burning Ship",
            Fractal::Buddhabrot => "Render the Buddhabrot",
        };
        let mut sub = SubCommand::with_name(fractal.name())
            .about(about)
            .args(&render_args(fractal));
        if fractal == Fractal::Julia {
            sub = sub.arg(
                Arg::with_name(CONSTANT)
                    .long(CONSTANT)
                    .alias("julia-constant")
                    .short("c")
                    .takes_value(true)
                    .allow_hyphen_values(true)
                    .default_value("-0.8,0.156")
                    .validator(|s| validate_complex(&s, "Could not parse the Julia constant"))
                    .help("The fixed constant c in z -> z^2 + c, as re,im"),
            );
        }
        app = app.subcommand(sub);
    }
    app
}

// Validators have already run, so parse failures here are impossible
// short of a clap bug; they still come back as configuration errors.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<Option<T>, RenderError> {
    match matches.value_of(name) {
        None => Ok(None),
        Some(s) => T::from_str(s)
            .map(Some)
            .map_err(|_| RenderError::InvalidConfig(format!("could not parse --{} {}", name, s))),
    }
}

fn config_from(fractal: Fractal, matches: &ArgMatches) -> Result<RenderConfig, RenderError> {
    let mut config = RenderConfig::new(fractal);
    if let Some(width) = value(matches, WIDTH)? {
        config.width = width;
    }
    if let Some(height) = value(matches, HEIGHT)? {
        config.height = height;
    }
    if let Some(iterations) = value(matches, ITERATIONS)? {
        config.max_iterations = iterations;
    }
    if let Some(x) = value(matches, CENTER_X)? {
        config.center.re = x;
    }
    if let Some(y) = value(matches, CENTER_Y)? {
        config.center.im = y;
    }
    if let Some(zoom) = value(matches, ZOOM)? {
        config.zoom = zoom;
    }
    if let Some(threads) = value(matches, THREADS)? {
        config.threads = threads;
    }
    if let Some(constant) = matches.value_of(CONSTANT) {
        config.julia_constant = parse_complex(constant).ok_or_else(|| {
            RenderError::InvalidConfig(format!("could not parse --{} {}", CONSTANT, constant))
        })?;
    }
    Ok(config)
}

fn run(fractal: Fractal, matches: &ArgMatches) -> Result<(), RenderError> {
    let config = config_from(fractal, matches)?;
    let output = matches
        .value_of(OUTPUT)
        .map(String::from)
        .unwrap_or_else(|| fractal.default_output());
    debug!("{:?}", config);
    let rendering = EscapeRenderer::from_config(&config)?.render(config.threads)?;
    write_png(&output, &rendering.raster)
}

fn names_a_fractal(arg: Option<String>) -> bool {
    arg.map_or(false, |name| Fractal::from_str(&name).is_ok())
}

fn usage() -> ! {
    // Printing help can only fail if stdout is gone, and then there is
    // nobody left to tell.
    let _ = app().print_help();
    println!();
    process::exit(0);
}

fn main() {
    env_logger::init();

    let matches = match app().get_matches_safe() {
        Ok(matches) => matches,
        Err(e) => match e.kind {
            ErrorKind::HelpDisplayed | ErrorKind::VersionDisplayed => e.exit(),
            // Once a fractal has been named, a bad option is the user's
            // mistake and clap reports it.  Only an unknown fractal gets
            // the usage text.
            ErrorKind::UnknownArgument
            | ErrorKind::UnrecognizedSubcommand
            | ErrorKind::InvalidSubcommand
                if !names_a_fractal(env::args().nth(1)) =>
            {
                usage()
            }
            _ => e.exit(),
        },
    };

    let (name, sub) = matches.subcommand();
    let fractal = match Fractal::from_str(name) {
        Ok(fractal) => fractal,
        Err(_) => usage(),
    };
    let sub = match sub {
        Some(sub) => sub,
        None => usage(),
    };

    if let Err(e) = run(fractal, sub) {
        eprintln!("escapetime: {}", e);
        process::exit(1);
    }
}
