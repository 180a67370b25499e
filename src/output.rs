// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Writing finished rasters to disk.

use image::png::PNGEncoder;
use image::ColorType;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::RenderError;
use crate::render::Raster;

/// Encode `raster` as an 8-bit RGB PNG at `path`, replacing anything
/// already there.
pub fn write_png<P: AsRef<Path>>(path: P, raster: &Raster) -> Result<(), RenderError> {
    let path = path.as_ref();
    let encode_error = |cause: io::Error| RenderError::Encode {
        path: path.display().to_string(),
        cause,
    };

    let dimension = |n: usize| {
        if n > u32::max_value() as usize {
            Err(encode_error(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("dimension {} is too large for PNG", n),
            )))
        } else {
            Ok(n as u32)
        }
    };
    let (width, height) = (dimension(raster.width())?, dimension(raster.height())?);

    let output = File::create(path).map_err(encode_error)?;
    let mut output = BufWriter::new(output);
    PNGEncoder::new(&mut output)
        .encode(raster.pixels(), width, height, ColorType::RGB(8))
        .map_err(encode_error)?;
    output.flush().map_err(encode_error)?;
    info!("wrote {}x{} image to {}", width, height, path.display());
    Ok(())
}
