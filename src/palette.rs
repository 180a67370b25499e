// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Banded coloring.  Counts are never scaled, only cycled through a
//! small fixed table, which is what gives these renders their stripes.

/// An RGB8 color.
pub type Rgb = [u8; 3];

/// A fixed, cyclically indexed color table.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Palette(&'static [Rgb]);

/// Sixteen colors running from brown through deep blue to white and
/// back through yellow and orange.
pub const DEFAULT_PALETTE: Palette = Palette(&[
    [66, 30, 15],
    [25, 7, 26],
    [9, 1, 47],
    [4, 4, 73],
    [0, 7, 100],
    [12, 44, 138],
    [24, 82, 177],
    [57, 125, 209],
    [134, 181, 229],
    [211, 236, 248],
    [241, 233, 191],
    [248, 201, 95],
    [255, 170, 0],
    [204, 128, 0],
    [153, 87, 0],
    [106, 52, 3],
]);

impl Palette {
    /// Wrap a color table.  Returns None for an empty table, since
    /// there would be nothing to cycle through.
    pub fn new(colors: &'static [Rgb]) -> Option<Palette> {
        if colors.is_empty() {
            None
        } else {
            Some(Palette(colors))
        }
    }

    /// The color for an escape time or a visit count.
    #[inline]
    pub fn color_for(&self, count: usize) -> Rgb {
        self.0[count % self.0.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        DEFAULT_PALETTE
    }
}
