//! Named colormaps for meshes and raindrop shading.
//!
//! Each map is a short list of evenly spaced stops with linear interpolation
//! between them. A `_r` suffix reverses any map.

use crate::error::{ChartError, Result};
use crate::style::Rgba;

#[derive(Clone, Debug, PartialEq)]
pub struct Colormap {
    name: String,
    stops: &'static [u32],
    reversed: bool,
}

const VIRIDIS: &[u32] = &[
    0x440154, 0x482878, 0x3e4989, 0x31688e, 0x26828e, 0x1f9e89, 0x35b779, 0x6ece58, 0xb5de2b,
    0xfde725,
];
const PLASMA: &[u32] = &[
    0x0d0887, 0x46039f, 0x7201a8, 0x9c179e, 0xbd3786, 0xd8576b, 0xed7953, 0xfb9f3a, 0xfdca26,
    0xf0f921,
];
const INFERNO: &[u32] = &[
    0x000004, 0x1b0c41, 0x4a0c6b, 0x781c6d, 0xa52c60, 0xcf4446, 0xed6925, 0xfb9b06, 0xf7d13d,
    0xfcffa4,
];
const MAGMA: &[u32] = &[
    0x000004, 0x180f3d, 0x440f76, 0x721f81, 0x9e2f7f, 0xcd4071, 0xf1605d, 0xfd9668, 0xfeca8d,
    0xfcfdbf,
];
const CIVIDIS: &[u32] = &[
    0x00224e, 0x123570, 0x3b496c, 0x575d6d, 0x707173, 0x8a8779, 0xa69d75, 0xc4b56c, 0xe4cf5b,
    0xfee838,
];
const GREYS: &[u32] = &[
    0xffffff, 0xf0f0f0, 0xd9d9d9, 0xbdbdbd, 0x969696, 0x737373, 0x525252, 0x252525, 0x000000,
];
const BLUES: &[u32] = &[
    0xf7fbff, 0xdeebf7, 0xc6dbef, 0x9ecae1, 0x6baed6, 0x4292c6, 0x2171b5, 0x08519c, 0x08306b,
];
const GREENS: &[u32] = &[
    0xf7fcf5, 0xe5f5e0, 0xc7e9c0, 0xa1d99b, 0x74c476, 0x41ab5d, 0x238b45, 0x006d2c, 0x00441b,
];
const REDS: &[u32] = &[
    0xfff5f0, 0xfee0d2, 0xfcbba1, 0xfc9272, 0xfb6a4a, 0xef3b2c, 0xcb181d, 0xa50f15, 0x67000d,
];
const ORANGES: &[u32] = &[
    0xfff5eb, 0xfee6ce, 0xfdd0a2, 0xfdae6b, 0xfd8d3c, 0xf16913, 0xd94801, 0xa63603, 0x7f2704,
];
const PURPLES: &[u32] = &[
    0xfcfbfd, 0xefedf5, 0xdadaeb, 0xbcbddc, 0x9e9ac8, 0x807dba, 0x6a51a3, 0x54278f, 0x3f007d,
];
const RDYLGN: &[u32] = &[
    0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee08b, 0xffffbf, 0xd9ef8b, 0xa6d96a, 0x66bd63,
    0x1a9850, 0x006837,
];
const RDYLBU: &[u32] = &[
    0xa50026, 0xd73027, 0xf46d43, 0xfdae61, 0xfee090, 0xffffbf, 0xe0f3f8, 0xabd9e9, 0x74add1,
    0x4575b4, 0x313695,
];
const RDBU: &[u32] = &[
    0x67001f, 0xb2182b, 0xd6604d, 0xf4a582, 0xfddbc7, 0xf7f7f7, 0xd1e5f0, 0x92c5de, 0x4393c3,
    0x2166ac, 0x053061,
];
const COOLWARM: &[u32] = &[
    0x3b4cc0, 0x688aef, 0x99baff, 0xc9d8f0, 0xedd1c2, 0xf7a789, 0xe36a53, 0xb40426,
];
const GRAY: &[u32] = &[0x000000, 0xffffff];
const HOT: &[u32] = &[0x0b0000, 0xff0000, 0xffff00, 0xffffff];

fn stops_for(base: &str) -> Option<&'static [u32]> {
    Some(match base {
        "viridis" => VIRIDIS,
        "plasma" => PLASMA,
        "inferno" => INFERNO,
        "magma" => MAGMA,
        "cividis" => CIVIDIS,
        "Greys" => GREYS,
        "Blues" => BLUES,
        "Greens" => GREENS,
        "Reds" => REDS,
        "Oranges" => ORANGES,
        "Purples" => PURPLES,
        "RdYlGn" => RDYLGN,
        "RdYlBu" => RDYLBU,
        "RdBu" => RDBU,
        "coolwarm" => COOLWARM,
        "gray" => GRAY,
        "hot" => HOT,
        _ => return None,
    })
}

/// Base names accepted by [`Colormap::by_name`] (each also valid with `_r`).
pub const NAMES: [&str; 17] = [
    "viridis", "plasma", "inferno", "magma", "cividis", "Greys", "Blues", "Greens", "Reds",
    "Oranges", "Purples", "RdYlGn", "RdYlBu", "RdBu", "coolwarm", "gray", "hot",
];

impl Colormap {
    pub fn by_name(name: &str) -> Result<Self> {
        let (base, reversed) = match name.strip_suffix("_r") {
            Some(b) => (b, true),
            None => (name, false),
        };
        let stops = stops_for(base).ok_or_else(|| ChartError::UnknownColormap(name.to_string()))?;
        Ok(Self {
            name: name.to_string(),
            stops,
            reversed,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Color at `t`, clamped to `[0, 1]`.
    pub fn at(&self, t: f64) -> Rgba {
        let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 0.0 };
        let t = if self.reversed { 1.0 - t } else { t };
        let last = self.stops.len() - 1;
        let pos = t * last as f64;
        let i = (pos.floor() as usize).min(last.saturating_sub(1));
        let frac = pos - i as f64;
        let a = Rgba::from_hex(self.stops[i]);
        let b = Rgba::from_hex(self.stops[(i + 1).min(last)]);
        let mix = |x: u8, y: u8| (x as f64 + (y as f64 - x as f64) * frac).round() as u8;
        Rgba::rgb(mix(a.r, b.r), mix(a.g, b.g), mix(a.b, b.b))
    }

    /// Color for `value` normalized into `[vmin, vmax]`.
    pub fn scaled(&self, value: f64, vmin: f64, vmax: f64) -> Rgba {
        let span = vmax - vmin;
        if span <= 0.0 {
            return self.at(0.0);
        }
        self.at((value - vmin) / span)
    }
}
