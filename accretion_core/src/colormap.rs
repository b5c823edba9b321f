// Copyright 2026 the Accretion Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named colormaps sampled by the derived color features.
//!
//! Each map is a small table of piecewise-linear stops, enough fidelity
//! for vertex coloring. Sampling clamps to `0.0..=1.0`.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;

use crate::color::Rgba;

/// A named colormap.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Colormap {
    /// Perceptually uniform blue → green → yellow.
    Viridis,
    /// Perceptually uniform dark blue → magenta → yellow.
    Plasma,
    /// Improved rainbow, blue → cyan → yellow → red.
    Turbo,
    /// Black → red → yellow heat ramp.
    Heat,
    /// Black → white.
    Grayscale,
}

/// Errors from colormap lookup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ColormapError {
    /// The name is not a known colormap.
    Unknown(String),
}

impl fmt::Display for ColormapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(name) => write!(f, "unknown colormap {name:?}"),
        }
    }
}

impl core::error::Error for ColormapError {}

impl FromStr for Colormap {
    type Err = ColormapError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Ok(match name {
            "viridis" => Self::Viridis,
            "plasma" => Self::Plasma,
            "turbo" => Self::Turbo,
            "heat" => Self::Heat,
            "grayscale" | "gray" | "grays" => Self::Grayscale,
            _ => return Err(ColormapError::Unknown(name.to_string())),
        })
    }
}

impl Colormap {
    /// The canonical name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Viridis => "viridis",
            Self::Plasma => "plasma",
            Self::Turbo => "turbo",
            Self::Heat => "heat",
            Self::Grayscale => "grayscale",
        }
    }

    /// Samples the map at `t`, clamped to `0.0..=1.0`. Alpha is always 1.
    #[must_use]
    pub fn sample(self, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        if self == Self::Grayscale {
            return Rgba::rgb(t, t, t);
        }
        sample_stops(self.stops(), t)
    }

    /// Samples `n` evenly spaced positions from 0 to 1 inclusive.
    ///
    /// A single-element request samples the start of the map.
    #[must_use]
    pub fn sample_n(self, n: usize) -> Vec<Rgba> {
        (0..n)
            .map(|i| {
                let t = if n > 1 { i as f32 / (n - 1) as f32 } else { 0.0 };
                self.sample(t)
            })
            .collect()
    }

    fn stops(self) -> &'static [(f32, Rgba)] {
        const VIRIDIS: &[(f32, Rgba)] = &[
            (0.0, Rgba::rgb(0.267, 0.004, 0.329)),
            (0.25, Rgba::rgb(0.282, 0.140, 0.458)),
            (0.5, Rgba::rgb(0.204, 0.286, 0.469)),
            (0.6, Rgba::rgb(0.128, 0.400, 0.369)),
            (0.75, Rgba::rgb(0.527, 0.510, 0.149)),
            (1.0, Rgba::rgb(0.993, 0.906, 0.144)),
        ];
        const PLASMA: &[(f32, Rgba)] = &[
            (0.0, Rgba::rgb(0.050, 0.030, 0.530)),
            (0.25, Rgba::rgb(0.275, 0.005, 0.610)),
            (0.5, Rgba::rgb(0.553, 0.027, 0.416)),
            (0.6, Rgba::rgb(0.764, 0.190, 0.217)),
            (0.75, Rgba::rgb(0.960, 0.380, 0.113)),
            (1.0, Rgba::rgb(0.940, 0.975, 0.131)),
        ];
        const TURBO: &[(f32, Rgba)] = &[
            (0.0, Rgba::rgb(0.180, 0.070, 0.450)),
            (0.2, Rgba::rgb(0.000, 0.300, 0.740)),
            (0.4, Rgba::rgb(0.000, 0.780, 0.870)),
            (0.5, Rgba::rgb(0.000, 0.980, 0.600)),
            (0.6, Rgba::rgb(0.850, 0.970, 0.110)),
            (0.8, Rgba::rgb(0.970, 0.430, 0.000)),
            (1.0, Rgba::rgb(0.880, 0.000, 0.000)),
        ];
        const HEAT: &[(f32, Rgba)] = &[
            (0.0, Rgba::BLACK),
            (0.25, Rgba::rgb(0.5, 0.0, 0.0)),
            (0.5, Rgba::rgb(1.0, 0.0, 0.0)),
            (0.75, Rgba::rgb(1.0, 0.5, 0.0)),
            (1.0, Rgba::rgb(1.0, 1.0, 0.0)),
        ];
        const GRAYSCALE: &[(f32, Rgba)] = &[(0.0, Rgba::BLACK), (1.0, Rgba::WHITE)];
        match self {
            Self::Viridis => VIRIDIS,
            Self::Plasma => PLASMA,
            Self::Turbo => TURBO,
            Self::Heat => HEAT,
            Self::Grayscale => GRAYSCALE,
        }
    }
}

/// Piecewise-linear interpolation over an ascending stop table.
fn sample_stops(stops: &[(f32, Rgba)], t: f32) -> Rgba {
    if t <= stops[0].0 {
        return stops[0].1;
    }
    let last = stops[stops.len() - 1];
    if t >= last.0 {
        return last.1;
    }
    for window in stops.windows(2) {
        let (t0, c0) = window[0];
        let (t1, c1) = window[1];
        if t >= t0 && t <= t1 {
            return c0.lerp(c1, (t - t0) / (t1 - t0));
        }
    }
    last.1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_known_names() {
        assert_eq!("viridis".parse::<Colormap>().unwrap(), Colormap::Viridis);
        assert_eq!("gray".parse::<Colormap>().unwrap(), Colormap::Grayscale);
        assert_eq!(
            "nope".parse::<Colormap>(),
            Err(ColormapError::Unknown("nope".into()))
        );
    }

    #[test]
    fn samples_stay_in_range() {
        for map in [
            Colormap::Viridis,
            Colormap::Plasma,
            Colormap::Turbo,
            Colormap::Heat,
            Colormap::Grayscale,
        ] {
            for t in [-0.5, 0.0, 0.3, 0.99, 1.0, 1.7] {
                let c = map.sample(t);
                for component in [c.r, c.g, c.b] {
                    assert!((0.0..=1.0).contains(&component), "{map:?} at {t}");
                }
                assert_eq!(c.a, 1.0);
            }
        }
    }

    #[test]
    fn viridis_endpoints_look_right() {
        let start = Colormap::Viridis.sample(0.0);
        let end = Colormap::Viridis.sample(1.0);
        assert!(start.r < 0.5 && start.b > 0.2, "start is dark purple");
        assert!(end.r > 0.9 && end.g > 0.8 && end.b < 0.3, "end is yellow");
    }

    #[test]
    fn sample_n_is_evenly_spaced() {
        let colors = Colormap::Grayscale.sample_n(5);
        let expected = [0.0, 0.25, 0.5, 0.75, 1.0];
        assert_eq!(colors.len(), 5);
        for (c, e) in colors.iter().zip(expected) {
            assert!((c.r - e).abs() < 1e-6);
        }
    }

    #[test]
    fn sample_n_degenerate_counts() {
        assert!(Colormap::Viridis.sample_n(0).is_empty());
        assert_eq!(
            Colormap::Grayscale.sample_n(1),
            alloc::vec![Rgba::rgb(0.0, 0.0, 0.0)]
        );
    }
}
