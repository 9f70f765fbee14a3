//! Curve shaping and color conversion.
//!
//! Every function here clamps its inputs, so any finite (or even NaN)
//! argument yields an in-range result.

use palette::{FromColor, Hsl, Srgb};

use crate::config::Curve;

/// Clamp into `[0, 1]`, mapping NaN to 0.
pub fn clamp01(x: f64) -> f64 {
    if x.is_nan() {
        0.0
    } else {
        x.clamp(0.0, 1.0)
    }
}

/// Linear interpolation from `min` to `max` by `t` (clamped).
pub fn lerp(min: f64, max: f64, t: f64) -> f64 {
    min + (max - min) * clamp01(t)
}

/// Wrap a hue in degrees into `[0, 360)`.
pub fn wrap_hue(h: f64) -> f64 {
    if !h.is_finite() {
        return 0.0;
    }
    let wrapped = h.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Map a fraction through a shaping curve. `shape(0) == 0`, `shape(1) == 1`
/// and the mapping is monotonic for every curve.
pub fn shape(fraction: f64, curve: Curve) -> f64 {
    let x = clamp01(fraction);
    match curve {
        Curve::Linear => x,
        Curve::Log => ease_in(x),
        Curve::Revlog => 1.0 - ease_in(1.0 - x),
    }
}

fn ease_in(x: f64) -> f64 {
    clamp01((x * 9.0).ln_1p() / 10f64.ln())
}

/// Standard HSL to 8-bit sRGB. Saturation and lightness are clamped,
/// hue wraps modulo 360.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> Srgb<u8> {
    let hsl: Hsl<palette::encoding::Srgb, f64> =
        Hsl::new(wrap_hue(hue), clamp01(saturation), clamp01(lightness));
    Srgb::from_color(hsl).into_format::<u8>()
}

/// Hue in degrees of a `#rrggbb` (or `rrggbb`) color, if it parses.
pub fn hex_hue(hex: &str) -> Option<f64> {
    let rgb: Srgb<u8> = hex.trim().parse().ok()?;
    let hsl: Hsl<palette::encoding::Srgb, f64> = Hsl::from_color(rgb.into_format::<f64>());
    Some(wrap_hue(hsl.hue.into_positive_degrees()))
}

/// A resolved color with alpha, as handed to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub rgb: Srgb<u8>,
    pub alpha: f64,
}

impl Rgba {
    pub fn new(rgb: Srgb<u8>, alpha: f64) -> Self {
        Self {
            rgb,
            alpha: clamp01(alpha),
        }
    }

    pub fn to_css(&self) -> String {
        rgba_text(self.rgb, self.alpha)
    }
}

/// `rgba(r, g, b, a)` with the alpha clamped and printed to four decimals.
pub fn rgba_text(rgb: Srgb<u8>, alpha: f64) -> String {
    format!(
        "rgba({}, {}, {}, {:.4})",
        rgb.red,
        rgb.green,
        rgb.blue,
        clamp01(alpha)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [Curve; 3] = [Curve::Linear, Curve::Log, Curve::Revlog];

    #[test]
    fn curves_pin_endpoints() {
        for curve in CURVES {
            assert_eq!(shape(0.0, curve), 0.0, "{curve:?}");
            assert!((shape(1.0, curve) - 1.0).abs() < 1e-12, "{curve:?}");
        }
    }

    #[test]
    fn curves_are_monotonic() {
        for curve in CURVES {
            let mut prev = shape(0.0, curve);
            for i in 1..=1000 {
                let next = shape(i as f64 / 1000.0, curve);
                assert!(next >= prev, "{curve:?} decreased at {i}");
                prev = next;
            }
        }
    }

    #[test]
    fn ease_in_lifts_low_values_and_ease_out_mirrors_it() {
        assert!(shape(0.1, Curve::Log) > 0.1);
        assert!(shape(0.9, Curve::Revlog) < 0.9);
        let x = 0.3;
        assert!((shape(x, Curve::Revlog) - (1.0 - shape(1.0 - x, Curve::Log))).abs() < 1e-12);
    }

    #[test]
    fn shape_clamps_input() {
        assert_eq!(shape(-3.0, Curve::Log), 0.0);
        assert_eq!(shape(7.0, Curve::Linear), 1.0);
        assert_eq!(shape(f64::NAN, Curve::Revlog), 0.0);
    }

    #[test]
    fn primary_hues() {
        assert_eq!(hsl_to_rgb(0.0, 1.0, 0.5), Srgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 1.0, 0.5), Srgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 1.0, 0.5), Srgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(480.0, 1.0, 0.5), Srgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(-120.0, 1.0, 0.5), Srgb::new(0, 0, 255));
    }

    #[test]
    fn zero_saturation_is_gray_for_any_hue() {
        for h in [0.0, 45.0, 180.0, 359.9] {
            let rgb = hsl_to_rgb(h, 0.0, 0.25);
            assert_eq!(rgb.red, rgb.green);
            assert_eq!(rgb.green, rgb.blue);
            assert_eq!(rgb, hsl_to_rgb(0.0, 0.0, 0.25));
        }
    }

    #[test]
    fn out_of_range_inputs_stay_in_gamut() {
        assert_eq!(hsl_to_rgb(10.0, 5.0, 2.0), Srgb::new(255, 255, 255));
        assert_eq!(hsl_to_rgb(f64::NAN, -1.0, -1.0), Srgb::new(0, 0, 0));
    }

    #[test]
    fn rgba_text_clamps_alpha() {
        assert_eq!(rgba_text(Srgb::new(1, 2, 3), 0.5), "rgba(1, 2, 3, 0.5000)");
        assert_eq!(rgba_text(Srgb::new(1, 2, 3), 1.7), "rgba(1, 2, 3, 1.0000)");
        assert_eq!(rgba_text(Srgb::new(1, 2, 3), -0.2), "rgba(1, 2, 3, 0.0000)");
    }

    #[test]
    fn hex_hue_parses_tint() {
        assert!((hex_hue("#ff00ff").unwrap() - 300.0).abs() < 1e-6);
        assert!((hex_hue("00ff00").unwrap() - 120.0).abs() < 1e-6);
        assert_eq!(hex_hue("magenta"), None);
    }
}
