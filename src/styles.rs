//! The bucket palette: a fixed bank of pre-registered styles along the
//! age gradient.
//!
//! Buckets are numbered `1..=BUCKET_COUNT`; a higher index is newer.
//! Index 0 means "no decoration" and is never built.

use crate::color::{clamp01, hex_hue, hsl_to_rgb, lerp, shape, wrap_hue, Rgba};
use crate::config::{ColorMode, ColorTarget, Config, Curve};
use crate::decorations::{DecorationHost, StyleHandle, StyleSpec};

/// Number of buckets. Fixed so the gradient is equally smooth whatever the
/// configured hue span.
pub const BUCKET_COUNT: usize = 360;

/// Alpha, saturation and lightness ceiling for background highlights, so
/// text stays readable.
const BACKGROUND_CAP: f64 = 0.4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub index: usize,
    pub color: Rgba,
    pub handle: StyleHandle,
}

#[derive(Debug, Default)]
pub struct Palette {
    buckets: Vec<Bucket>,
}

impl Palette {
    /// Compute every bucket color for `config` and register one host style
    /// per bucket.
    pub fn build(config: &Config, host: &mut impl DecorationHost) -> Self {
        let buckets = (1..=BUCKET_COUNT)
            .map(|index| {
                let color = bucket_color(config, index);
                let handle = host.create_style(StyleSpec {
                    color,
                    target: config.color_target,
                });
                Bucket {
                    index,
                    color,
                    handle,
                }
            })
            .collect();
        Self { buckets }
    }

    /// Release every style back to the host.
    pub fn dispose(&mut self, host: &mut impl DecorationHost) {
        for bucket in self.buckets.drain(..) {
            host.dispose_style(bucket.handle);
        }
    }

    pub fn bucket_at(&self, index: usize) -> Option<&Bucket> {
        index.checked_sub(1).and_then(|i| self.buckets.get(i))
    }

    pub fn handle_at(&self, index: usize) -> Option<StyleHandle> {
        self.bucket_at(index).map(|b| b.handle)
    }

    pub fn bucket_count(&self) -> usize {
        BUCKET_COUNT
    }

    pub fn is_built(&self) -> bool {
        !self.buckets.is_empty()
    }

    pub fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

/// Color of bucket `index` (1-based, clamped into range).
pub fn bucket_color(config: &Config, index: usize) -> Rgba {
    let newest = index.clamp(1, BUCKET_COUNT) as f64 / BUCKET_COUNT as f64;
    let background = config.color_target == ColorTarget::Background;
    let cap = |v: f64| if background { v.min(BACKGROUND_CAP) } else { v };

    let alpha_base = if config.use_alpha_fade {
        shape(newest, config.alpha_curve)
    } else {
        1.0
    };
    let alpha = cap(lerp(
        clamp01(config.min_alpha),
        clamp01(config.max_alpha),
        reversed(alpha_base, config.reverse_alpha),
    ));

    let saturation = cap(channel(
        newest,
        config.saturation_curve,
        config.reverse_saturation,
        config.min_saturation,
        config.max_saturation,
    ));
    let lightness = cap(channel(
        newest,
        config.lightness_curve,
        config.reverse_lightness,
        config.min_lightness,
        config.max_lightness,
    ));

    let hue = match config.color_mode {
        ColorMode::HueCycle => cycle_hue(config, newest),
        ColorMode::Tint => hex_hue(&config.tint_color).unwrap_or_else(|| wrap_hue(config.new_hue)),
    };

    Rgba::new(hsl_to_rgb(hue, saturation, lightness), alpha)
}

fn reversed(x: f64, reverse: bool) -> f64 {
    if reverse {
        1.0 - x
    } else {
        x
    }
}

fn channel(newest: f64, curve: Curve, reverse: bool, min: f64, max: f64) -> f64 {
    lerp(clamp01(min), clamp01(max), reversed(shape(newest, curve), reverse))
}

/// Walk from `oldHue` toward `newHue`: forward around the wheel, or the
/// complementary way round when `reverseHue` is set.
fn cycle_hue(config: &Config, newest: f64) -> f64 {
    let old = wrap_hue(config.old_hue);
    let new = wrap_hue(config.new_hue);
    let forward = (new - old).rem_euclid(360.0);
    let (distance, sign) = if config.reverse_hue {
        (if forward == 0.0 { 0.0 } else { 360.0 - forward }, -1.0)
    } else {
        (forward, 1.0)
    };
    wrap_hue(old + sign * distance * shape(newest, config.hue_curve))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decorations::TerminalDecorations;
    use palette::Srgb;

    fn rgb_of(rgba: Rgba) -> Srgb<u8> {
        rgba.rgb
    }

    #[test]
    fn builds_one_style_per_bucket() {
        let mut host = TerminalDecorations::new();
        let palette = Palette::build(&Config::default(), &mut host);
        assert_eq!(palette.buckets().len(), BUCKET_COUNT);
        assert_eq!(host.style_count(), BUCKET_COUNT);
        assert!(palette.bucket_at(0).is_none());
        assert_eq!(palette.bucket_at(1).unwrap().index, 1);
        assert_eq!(palette.bucket_at(BUCKET_COUNT).unwrap().index, BUCKET_COUNT);
        assert!(palette.bucket_at(BUCKET_COUNT + 1).is_none());
    }

    #[test]
    fn dispose_releases_all_styles() {
        let mut host = TerminalDecorations::new();
        let mut palette = Palette::build(&Config::default(), &mut host);
        palette.dispose(&mut host);
        assert_eq!(host.style_count(), 0);
        assert!(!palette.is_built());
        assert_eq!(palette.bucket_count(), BUCKET_COUNT);
    }

    #[test]
    fn alpha_rises_toward_newest() {
        let config = Config::default();
        let oldest = bucket_color(&config, 1).alpha;
        let newest = bucket_color(&config, BUCKET_COUNT).alpha;
        assert!(newest > oldest);
        assert!((newest - config.max_alpha).abs() < 1e-9);
    }

    #[test]
    fn reverse_alpha_flips_the_ramp() {
        let config = Config {
            reverse_alpha: true,
            ..Config::default()
        };
        assert!((bucket_color(&config, BUCKET_COUNT).alpha - config.min_alpha).abs() < 1e-9);
    }

    #[test]
    fn without_fade_alpha_is_max() {
        let config = Config {
            use_alpha_fade: false,
            ..Config::default()
        };
        assert!((bucket_color(&config, 1).alpha - 0.5).abs() < 1e-9);
    }

    #[test]
    fn background_caps_alpha_saturation_lightness() {
        let config = Config {
            color_target: ColorTarget::Background,
            max_alpha: 1.0,
            min_lightness: 0.9,
            max_lightness: 0.9,
            ..Config::default()
        };
        let color = bucket_color(&config, BUCKET_COUNT);
        assert!(color.alpha <= 0.4 + 1e-12);
        // Lightness 0.4, saturation 0.4: no channel can exceed 0.56 * 255.
        assert!(color.rgb.red.max(color.rgb.green).max(color.rgb.blue) <= 143);
    }

    #[test]
    fn newest_bucket_lands_on_new_hue() {
        // Default walk: 180 backwards by 210 degrees ends at 330.
        let config = Config::default();
        assert_eq!(rgb_of(bucket_color(&config, BUCKET_COUNT)), hsl_to_rgb(330.0, 1.0, 0.5));

        let forward = Config {
            reverse_hue: false,
            ..Config::default()
        };
        assert_eq!(rgb_of(bucket_color(&forward, BUCKET_COUNT)), hsl_to_rgb(330.0, 1.0, 0.5));
        // Halfway: forward passes 255, backward passes 75.
        assert_eq!(rgb_of(bucket_color(&forward, 180)), hsl_to_rgb(255.0, 1.0, 0.5));
        assert_eq!(rgb_of(bucket_color(&config, 180)), hsl_to_rgb(75.0, 1.0, 0.5));
    }

    #[test]
    fn equal_hues_do_not_move() {
        let config = Config {
            old_hue: 90.0,
            new_hue: 450.0,
            ..Config::default()
        };
        assert_eq!(rgb_of(bucket_color(&config, 1)), rgb_of(bucket_color(&config, 300)));
    }

    #[test]
    fn tint_uses_tint_color_hue() {
        let config = Config {
            color_mode: ColorMode::Tint,
            tint_color: "#00ff00".into(),
            ..Config::default()
        };
        assert_eq!(rgb_of(bucket_color(&config, 1)), Srgb::new(0, 255, 0));

        let fallback = Config {
            color_mode: ColorMode::Tint,
            tint_color: "not a color".into(),
            ..Config::default()
        };
        assert_eq!(rgb_of(bucket_color(&fallback, 1)), hsl_to_rgb(330.0, 1.0, 0.5));
    }

    #[test]
    fn saturation_and_lightness_ramps() {
        let config = Config {
            min_lightness: 0.2,
            max_lightness: 0.8,
            reverse_lightness: true,
            min_saturation: 0.0,
            max_saturation: 0.0,
            ..Config::default()
        };
        // Reversed lightness: the newest bucket is the darkest gray.
        let newest = bucket_color(&config, BUCKET_COUNT).rgb;
        let oldest = bucket_color(&config, 1).rgb;
        assert_eq!(newest, hsl_to_rgb(0.0, 0.0, 0.2));
        assert!(oldest.red > newest.red);
    }
}
