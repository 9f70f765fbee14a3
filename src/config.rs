//! Process-wide settings, persisted as JSON.
//!
//! Keys and defaults match the editor settings surface one to one, so a
//! `.recency.json` written by hand uses the same names (`maxAgeMinutes`,
//! `colorMode`, ...). Values are never rejected: out-of-domain numbers are
//! clamped by the accessors at the point of use.

use std::fs;
use std::path::Path;
use std::time::Duration;

use color_eyre::eyre::{Result, WrapErr};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// How a line's age is turned into a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Mode {
    Time,
    CommitOrder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorMode {
    Tint,
    HueCycle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ColorTarget {
    Foreground,
    Background,
}

/// Which documents take part in commit ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelativeScope {
    File,
    Repo,
}

/// Shaping curve applied to a normalized fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Curve {
    Linear,
    /// Ease-in.
    Log,
    /// Ease-out.
    Revlog,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub enabled: bool,
    pub max_age_minutes: f64,
    pub max_alpha: f64,
    pub min_alpha: f64,
    pub tint_color: String,
    pub update_interval_ms: i64,
    pub use_git_blame: bool,
    pub mode: Mode,
    pub color_mode: ColorMode,
    pub color_target: ColorTarget,
    pub relative_scope: RelativeScope,
    pub new_hue: f64,
    pub old_hue: f64,
    pub saturation: f64,
    pub lightness: f64,
    pub use_alpha_fade: bool,
    pub reverse_hue: bool,
    pub hue_curve: Curve,
    pub reverse_alpha: bool,
    pub alpha_curve: Curve,
    pub min_saturation: f64,
    pub max_saturation: f64,
    pub reverse_saturation: bool,
    pub saturation_curve: Curve,
    pub min_lightness: f64,
    pub max_lightness: f64,
    pub reverse_lightness: bool,
    pub lightness_curve: Curve,
    pub debug_logging: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            max_age_minutes: 500.0,
            max_alpha: 0.50,
            min_alpha: 0.05,
            tint_color: "#ff00ff".to_string(),
            update_interval_ms: 1000,
            use_git_blame: true,
            mode: Mode::CommitOrder,
            color_mode: ColorMode::HueCycle,
            color_target: ColorTarget::Foreground,
            relative_scope: RelativeScope::File,
            new_hue: 330.0,
            old_hue: 180.0,
            saturation: 1.0,
            lightness: 0.50,
            use_alpha_fade: true,
            reverse_hue: true,
            hue_curve: Curve::Linear,
            reverse_alpha: false,
            alpha_curve: Curve::Linear,
            min_saturation: 1.0,
            max_saturation: 1.0,
            reverse_saturation: false,
            saturation_curve: Curve::Linear,
            min_lightness: 0.5,
            max_lightness: 0.5,
            reverse_lightness: false,
            lightness_curve: Curve::Linear,
            debug_logging: false,
        }
    }
}

impl Config {
    /// Read settings from `path`. A missing file yields the defaults; a file
    /// that does not parse is logged and also yields the defaults.
    pub fn load(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::default();
        };
        match Self::from_json(&text) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable config");
                Self::default()
            }
        }
    }

    /// Parse a settings object key by key. A value of the wrong type only
    /// costs its own key, which keeps its default.
    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        let entries: Map<String, Value> = serde_json::from_str(text)?;
        let mut accepted = Map::new();
        let mut config = Self::default();
        for (key, value) in entries {
            accepted.insert(key.clone(), value);
            match serde_json::from_value(Value::Object(accepted.clone())) {
                Ok(next) => config = next,
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "ignoring invalid config value");
                    accepted.remove(&key);
                }
            }
        }
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json + "\n")
            .wrap_err_with(|| format!("writing config to {}", path.display()))
    }

    /// Width of the time window, in milliseconds. Never negative.
    pub fn max_age_ms(&self) -> f64 {
        let ms = self.max_age_minutes * 60.0 * 1000.0;
        if ms.is_finite() {
            ms.max(0.0)
        } else if ms > 0.0 {
            f64::MAX
        } else {
            0.0
        }
    }

    pub fn update_interval(&self) -> Duration {
        Duration::from_millis(self.update_interval_ms.max(1) as u64)
    }

    /// Whether any of the alpha/saturation/lightness reversal flags is set.
    pub fn any_reversed(&self) -> bool {
        self.reverse_alpha || self.reverse_saturation || self.reverse_lightness
    }
}
