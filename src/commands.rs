//! User commands and the status indicator.
//!
//! Commands are pure transformations of a [`Config`]; the caller persists
//! the result and feeds it back in as a configuration change.

use std::fmt;

use crate::config::{ColorTarget, Config};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Toggle,
    Cycle,
    Recompute,
    ToggleColorTarget,
    ToggleReverseAll,
}

impl Command {
    /// The configuration after running this command, or `None` when the
    /// command does not touch configuration.
    pub fn apply(self, config: &Config) -> Option<Config> {
        match self {
            Command::Toggle => Some(toggle_enabled(config)),
            Command::Cycle => Some(cycle(config)),
            Command::ToggleColorTarget => Some(toggle_color_target(config)),
            Command::ToggleReverseAll => Some(toggle_reverse_all(config)),
            Command::Recompute => None,
        }
    }
}

pub fn toggle_enabled(config: &Config) -> Config {
    Config {
        enabled: !config.enabled,
        ..config.clone()
    }
}

/// Off -> New -> Old -> Off. "New" highlights the newest lines most
/// strongly, "Old" flips alpha, saturation and lightness so the oldest
/// stand out.
pub fn cycle(config: &Config) -> Config {
    match status_label(config) {
        StatusLabel::Off => with_reversal(config, true, false),
        StatusLabel::New => with_reversal(config, true, true),
        StatusLabel::Old => with_reversal(config, false, false),
    }
}

fn with_reversal(config: &Config, enabled: bool, reversed: bool) -> Config {
    Config {
        enabled,
        reverse_alpha: reversed,
        reverse_saturation: reversed,
        reverse_lightness: reversed,
        ..config.clone()
    }
}

pub fn toggle_color_target(config: &Config) -> Config {
    let color_target = match config.color_target {
        ColorTarget::Foreground => ColorTarget::Background,
        ColorTarget::Background => ColorTarget::Foreground,
    };
    Config {
        color_target,
        ..config.clone()
    }
}

/// Flip the alpha, saturation and lightness reversal flags, each from its
/// own current value. Hue direction is left alone.
pub fn toggle_reverse_all(config: &Config) -> Config {
    Config {
        reverse_alpha: !config.reverse_alpha,
        reverse_saturation: !config.reverse_saturation,
        reverse_lightness: !config.reverse_lightness,
        ..config.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLabel {
    Off,
    New,
    Old,
}

impl fmt::Display for StatusLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StatusLabel::Off => "Off",
            StatusLabel::New => "New",
            StatusLabel::Old => "Old",
        };
        write!(f, "Recency: {label}")
    }
}

/// "Old" whenever any of the alpha, saturation or lightness ramps is
/// reversed. Hue reversal only picks the direction around the wheel.
pub fn status_label(config: &Config) -> StatusLabel {
    if !config.enabled {
        StatusLabel::Off
    } else if config.any_reversed() {
        StatusLabel::Old
    } else {
        StatusLabel::New
    }
}
