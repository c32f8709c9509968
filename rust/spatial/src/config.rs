// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Sewing configuration, optionally loaded from environment variables.

use serde::{Deserialize, Serialize};

/// Smallest accepted face-box sampling density.
pub const MIN_FACE_SAMPLES: usize = 2;

/// Largest accepted face-box sampling density.
pub const MAX_FACE_SAMPLES: usize = 256;

/// Sewing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SewingConfig {
    /// Merge tolerance for vertices and edge midpoints.
    pub tolerance: f64,
    /// Samples per parametric direction used for each face box.
    pub face_samples: usize,
    /// Fit face boxes with the optimal (slower, tighter) axis search.
    pub optimal_boxes: bool,
    /// Evaluate surfaces on the rayon thread pool.
    pub parallel: bool,
}

impl Default for SewingConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-6,
            face_samples: 5,
            optimal_boxes: false,
            parallel: true,
        }
    }
}

impl SewingConfig {
    /// Load configuration from `SEWKIT_*` environment variables, falling back
    /// to the defaults for anything missing or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            tolerance: std::env::var("SEWKIT_TOLERANCE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.tolerance),
            face_samples: std::env::var("SEWKIT_FACE_SAMPLES")
                .unwrap_or_else(|_| defaults.face_samples.to_string())
                .parse()
                .unwrap_or(defaults.face_samples),
            optimal_boxes: std::env::var("SEWKIT_OPTIMAL_BOXES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(defaults.optimal_boxes),
            parallel: std::env::var("SEWKIT_PARALLEL")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(defaults.parallel),
        }
        .normalized()
    }

    /// Clamps `face_samples` to `MIN_FACE_SAMPLES..=MAX_FACE_SAMPLES`.
    pub fn normalized(mut self) -> Self {
        self.face_samples = self.face_samples.clamp(MIN_FACE_SAMPLES, MAX_FACE_SAMPLES);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SewingConfig::default();
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.face_samples, 5);
        assert!(!config.optimal_boxes);
        assert!(config.parallel);
    }

    #[test]
    fn normalized_clamps_samples() {
        let config = SewingConfig {
            face_samples: 0,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.face_samples, MIN_FACE_SAMPLES);
    }

    #[test]
    fn normalized_caps_samples() {
        let config = SewingConfig {
            face_samples: usize::MAX,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.face_samples, MAX_FACE_SAMPLES);
    }

    const ENV_VARS: [&str; 4] = [
        "SEWKIT_TOLERANCE",
        "SEWKIT_FACE_SAMPLES",
        "SEWKIT_OPTIMAL_BOXES",
        "SEWKIT_PARALLEL",
    ];

    fn clear_env() {
        for name in ENV_VARS {
            std::env::remove_var(name);
        }
    }

    // Process environment is global: every case runs inside this one test.
    #[test]
    fn from_env_reads_overrides_and_falls_back() {
        clear_env();
        assert_eq!(SewingConfig::from_env(), SewingConfig::default());

        std::env::set_var("SEWKIT_TOLERANCE", "0.001");
        std::env::set_var("SEWKIT_FACE_SAMPLES", "9");
        std::env::set_var("SEWKIT_OPTIMAL_BOXES", "true");
        std::env::set_var("SEWKIT_PARALLEL", "0");
        let config = SewingConfig::from_env();
        assert_eq!(config.tolerance, 0.001);
        assert_eq!(config.face_samples, 9);
        assert!(config.optimal_boxes);
        assert!(!config.parallel);

        // Unparsable values fall back to the defaults
        std::env::set_var("SEWKIT_TOLERANCE", "tiny");
        std::env::set_var("SEWKIT_FACE_SAMPLES", "-3");
        let config = SewingConfig::from_env();
        assert_eq!(config.tolerance, 1e-6);
        assert_eq!(config.face_samples, 5);

        // Out-of-range sample counts are clamped
        std::env::set_var("SEWKIT_FACE_SAMPLES", "1");
        assert_eq!(SewingConfig::from_env().face_samples, MIN_FACE_SAMPLES);
        std::env::set_var("SEWKIT_FACE_SAMPLES", "1000000");
        assert_eq!(SewingConfig::from_env().face_samples, MAX_FACE_SAMPLES);

        clear_env();
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: SewingConfig = serde_json::from_str(r#"{"tolerance": 0.01}"#).unwrap();
        assert_eq!(config.tolerance, 0.01);
        assert_eq!(config.face_samples, 5);
    }
}
