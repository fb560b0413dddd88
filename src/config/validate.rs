//! Configuration validation.

use crate::config::Config;
use crate::error::{Error, Result};

/// Validate a loaded configuration.
///
/// Checks that configured asset paths exist and thresholds are in range.
pub fn validate_config(config: &Config) -> Result<()> {
    for (name, path) in [
        ("taxonomy", config.assets.taxonomy.as_ref()),
        ("mapping", config.assets.mapping.as_ref()),
        ("frequency", config.assets.frequency.as_ref()),
    ] {
        if let Some(path) = path {
            if !path.exists() {
                return Err(Error::ConfigValidation {
                    message: format!("{name} asset does not exist: {}", path.display()),
                });
            }
        }
    }

    if !(0.0..=1.0).contains(&config.defaults.ancestor_threshold) {
        return Err(Error::ConfigValidation {
            message: format!(
                "ancestor_threshold must be between 0.0 and 1.0, got {}",
                config.defaults.ancestor_threshold
            ),
        });
    }
    if let Some(threshold) = config.defaults.score_threshold {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(Error::ConfigValidation {
                message: format!("score_threshold must be between 0.0 and 1.0, got {threshold}"),
            });
        }
    }

    Ok(())
}
