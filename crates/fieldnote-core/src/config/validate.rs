//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::{Config, DerivativeSpec};

const LOG_LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.root.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "storage.root must not be empty".into(),
            ));
        }
        if self.records.path.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "records.path must not be empty".into(),
            ));
        }
        check_dir("storage.original_dir", &self.storage.original_dir)?;
        check_spec("derivatives.thumbnail", &self.derivatives.thumbnail)?;
        check_spec("derivatives.display", &self.derivatives.display)?;

        let dirs = [
            &self.storage.original_dir,
            &self.derivatives.thumbnail.dir,
            &self.derivatives.display.dir,
        ];
        if dirs[0] == dirs[1] || dirs[0] == dirs[2] || dirs[1] == dirs[2] {
            return Err(ConfigError::ValidationError(
                "storage.original_dir, derivatives.thumbnail.dir and derivatives.display.dir must differ"
                    .into(),
            ));
        }

        let limits = &self.limits;
        for (name, value) in [
            ("limits.max_file_size_mb", limits.max_file_size_mb),
            ("limits.max_image_dimension", u64::from(limits.max_image_dimension)),
            ("limits.store_timeout_ms", limits.store_timeout_ms),
            ("limits.extract_timeout_ms", limits.extract_timeout_ms),
            ("limits.derive_timeout_ms", limits.derive_timeout_ms),
            ("limits.commit_timeout_ms", limits.commit_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::ValidationError(format!("{name} must be > 0")));
            }
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::ValidationError(format!(
                "logging.level must be one of {}",
                LOG_LEVELS.join(", ")
            )));
        }
        if self.logging.format != "pretty" && self.logging.format != "json" {
            return Err(ConfigError::ValidationError(
                "logging.format must be \"pretty\" or \"json\"".into(),
            ));
        }
        Ok(())
    }
}

fn check_dir(name: &str, dir: &str) -> Result<(), ConfigError> {
    let valid = !dir.is_empty()
        && dir
            .split('/')
            .all(|seg| !seg.is_empty() && seg != "." && seg != "..");
    if valid {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(format!(
            "{name} must be a relative directory name"
        )))
    }
}

fn check_spec(name: &str, spec: &DerivativeSpec) -> Result<(), ConfigError> {
    check_dir(&format!("{name}.dir"), &spec.dir)?;
    if spec.width == 0 || spec.height == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{name} width and height must be > 0"
        )));
    }
    Ok(())
}
