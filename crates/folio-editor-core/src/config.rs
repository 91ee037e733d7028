use std::time::Duration;

use crate::error::ConfigError;

/// Editor runtime configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Quiet period after the last edit before an autosave fires.
    pub autosave_delay: Duration,
    /// Maximum undo steps kept.
    pub history_limit: usize,
    /// Pointer travel in pixels before a drag activates.
    pub drag_activation_px: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_delay: Self::DEFAULT_AUTOSAVE_DELAY,
            history_limit: Self::DEFAULT_HISTORY_LIMIT,
            drag_activation_px: Self::DEFAULT_DRAG_ACTIVATION_PX,
        }
    }
}

impl EditorConfig {
    pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(2000);
    pub const MIN_AUTOSAVE_DELAY: Duration = Duration::from_millis(2000);
    pub const MAX_AUTOSAVE_DELAY: Duration = Duration::from_millis(3000);
    pub const DEFAULT_HISTORY_LIMIT: usize = 100;
    pub const DEFAULT_DRAG_ACTIVATION_PX: f32 = 8.0;

    /// Load configuration from environment variables.
    ///
    /// Optional env vars:
    /// - `FOLIO_AUTOSAVE_DELAY_MS`: Autosave quiet period, 2000 to 3000 (default: 2000)
    /// - `FOLIO_HISTORY_LIMIT`: Undo steps kept, at least 1 (default: 100)
    /// - `FOLIO_DRAG_ACTIVATION_PX`: Drag activation distance (default: 8)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup("FOLIO_AUTOSAVE_DELAY_MS") {
            let ms: u64 = parse("FOLIO_AUTOSAVE_DELAY_MS", &raw)?;
            let delay = Duration::from_millis(ms);
            if !(Self::MIN_AUTOSAVE_DELAY..=Self::MAX_AUTOSAVE_DELAY).contains(&delay) {
                return Err(ConfigError::Invalid {
                    var: "FOLIO_AUTOSAVE_DELAY_MS",
                    message: format!("{ms} is outside 2000..=3000"),
                });
            }
            config.autosave_delay = delay;
        }

        if let Some(raw) = lookup("FOLIO_HISTORY_LIMIT") {
            let limit: usize = parse("FOLIO_HISTORY_LIMIT", &raw)?;
            if limit == 0 {
                return Err(ConfigError::Invalid {
                    var: "FOLIO_HISTORY_LIMIT",
                    message: "must be at least 1".to_string(),
                });
            }
            config.history_limit = limit;
        }

        if let Some(raw) = lookup("FOLIO_DRAG_ACTIVATION_PX") {
            let px: f32 = parse("FOLIO_DRAG_ACTIVATION_PX", &raw)?;
            if !px.is_finite() || px < 0.0 {
                return Err(ConfigError::Invalid {
                    var: "FOLIO_DRAG_ACTIVATION_PX",
                    message: format!("{px} is not a distance"),
                });
            }
            config.drag_activation_px = px;
        }

        Ok(config)
    }
}

fn parse<T>(var: &'static str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        var,
        message: e.to_string(),
    })
}
