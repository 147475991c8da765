use std::{fmt, sync::Arc};

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Theme {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(anyhow::anyhow!("Unknown theme '{value}'. Supported themes: light, dark.")),
        }
    }
}

/// Process-wide theme, read by every renderer.
///
/// Initialised once from the config at start-up; writes are last-write-wins.
#[derive(Debug, Clone, Default)]
pub struct SharedTheme(Arc<RwLock<Theme>>);

impl SharedTheme {
    pub fn new(theme: Theme) -> Self {
        Self(Arc::new(RwLock::new(theme)))
    }

    pub fn get(&self) -> Theme {
        *self.0.read()
    }

    pub fn set(&self, theme: Theme) {
        *self.0.write() = theme;
    }

    /// Flip light/dark and return the new value.
    pub fn toggle(&self) -> Theme {
        let mut guard = self.0.write();
        *guard = guard.toggled();
        *guard
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toggle_flips_between_light_and_dark() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(Theme::try_from("DARK").unwrap(), Theme::Dark);
        assert!(Theme::try_from("sepia").is_err());
    }

    #[test]
    fn shared_theme_clones_see_the_same_value() {
        let theme = SharedTheme::new(Theme::Light);
        let reader = theme.clone();

        assert_eq!(theme.toggle(), Theme::Dark);
        assert_eq!(reader.get(), Theme::Dark);

        reader.set(Theme::Light);
        assert_eq!(theme.get(), Theme::Light);
    }
}
