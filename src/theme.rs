//! Theme preference resolution

use serde::{Deserialize, Serialize};

/// Cookie holding a client's theme preference.
pub const THEME_COOKIE: &str = "THEME";
/// Client hint carrying the operating system's colour scheme.
pub const COLOR_SCHEME_HINT: &str = "Sec-CH-Prefers-Color-Scheme";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    /// Only the exact values `dark` and `light` are recognised.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "dark" => Some(Theme::Dark),
            "light" => Some(Theme::Light),
            _ => None,
        }
    }

    /// Parse a `Sec-CH-Prefers-Color-Scheme` value, which arrives quoted.
    pub fn from_client_hint(value: &str) -> Option<Self> {
        Self::parse(value.trim().trim_matches('"'))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }

    /// Class set on the document root.
    pub fn root_class(&self) -> &'static str {
        match self {
            Theme::Light => "",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Theme a page is drawn with, and whether the client's stored value must
/// be written back.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ThemeChoice {
    pub theme: Theme,
    pub persist: bool,
}

/// Decides which theme a page is drawn with. Preferences live with the
/// client, so the controller itself holds no per-viewer state.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThemeController {
    fallback: Theme,
}

impl ThemeController {
    pub fn new(fallback: Theme) -> Self {
        Self { fallback }
    }

    /// Preferred theme: stored preference, then the system signal, then the
    /// configured fallback.
    pub fn resolve(&self, stored: Option<&str>, system: Option<Theme>) -> Theme {
        stored
            .and_then(Theme::parse)
            .or(system)
            .unwrap_or(self.fallback)
    }

    /// Resolve for a page view. A missing or unrecognised stored value is
    /// replaced by the resolved one.
    pub fn startup(&self, stored: Option<&str>, system: Option<Theme>) -> ThemeChoice {
        let theme = self.resolve(stored, system);
        ThemeChoice {
            theme,
            persist: stored.and_then(Theme::parse) != Some(theme),
        }
    }

    pub fn toggle(&self, current: Theme) -> Theme {
        current.toggled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_only_exact_values() {
        assert_eq!(Theme::parse("dark"), Some(Theme::Dark));
        assert_eq!(Theme::parse(" light "), Some(Theme::Light));
        assert_eq!(Theme::parse("Dark"), None);
        assert_eq!(Theme::parse(""), None);
        assert_eq!(Theme::from_client_hint("\"dark\""), Some(Theme::Dark));
    }

    #[test]
    fn test_stored_wins_over_system() {
        let controller = ThemeController::new(Theme::Light);
        assert_eq!(controller.resolve(Some("dark"), Some(Theme::Light)), Theme::Dark);
        assert_eq!(controller.resolve(Some("purple"), Some(Theme::Dark)), Theme::Dark);
    }

    #[test]
    fn test_system_then_fallback() {
        let controller = ThemeController::new(Theme::Light);
        assert_eq!(controller.resolve(None, Some(Theme::Dark)), Theme::Dark);
        assert_eq!(controller.resolve(None, None), Theme::Light);
        assert_eq!(ThemeController::new(Theme::Dark).resolve(None, None), Theme::Dark);
    }

    #[test]
    fn test_startup_persists_only_new_choices() {
        let controller = ThemeController::new(Theme::Light);

        let first = controller.startup(None, Some(Theme::Dark));
        assert_eq!(first, ThemeChoice { theme: Theme::Dark, persist: true });

        let again = controller.startup(Some("dark"), Some(Theme::Light));
        assert_eq!(again, ThemeChoice { theme: Theme::Dark, persist: false });

        let repaired = controller.startup(Some("purple"), None);
        assert_eq!(repaired, ThemeChoice { theme: Theme::Light, persist: true });
    }

    #[test]
    fn test_toggle_flips() {
        let controller = ThemeController::default();
        assert_eq!(controller.toggle(Theme::Light), Theme::Dark);
        assert_eq!(controller.toggle(Theme::Dark), Theme::Light);
    }
}
