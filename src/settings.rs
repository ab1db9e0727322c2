//! Loading session configuration from run parameters
//!
//! Test runs are parameterized through `UITEST_*` environment variables so the
//! same suite can target different deployments without code changes:
//!
//! | Variable | Meaning |
//! |----------|---------|
//! | `UITEST_WEB_APP_URL` | base URL of the application (required) |
//! | `UITEST_PROFILE` | `desktop` or `mobile` |
//! | `UITEST_CULTURE` | culture such as `hr-HR` |
//! | `UITEST_DESKTOP_WINDOW` | `{"X":..,"Y":..,"Width":..,"Height":..}` |
//! | `UITEST_MOBILE_WINDOW` | same shape, for mobile sessions |
//! | `UITEST_MOBILE_USER_AGENT` | user agent for mobile sessions |
//! | `UITEST_ARTIFACTS_DIR` | where failure screenshots go |
//! | `UITEST_HEADLESS` | `false`/`0` shows the browser window |

use std::path::PathBuf;

use crate::{EmulationProfile, Error, Result, SessionConfig, WindowRect};

pub const WEB_APP_URL: &str = "UITEST_WEB_APP_URL";
pub const PROFILE: &str = "UITEST_PROFILE";
pub const CULTURE: &str = "UITEST_CULTURE";
pub const DESKTOP_WINDOW: &str = "UITEST_DESKTOP_WINDOW";
pub const MOBILE_WINDOW: &str = "UITEST_MOBILE_WINDOW";
pub const MOBILE_USER_AGENT: &str = "UITEST_MOBILE_USER_AGENT";
pub const ARTIFACTS_DIR: &str = "UITEST_ARTIFACTS_DIR";
pub const HEADLESS: &str = "UITEST_HEADLESS";

impl SessionConfig {
    /// Build a configuration from `UITEST_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary key lookup
    ///
    /// Empty values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let base_url = get(WEB_APP_URL).ok_or_else(|| Error::ConfigError("Base URL not defined".into()))?;
        url::Url::parse(&base_url)
            .map_err(|e| Error::ConfigError(format!("invalid base URL '{}': {}", base_url, e)))?;

        let mut config = SessionConfig { base_url, ..Default::default() };

        if let Some(profile) = get(PROFILE) {
            config.profile = profile.parse()?;
        }
        config.culture = get(CULTURE);
        config.desktop_window = get(DESKTOP_WINDOW).map(|s| parse_window(DESKTOP_WINDOW, &s)).transpose()?;
        config.mobile_window = get(MOBILE_WINDOW).map(|s| parse_window(MOBILE_WINDOW, &s)).transpose()?;
        config.mobile_user_agent = get(MOBILE_USER_AGENT);
        if let Some(dir) = get(ARTIFACTS_DIR) {
            config.artifacts_dir = PathBuf::from(dir);
        }
        if let Some(headless) = get(HEADLESS) {
            config.headless = !matches!(headless.trim().to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }

        Ok(config)
    }
}

fn parse_window(key: &str, raw: &str) -> Result<WindowRect> {
    serde_json::from_str(raw).map_err(|e| Error::ConfigError(format!("{}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn missing_base_url_is_config_error() {
        let err = SessionConfig::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::ConfigError(ref m) if m.contains("Base URL")));
    }

    #[test]
    fn parses_full_run_settings() {
        let cfg = SessionConfig::from_lookup(lookup(&[
            (WEB_APP_URL, "http://localhost:5000"),
            (PROFILE, "mobile"),
            (CULTURE, "hr-HR"),
            (MOBILE_WINDOW, r#"{"X":2050, "Y":1460, "Width":500, "Height":900}"#),
            (MOBILE_USER_AGENT, "Mozilla/5.0 (Linux; Android 9;) Mobile"),
            (HEADLESS, "false"),
        ]))
        .unwrap();
        assert_eq!(cfg.base_url, "http://localhost:5000");
        assert_eq!(cfg.profile, EmulationProfile::Mobile);
        assert_eq!(cfg.mobile_window.unwrap().height, 900);
        assert!(cfg.desktop_window.is_none());
        assert!(!cfg.headless);
        assert_eq!(cfg.culture.as_deref(), Some("hr-HR"));
    }

    #[test]
    fn rejects_malformed_window_json() {
        let err = SessionConfig::from_lookup(lookup(&[
            (WEB_APP_URL, "http://localhost"),
            (DESKTOP_WINDOW, "{\"Width\": 10"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains(DESKTOP_WINDOW));
    }

    #[test]
    fn rejects_unparseable_base_url() {
        assert!(SessionConfig::from_lookup(lookup(&[(WEB_APP_URL, "not a url")])).is_err());
    }
}
