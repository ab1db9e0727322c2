//! Device emulation profiles for desktop and mobile sessions

use serde::{Deserialize, Serialize};

/// Which kind of device a session emulates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmulationProfile {
    #[default]
    Desktop,
    Mobile,
}

impl std::str::FromStr for EmulationProfile {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(EmulationProfile::Desktop),
            "mobile" => Ok(EmulationProfile::Mobile),
            other => Err(crate::Error::ConfigError(format!("unknown emulation profile '{}'", other))),
        }
    }
}

/// Window placement and size on screen
///
/// Deserializes from the `{"X":..,"Y":..,"Width":..,"Height":..}` shape used
/// by run settings files as well as from lowercase keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowRect {
    #[serde(rename = "X", alias = "x", default)]
    pub x: i32,
    #[serde(rename = "Y", alias = "y", default)]
    pub y: i32,
    #[serde(rename = "Width", alias = "width")]
    pub width: u32,
    #[serde(rename = "Height", alias = "height")]
    pub height: u32,
}

/// Metrics the browser is asked to emulate
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMetrics {
    pub width: u32,
    pub height: u32,
    pub dpr: f64,
    pub touch: bool,
    pub mobile: bool,
}

impl DeviceMetrics {
    pub const DESKTOP_DEFAULT: (u32, u32) = (1280, 720);
    pub const MOBILE_DEFAULT: (u32, u32) = (500, 900);

    /// Metrics for a profile; `window` overrides the default size
    pub fn for_profile(profile: EmulationProfile, window: Option<WindowRect>, mobile_pixel_ratio: f64) -> Self {
        match profile {
            EmulationProfile::Desktop => {
                let (width, height) = window
                    .map(|w| (w.width, w.height))
                    .unwrap_or(Self::DESKTOP_DEFAULT);
                DeviceMetrics { width, height, dpr: 1.0, touch: false, mobile: false }
            }
            EmulationProfile::Mobile => {
                let (width, height) = window
                    .map(|w| (w.width, w.height))
                    .unwrap_or(Self::MOBILE_DEFAULT);
                DeviceMetrics { width, height, dpr: mobile_pixel_ratio, touch: true, mobile: true }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_defaults_without_window() {
        let m = DeviceMetrics::for_profile(EmulationProfile::Desktop, None, 2.0);
        assert_eq!((m.width, m.height), (1280, 720));
        assert_eq!(m.dpr, 1.0);
        assert!(!m.touch);
    }

    #[test]
    fn mobile_enables_touch_and_pixel_ratio() {
        let w = WindowRect { x: 2050, y: 1460, width: 500, height: 900 };
        let m = DeviceMetrics::for_profile(EmulationProfile::Mobile, Some(w), 3.0);
        assert_eq!(m.width, 500);
        assert_eq!(m.dpr, 3.0);
        assert!(m.touch && m.mobile);
    }

    #[test]
    fn window_rect_parses_run_settings_json() {
        let w: WindowRect =
            serde_json::from_str(r#"{"X":2050, "Y":1460, "Width":1440, "Height":800}"#).unwrap();
        assert_eq!(w, WindowRect { x: 2050, y: 1460, width: 1440, height: 800 });
    }

    #[test]
    fn profile_parses_case_insensitively() {
        assert_eq!("Mobile".parse::<EmulationProfile>().unwrap(), EmulationProfile::Mobile);
        assert!("tablet".parse::<EmulationProfile>().is_err());
    }
}
