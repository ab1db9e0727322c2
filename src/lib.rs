//! WebDriver Tools
//!
//! Helpers for end-to-end UI tests written against a browser-automation
//! driver: a test session lifecycle with desktop/mobile emulation, a library of
//! DOM interaction helpers, a full-page screenshot stitcher and a mock-data
//! generator for synthetic test users.
//!
//! # Features
//!
//! - **Driver trait**: every helper is written against [`Driver`], so any
//!   backend (or an in-memory fake in tests) can be plugged in
//! - **CDP Backend** (`cdp` feature): drives headless Chrome via the Chrome
//!   DevTools Protocol
//! - **Full-page screenshots**: viewport captures stitched into one PNG, with
//!   the scroll position restored afterwards
//!
//! # Example
//!
//! ```no_run
//! # #[cfg(feature = "cdp")]
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use webdriver_tools::{By, Interact, SessionConfig, UiTestSession, TestOutcome};
//! use webdriver_tools::cdp::CdpDriver;
//!
//! let config = SessionConfig {
//!     base_url: "http://localhost:8080".to_string(),
//!     ..Default::default()
//! };
//!
//! let mut session = UiTestSession::<CdpDriver>::start(config, "contact_form")?;
//! session.go_to("/contact")?;
//! session.driver_mut().set_text(&By::Id("name".into()), "Ana")?;
//! session.finish(TestOutcome::Passed)?;
//! # Ok(())
//! # }
//! # #[cfg(not(feature = "cdp"))]
//! # fn main() {}
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod error;
pub use error::{Error, Result};

pub mod emulation;
pub use emulation::{DeviceMetrics, EmulationProfile, WindowRect};

pub mod interact;
pub use interact::{ClickOutcome, Interact, RetryPolicy, Wait};

pub mod mockdata;
pub mod prefix;
pub use prefix::{FieldPrefixCache, PrefixProbe};

pub mod screenshot;
pub use screenshot::{stitch, CaptureSurface, CompositeImage, DriverSurface, Segment};

pub mod session;
pub use session::{TestOutcome, UiTestSession};

pub mod settings;

// Async-friendly session facade (worker-thread backed)
pub mod async_api;
pub use async_api::AsyncSession;

#[cfg(feature = "cdp")]
pub mod cdp;

/// Configuration for a UI test session
///
/// The defaults describe a headless desktop Chrome at 1280x720 that accepts
/// self-signed certificates, which is what most local test environments need.
/// `base_url` has no sensible default and must be provided, either directly or
/// through [`SessionConfig::from_env`].
///
/// # Examples
///
/// ```
/// let cfg = webdriver_tools::SessionConfig::default();
/// assert_eq!(cfg.profile, webdriver_tools::EmulationProfile::Desktop);
/// assert!(cfg.accept_insecure_certs);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Root URL of the application under test; relative paths are joined onto it
    pub base_url: String,
    /// Desktop or mobile emulation, decided by the caller
    pub profile: EmulationProfile,
    /// Window geometry for desktop sessions
    pub desktop_window: Option<WindowRect>,
    /// Window geometry for mobile sessions
    pub mobile_window: Option<WindowRect>,
    /// User agent sent in mobile sessions
    pub mobile_user_agent: Option<String>,
    /// Device pixel ratio emulated in mobile sessions
    pub mobile_pixel_ratio: f64,
    /// Culture such as `hr-HR`; sent as `Accept-Language`
    pub culture: Option<String>,
    /// Custom HTTP headers
    pub headers: HashMap<String, String>,
    /// Run the browser without a visible window
    pub headless: bool,
    /// Ignore TLS certificate errors
    pub accept_insecure_certs: bool,
    /// Timeout for page loads in milliseconds
    pub timeout_ms: u64,
    /// Where failure screenshots are written
    pub artifacts_dir: PathBuf,
    /// Retry budget for intercepted clicks
    pub click_retry: RetryPolicy,
    /// How generated form-field prefixes are discovered
    pub prefix_probe: PrefixProbe,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            profile: EmulationProfile::Desktop,
            desktop_window: None,
            mobile_window: None,
            mobile_user_agent: None,
            mobile_pixel_ratio: 2.0,
            culture: None,
            headers: HashMap::new(),
            headless: true,
            accept_insecure_certs: true,
            timeout_ms: 30000,
            artifacts_dir: PathBuf::from("test-results"),
            click_retry: RetryPolicy::default(),
            prefix_probe: PrefixProbe::default(),
        }
    }
}

impl SessionConfig {
    /// Device metrics the browser should emulate for the configured profile
    pub fn device_metrics(&self) -> DeviceMetrics {
        let window = match self.profile {
            EmulationProfile::Desktop => self.desktop_window,
            EmulationProfile::Mobile => self.mobile_window,
        };
        DeviceMetrics::for_profile(self.profile, window, self.mobile_pixel_ratio)
    }

    /// Request headers including `Accept-Language` derived from `culture`
    pub fn effective_headers(&self) -> HashMap<String, String> {
        let mut headers = self.headers.clone();
        if let Some(culture) = &self.culture {
            headers
                .entry("Accept-Language".to_string())
                .or_insert_with(|| culture.clone());
        }
        headers
    }
}

/// Element locator strategies
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum By {
    Id(String),
    Css(String),
    XPath(String),
    TagName(String),
    ClassName(String),
    Name(String),
}

impl By {
    /// Strategy name understood by the in-page element finder
    pub fn strategy(&self) -> &'static str {
        match self {
            By::Id(_) => "id",
            By::Css(_) => "css",
            By::XPath(_) => "xpath",
            By::TagName(_) => "tag",
            By::ClassName(_) => "class",
            By::Name(_) => "name",
        }
    }

    pub fn value(&self) -> &str {
        match self {
            By::Id(v) | By::Css(v) | By::XPath(v) | By::TagName(v) | By::ClassName(v) | By::Name(v) => v,
        }
    }
}

impl std::fmt::Display for By {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "By.{}({})", self.strategy(), self.value())
    }
}

/// Key under which W3C WebDriver serializes element references
pub const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Opaque handle to an element found by a [`Driver`]
///
/// Serializes as a W3C element reference so it can be passed to
/// [`Driver::execute_script`] and resolved to the DOM node in the page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementRef {
    #[serde(rename = "element-6066-11e4-a52e-4f735466cecf")]
    pub id: String,
}

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// JSON form used as a script argument
    pub fn to_script_arg(&self) -> Value {
        serde_json::json!({ ELEMENT_KEY: self.id })
    }
}

/// Core trait for browser-automation backends
///
/// Scripts passed to [`Driver::execute_script`] follow WebDriver conventions:
/// they are function bodies, read parameters from `arguments[n]` and hand a
/// value back with `return`.
pub trait Driver {
    /// Launch a browser configured for the session
    fn new(config: SessionConfig) -> Result<Self>
    where
        Self: Sized;

    /// Navigate to an absolute URL and wait for the page to load
    fn navigate(&mut self, url: &str) -> Result<()>;

    /// Reload the current page
    fn refresh(&mut self) -> Result<()>;

    /// Title of the current page
    fn title(&mut self) -> Result<String>;

    /// URL of the current page
    fn current_url(&mut self) -> Result<String>;

    /// Execute a script body in the page and return its JSON result
    fn execute_script(&mut self, script: &str, args: &[Value]) -> Result<Value>;

    /// Capture the visible viewport as PNG bytes
    fn capture_viewport(&mut self) -> Result<Vec<u8>>;

    /// Find all elements matching `by`, optionally scoped to a parent element
    fn find_elements(&mut self, by: &By, parent: Option<&ElementRef>) -> Result<Vec<ElementRef>>;

    /// Read an attribute; `checked`, `selected` and `value` reflect live state
    fn attribute(&mut self, element: &ElementRef, name: &str) -> Result<Option<String>>;

    /// Whether the element is rendered and visible
    fn is_displayed(&mut self, element: &ElementRef) -> Result<bool>;

    /// Click the element; fails with [`Error::ClickIntercepted`] when another
    /// element would receive the click
    fn click(&mut self, element: &ElementRef) -> Result<()>;

    /// Type text into the element
    fn send_keys(&mut self, element: &ElementRef, text: &str) -> Result<()>;

    /// Attach a local file to a file input
    fn upload_file(&mut self, element: &ElementRef, path: &str) -> Result<()> {
        self.send_keys(element, path)
    }

    /// Text of the open alert, if any
    fn alert_text(&mut self) -> Result<Option<String>>;

    /// Accept (close) the open alert
    fn accept_alert(&mut self) -> Result<()>;

    /// Close the browser and release its resources
    fn close(self) -> Result<()>;

    // --- Convenience helpers (default implementations) ---

    /// First element matching `by`
    fn find_element(&mut self, by: &By) -> Result<ElementRef> {
        self.find_elements(by, None)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(by.to_string()))
    }

    /// First descendant of `parent` matching `by`
    fn find_child_element(&mut self, parent: &ElementRef, by: &By) -> Result<ElementRef> {
        self.find_elements(by, Some(parent))?
            .into_iter()
            .next()
            .ok_or_else(|| Error::ElementNotFound(by.to_string()))
    }

    /// Run a script for its side effects, reporting only success
    fn execute_non_return_js(&mut self, script: &str, args: &[Value]) -> bool {
        self.execute_script(script, args).is_ok()
    }

    /// Run a script and deserialize its result
    fn execute_typed_js<T: DeserializeOwned>(&mut self, script: &str, args: &[Value]) -> Result<T>
    where
        Self: Sized,
    {
        let value = self.execute_script(script, args)?;
        Ok(serde_json::from_value(value)?)
    }
}

/// Launch the default backend
///
/// Requires the `cdp` feature; the session is driven through headless Chrome.
#[cfg(feature = "cdp")]
pub fn new_session(config: SessionConfig) -> Result<impl Driver> {
    cdp::CdpDriver::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.profile, EmulationProfile::Desktop);
        assert!(config.headless);
        assert_eq!(config.mobile_pixel_ratio, 2.0);
        assert_eq!(config.click_retry.max_attempts, 10);
    }

    #[test]
    fn culture_becomes_accept_language() {
        let config = SessionConfig {
            culture: Some("hr-HR".into()),
            ..Default::default()
        };
        let headers = config.effective_headers();
        assert_eq!(headers.get("Accept-Language").map(String::as_str), Some("hr-HR"));
    }

    #[test]
    fn explicit_accept_language_wins_over_culture() {
        let mut headers = HashMap::new();
        headers.insert("Accept-Language".to_string(), "de-DE".to_string());
        let config = SessionConfig {
            culture: Some("hr-HR".into()),
            headers,
            ..Default::default()
        };
        assert_eq!(config.effective_headers()["Accept-Language"], "de-DE");
    }

    #[test]
    fn mobile_profile_uses_mobile_window() {
        let config = SessionConfig {
            profile: EmulationProfile::Mobile,
            mobile_window: Some(WindowRect { x: 0, y: 0, width: 390, height: 844 }),
            desktop_window: Some(WindowRect { x: 0, y: 0, width: 1440, height: 800 }),
            ..Default::default()
        };
        let m = config.device_metrics();
        assert_eq!(m.width, 390);
        assert!(m.mobile);
        assert_eq!(m.dpr, 2.0);
    }

    #[test]
    fn element_ref_serializes_as_w3c_reference() {
        let el = ElementRef::new("42");
        let v = serde_json::to_value(&el).unwrap();
        assert_eq!(v, el.to_script_arg());
        assert_eq!(v[ELEMENT_KEY], "42");
    }

    #[test]
    fn locator_display() {
        assert_eq!(By::Id("cb1".into()).to_string(), "By.id(cb1)");
        assert_eq!(By::XPath("..".into()).strategy(), "xpath");
    }
}
