//! Test session lifecycle
//!
//! A [`UiTestSession`] owns the driver for one test: it launches the browser
//! with the configured emulation profile, resolves relative URLs against the
//! application under test and, when the test did not pass, leaves viewport
//! and full-page screenshots behind before closing the browser.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::prefix::FieldPrefixCache;
use crate::screenshot::naming::screenshot_file_name_now;
use crate::screenshot::{stitch, DriverSurface};
use crate::{By, Driver, Error, Result, SessionConfig};

/// Result of the test body, reported by the caller at teardown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
    Error,
    Inconclusive,
}

impl TestOutcome {
    /// Outcomes that leave screenshots behind
    pub fn is_failure(self) -> bool {
        matches!(self, TestOutcome::Failed | TestOutcome::Error)
    }
}

/// One browser-backed UI test
pub struct UiTestSession<D: Driver> {
    driver: D,
    config: SessionConfig,
    test_name: String,
    prefixes: FieldPrefixCache,
}

impl<D: Driver> UiTestSession<D> {
    /// Launch a browser for `test_name`
    pub fn start(config: SessionConfig, test_name: impl Into<String>) -> Result<Self> {
        validate_base_url(&config.base_url)?;
        let driver = D::new(config.clone())?;
        Self::with_driver(driver, config, test_name)
    }

    /// Wrap an already running driver
    pub fn with_driver(driver: D, config: SessionConfig, test_name: impl Into<String>) -> Result<Self> {
        validate_base_url(&config.base_url)?;
        let test_name = test_name.into();
        info!("Starting UI test '{}' ({:?} profile)", test_name, config.profile);
        Ok(Self {
            driver,
            prefixes: FieldPrefixCache::new(config.prefix_probe.clone()),
            config,
            test_name,
        })
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn test_name(&self) -> &str {
        &self.test_name
    }

    /// Absolute URL for a path relative to the application root
    pub fn url_for(&self, path: &str) -> String {
        let base = &self.config.base_url;
        if !base.ends_with('/') && !path.starts_with('/') {
            format!("{}/{}", base, path)
        } else {
            format!("{}{}", base, path)
        }
    }

    /// Navigate to a path relative to the application root
    pub fn go_to(&mut self, path: &str) -> Result<()> {
        let url = self.url_for(path);
        info!("Navigating to {}", url);
        self.driver.navigate(&url)
    }

    pub fn refresh(&mut self) -> Result<()> {
        self.driver.refresh()
    }

    pub fn page_title(&mut self) -> Result<String> {
        self.driver.title()
    }

    /// Element id of a logical form field, discovering its generated prefix
    /// on first use
    pub fn field_id(&mut self, field: &str) -> Result<String> {
        self.prefixes.resolve(&mut self.driver, field)
    }

    /// Locator of a logical form field
    pub fn field(&mut self, field: &str) -> Result<By> {
        self.prefixes.locate(&mut self.driver, field)
    }

    /// Forget discovered field prefixes
    pub fn reset_field_prefixes(&mut self) {
        self.prefixes.clear();
    }

    /// Save a screenshot into `dir` and return its path
    pub fn take_screenshot(&mut self, dir: &Path, full_page: bool) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(screenshot_file_name_now(&self.test_name, full_page));
        if full_page {
            let composite = stitch(&mut DriverSurface::new(&mut self.driver))?;
            composite.save_png(&path)?;
        } else {
            let png = self.driver.capture_viewport()?;
            std::fs::write(&path, png)?;
        }
        info!("Screenshot image saved to {}", path.display());
        Ok(path)
    }

    /// Save viewport and full-page screenshots into the artifacts directory
    ///
    /// Capture failures are logged and skipped so teardown can proceed.
    pub fn record_failure_screenshots(&mut self) -> Vec<PathBuf> {
        info!("Taking screenshot of failed test '{}'", self.test_name);
        let dir = self.config.artifacts_dir.clone();
        let mut saved = Vec::new();
        for full_page in [false, true] {
            match self.take_screenshot(&dir, full_page) {
                Ok(path) => saved.push(path),
                Err(e) => warn!("Get screenshot failed (full page: {}): {}", full_page, e),
            }
        }
        saved
    }

    /// Tear down: screenshot failures, then close the browser
    ///
    /// Returns the paths of the screenshots taken.
    pub fn finish(mut self, outcome: TestOutcome) -> Result<Vec<PathBuf>> {
        let saved = if outcome.is_failure() {
            self.record_failure_screenshots()
        } else {
            Vec::new()
        };
        info!("Finished UI test '{}': {:?}", self.test_name, outcome);
        self.driver.close()?;
        Ok(saved)
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    if base_url.trim().is_empty() {
        return Err(Error::ConfigError("Base URL not defined".into()));
    }
    url::Url::parse(base_url).map_err(|e| Error::ConfigError(format!("invalid base URL '{}': {}", base_url, e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_failed_and_errored_outcomes_capture() {
        assert!(TestOutcome::Failed.is_failure());
        assert!(TestOutcome::Error.is_failure());
        assert!(!TestOutcome::Passed.is_failure());
        assert!(!TestOutcome::Inconclusive.is_failure());
    }

    #[test]
    fn empty_base_url_is_rejected() {
        assert!(matches!(validate_base_url(""), Err(Error::ConfigError(_))));
        assert!(validate_base_url("http://localhost:8080/app").is_ok());
    }
}
