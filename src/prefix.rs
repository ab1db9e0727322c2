//! Discovery of generated form-field id prefixes
//!
//! Server-side form frameworks often prefix field ids with a generated
//! container id (`ctl00_`, `ctl01_`, ...) that changes with page layout.
//! Tests refer to fields by their logical name; the real id is found by
//! probing the sequential prefixes once and remembered for the session.

use std::collections::HashMap;

use crate::{By, Driver, Error, Result};

/// Shape of the candidate prefixes: `{stem}{index:0width}{separator}`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefixProbe {
    pub stem: String,
    pub separator: String,
    pub max_index: u32,
    pub width: usize,
}

impl Default for PrefixProbe {
    fn default() -> Self {
        Self {
            stem: "ctl".to_string(),
            separator: "_".to_string(),
            max_index: 20,
            width: 2,
        }
    }
}

impl PrefixProbe {
    /// Candidate prefixes in probing order
    pub fn candidates(&self) -> impl Iterator<Item = String> + '_ {
        (0..=self.max_index).map(move |i| format!("{}{:0width$}{}", self.stem, i, self.separator, width = self.width))
    }
}

/// Per-session memo of logical field name → discovered prefix
#[derive(Debug, Clone, Default)]
pub struct FieldPrefixCache {
    probe: PrefixProbe,
    resolved: HashMap<String, String>,
}

impl FieldPrefixCache {
    pub fn new(probe: PrefixProbe) -> Self {
        Self { probe, resolved: HashMap::new() }
    }

    /// Prefix previously discovered for `field`
    pub fn cached(&self, field: &str) -> Option<&str> {
        self.resolved.get(field).map(String::as_str)
    }

    /// Full element id of `field`, probing the page on first use
    pub fn resolve<D: Driver + ?Sized>(&mut self, driver: &mut D, field: &str) -> Result<String> {
        if let Some(prefix) = self.resolved.get(field) {
            return Ok(format!("{}{}", prefix, field));
        }
        for prefix in self.probe.candidates() {
            let id = format!("{}{}", prefix, field);
            if !driver.find_elements(&By::Id(id.clone()), None)?.is_empty() {
                log::debug!("Resolved field '{}' to id '{}'", field, id);
                self.resolved.insert(field.to_string(), prefix);
                return Ok(id);
            }
        }
        Err(Error::ElementNotFound(format!(
            "field '{}' under any prefix {}{}..{}{}",
            field, self.probe.stem, 0, self.probe.max_index, self.probe.separator
        )))
    }

    /// Locator for `field`, probing on first use
    pub fn locate<D: Driver + ?Sized>(&mut self, driver: &mut D, field: &str) -> Result<By> {
        Ok(By::Id(self.resolve(driver, field)?))
    }

    /// Forget discovered prefixes (e.g. after navigating to another form)
    pub fn clear(&mut self) {
        self.resolved.clear();
    }
}
