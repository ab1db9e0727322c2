//! Polling waits

use std::time::{Duration, Instant};

use crate::{Error, Result};

/// A timeout and polling interval for condition waits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wait {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for Wait {
    fn default() -> Self {
        Self::seconds(5)
    }
}

impl Wait {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, interval: Duration::from_millis(100) }
    }

    pub fn seconds(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Poll `condition` until it returns `Ok(true)`
    ///
    /// Errors from the condition count as "not yet" (the page may still be
    /// rendering); the condition is checked at least once. Returns
    /// [`Error::Timeout`] when the deadline passes.
    pub fn until<F>(&self, mut condition: F) -> Result<()>
    where
        F: FnMut() -> Result<bool>,
    {
        let deadline = Instant::now() + self.timeout;
        loop {
            match condition() {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => log::debug!("wait condition errored, retrying: {}", e),
            }
            if Instant::now() >= deadline {
                return Err(Error::Timeout(self.timeout.as_millis() as u64));
            }
            std::thread::sleep(self.interval);
        }
    }

    /// Like [`Wait::until`] but reports a timeout as `false`
    pub fn check<F>(&self, condition: F) -> Result<bool>
    where
        F: FnMut() -> Result<bool>,
    {
        match self.until(condition) {
            Ok(()) => Ok(true),
            Err(Error::Timeout(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> Wait {
        Wait::new(Duration::from_millis(30)).with_interval(Duration::from_millis(1))
    }

    #[test]
    fn returns_once_condition_holds() {
        let mut n = 0;
        quick()
            .until(|| {
                n += 1;
                Ok(n == 3)
            })
            .unwrap();
        assert_eq!(n, 3);
    }

    #[test]
    fn times_out_with_configured_duration() {
        assert!(matches!(quick().until(|| Ok(false)), Err(Error::Timeout(30))));
    }

    #[test]
    fn errors_are_treated_as_not_ready() {
        let mut n = 0;
        let ok = quick()
            .check(|| {
                n += 1;
                if n < 2 {
                    Err(Error::ElementNotFound("#late".into()))
                } else {
                    Ok(true)
                }
            })
            .unwrap();
        assert!(ok);
    }

    #[test]
    fn check_maps_timeout_to_false() {
        assert!(!quick().check(|| Ok(false)).unwrap());
    }
}
