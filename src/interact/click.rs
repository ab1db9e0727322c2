//! Bounded click retry

use std::time::Duration;

use crate::{Error, Result};

/// Fixed attempt budget and backoff for intercepted clicks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    pub fn no_backoff(max_attempts: u32) -> Self {
        Self { max_attempts, backoff: Duration::ZERO }
    }
}

/// How a click attempt sequence ended
#[derive(Debug)]
pub enum ClickOutcome {
    /// The click landed on the element
    Succeeded { attempts: u32 },
    /// Every attempt was intercepted
    ExhaustedRetries { attempts: u32, last_error: Error },
    /// The click failed for a reason retrying cannot fix
    NonRetryable { attempts: u32, error: Error },
}

impl ClickOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ClickOutcome::Succeeded { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            ClickOutcome::Succeeded { attempts }
            | ClickOutcome::ExhaustedRetries { attempts, .. }
            | ClickOutcome::NonRetryable { attempts, .. } => *attempts,
        }
    }

    /// Collapse into a `Result`, keeping the last error on failure
    pub fn into_result(self) -> Result<()> {
        match self {
            ClickOutcome::Succeeded { .. } => Ok(()),
            ClickOutcome::ExhaustedRetries { last_error, .. } => Err(last_error),
            ClickOutcome::NonRetryable { error, .. } => Err(error),
        }
    }
}

/// Run `attempt` until it succeeds, fails non-retryably, or the budget runs out
pub(crate) fn retry_click<F>(policy: RetryPolicy, mut attempt: F) -> ClickOutcome
where
    F: FnMut() -> Result<()>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;
    loop {
        attempts += 1;
        match attempt() {
            Ok(()) => return ClickOutcome::Succeeded { attempts },
            Err(e) if !e.is_click_retryable() => return ClickOutcome::NonRetryable { attempts, error: e },
            Err(e) if attempts >= max_attempts => {
                return ClickOutcome::ExhaustedRetries { attempts, last_error: e };
            }
            Err(e) => {
                log::debug!("Click attempt {} intercepted: {}", attempts, e);
                if !policy.backoff.is_zero() {
                    std::thread::sleep(policy.backoff);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn succeeds_after_interceptions() {
        let mut left = 3;
        let outcome = retry_click(RetryPolicy::no_backoff(10), || {
            if left > 0 {
                left -= 1;
                Err(Error::ClickIntercepted("spinner".into()))
            } else {
                Ok(())
            }
        });
        assert!(matches!(outcome, ClickOutcome::Succeeded { attempts: 4 }));
    }

    #[test]
    fn stops_at_budget() {
        let outcome = retry_click(RetryPolicy::no_backoff(3), || Err(Error::ClickIntercepted("modal".into())));
        assert!(matches!(outcome, ClickOutcome::ExhaustedRetries { attempts: 3, .. }));
        assert!(outcome.into_result().is_err());
    }

    #[test]
    fn non_retryable_error_returns_immediately() {
        let mut calls = 0;
        let outcome = retry_click(RetryPolicy::no_backoff(10), || {
            calls += 1;
            Err(Error::ElementError("stale element".into()))
        });
        assert_eq!(calls, 1);
        assert!(matches!(outcome, ClickOutcome::NonRetryable { attempts: 1, .. }));
    }

    #[test]
    fn zero_budget_still_tries_once() {
        let outcome = retry_click(RetryPolicy::no_backoff(0), || Ok(()));
        assert_eq!(outcome.attempts(), 1);
    }
}
