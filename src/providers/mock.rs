/*!
 * Mock translator for testing.
 *
 * This module provides a scripted translator that simulates different behaviors:
 * - `MockTranslator::working()` - Always succeeds with tagged text
 * - `MockTranslator::failing()` - Always fails with an API error
 * - `MockTranslator::failing_for(...)` - Fails only for the listed target languages
 * - `MockTranslator::slow(...)` - Succeeds after a delay
 *
 * Every instance records how many calls it served and the highest number of
 * calls that were in flight at the same time.
 */

use async_trait::async_trait;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::errors::ProviderError;
use crate::providers::Translator;

/// Behavior mode for the mock translator
#[derive(Debug, Clone, PartialEq)]
pub enum MockBehavior {
    /// Always succeeds
    Working,
    /// Always fails with an error
    Failing,
    /// Fails for the listed target codes, succeeds otherwise
    FailingFor(Vec<String>),
    /// Simulates slow responses (for timeout and overlap testing)
    Slow { delay_ms: u64 },
    /// Sleeps `delay_ms` for the listed target codes only
    SlowFor { targets: Vec<String>, delay_ms: u64 },
}

/// Mock translator for testing dispatch behavior
#[derive(Debug, Clone)]
pub struct MockTranslator {
    behavior: MockBehavior,
    calls: Arc<AtomicUsize>,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockTranslator {
    /// Create a new mock translator with the specified behavior
    pub fn new(behavior: MockBehavior) -> Self {
        Self {
            behavior,
            calls: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn working() -> Self {
        Self::new(MockBehavior::Working)
    }

    pub fn failing() -> Self {
        Self::new(MockBehavior::Failing)
    }

    pub fn failing_for(targets: &[&str]) -> Self {
        Self::new(MockBehavior::FailingFor(
            targets.iter().map(|t| t.to_string()).collect(),
        ))
    }

    pub fn slow(delay_ms: u64) -> Self {
        Self::new(MockBehavior::Slow { delay_ms })
    }

    pub fn slow_for(targets: &[&str], delay_ms: u64) -> Self {
        Self::new(MockBehavior::SlowFor {
            targets: targets.iter().map(|t| t.to_string()).collect(),
            delay_ms,
        })
    }

    /// The text a working mock returns for a given input
    pub fn expected_translation(text: &str, target_language: &str) -> String {
        format!("[{}] {}", target_language, text)
    }

    /// Number of translate calls served so far
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of simultaneously running calls observed
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    async fn respond(&self, text: &str, target_language: &str) -> Result<String, ProviderError> {
        match &self.behavior {
            MockBehavior::Working => Ok(Self::expected_translation(text, target_language)),

            MockBehavior::Failing => Err(ProviderError::ApiError {
                status_code: 500,
                message: "Simulated provider failure".to_string(),
            }),

            MockBehavior::FailingFor(targets) => {
                if targets.iter().any(|t| t.eq_ignore_ascii_case(target_language)) {
                    Err(ProviderError::ApiError {
                        status_code: 503,
                        message: format!("Simulated failure for {}", target_language),
                    })
                } else {
                    Ok(Self::expected_translation(text, target_language))
                }
            }

            MockBehavior::Slow { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                Ok(Self::expected_translation(text, target_language))
            }

            MockBehavior::SlowFor { targets, delay_ms } => {
                if targets.iter().any(|t| t.eq_ignore_ascii_case(target_language)) {
                    tokio::time::sleep(Duration::from_millis(*delay_ms)).await;
                }
                Ok(Self::expected_translation(text, target_language))
            }
        }
    }
}

/// Decrements the in-flight counter even when the call future is dropped
struct InFlightGuard(Arc<AtomicUsize>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        _source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(Arc::clone(&self.in_flight));

        self.respond(text, target_language).await
    }
}
