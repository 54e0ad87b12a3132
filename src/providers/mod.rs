/*!
 * Provider implementations for the translation capability.
 *
 * The dispatch engine only depends on the `Translator` trait:
 * - `workflow`: HTTP client for the hosted translation workflow API
 * - `mock`: scripted translator used by the test suites
 */

use async_trait::async_trait;
use std::fmt::Debug;

use crate::errors::ProviderError;

/// Common trait for everything able to translate one string
///
/// Implementations must be shareable across concurrently running tasks.
#[async_trait]
pub trait Translator: Send + Sync + Debug {
    /// Translate `text` from `source_language` into `target_language`
    ///
    /// # Returns
    /// * `Result<String, ProviderError>` - The translated text or a typed failure
    async fn translate(
        &self,
        text: &str,
        source_language: &str,
        target_language: &str,
    ) -> Result<String, ProviderError>;
}

pub mod mock;
pub mod workflow;

pub use mock::{MockBehavior, MockTranslator};
pub use workflow::WorkflowTranslator;
