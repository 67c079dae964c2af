//! Completion provider boundary.
//!
//! Every reasoning stage talks to the model through [`CompletionProvider`].
//! [`LangbaseClient`] is the production implementation; tests substitute
//! stubs so the pipeline can be exercised without network access.

mod client;
mod types;

pub use client::LangbaseClient;
pub use types::*;

use async_trait::async_trait;

use crate::error::LangbaseResult;

/// A single-shot text completion capability.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Issue one prompt and return the raw completion text.
    ///
    /// `system` overrides the default system instruction when given.
    async fn complete<'a>(&self, prompt: &str, system: Option<&'a str>) -> LangbaseResult<String>;
}
