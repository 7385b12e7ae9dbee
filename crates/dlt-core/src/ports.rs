use std::{future::Future, sync::Arc, time::Duration};

use async_trait::async_trait;

use crate::{domain::RequestId, errors::Error, language::DetectionResult, Result};

/// Hexagonal port for the language detection / translation backend.
///
/// Implementations report "no result" as `Ok(None)` and transport or API failures
/// as `Err`. Callers inside the core go through [`BackendGuard`].
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    async fn detect_language(&self, text: &str, rid: &RequestId)
        -> Result<Option<DetectionResult>>;

    async fn translate(&self, text: &str, target_code: &str, rid: &RequestId)
        -> Result<Option<String>>;
}

/// Wraps a backend so every call is bounded, logged and never fails.
#[derive(Clone)]
pub struct BackendGuard {
    inner: Arc<dyn TranslationBackend>,
    timeout: Option<Duration>,
}

impl BackendGuard {
    pub fn new(inner: Arc<dyn TranslationBackend>, timeout: Option<Duration>) -> Self {
        Self { inner, timeout }
    }

    pub async fn detect(&self, text: &str, rid: &RequestId) -> Option<DetectionResult> {
        match self.bounded(self.inner.detect_language(text, rid)).await {
            Ok(Some(d)) => Some(d),
            Ok(None) => {
                tracing::warn!(rid = %rid, "language detection returned no result");
                None
            }
            Err(e) => {
                tracing::error!(rid = %rid, error = %e, "language detection failed");
                None
            }
        }
    }

    pub async fn translate(&self, text: &str, target_code: &str, rid: &RequestId) -> Option<String> {
        match self.bounded(self.inner.translate(text, target_code, rid)).await {
            Ok(Some(t)) if !t.trim().is_empty() => Some(t),
            Ok(_) => {
                tracing::warn!(rid = %rid, target_lang = target_code, "translation returned no result");
                None
            }
            Err(e) => {
                tracing::warn!(rid = %rid, target_lang = target_code, error = %e, "translation failed");
                None
            }
        }
    }

    async fn bounded<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => fut.await,
        }
    }
}
