//! Google Cloud Translation (v3 REST) adapter.
//!
//! Implements the `dlt-core` translation backend port.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use dlt_core::{
    config::Config, domain::RequestId, errors::Error, language::DetectionResult,
    ports::TranslationBackend, Result,
};

pub mod token;

use token::TokenSource;

const API_BASE: &str = "https://translation.googleapis.com/v3";
const HTTP_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug)]
pub struct GoogleTranslateClient {
    http: reqwest::Client,
    project_id: String,
    parent: String,
    tokens: TokenSource,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DetectRequest<'a> {
    content: &'a str,
    mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct DetectResponse {
    #[serde(default)]
    languages: Vec<DetectedLanguage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DetectedLanguage {
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    confidence: f64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TranslateRequest<'a> {
    contents: [&'a str; 1],
    target_language_code: &'a str,
    mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
struct TranslateResponse {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Translation {
    #[serde(default)]
    translated_text: String,
}

impl GoogleTranslateClient {
    pub fn new(project_id: impl Into<String>, tokens: TokenSource) -> Result<Self> {
        let project_id = project_id.into();
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .build()
            .map_err(|e| Error::Http(format!("failed to build http client: {e}")))?;

        Ok(Self {
            http,
            parent: format!("projects/{project_id}/locations/global"),
            project_id,
            tokens,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(
            cfg.google_project_id.clone(),
            TokenSource::from_config(cfg.google_access_token.clone(), cfg.gcloud_path.clone()),
        )
    }

    async fn call<B, R>(&self, method: &str, body: &B, rid: &RequestId) -> Result<R>
    where
        B: Serialize + Sync,
        R: for<'de> Deserialize<'de>,
    {
        let url = format!("{API_BASE}/{}:{method}", self.parent);
        let token = self.tokens.token().await?;

        let resp = self
            .http
            .post(&url)
            .bearer_auth(token)
            .header("x-goog-user-project", &self.project_id)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("{method} request error: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            if status == reqwest::StatusCode::UNAUTHORIZED {
                self.tokens.invalidate().await;
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Backend(format!(
                "{method} failed: {status} {}",
                body.chars().take(200).collect::<String>()
            )));
        }

        tracing::debug!(rid = %rid, method, %status, "backend call ok");
        resp.json::<R>()
            .await
            .map_err(|e| Error::Backend(format!("{method} json error: {e}")))
    }
}

#[async_trait]
impl TranslationBackend for GoogleTranslateClient {
    async fn detect_language(
        &self,
        text: &str,
        rid: &RequestId,
    ) -> Result<Option<DetectionResult>> {
        let body = DetectRequest {
            content: text,
            mime_type: "text/plain",
        };
        let resp: DetectResponse = self.call("detectLanguage", &body, rid).await?;
        Ok(best_detection(resp))
    }

    async fn translate(
        &self,
        text: &str,
        target_code: &str,
        rid: &RequestId,
    ) -> Result<Option<String>> {
        let body = TranslateRequest {
            contents: [text],
            target_language_code: target_code,
            mime_type: "text/plain",
        };
        let resp: TranslateResponse = self.call("translateText", &body, rid).await?;
        Ok(first_translation(resp))
    }
}

/// The API lists the most likely language first.
fn best_detection(resp: DetectResponse) -> Option<DetectionResult> {
    let lang = resp.languages.into_iter().next()?;
    DetectionResult::new(&lang.language_code, lang.confidence)
}

fn first_translation(resp: TranslateResponse) -> Option<String> {
    resp.translations
        .into_iter()
        .next()
        .map(|t| t.translated_text)
        .filter(|t| !t.trim().is_empty())
}
