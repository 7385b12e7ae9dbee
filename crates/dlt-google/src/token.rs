//! Bearer tokens for the Cloud Translation API.

use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use tokio::{process::Command, sync::Mutex};

use dlt_core::{errors::Error, Result};

/// gcloud access tokens live for an hour; refresh well before that.
const MINTED_TOKEN_TTL: Duration = Duration::from_secs(45 * 60);

#[derive(Debug)]
pub enum TokenSource {
    /// A token supplied through configuration, used as-is.
    Static(String),
    /// Minted with `gcloud auth application-default print-access-token` and cached.
    Gcloud {
        gcloud_path: PathBuf,
        cache: Mutex<Option<CachedToken>>,
    },
}

#[derive(Clone, Debug)]
pub struct CachedToken {
    token: String,
    at: Instant,
}

impl TokenSource {
    pub fn from_config(access_token: Option<String>, gcloud_path: PathBuf) -> Self {
        match access_token {
            Some(t) => TokenSource::Static(t.trim().to_string()),
            None => TokenSource::Gcloud {
                gcloud_path,
                cache: Mutex::new(None),
            },
        }
    }

    pub async fn token(&self) -> Result<String> {
        match self {
            TokenSource::Static(t) => Ok(t.clone()),
            TokenSource::Gcloud { gcloud_path, cache } => {
                let mut guard = cache.lock().await;
                if let Some(c) = guard.as_ref() {
                    if c.at.elapsed() < MINTED_TOKEN_TTL {
                        return Ok(c.token.clone());
                    }
                }

                let token = mint_with_gcloud(gcloud_path).await?;
                *guard = Some(CachedToken {
                    token: token.clone(),
                    at: Instant::now(),
                });
                Ok(token)
            }
        }
    }

    /// Drop a cached token after the API rejected it.
    pub async fn invalidate(&self) {
        if let TokenSource::Gcloud { cache, .. } = self {
            *cache.lock().await = None;
        }
    }
}

async fn mint_with_gcloud(gcloud_path: &Path) -> Result<String> {
    let out = Command::new(gcloud_path)
        .args(["auth", "application-default", "print-access-token"])
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| {
            Error::External(format!(
                "failed to run {}: {e}",
                gcloud_path.display()
            ))
        })?;

    if !out.status.success() {
        let stderr = String::from_utf8_lossy(&out.stderr);
        return Err(Error::External(format!(
            "gcloud exited with {}: {}",
            out.status,
            stderr.trim().chars().take(200).collect::<String>()
        )));
    }

    let token = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if token.is_empty() {
        return Err(Error::External(
            "gcloud printed an empty access token".to_string(),
        ));
    }
    tracing::debug!("minted new access token via gcloud");
    Ok(token)
}
