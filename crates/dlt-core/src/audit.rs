use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::{
    domain::{ChatIdentity, RequestId},
    errors::Error,
    Result,
};

const AUDIT_MAX_TEXT: usize = 500;

#[derive(Clone, Debug, Serialize)]
pub struct AuditEvent {
    pub timestamp: String,
    pub event: String,
    pub request_id: String,
    pub chat_id: i64,
    pub chat: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authorized: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recent_messages: Option<usize>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuditEvent {
    fn base(event: &str, rid: &RequestId, identity: &ChatIdentity) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            event: event.to_string(),
            request_id: rid.to_string(),
            chat_id: identity.chat_id.0,
            chat: identity.display_name.clone(),
            username: identity.sender_username.clone(),
            authorized: None,
            recent_messages: None,
            source_lang: None,
            outcome: None,
            content: None,
            response: None,
            error: None,
        }
    }

    pub fn auth(rid: &RequestId, identity: &ChatIdentity, authorized: bool) -> Self {
        Self {
            authorized: Some(authorized),
            ..Self::base("auth", rid, identity)
        }
    }

    pub fn rate_limit(rid: &RequestId, identity: &ChatIdentity, recent_messages: usize) -> Self {
        Self {
            recent_messages: Some(recent_messages),
            ..Self::base("rate_limit", rid, identity)
        }
    }

    pub fn translation(
        rid: &RequestId,
        identity: &ChatIdentity,
        source_lang: &str,
        outcome: &str,
        content: &str,
        response: Option<&str>,
    ) -> Self {
        Self {
            source_lang: Some(source_lang.to_string()),
            outcome: Some(outcome.to_string()),
            content: Some(content.to_string()),
            response: response.map(|s| s.to_string()),
            ..Self::base("translation", rid, identity)
        }
    }

    pub fn error(rid: &RequestId, identity: &ChatIdentity, error: &str) -> Self {
        Self {
            error: Some(error.to_string()),
            ..Self::base("error", rid, identity)
        }
    }
}

/// Append-only audit trail, either JSON lines or a readable block format.
#[derive(Clone, Debug)]
pub struct AuditLogger {
    path: PathBuf,
    json: bool,
}

impl AuditLogger {
    pub fn new(path: impl Into<PathBuf>, json: bool) -> Self {
        Self {
            path: path.into(),
            json,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an event; failures are logged and swallowed.
    pub fn record(&self, event: AuditEvent) {
        let kind = event.event.clone();
        if let Err(e) = self.write(event) {
            tracing::warn!(event = %kind, error = %e, "failed to write audit event");
        }
    }

    pub fn write(&self, mut event: AuditEvent) -> Result<()> {
        if let Some(s) = &event.content {
            event.content = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }
        if let Some(s) = &event.response {
            event.response = Some(truncate_text(s, AUDIT_MAX_TEXT));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        if self.json {
            let line = serde_json::to_string(&event)?;
            writeln!(file, "{line}")?;
            return Ok(());
        }

        let mut out = String::new();
        out.push('\n');
        out.push_str(&"=".repeat(60));

        let value = serde_json::to_value(&event)?;
        let Some(obj) = value.as_object() else {
            return Err(Error::External(
                "audit event is not a JSON object".to_string(),
            ));
        };
        for (k, v) in obj {
            out.push('\n');
            out.push_str(k);
            out.push_str(": ");
            match v {
                serde_json::Value::String(s) => out.push_str(s),
                other => out.push_str(&other.to_string()),
            }
        }
        out.push('\n');

        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

pub fn truncate_text(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        return s.to_string();
    }
    let mut out = s.chars().take(max_len).collect::<String>();
    out.push_str("...");
    out
}
