//! End-to-end handling of one incoming message.
//!
//! Received → auth → rate limit → detect → route → translate → reply & count.
//! Every stage may stop early; none of them surface errors to the sender.

use std::{sync::Arc, time::Duration};

use crate::{
    audit::{AuditEvent, AuditLogger},
    config::Config,
    domain::{IncomingMessage, RequestId, UserId},
    formatting::{format_reply, format_stats_report},
    language::{route, LanguageProfile, RoutingDecision, RoutingPolicy},
    messaging::{port::MessagingPort, types::OutgoingReply},
    orchestrator::{OutcomeKind, TranslationOrchestrator, TranslationOutcome},
    ports::{BackendGuard, TranslationBackend},
    security::{Authorizer, RateLimiter},
    stats::StatsAggregator,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    EmptyText,
    Command,
    OwnMessage,
}

/// Where a message's journey through the pipeline ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineOutcome {
    Ignored(IgnoreReason),
    Unauthorized,
    RateLimited,
    DetectionFailed,
    Suppressed,
    Translated(OutcomeKind),
}

#[derive(Clone, Debug)]
pub struct PipelineSettings {
    pub lang_a: LanguageProfile,
    pub lang_b: LanguageProfile,
    pub routing: RoutingPolicy,
    pub reply_delay: Duration,
    /// Messages from this user (the bot itself) are never translated.
    pub bot_user_id: Option<UserId>,
}

impl PipelineSettings {
    pub fn from_config(cfg: &Config, bot_user_id: Option<UserId>) -> Self {
        Self {
            lang_a: cfg.lang_a.clone(),
            lang_b: cfg.lang_b.clone(),
            routing: RoutingPolicy {
                short_text_bypass_chars: cfg.short_text_bypass_chars,
                confidence_threshold: cfg.confidence_threshold,
            },
            reply_delay: cfg.reply_delay,
            bot_user_id,
        }
    }
}

pub struct MessagePipeline {
    settings: PipelineSettings,
    authorizer: Authorizer,
    rate_limiter: RateLimiter,
    backend: BackendGuard,
    orchestrator: TranslationOrchestrator,
    stats: Arc<StatsAggregator>,
    messenger: Arc<dyn MessagingPort>,
    audit: Arc<AuditLogger>,
}

impl MessagePipeline {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        settings: PipelineSettings,
        authorizer: Authorizer,
        rate_limiter: RateLimiter,
        backend: Arc<dyn TranslationBackend>,
        backend_timeout: Option<Duration>,
        stats: Arc<StatsAggregator>,
        messenger: Arc<dyn MessagingPort>,
        audit: Arc<AuditLogger>,
    ) -> Self {
        let backend = BackendGuard::new(backend, backend_timeout);
        let orchestrator = TranslationOrchestrator::new(
            backend.clone(),
            settings.lang_a.clone(),
            settings.lang_b.clone(),
        );
        Self {
            settings,
            authorizer,
            rate_limiter,
            backend,
            orchestrator,
            stats,
            messenger,
            audit,
        }
    }

    /// Wire a pipeline from configuration. Stats are loaded for today.
    pub fn from_config(
        cfg: &Config,
        bot_user_id: Option<UserId>,
        backend: Arc<dyn TranslationBackend>,
        messenger: Arc<dyn MessagingPort>,
    ) -> Self {
        Self::new(
            PipelineSettings::from_config(cfg, bot_user_id),
            Authorizer::new(&cfg.allowed_chat_ids, &cfg.allowed_admin_usernames),
            RateLimiter::new(cfg.max_messages_per_minute),
            backend,
            cfg.backend_timeout,
            Arc::new(StatsAggregator::load(&cfg.stats_dir)),
            messenger,
            Arc::new(AuditLogger::new(
                cfg.audit_log_path.clone(),
                cfg.audit_log_json,
            )),
        )
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn stats(&self) -> &StatsAggregator {
        &self.stats
    }

    pub async fn process(&self, msg: IncomingMessage) -> PipelineOutcome {
        self.process_with_id(msg, RequestId::generate()).await
    }

    pub async fn process_with_id(&self, msg: IncomingMessage, rid: RequestId) -> PipelineOutcome {
        let text = msg.text.trim();
        if text.is_empty() {
            return PipelineOutcome::Ignored(IgnoreReason::EmptyText);
        }
        if msg.is_command || text.starts_with('/') {
            return PipelineOutcome::Ignored(IgnoreReason::Command);
        }
        if self.settings.bot_user_id == Some(msg.sender_id) {
            return PipelineOutcome::Ignored(IgnoreReason::OwnMessage);
        }

        let chat = &msg.chat;
        tracing::debug!(
            rid = %rid,
            chat_id = chat.chat_id.0,
            user = chat.sender_username.as_deref().unwrap_or_default(),
            source = msg.source.as_str(),
            content = text,
            "message received"
        );

        // Auth
        let authorized = self.authorizer.is_authorized(chat, &rid);
        self.audit.record(AuditEvent::auth(&rid, chat, authorized));
        if !authorized {
            return PipelineOutcome::Unauthorized;
        }

        // Rate limit
        if self.rate_limiter.is_rate_limited(chat.chat_id, &rid).await {
            let recent = self.rate_limiter.status(chat.chat_id).await.recent;
            self.audit.record(AuditEvent::rate_limit(&rid, chat, recent));
            return PipelineOutcome::RateLimited;
        }

        // Detect
        let Some(detection) = self.backend.detect(text, &rid).await else {
            self.stats.record(OutcomeKind::Failed).await;
            return PipelineOutcome::DetectionFailed;
        };

        // Route
        let len = text.chars().count();
        let decision = route(
            &detection,
            &self.settings.lang_a,
            &self.settings.lang_b,
            self.settings.routing,
            len,
        );
        tracing::info!(
            rid = %rid,
            source_lang = %detection.language_code().to_uppercase(),
            confidence = %format!("{:.1}%", detection.confidence() * 100.0),
            length = len,
            decision = ?decision,
            "language detected"
        );
        if decision == RoutingDecision::Suppress {
            tracing::info!(rid = %rid, "confidence too low, skipping translation");
            return PipelineOutcome::Suppressed;
        }

        // Translate
        let Some(outcome) = self
            .orchestrator
            .execute(decision, text, detection.language_code(), &rid)
            .await
        else {
            return PipelineOutcome::Suppressed;
        };

        // Reply & count
        let reply = outcome.has_reply().then(|| format_reply(&outcome.parts));
        if reply.is_some() {
            self.send_reply(&msg, &outcome, &rid).await;
            if !self.settings.reply_delay.is_zero() {
                tokio::time::sleep(self.settings.reply_delay).await;
            }
        } else {
            tracing::error!(
                rid = %rid,
                source_lang = detection.language_code(),
                content = text,
                "translation completely failed"
            );
        }

        let snapshot = self.stats.record(outcome.kind).await;
        if outcome.kind.is_success() {
            tracing::info!(
                rid = %rid,
                number = snapshot.counters.total,
                kind = outcome.kind.counter_name(),
                chat_id = chat.chat_id.0,
                "translation counted"
            );
        }
        self.audit.record(AuditEvent::translation(
            &rid,
            chat,
            detection.language_code(),
            outcome.kind.counter_name(),
            text,
            reply.as_deref(),
        ));

        PipelineOutcome::Translated(outcome.kind)
    }

    async fn send_reply(&self, msg: &IncomingMessage, outcome: &TranslationOutcome, rid: &RequestId) {
        let max_len = self.messenger.capabilities().max_message_len;
        let combined = format_reply(&outcome.parts);

        // Too long for one message: one reply per part, each still quoting the original.
        let bodies = if combined.chars().count() <= max_len {
            vec![combined]
        } else {
            outcome
                .parts
                .iter()
                .map(|p| format_reply(std::slice::from_ref(p)))
                .collect()
        };

        for html in bodies {
            let reply = OutgoingReply {
                reply_to: msg.message_ref(),
                html,
                silent: true,
            };
            if let Err(e) = self.messenger.send_reply(reply).await {
                tracing::error!(rid = %rid, chat_id = msg.chat.chat_id.0, error = %e, "failed to send reply");
                self.audit
                    .record(AuditEvent::error(rid, &msg.chat, &e.to_string()));
            }
        }
    }

    /// Today's statistics report, for whitelisted admin usernames only.
    pub async fn admin_report(&self, username: Option<&str>) -> Option<String> {
        if !self.authorizer.is_admin(username) {
            tracing::info!(
                username = username.unwrap_or("None"),
                "unauthorized user attempted to view stats"
            );
            return None;
        }
        let snapshot = self.stats.snapshot().await;
        Some(format_stats_report(
            &snapshot,
            &self.settings.lang_a,
            &self.settings.lang_b,
        ))
    }
}
