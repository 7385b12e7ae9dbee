//! Turns a routing decision into one or two backend translation calls.

use crate::{
    domain::RequestId,
    language::{LanguageProfile, RoutingDecision},
    ports::BackendGuard,
};

/// Which named counter a processed message lands in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    AtoB,
    BtoA,
    OtherToDualFull,
    OtherToDualPartial,
    Failed,
}

impl OutcomeKind {
    pub const ALL: [OutcomeKind; 5] = [
        OutcomeKind::AtoB,
        OutcomeKind::BtoA,
        OutcomeKind::OtherToDualFull,
        OutcomeKind::OtherToDualPartial,
        OutcomeKind::Failed,
    ];

    pub fn counter_name(self) -> &'static str {
        match self {
            OutcomeKind::AtoB => "a_to_b",
            OutcomeKind::BtoA => "b_to_a",
            OutcomeKind::OtherToDualFull => "other_to_dual",
            OutcomeKind::OtherToDualPartial => "partial_dual",
            OutcomeKind::Failed => "failed",
        }
    }

    pub fn is_success(self) -> bool {
        !matches!(self, OutcomeKind::Failed)
    }
}

/// One translated block of the reply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationPart {
    /// `"{from} -> {to}"`.
    pub label: String,
    /// Flag of the target language.
    pub flag: String,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranslationOutcome {
    pub parts: Vec<TranslationPart>,
    pub kind: OutcomeKind,
}

impl TranslationOutcome {
    fn failed() -> Self {
        Self {
            parts: Vec::new(),
            kind: OutcomeKind::Failed,
        }
    }

    pub fn has_reply(&self) -> bool {
        !self.parts.is_empty()
    }
}

#[derive(Clone)]
pub struct TranslationOrchestrator {
    backend: BackendGuard,
    lang_a: LanguageProfile,
    lang_b: LanguageProfile,
}

impl TranslationOrchestrator {
    pub fn new(backend: BackendGuard, lang_a: LanguageProfile, lang_b: LanguageProfile) -> Self {
        Self {
            backend,
            lang_a,
            lang_b,
        }
    }

    /// Run the translations `decision` asks for.
    ///
    /// `source_code` is the detected language, used to label dual translations.
    /// Returns `None` for [`RoutingDecision::Suppress`].
    pub async fn execute(
        &self,
        decision: RoutingDecision,
        text: &str,
        source_code: &str,
        rid: &RequestId,
    ) -> Option<TranslationOutcome> {
        let outcome = match decision {
            RoutingDecision::Suppress => return None,
            RoutingDecision::TranslateAtoB => {
                self.single(text, &self.lang_a, &self.lang_b, OutcomeKind::AtoB, rid)
                    .await
            }
            RoutingDecision::TranslateBtoA => {
                self.single(text, &self.lang_b, &self.lang_a, OutcomeKind::BtoA, rid)
                    .await
            }
            RoutingDecision::DualTranslate => self.dual(text, source_code, rid).await,
        };
        Some(outcome)
    }

    async fn single(
        &self,
        text: &str,
        from: &LanguageProfile,
        to: &LanguageProfile,
        kind: OutcomeKind,
        rid: &RequestId,
    ) -> TranslationOutcome {
        let Some(translated) = self.backend.translate(text, &to.code, rid).await else {
            return TranslationOutcome::failed();
        };

        tracing::info!(rid = %rid, from = %from.name, to = %to.name, translation = %translated, "translation successful");
        TranslationOutcome {
            parts: vec![part(&from.name, to, translated)],
            kind,
        }
    }

    async fn dual(&self, text: &str, source_code: &str, rid: &RequestId) -> TranslationOutcome {
        // Independent calls: a failure on one side never cancels the other.
        let (to_a, to_b) = tokio::join!(
            self.backend.translate(text, &self.lang_a.code, rid),
            self.backend.translate(text, &self.lang_b.code, rid),
        );

        let source_label = source_code.to_uppercase();
        let kind = match (&to_a, &to_b) {
            (Some(_), Some(_)) => OutcomeKind::OtherToDualFull,
            (None, None) => return TranslationOutcome::failed(),
            _ => OutcomeKind::OtherToDualPartial,
        };

        if kind == OutcomeKind::OtherToDualFull {
            tracing::info!(rid = %rid, source = %source_label, "dual translation successful");
        } else {
            tracing::warn!(
                rid = %rid,
                source = %source_label,
                lang_a_ok = to_a.is_some(),
                lang_b_ok = to_b.is_some(),
                "partial dual translation"
            );
        }

        let parts = [(to_a, &self.lang_a), (to_b, &self.lang_b)]
            .into_iter()
            .filter_map(|(res, to)| res.map(|t| part(&source_label, to, t)))
            .collect();

        TranslationOutcome { parts, kind }
    }
}

fn part(from: &str, to: &LanguageProfile, text: String) -> TranslationPart {
    TranslationPart {
        label: format!("{from} -> {}", to.name),
        flag: to.flag.clone(),
        text,
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::{errors::Error, language::DetectionResult, ports::TranslationBackend, Result};
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Arc, time::Duration};
    use tokio::time::Instant;

    /// Scripted backend: per-target delay and result, fixed detection.
    #[derive(Default)]
    pub(crate) struct FakeBackend {
        pub detection: Option<(String, f64)>,
        pub replies: HashMap<String, (Duration, Option<String>)>,
        pub calls: std::sync::Mutex<Vec<String>>,
    }

    impl FakeBackend {
        pub fn detecting(code: &str, confidence: f64) -> Self {
            Self {
                detection: Some((code.to_string(), confidence)),
                ..Default::default()
            }
        }

        pub fn reply(mut self, target: &str, delay_ms: u64, text: Option<&str>) -> Self {
            self.replies.insert(
                target.to_string(),
                (Duration::from_millis(delay_ms), text.map(|s| s.to_string())),
            );
            self
        }

        pub fn translate_calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl TranslationBackend for FakeBackend {
        async fn detect_language(
            &self,
            _text: &str,
            _rid: &RequestId,
        ) -> Result<Option<DetectionResult>> {
            match &self.detection {
                Some((code, conf)) => Ok(DetectionResult::new(code, *conf)),
                None => Err(Error::Backend("detector unavailable".to_string())),
            }
        }

        async fn translate(
            &self,
            text: &str,
            target_code: &str,
            _rid: &RequestId,
        ) -> Result<Option<String>> {
            self.calls.lock().unwrap().push(target_code.to_string());
            let (delay, reply) = self
                .replies
                .get(target_code)
                .cloned()
                .unwrap_or((Duration::ZERO, Some(format!("{text}@{target_code}"))));
            tokio::time::sleep(delay).await;
            reply
                .map(|r| Ok(Some(r)))
                .unwrap_or_else(|| Err(Error::Backend(format!("no route to {target_code}"))))
        }
    }

    pub(crate) fn lang_a() -> LanguageProfile {
        LanguageProfile::new("zh-CN", "Chinese", "🇨🇳")
    }

    pub(crate) fn lang_b() -> LanguageProfile {
        LanguageProfile::new("vi", "Vietnamese", "🇻🇳")
    }

    fn orchestrator(backend: FakeBackend) -> (TranslationOrchestrator, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let guard = BackendGuard::new(backend.clone(), None);
        (TranslationOrchestrator::new(guard, lang_a(), lang_b()), backend)
    }

    #[tokio::test]
    async fn a_to_b_translates_into_b_only() {
        let (orch, backend) = orchestrator(FakeBackend::default().reply("vi", 0, Some("xin chào")));
        let out = orch
            .execute(RoutingDecision::TranslateAtoB, "你好", "zh-cn", &RequestId::generate())
            .await
            .unwrap();
        assert_eq!(out.kind, OutcomeKind::AtoB);
        assert_eq!(
            out.parts,
            vec![TranslationPart {
                label: "Chinese -> Vietnamese".to_string(),
                flag: "🇻🇳".to_string(),
                text: "xin chào".to_string(),
            }]
        );
        assert_eq!(backend.translate_calls(), vec!["vi"]);
    }

    #[tokio::test]
    async fn single_direction_failure_has_no_parts() {
        let (orch, _) = orchestrator(FakeBackend::default().reply("zh-CN", 0, None));
        let out = orch
            .execute(RoutingDecision::TranslateBtoA, "chào", "vi", &RequestId::generate())
            .await
            .unwrap();
        assert_eq!(out.kind, OutcomeKind::Failed);
        assert!(!out.has_reply());
    }

    #[tokio::test(start_paused = true)]
    async fn dual_runs_concurrently_and_keeps_a_then_b_order() {
        // B completes first; the reply order must still be A, B.
        let (orch, _) = orchestrator(
            FakeBackend::default()
                .reply("zh-CN", 1_000, Some("你好"))
                .reply("vi", 10, Some("xin chào")),
        );
        let started = Instant::now();
        let out = orch
            .execute(RoutingDecision::DualTranslate, "hello", "en", &RequestId::generate())
            .await
            .unwrap();

        assert!(started.elapsed() < Duration::from_millis(1_500));
        assert_eq!(out.kind, OutcomeKind::OtherToDualFull);
        let labels: Vec<_> = out.parts.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["EN -> Chinese", "EN -> Vietnamese"]);
    }

    #[tokio::test]
    async fn dual_with_one_failure_is_partial() {
        let (orch, _) = orchestrator(FakeBackend::default().reply("zh-CN", 0, None));
        let out = orch
            .execute(RoutingDecision::DualTranslate, "bonjour", "fr", &RequestId::generate())
            .await
            .unwrap();
        assert_eq!(out.kind, OutcomeKind::OtherToDualPartial);
        assert_eq!(out.parts.len(), 1);
        assert_eq!(out.parts[0].label, "FR -> Vietnamese");
    }

    #[tokio::test]
    async fn dual_with_both_failing_is_failed() {
        let (orch, backend) = orchestrator(
            FakeBackend::default()
                .reply("zh-CN", 0, None)
                .reply("vi", 0, None),
        );
        let out = orch
            .execute(RoutingDecision::DualTranslate, "hola", "es", &RequestId::generate())
            .await
            .unwrap();
        assert_eq!(out.kind, OutcomeKind::Failed);
        assert!(out.parts.is_empty());
        assert_eq!(backend.translate_calls().len(), 2);
    }

    #[tokio::test]
    async fn suppress_makes_no_calls() {
        let (orch, backend) = orchestrator(FakeBackend::default());
        let out = orch
            .execute(RoutingDecision::Suppress, "??", "fr", &RequestId::generate())
            .await;
        assert!(out.is_none());
        assert!(backend.translate_calls().is_empty());
    }
}
