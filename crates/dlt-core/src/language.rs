//! Language codes, detection results and routing.

/// One side of the configured language pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LanguageProfile {
    /// Backend target code as configured (e.g. `zh-CN`).
    pub code: String,
    pub name: String,
    pub flag: String,
}

impl LanguageProfile {
    pub fn new(code: impl Into<String>, name: impl Into<String>, flag: impl Into<String>) -> Self {
        Self {
            code: code.into().trim().to_string(),
            name: name.into(),
            flag: flag.into(),
        }
    }

    /// Configured code in the same normalized form the detector reports.
    pub fn normalized_code(&self) -> String {
        normalize_code(&self.code)
    }
}

/// Lower-case, hyphen-separated form of a language code (`zh_CN` -> `zh-cn`).
pub fn normalize_code(code: &str) -> String {
    code.trim().to_lowercase().replace('_', "-")
}

/// Leading component of a hyphenated language code (`zh` for `zh-cn`).
pub fn primary_subtag(code: &str) -> &str {
    code.split('-').next().unwrap_or(code)
}

#[derive(Clone, Debug, PartialEq)]
pub struct DetectionResult {
    language_code: String,
    confidence: f64,
}

impl DetectionResult {
    /// Normalizes the code and clamps confidence into `[0, 1]`.
    ///
    /// Returns `None` for an empty code; a detection without a language is no detection.
    pub fn new(language_code: &str, confidence: f64) -> Option<Self> {
        let language_code = normalize_code(language_code);
        if language_code.is_empty() {
            return None;
        }
        let confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
        Some(Self {
            language_code,
            confidence,
        })
    }

    pub fn language_code(&self) -> &str {
        &self.language_code
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoutingDecision {
    TranslateAtoB,
    TranslateBtoA,
    DualTranslate,
    Suppress,
}

/// Thresholds that gate routing.
#[derive(Clone, Copy, Debug)]
pub struct RoutingPolicy {
    pub short_text_bypass_chars: usize,
    pub confidence_threshold: f64,
}

/// Decide what to do with a message whose language was detected as `detection`.
///
/// Language A matches on the primary subtag so regional variants collapse onto it;
/// language B must match exactly.
pub fn route(
    detection: &DetectionResult,
    lang_a: &LanguageProfile,
    lang_b: &LanguageProfile,
    policy: RoutingPolicy,
    message_len: usize,
) -> RoutingDecision {
    let detected = detection.language_code();
    let a = lang_a.normalized_code();
    let b = lang_b.normalized_code();

    let is_short = message_len <= policy.short_text_bypass_chars;
    let bypass_eligible = is_short && (detected == a || detected == b);

    if detection.confidence() < policy.confidence_threshold && !bypass_eligible {
        return RoutingDecision::Suppress;
    }

    if detected == a || primary_subtag(detected) == primary_subtag(&a) {
        return RoutingDecision::TranslateAtoB;
    }

    if detected == b {
        return RoutingDecision::TranslateBtoA;
    }

    RoutingDecision::DualTranslate
}
