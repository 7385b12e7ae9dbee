use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{errors::Error, language::LanguageProfile, Result};

/// Typed configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    // Transport
    pub telegram_bot_token: String,

    // Backend
    pub google_project_id: String,
    pub google_access_token: Option<String>,
    pub gcloud_path: PathBuf,
    /// `None` means backend calls may block indefinitely.
    pub backend_timeout: Option<Duration>,

    // Language pair
    pub lang_a: LanguageProfile,
    pub lang_b: LanguageProfile,

    // Whitelists
    pub allowed_chat_ids: Vec<i64>,
    pub allowed_admin_usernames: Vec<String>,

    // Routing / flood control
    pub max_messages_per_minute: u32,
    pub reply_delay: Duration,
    pub confidence_threshold: f64,
    pub short_text_bypass_chars: usize,

    // Persistence / logs
    pub stats_dir: PathBuf,
    pub audit_log_path: PathBuf,
    pub audit_log_json: bool,
    pub log_level: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| lookup(key).and_then(non_empty);

        let telegram_bot_token = get("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN environment variable is required".to_string())
        })?;
        let google_project_id = get("GOOGLE_PROJECT_ID").ok_or_else(|| {
            Error::Config("GOOGLE_PROJECT_ID environment variable is required".to_string())
        })?;
        let google_access_token = get("GOOGLE_ACCESS_TOKEN");
        let gcloud_path = PathBuf::from(get("GCLOUD_PATH").unwrap_or_else(|| "gcloud".to_string()));
        let backend_timeout = match parse_u64(get("BACKEND_TIMEOUT_MS")).unwrap_or(30_000) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        };

        let lang_a = LanguageProfile::new(
            get("LANG_A_CODE").unwrap_or_else(|| "zh-CN".to_string()),
            get("LANG_A_NAME").unwrap_or_else(|| "Chinese".to_string()),
            get("LANG_A_FLAG").unwrap_or_else(|| "🇨🇳".to_string()),
        );
        let lang_b = LanguageProfile::new(
            get("LANG_B_CODE").unwrap_or_else(|| "vi".to_string()),
            get("LANG_B_NAME").unwrap_or_else(|| "Vietnamese".to_string()),
            get("LANG_B_FLAG").unwrap_or_else(|| "🇻🇳".to_string()),
        );
        if lang_a.code.eq_ignore_ascii_case(&lang_b.code) {
            return Err(Error::Config(format!(
                "LANG_A_CODE and LANG_B_CODE must differ (both are {})",
                lang_a.code
            )));
        }

        let allowed_chat_ids = parse_csv_i64(get("ALLOWED_CHAT_IDS"));
        let allowed_admin_usernames = parse_csv_usernames(get("ALLOWED_ADMIN_USERNAMES"));

        let max_messages_per_minute = parse_u64(get("MAX_MESSAGES_PER_MINUTE"))
            .map(|v| v.min(u32::MAX as u64) as u32)
            .unwrap_or(60);
        let reply_delay = Duration::from_millis(parse_u64(get("REPLY_DELAY_MS")).unwrap_or(100));
        let confidence_threshold = get("CONFIDENCE_THRESHOLD")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
            .unwrap_or(0.7)
            .clamp(0.0, 1.0);
        let short_text_bypass_chars = parse_u64(get("SHORT_TEXT_BYPASS_CHARS"))
            .map(|v| v as usize)
            .unwrap_or(6);

        let stats_dir = PathBuf::from(get("STATS_DIR").unwrap_or_else(|| "logs".to_string()));
        let audit_log_path = get("AUDIT_LOG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| stats_dir.join("audit.log"));
        let audit_log_json = parse_bool(get("AUDIT_LOG_JSON")).unwrap_or(false);
        let log_level = get("LOG_LEVEL")
            .map(|s| s.trim().to_lowercase())
            .unwrap_or_else(|| "info".to_string());

        Ok(Self {
            telegram_bot_token,
            google_project_id,
            google_access_token,
            gcloud_path,
            backend_timeout,
            lang_a,
            lang_b,
            allowed_chat_ids,
            allowed_admin_usernames,
            max_messages_per_minute,
            reply_delay,
            confidence_threshold,
            short_text_bypass_chars,
            stats_dir,
            audit_log_path,
            audit_log_json,
            log_level,
        })
    }

    /// Create the directories the bot writes into.
    pub fn ensure_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.stats_dir)?;
        if let Some(parent) = self.audit_log_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn parse_bool(v: Option<String>) -> Option<bool> {
    v.map(|s| {
        matches!(
            s.trim().to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn parse_u64(v: Option<String>) -> Option<u64> {
    v.and_then(|s| s.trim().parse::<u64>().ok())
}

fn parse_csv_i64(v: Option<String>) -> Vec<i64> {
    v.unwrap_or_default()
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<i64>().ok())
        .collect()
}

fn parse_csv_usernames(v: Option<String>) -> Vec<String> {
    v.unwrap_or_default()
        .split(',')
        .map(crate::security::normalize_username)
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| map.get(k).cloned()
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("TELEGRAM_BOT_TOKEN", "123:abc"),
        ("GOOGLE_PROJECT_ID", "my-project"),
    ];

    #[test]
    fn defaults_match_documented_values() {
        let cfg = Config::from_lookup(lookup(&REQUIRED)).unwrap();
        assert_eq!(cfg.lang_a.code, "zh-CN");
        assert_eq!(cfg.lang_b.code, "vi");
        assert_eq!(cfg.max_messages_per_minute, 60);
        assert_eq!(cfg.reply_delay, Duration::from_millis(100));
        assert!((cfg.confidence_threshold - 0.7).abs() < f64::EPSILON);
        assert_eq!(cfg.short_text_bypass_chars, 6);
        assert_eq!(cfg.backend_timeout, Some(Duration::from_secs(30)));
        assert!(cfg.allowed_chat_ids.is_empty());
        assert!(cfg.allowed_admin_usernames.is_empty());
        assert_eq!(cfg.audit_log_path, PathBuf::from("logs/audit.log"));
    }

    #[test]
    fn missing_token_is_a_config_error() {
        let err = Config::from_lookup(lookup(&[("GOOGLE_PROJECT_ID", "p")])).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn whitelists_are_parsed_and_normalized() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("ALLOWED_CHAT_IDS", "-1001, 42,,oops"));
        pairs.push(("ALLOWED_ADMIN_USERNAMES", "@Alice, bob ,"));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.allowed_chat_ids, vec![-1001, 42]);
        assert_eq!(cfg.allowed_admin_usernames, vec!["alice", "bob"]);
    }

    #[test]
    fn zero_timeout_disables_it_and_threshold_is_clamped() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("BACKEND_TIMEOUT_MS", "0"));
        pairs.push(("CONFIDENCE_THRESHOLD", "1.5"));
        let cfg = Config::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(cfg.backend_timeout, None);
        assert!((cfg.confidence_threshold - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn identical_language_codes_are_rejected() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("LANG_A_CODE", "VI"));
        assert!(Config::from_lookup(lookup(&pairs)).is_err());
    }
}
