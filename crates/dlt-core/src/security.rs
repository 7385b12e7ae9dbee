use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::domain::{ChatId, ChatIdentity, RequestId};

// ============== Authorization ==============

/// Lower-case a username and strip a leading `@`.
pub fn normalize_username(raw: &str) -> String {
    raw.trim().trim_start_matches('@').to_lowercase()
}

/// Whitelist check over chat ids and sender usernames.
///
/// With both lists empty every chat is allowed.
#[derive(Clone, Debug, Default)]
pub struct Authorizer {
    chat_ids: HashSet<i64>,
    usernames: HashSet<String>,
}

impl Authorizer {
    pub fn new(chat_ids: &[i64], usernames: &[String]) -> Self {
        Self {
            chat_ids: chat_ids.iter().copied().collect(),
            usernames: usernames
                .iter()
                .map(|u| normalize_username(u))
                .filter(|u| !u.is_empty())
                .collect(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.chat_ids.is_empty() && self.usernames.is_empty()
    }

    pub fn is_authorized(&self, identity: &ChatIdentity, rid: &RequestId) -> bool {
        if self.is_open() {
            return true;
        }

        let chat_id = identity.chat_id.0;
        if self.chat_ids.contains(&chat_id) {
            tracing::debug!(rid = %rid, chat_id, chat = %identity.display_name, "whitelist passed (chat id)");
            return true;
        }

        if self.is_admin(identity.sender_username.as_deref()) {
            tracing::debug!(
                rid = %rid,
                chat_id,
                username = identity.sender_username.as_deref().unwrap_or_default(),
                "whitelist passed (username)"
            );
            return true;
        }

        tracing::info!(
            rid = %rid,
            chat_id,
            chat = %identity.display_name,
            username = identity.sender_username.as_deref().unwrap_or("None"),
            "ignored message from unauthorized chat"
        );
        false
    }

    /// Username whitelist membership. Users without a username are never admins.
    pub fn is_admin(&self, username: Option<&str>) -> bool {
        let Some(username) = username.map(normalize_username) else {
            return false;
        };
        !username.is_empty() && self.usernames.contains(&username)
    }
}

// ============== Rate Limiter (Sliding Window) ==============

const RATE_WINDOW: Duration = Duration::from_secs(60);
/// Idle chat windows are swept from the map once every this many checks.
const SWEEP_EVERY: u64 = 256;

type ChatWindow = Arc<Mutex<VecDeque<Instant>>>;

/// Per-chat sliding-window limiter.
///
/// Each chat owns its own window behind its own lock, so concurrent messages from
/// one chat serialize on prune-and-append while other chats proceed.
#[derive(Debug)]
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    windows: Mutex<HashMap<ChatId, ChatWindow>>,
    checks: AtomicU64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RateLimitStatus {
    pub recent: usize,
    pub max: u32,
}

impl RateLimiter {
    /// A ceiling of `0` rejects every message.
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_window: max_per_minute,
            window: RATE_WINDOW,
            windows: Mutex::new(HashMap::new()),
            checks: AtomicU64::new(0),
        }
    }

    pub async fn is_rate_limited(&self, chat_id: ChatId, rid: &RequestId) -> bool {
        self.check_at(chat_id, Instant::now(), rid).await
    }

    pub async fn check_at(&self, chat_id: ChatId, now: Instant, rid: &RequestId) -> bool {
        let window = self.window_for(chat_id, now).await;
        let mut stamps = window.lock().await;

        while let Some(front) = stamps.front() {
            if now.saturating_duration_since(*front) >= self.window {
                stamps.pop_front();
            } else {
                break;
            }
        }

        if stamps.len() >= self.max_per_window as usize {
            tracing::warn!(
                rid = %rid,
                chat_id = chat_id.0,
                rate = stamps.len() + 1,
                max = self.max_per_window,
                "rate limit triggered"
            );
            return true;
        }

        stamps.push_back(now);
        false
    }

    pub async fn status(&self, chat_id: ChatId) -> RateLimitStatus {
        let recent = match self.windows.lock().await.get(&chat_id) {
            Some(w) => w.lock().await.len(),
            None => 0,
        };
        RateLimitStatus {
            recent,
            max: self.max_per_window,
        }
    }

    /// Number of chats currently holding a window.
    pub async fn tracked_chats(&self) -> usize {
        self.windows.lock().await.len()
    }

    /// Drop windows whose every timestamp has aged out and that no check is using.
    pub async fn evict_idle_at(&self, now: Instant) {
        let mut map = self.windows.lock().await;
        evict_idle(&mut map, now, self.window);
    }

    async fn window_for(&self, chat_id: ChatId, now: Instant) -> ChatWindow {
        let mut map = self.windows.lock().await;
        if self.checks.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == SWEEP_EVERY - 1 {
            evict_idle(&mut map, now, self.window);
        }
        map.entry(chat_id)
            .or_insert_with(|| Arc::new(Mutex::new(VecDeque::new())))
            .clone()
    }
}

fn evict_idle(map: &mut HashMap<ChatId, ChatWindow>, now: Instant, window: Duration) {
    let before = map.len();
    map.retain(|_, w| {
        // Another check holds a clone; keep it.
        if Arc::strong_count(w) > 1 {
            return true;
        }
        match w.try_lock() {
            Ok(stamps) => stamps
                .back()
                .is_some_and(|last| now.saturating_duration_since(*last) < window),
            Err(_) => true,
        }
    });
    let evicted = before - map.len();
    if evicted > 0 {
        tracing::debug!(evicted, remaining = map.len(), "evicted idle rate windows");
    }
}
