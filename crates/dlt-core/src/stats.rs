//! Daily translation statistics.
//!
//! Counters live in memory and are rewritten in full to `stats_YYYY-MM-DD.json`
//! after every change. A missing or unreadable file starts the day from zero.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::orchestrator::OutcomeKind;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyCounters {
    pub total: u64,
    pub a_to_b: u64,
    pub b_to_a: u64,
    pub other_to_dual: u64,
    pub partial_dual: u64,
    pub failed: u64,
}

impl DailyCounters {
    pub fn get(&self, kind: OutcomeKind) -> u64 {
        match kind {
            OutcomeKind::AtoB => self.a_to_b,
            OutcomeKind::BtoA => self.b_to_a,
            OutcomeKind::OtherToDualFull => self.other_to_dual,
            OutcomeKind::OtherToDualPartial => self.partial_dual,
            OutcomeKind::Failed => self.failed,
        }
    }

    fn slot(&mut self, kind: OutcomeKind) -> &mut u64 {
        match kind {
            OutcomeKind::AtoB => &mut self.a_to_b,
            OutcomeKind::BtoA => &mut self.b_to_a,
            OutcomeKind::OtherToDualFull => &mut self.other_to_dual,
            OutcomeKind::OtherToDualPartial => &mut self.partial_dual,
            OutcomeKind::Failed => &mut self.failed,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub date: NaiveDate,
    pub counters: DailyCounters,
}

#[derive(Debug)]
struct StatsState {
    date: NaiveDate,
    counters: DailyCounters,
    version: u64,
}

/// Shared counter set for every pipeline instance.
///
/// Increments serialize on a short in-memory lock; the file write happens after
/// that lock is released, under a separate writer lock that drops stale snapshots.
#[derive(Debug)]
pub struct StatsAggregator {
    dir: PathBuf,
    state: Mutex<StatsState>,
    /// Version of the last snapshot written to disk.
    written: Mutex<u64>,
}

impl StatsAggregator {
    /// Load today's counters from `dir`.
    pub fn load(dir: impl Into<PathBuf>) -> Self {
        Self::load_for(dir, Local::now().date_naive())
    }

    pub fn load_for(dir: impl Into<PathBuf>, date: NaiveDate) -> Self {
        let dir = dir.into();
        let counters = read_counters(&stats_path(&dir, date));
        Self {
            dir,
            state: Mutex::new(StatsState {
                date,
                counters,
                version: 0,
            }),
            written: Mutex::new(0),
        }
    }

    pub fn path_for(&self, date: NaiveDate) -> PathBuf {
        stats_path(&self.dir, date)
    }

    /// Count one processed message: its outcome counter, plus `total` on success.
    pub async fn record(&self, kind: OutcomeKind) -> StatsSnapshot {
        self.record_on(kind, Local::now().date_naive()).await
    }

    pub async fn record_on(&self, kind: OutcomeKind, date: NaiveDate) -> StatsSnapshot {
        self.update(date, |c| {
            *c.slot(kind) += 1;
            if kind.is_success() {
                c.total += 1;
            }
        })
        .await
    }

    /// Bump only the counter named by `kind`.
    pub async fn increment(&self, kind: OutcomeKind) -> StatsSnapshot {
        self.update(Local::now().date_naive(), |c| *c.slot(kind) += 1)
            .await
    }

    /// Bump `total` when the message produced at least one reply part.
    pub async fn increment_total_if_any_success(&self, has_reply: bool) -> StatsSnapshot {
        if !has_reply {
            return self.snapshot().await;
        }
        self.update(Local::now().date_naive(), |c| c.total += 1)
            .await
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        self.snapshot_on(Local::now().date_naive()).await
    }

    /// Current counters as of `date`; a new date starts from zero.
    pub async fn snapshot_on(&self, date: NaiveDate) -> StatsSnapshot {
        let mut st = self.state.lock().await;
        roll_over(&mut st, date);
        StatsSnapshot {
            date: st.date,
            counters: st.counters,
        }
    }

    async fn update(&self, date: NaiveDate, apply: impl FnOnce(&mut DailyCounters)) -> StatsSnapshot {
        let (snapshot, version) = {
            let mut st = self.state.lock().await;
            roll_over(&mut st, date);
            apply(&mut st.counters);
            st.version += 1;
            (
                StatsSnapshot {
                    date: st.date,
                    counters: st.counters,
                },
                st.version,
            )
        };

        self.persist(snapshot, version).await;
        snapshot
    }

    async fn persist(&self, snapshot: StatsSnapshot, version: u64) {
        // Versions are global across dates, so an older snapshot never lands after a newer one.
        let mut written = self.written.lock().await;
        if version <= *written {
            return;
        }

        let path = self.path_for(snapshot.date);
        match write_counters(&path, &snapshot.counters).await {
            Ok(()) => *written = version,
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "failed to save statistics")
            }
        }
    }
}

fn roll_over(st: &mut StatsState, date: NaiveDate) {
    if st.date == date {
        return;
    }
    tracing::info!(from = %st.date, to = %date, "date rolled over, starting new statistics");
    st.date = date;
    st.counters = DailyCounters::default();
}

fn stats_path(dir: &Path, date: NaiveDate) -> PathBuf {
    dir.join(format!("stats_{}.json", date.format("%Y-%m-%d")))
}

fn read_counters(path: &Path) -> DailyCounters {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return DailyCounters::default(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "statistics file unreadable, re-initializing");
            return DailyCounters::default();
        }
    };

    match serde_json::from_str::<DailyCounters>(&raw) {
        Ok(c) => c,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "statistics file corrupted, re-initializing");
            DailyCounters::default()
        }
    }
}

async fn write_counters(path: &Path, counters: &DailyCounters) -> crate::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(counters)?;
    tokio::fs::write(path, json).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn counters_follow_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsAggregator::load_for(dir.path(), day(1));

        let outcomes = [
            OutcomeKind::AtoB,
            OutcomeKind::AtoB,
            OutcomeKind::BtoA,
            OutcomeKind::OtherToDualFull,
            OutcomeKind::OtherToDualPartial,
            OutcomeKind::Failed,
            OutcomeKind::Failed,
        ];
        for kind in outcomes {
            stats.record_on(kind, day(1)).await;
        }

        let c = stats.snapshot_on(day(1)).await.counters;
        assert_eq!(c.total, 5);
        for kind in OutcomeKind::ALL {
            let expected = outcomes.iter().filter(|k| **k == kind).count() as u64;
            assert_eq!(c.get(kind), expected, "{}", kind.counter_name());
        }
        let named: u64 = OutcomeKind::ALL.iter().map(|k| c.get(*k)).sum();
        assert_eq!(named, outcomes.len() as u64);
    }

    #[tokio::test]
    async fn persisted_counters_survive_reload() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsAggregator::load_for(dir.path(), day(2));
        stats.record_on(OutcomeKind::BtoA, day(2)).await;
        stats.record_on(OutcomeKind::OtherToDualPartial, day(2)).await;
        stats.record_on(OutcomeKind::Failed, day(2)).await;
        let before = stats.snapshot_on(day(2)).await.counters;

        let reloaded = StatsAggregator::load_for(dir.path(), day(2));
        assert_eq!(reloaded.snapshot_on(day(2)).await.counters, before);

        let raw = std::fs::read_to_string(stats.path_for(day(2))).unwrap();
        let v: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(v["total"], 2);
        assert_eq!(v["partial_dual"], 1);
    }

    #[tokio::test]
    async fn corrupted_file_starts_from_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = stats_path(dir.path(), day(3));
        std::fs::write(&path, "{ not json").unwrap();

        let stats = StatsAggregator::load_for(dir.path(), day(3));
        assert_eq!(stats.snapshot_on(day(3)).await.counters, DailyCounters::default());

        stats.record_on(OutcomeKind::AtoB, day(3)).await;
        let reloaded = StatsAggregator::load_for(dir.path(), day(3));
        assert_eq!(reloaded.snapshot_on(day(3)).await.counters.a_to_b, 1);
    }

    #[tokio::test]
    async fn new_date_replaces_counters() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsAggregator::load_for(dir.path(), day(4));
        stats.record_on(OutcomeKind::AtoB, day(4)).await;
        let snap = stats.record_on(OutcomeKind::BtoA, day(5)).await;

        assert_eq!(snap.date, day(5));
        assert_eq!(snap.counters.a_to_b, 0);
        assert_eq!(snap.counters.b_to_a, 1);
        assert!(stats.path_for(day(4)).exists());
        assert!(stats.path_for(day(5)).exists());
    }

    #[tokio::test]
    async fn snapshot_after_midnight_reports_the_new_day() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsAggregator::load_for(dir.path(), day(7));
        stats.record_on(OutcomeKind::AtoB, day(7)).await;

        let snap = stats.snapshot_on(day(8)).await;
        assert_eq!(snap.date, day(8));
        assert_eq!(snap.counters, DailyCounters::default());

        let snap = stats.record_on(OutcomeKind::BtoA, day(8)).await;
        assert_eq!((snap.counters.total, snap.counters.b_to_a), (1, 1));
    }

    #[tokio::test]
    async fn late_write_for_the_previous_day_does_not_unlock_stale_writes() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsAggregator::load_for(dir.path(), day(9));
        let snap = |date, total| StatsSnapshot {
            date,
            counters: DailyCounters {
                total,
                ..Default::default()
            },
        };

        stats.persist(snap(day(10), 5), 3).await;
        stats.persist(snap(day(9), 9), 2).await;
        stats.persist(snap(day(10), 4), 1).await;

        let reloaded = StatsAggregator::load_for(dir.path(), day(10));
        assert_eq!(reloaded.snapshot_on(day(10)).await.counters.total, 5);
        assert!(!stats.path_for(day(9)).exists());
    }

    #[tokio::test]
    async fn split_increments_match_record() {
        let dir = tempfile::tempdir().unwrap();
        let stats = StatsAggregator::load(dir.path());
        stats.increment(OutcomeKind::Failed).await;
        stats.increment_total_if_any_success(false).await;
        stats.increment(OutcomeKind::AtoB).await;
        let c = stats.increment_total_if_any_success(true).await.counters;
        assert_eq!((c.total, c.failed, c.a_to_b), (1, 1, 1));
    }

    #[tokio::test]
    async fn concurrent_records_are_all_counted_and_last_write_wins() {
        let dir = tempfile::tempdir().unwrap();
        let stats = Arc::new(StatsAggregator::load_for(dir.path(), day(6)));

        let mut handles = Vec::new();
        for i in 0..64 {
            let stats = stats.clone();
            let kind = OutcomeKind::ALL[i % OutcomeKind::ALL.len()];
            handles.push(tokio::spawn(async move {
                stats.record_on(kind, day(6)).await;
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let c = stats.snapshot_on(day(6)).await.counters;
        assert_eq!(c.total + c.failed, 64);
        let reloaded = StatsAggregator::load_for(dir.path(), day(6));
        assert_eq!(reloaded.snapshot_on(day(6)).await.counters, c);
    }
}
