//! Visitor/usage ledger.
//!
//! Tracks visits, sessions, and generated documents per visitor, with
//! per-day and per-month rollups. Everything lives in one JSON document in
//! the [`KvStore`]; the visitor id persists separately with a 365-day
//! expiry so repeat runs count as the same visitor.
//!
//! Retention is trimmed on every write: the last 1000 visits, 500 document
//! records, 1000 events, 365 days of daily stats, and 24 months of monthly
//! stats. Persistence is best-effort; a corrupt stats document resets to
//! empty rather than failing.

use crate::storage::KvStore;
use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};
use uuid::Uuid;

/// Store key for the stats document.
pub const STATS_KEY: &str = "visitor_stats";
/// Store key for the persisted visitor id.
pub const VISITOR_ID_KEY: &str = "visitor_id";

const MAX_VISIT_HISTORY: usize = 1000;
const MAX_DOCUMENT_HISTORY: usize = 500;
const MAX_EVENTS: usize = 1000;
const DAILY_RETENTION_DAYS: i64 = 365;
const MONTHLY_RETENTION_MONTHS: u32 = 24;
const VISITOR_ID_TTL_DAYS: i64 = 365;

/// Counters for one day or one month.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub visits: u64,
    pub unique_visitors: u64,
    pub page_views: u64,
    pub documents_generated: u64,
}

/// One visitor's row in the visit history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisitRecord {
    pub visitor_id: String,
    pub first_visit: DateTime<Utc>,
    pub last_visit: DateTime<Utc>,
    pub total_visits: u64,
}

/// A generated document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub kind: String,
    pub timestamp: DateTime<Utc>,
    pub visitor_id: String,
    pub session_id: String,
}

/// A free-form tracked event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub name: String,
    pub data: serde_json::Value,
    pub timestamp: DateTime<Utc>,
    pub visitor_id: String,
    pub session_id: String,
}

/// The persisted stats document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VisitorStats {
    pub total_visitors: u64,
    pub unique_visitors: u64,
    pub returning_visitors: u64,
    pub page_views: u64,
    pub sessions: u64,
    pub documents_generated: u64,
    pub last_visit: Option<DateTime<Utc>>,
    pub visit_history: Vec<VisitRecord>,
    /// Keyed by `YYYY-MM-DD`.
    pub daily_stats: BTreeMap<String, PeriodStats>,
    /// Keyed by `YYYY-MM`.
    pub monthly_stats: BTreeMap<String, PeriodStats>,
    pub document_history: Vec<DocumentRecord>,
    pub events: Vec<EventRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedVisitorId {
    visitor_id: String,
    expires: DateTime<Utc>,
}

/// Visitor ledger bound to a [`KvStore`].
pub struct VisitorLedger {
    store: Arc<dyn KvStore>,
    visitor_id: String,
    session_id: String,
    stats: Mutex<VisitorStats>,
}

impl VisitorLedger {
    /// Open the ledger: load (or reset) the stats document and resolve the
    /// persistent visitor id, minting a fresh one when absent or expired.
    pub fn open(store: Arc<dyn KvStore>) -> Self {
        let now = Utc::now();
        let stats = match store.get(STATS_KEY) {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Resetting corrupt visitor stats: {}", e);
                VisitorStats::default()
            }),
            None => VisitorStats::default(),
        };

        let visitor_id = Self::resolve_visitor_id(&store, now);
        let session_id = format!("session-{}", Uuid::new_v4());
        debug!("Visitor ledger opened for '{}'", visitor_id);

        Self {
            store,
            visitor_id,
            session_id,
            stats: Mutex::new(stats),
        }
    }

    fn resolve_visitor_id(store: &Arc<dyn KvStore>, now: DateTime<Utc>) -> String {
        if let Some(raw) = store.get(VISITOR_ID_KEY) {
            if let Ok(persisted) = serde_json::from_str::<PersistedVisitorId>(&raw) {
                if persisted.expires > now {
                    return persisted.visitor_id;
                }
            }
        }
        let visitor_id = format!("visitor-{}", Uuid::new_v4());
        let persisted = PersistedVisitorId {
            visitor_id: visitor_id.clone(),
            expires: now + Duration::days(VISITOR_ID_TTL_DAYS),
        };
        if let Ok(json) = serde_json::to_string(&persisted) {
            store.put(VISITOR_ID_KEY, json);
        }
        visitor_id
    }

    pub fn visitor_id(&self) -> &str {
        &self.visitor_id
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Count a visit (one per session start).
    pub fn record_visit(&self) {
        self.record_visit_at(Utc::now());
    }

    /// Visit recording with an explicit clock, for deterministic tests.
    pub fn record_visit_at(&self, now: DateTime<Utc>) {
        let mut stats = self.lock();
        let day = day_key(now);
        let month = month_key(now);

        stats.page_views += 1;
        stats.daily_stats.entry(day.clone()).or_default().page_views += 1;
        stats
            .monthly_stats
            .entry(month.clone())
            .or_default()
            .page_views += 1;

        let existing = stats
            .visit_history
            .iter()
            .position(|v| v.visitor_id == self.visitor_id);
        match existing {
            Some(i) => {
                let record = &mut stats.visit_history[i];
                record.last_visit = now;
                record.total_visits += 1;
                stats.returning_visitors += 1;
            }
            None => {
                stats.unique_visitors += 1;
                stats.daily_stats.entry(day.clone()).or_default().unique_visitors += 1;
                stats
                    .monthly_stats
                    .entry(month.clone())
                    .or_default()
                    .unique_visitors += 1;
                stats.visit_history.push(VisitRecord {
                    visitor_id: self.visitor_id.clone(),
                    first_visit: now,
                    last_visit: now,
                    total_visits: 1,
                });
            }
        }

        stats.sessions += 1;
        if let Some(d) = stats.daily_stats.get_mut(&day) {
            d.visits += 1;
        }
        if let Some(m) = stats.monthly_stats.get_mut(&month) {
            m.visits += 1;
        }
        stats.last_visit = Some(now);
        stats.total_visitors = stats.unique_visitors + stats.returning_visitors;

        Self::trim(&mut stats, now);
        self.persist(&stats);
    }

    /// Count a generated document of the given kind (certificate,
    /// attendance-sheet, …).
    pub fn record_document(&self, kind: &str) {
        self.record_document_at(kind, Utc::now());
    }

    pub fn record_document_at(&self, kind: &str, now: DateTime<Utc>) {
        let mut stats = self.lock();
        stats.documents_generated += 1;
        if let Some(d) = stats.daily_stats.get_mut(&day_key(now)) {
            d.documents_generated += 1;
        }
        if let Some(m) = stats.monthly_stats.get_mut(&month_key(now)) {
            m.documents_generated += 1;
        }
        stats.document_history.push(DocumentRecord {
            kind: kind.to_string(),
            timestamp: now,
            visitor_id: self.visitor_id.clone(),
            session_id: self.session_id.clone(),
        });
        Self::trim(&mut stats, now);
        self.persist(&stats);
        drop(stats);

        self.record_event_at(
            "document_generated",
            serde_json::json!({ "kind": kind }),
            now,
        );
    }

    /// Record a free-form event with a JSON payload.
    pub fn record_event(&self, name: &str, data: serde_json::Value) {
        self.record_event_at(name, data, Utc::now());
    }

    pub fn record_event_at(&self, name: &str, data: serde_json::Value, now: DateTime<Utc>) {
        let mut stats = self.lock();
        stats.events.push(EventRecord {
            name: name.to_string(),
            data,
            timestamp: now,
            visitor_id: self.visitor_id.clone(),
            session_id: self.session_id.clone(),
        });
        Self::trim(&mut stats, now);
        self.persist(&stats);
    }

    /// Snapshot of the current stats.
    pub fn stats(&self) -> VisitorStats {
        self.lock().clone()
    }

    /// Clear everything and persist the empty document.
    pub fn reset(&self) {
        let mut stats = self.lock();
        *stats = VisitorStats::default();
        self.persist(&stats);
    }

    /// The last `days` days (oldest first), zero-filled where no data exists.
    pub fn daily_summary(&self, days: u32) -> Vec<(String, PeriodStats)> {
        self.daily_summary_at(days, Utc::now())
    }

    pub fn daily_summary_at(&self, days: u32, now: DateTime<Utc>) -> Vec<(String, PeriodStats)> {
        let stats = self.lock();
        (0..days)
            .rev()
            .map(|i| {
                let key = day_key(now - Duration::days(i as i64));
                let entry = stats.daily_stats.get(&key).cloned().unwrap_or_default();
                (key, entry)
            })
            .collect()
    }

    /// Pretty-printed JSON snapshot of the stats document.
    pub fn export_json(&self) -> String {
        serde_json::to_string_pretty(&*self.lock()).unwrap_or_else(|_| "{}".to_string())
    }

    /// CSV of the last `days` daily rollups, zero-filled.
    pub fn export_csv(&self, days: u32) -> String {
        let mut csv = String::from("Date,Visits,Unique Visitors,Page Views,Documents Generated\n");
        for (date, day) in self.daily_summary(days) {
            csv.push_str(&format!(
                "{},{},{},{},{}\n",
                date, day.visits, day.unique_visitors, day.page_views, day.documents_generated
            ));
        }
        csv
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VisitorStats> {
        self.stats.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn persist(&self, stats: &VisitorStats) {
        match serde_json::to_string(stats) {
            Ok(json) => self.store.put(STATS_KEY, json),
            Err(e) => warn!("Failed to serialise visitor stats: {}", e),
        }
    }

    fn trim(stats: &mut VisitorStats, now: DateTime<Utc>) {
        if stats.visit_history.len() > MAX_VISIT_HISTORY {
            let excess = stats.visit_history.len() - MAX_VISIT_HISTORY;
            stats.visit_history.drain(..excess);
        }
        if stats.document_history.len() > MAX_DOCUMENT_HISTORY {
            let excess = stats.document_history.len() - MAX_DOCUMENT_HISTORY;
            stats.document_history.drain(..excess);
        }
        if stats.events.len() > MAX_EVENTS {
            let excess = stats.events.len() - MAX_EVENTS;
            stats.events.drain(..excess);
        }

        let daily_cutoff = day_key(now - Duration::days(DAILY_RETENTION_DAYS));
        stats.daily_stats.retain(|date, _| *date >= daily_cutoff);

        let monthly_cutoff = month_key(months_back(now, MONTHLY_RETENTION_MONTHS));
        stats.monthly_stats.retain(|month, _| *month >= monthly_cutoff);
    }
}

fn day_key(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d").to_string()
}

fn month_key(t: DateTime<Utc>) -> String {
    t.format("%Y-%m").to_string()
}

/// `t` shifted back by `months` calendar months (day clamped to the 1st —
/// only the `YYYY-MM` part is ever used).
fn months_back(t: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let total = t.year() * 12 + t.month0() as i32 - months as i32;
    let (year, month0) = (total.div_euclid(12), total.rem_euclid(12));
    t.with_day(1)
        .and_then(|d| d.with_year(year))
        .and_then(|d| d.with_month0(month0 as u32))
        .unwrap_or(t)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn ledger() -> (Arc<MemoryStore>, VisitorLedger) {
        let store = Arc::new(MemoryStore::new());
        let ledger = VisitorLedger::open(store.clone());
        (store, ledger)
    }

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn first_visit_is_unique_later_ones_returning() {
        let (_, ledger) = ledger();
        ledger.record_visit_at(at(2026, 3, 1));
        let s = ledger.stats();
        assert_eq!(s.unique_visitors, 1);
        assert_eq!(s.returning_visitors, 0);
        assert_eq!(s.total_visitors, 1);

        ledger.record_visit_at(at(2026, 3, 2));
        let s = ledger.stats();
        assert_eq!(s.unique_visitors, 1);
        assert_eq!(s.returning_visitors, 1);
        assert_eq!(s.total_visitors, 2);
        assert_eq!(s.sessions, 2);
        assert_eq!(s.visit_history.len(), 1);
        assert_eq!(s.visit_history[0].total_visits, 2);
    }

    #[test]
    fn visitor_id_survives_reopen() {
        let (store, ledger) = ledger();
        let id = ledger.visitor_id().to_string();
        drop(ledger);
        let reopened = VisitorLedger::open(store);
        assert_eq!(reopened.visitor_id(), id);
    }

    #[test]
    fn expired_visitor_id_is_reminted() {
        let store = Arc::new(MemoryStore::new());
        let stale = PersistedVisitorId {
            visitor_id: "visitor-old".into(),
            expires: Utc::now() - Duration::days(1),
        };
        store.put(VISITOR_ID_KEY, serde_json::to_string(&stale).unwrap());
        let ledger = VisitorLedger::open(store);
        assert_ne!(ledger.visitor_id(), "visitor-old");
    }

    #[test]
    fn documents_roll_up_into_day_and_month() {
        let (_, ledger) = ledger();
        let now = at(2026, 3, 1);
        ledger.record_visit_at(now);
        ledger.record_document_at("certificate", now);
        ledger.record_document_at("attendance-sheet", now);

        let s = ledger.stats();
        assert_eq!(s.documents_generated, 2);
        assert_eq!(s.daily_stats["2026-03-01"].documents_generated, 2);
        assert_eq!(s.monthly_stats["2026-03"].documents_generated, 2);
        assert_eq!(s.document_history.len(), 2);
        // each document also leaves a document_generated event
        assert_eq!(s.events.len(), 2);
        assert_eq!(s.events[0].name, "document_generated");
    }

    #[test]
    fn document_history_is_trimmed_to_500() {
        let (_, ledger) = ledger();
        let now = at(2026, 3, 1);
        for _ in 0..505 {
            ledger.record_document_at("certificate", now);
        }
        let s = ledger.stats();
        assert_eq!(s.document_history.len(), 500);
        assert_eq!(s.documents_generated, 505);
    }

    #[test]
    fn old_daily_and_monthly_stats_are_pruned() {
        let (_, ledger) = ledger();
        ledger.record_visit_at(at(2023, 1, 15));
        ledger.record_visit_at(at(2026, 3, 1));
        let s = ledger.stats();
        assert!(!s.daily_stats.contains_key("2023-01-15"));
        assert!(s.daily_stats.contains_key("2026-03-01"));
        assert!(!s.monthly_stats.contains_key("2023-01"));
        assert!(s.monthly_stats.contains_key("2026-03"));
    }

    #[test]
    fn corrupt_stats_reset_to_empty() {
        let store = Arc::new(MemoryStore::new());
        store.put(STATS_KEY, "][".into());
        let ledger = VisitorLedger::open(store);
        assert_eq!(ledger.stats().page_views, 0);
    }

    #[test]
    fn csv_has_header_and_zero_filled_rows() {
        let (_, ledger) = ledger();
        let csv = ledger.export_csv(7);
        let lines: Vec<&str> = csv.trim_end().lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(
            lines[0],
            "Date,Visits,Unique Visitors,Page Views,Documents Generated"
        );
        assert!(lines[1].ends_with(",0,0,0,0"));
    }

    #[test]
    fn daily_summary_is_oldest_first() {
        let (_, ledger) = ledger();
        let now = at(2026, 3, 10);
        ledger.record_visit_at(now);
        let summary = ledger.daily_summary_at(3, now);
        assert_eq!(summary.len(), 3);
        assert_eq!(summary[0].0, "2026-03-08");
        assert_eq!(summary[2].0, "2026-03-10");
        assert_eq!(summary[2].1.visits, 1);
    }

    #[test]
    fn months_back_crosses_year_boundaries() {
        assert_eq!(month_key(months_back(at(2026, 3, 31), 24)), "2024-03");
        assert_eq!(month_key(months_back(at(2026, 1, 15), 2)), "2025-11");
    }
}
