//! Session history
//!
//! Append-only, in-memory list of finished sessions. The side panel shows the
//! most recent few, newest first.

use serde::{Deserialize, Serialize};

/// Snapshot of one finished session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub score: u64,
    pub hits: u32,
    pub misses: u32,
    /// hits / balloons spawned, rounded to a whole percent
    pub accuracy: u32,
    pub max_combo: u32,
    /// Unix timestamp (ms) when the session ended
    pub timestamp: f64,
}

/// History of finished sessions, oldest first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameHistory {
    records: Vec<GameRecord>,
}

impl GameHistory {
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record, returning its 1-indexed game number
    pub fn push(&mut self, record: GameRecord) -> usize {
        self.records.push(record);
        self.records.len()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&GameRecord> {
        self.records.last()
    }

    /// Up to `n` most recent records, newest first, paired with their game number
    pub fn recent(&self, n: usize) -> impl Iterator<Item = (usize, &GameRecord)> {
        self.records
            .iter()
            .enumerate()
            .rev()
            .take(n)
            .map(|(i, r)| (i + 1, r))
    }

    /// Best score across all sessions
    pub fn best_score(&self) -> Option<u64> {
        self.records.iter().map(|r| r.score).max()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.records).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    let now = js_sys::Date::now();
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;

    if diff_hours >= 24.0 {
        let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
        format!(
            "{}/{}/{}",
            date.get_month() + 1,
            date.get_date(),
            date.get_full_year() % 100
        )
    } else if diff_hours >= 1.0 {
        format!("{} h ago", diff_hours.floor() as i32)
    } else if diff_mins >= 1.0 {
        format!("{} min ago", diff_mins.floor() as i32)
    } else {
        "Just now".to_string()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(_timestamp: f64) -> String {
    "N/A".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: u64) -> GameRecord {
        GameRecord {
            score,
            hits: 1,
            misses: 0,
            accuracy: 100,
            max_combo: 1,
            timestamp: 0.0,
        }
    }

    #[test]
    fn recent_is_newest_first_and_numbered() {
        let mut history = GameHistory::new();
        for score in [10, 20, 30, 40, 50, 60] {
            history.push(record(score));
        }

        let recent: Vec<_> = history.recent(5).map(|(n, r)| (n, r.score)).collect();
        assert_eq!(recent, vec![(6, 60), (5, 50), (4, 40), (3, 30), (2, 20)]);
    }

    #[test]
    fn append_only() {
        let mut history = GameHistory::new();
        assert!(history.is_empty());
        assert_eq!(history.push(record(5)), 1);
        assert_eq!(history.push(record(3)), 2);
        assert_eq!(history.latest().map(|r| r.score), Some(3));
        assert_eq!(history.best_score(), Some(5));
    }

    #[test]
    fn json_lists_records_oldest_first() {
        let mut history = GameHistory::new();
        assert_eq!(history.to_json(), "[]");
        history.push(record(7));
        history.push(record(9));
        let value: serde_json::Value = serde_json::from_str(&history.to_json()).unwrap();
        let scores: Vec<u64> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["score"].as_u64().unwrap())
            .collect();
        assert_eq!(scores, vec![7, 9]);
    }
}
