use chrono::{DateTime, Local};
use std::collections::VecDeque;

/// 履歴の最大件数
pub const HISTORY_CAPACITY: usize = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct DetectionEntry {
    pub position: String,
    pub detected_at: DateTime<Local>,
}

/// 直近の姿勢検出の履歴。新しい順に保持する。
/// 直前と同じ姿勢は追加しない（連続重複の排除）。
#[derive(Debug, Default)]
pub struct DetectionHistory {
    entries: VecDeque<DetectionEntry>,
}

impl DetectionHistory {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// 姿勢を記録する。直前のエントリと同じ姿勢なら何もしない。
    /// 追加したらtrueを返す。
    pub fn record(&mut self, position: &str, detected_at: DateTime<Local>) -> bool {
        if self.entries.front().map(|e| e.position.as_str()) == Some(position) {
            return false;
        }
        self.entries.push_front(DetectionEntry {
            position: position.to_string(),
            detected_at,
        });
        self.entries.truncate(HISTORY_CAPACITY);
        true
    }

    /// 新しい順
    pub fn iter(&self) -> impl Iterator<Item = &DetectionEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Local> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0)
            .unwrap()
            .with_timezone(&Local)
    }

    fn positions(history: &DetectionHistory) -> Vec<&str> {
        history.iter().map(|e| e.position.as_str()).collect()
    }

    #[test]
    fn test_dedup_consecutive() {
        let mut history = DetectionHistory::new();
        for (i, p) in ["A", "A", "B", "B", "B", "C"].iter().enumerate() {
            history.record(p, at(i as i64));
        }
        assert_eq!(positions(&history), vec!["C", "B", "A"]);
    }

    #[test]
    fn test_non_consecutive_duplicates_kept() {
        let mut history = DetectionHistory::new();
        history.record("A", at(0));
        history.record("B", at(1));
        history.record("A", at(2));
        assert_eq!(positions(&history), vec!["A", "B", "A"]);
    }

    #[test]
    fn test_bounded_to_capacity_newest_first() {
        let mut history = DetectionHistory::new();
        for i in 0..10 {
            let added = history.record(&format!("P{}", i), at(i));
            assert!(added);
        }
        assert_eq!(history.len(), HISTORY_CAPACITY);
        assert_eq!(positions(&history), vec!["P9", "P8", "P7", "P6", "P5"]);
    }

    #[test]
    fn test_record_returns_false_on_duplicate() {
        let mut history = DetectionHistory::new();
        assert!(history.record("A", at(0)));
        assert!(!history.record("A", at(1)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_timestamp_preserved() {
        let mut history = DetectionHistory::new();
        history.record("A", at(42));
        let entry = history.iter().next().unwrap();
        assert_eq!(entry.detected_at, at(42));
    }
}
