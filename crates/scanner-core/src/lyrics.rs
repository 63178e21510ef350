use serde::{Deserialize, Serialize};

/// Ordered lines of unsynced lyrics. Empty strings are blank lines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlainLyrics(pub Vec<String>);

impl PlainLyrics {
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|line| line.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncedLine {
    pub timestamp: f64,
    pub content: String,
}

/// Ordered ascending by `timestamp`. Construct via [`SyncedLyrics::new`],
/// which enforces the sort invariant rather than trusting callers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SyncedLyrics(pub Vec<SyncedLine>);

impl SyncedLyrics {
    pub fn new(mut lines: Vec<SyncedLine>) -> Self {
        lines.sort_by(|a, b| a.timestamp.total_cmp(&b.timestamp));
        Self(lines)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Projects to [`PlainLyrics`] by dropping timestamps.
    pub fn to_plain(&self) -> PlainLyrics {
        PlainLyrics(self.0.iter().map(|l| l.content.clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_sorts_ascending_by_timestamp() {
        let lyrics = SyncedLyrics::new(vec![
            SyncedLine { timestamp: 5.0, content: "b".into() },
            SyncedLine { timestamp: 2.0, content: "a".into() },
        ]);
        assert_eq!(lyrics.0[0].timestamp, 2.0);
        assert_eq!(lyrics.0[1].timestamp, 5.0);
    }

    #[test]
    fn to_plain_projects_content_in_order() {
        let lyrics = SyncedLyrics::new(vec![
            SyncedLine { timestamp: 1.0, content: "one".into() },
            SyncedLine { timestamp: 2.0, content: "two".into() },
        ]);
        assert_eq!(lyrics.to_plain().0, vec!["one".to_string(), "two".to_string()]);
    }
}
