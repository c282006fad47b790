use serde::{Deserialize, Serialize};

/// Sentinel for a time the source transcript did not provide.
pub const UNKNOWN_TIME: f64 = -1.0;

/// Sentinel for a word position the source did not provide.
pub const UNKNOWN_INDEX: i64 = -1;

/// One transcript word together with everything needed to trace it back to
/// its source: file, segment, timing and speaker.
///
/// `word_index` is the word's position inside its original segment. It is
/// provenance, not a position in the current document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordRecord {
    pub word: String,
    pub start_time: f64,
    pub end_time: f64,
    pub word_index: i64,
    pub segment_id: String,
    pub segment_start_time: f64,
    pub segment_end_time: f64,
    pub speaker: String,
    pub file_name: String,
    pub file_id: String,
}

impl WordRecord {
    /// A record with only the word and speaker known.
    pub fn new(word: impl Into<String>, speaker: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            start_time: UNKNOWN_TIME,
            end_time: UNKNOWN_TIME,
            word_index: UNKNOWN_INDEX,
            segment_id: String::new(),
            segment_start_time: UNKNOWN_TIME,
            segment_end_time: UNKNOWN_TIME,
            speaker: speaker.into(),
            file_name: String::new(),
            file_id: String::new(),
        }
    }

    pub fn with_times(mut self, start: f64, end: f64) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn with_segment(mut self, id: impl Into<String>, start: f64, end: f64) -> Self {
        self.segment_id = id.into();
        self.segment_start_time = start;
        self.segment_end_time = end;
        self
    }

    pub fn with_source(mut self, file_name: impl Into<String>, file_id: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self.file_id = file_id.into();
        self
    }

    pub fn with_word_index(mut self, index: i64) -> Self {
        self.word_index = index;
        self
    }

    pub fn has_timing(&self) -> bool {
        self.start_time >= 0.0 && self.end_time >= 0.0
    }

    /// True when every numeric field is a finite number.
    pub fn is_finite(&self) -> bool {
        [
            self.start_time,
            self.end_time,
            self.segment_start_time,
            self.segment_end_time,
        ]
        .iter()
        .all(|t| t.is_finite())
    }
}

/// Joins the words of `items` with single spaces.
pub fn plain_text(items: &[WordRecord]) -> String {
    items
        .iter()
        .map(|item| item.word.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Formats seconds as `mm:ss`, or `--:--` when unknown.
pub fn format_timestamp(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "--:--".to_string();
    }
    let total = seconds.floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}

#[cfg(test)]
mod tests {
    use super::{format_timestamp, plain_text, WordRecord, UNKNOWN_TIME};

    #[test]
    fn new_record_defaults_times_to_unknown() {
        let record = WordRecord::new("Hi", "A");
        assert_eq!(record.start_time, UNKNOWN_TIME);
        assert_eq!(record.segment_end_time, UNKNOWN_TIME);
        assert!(!record.has_timing());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let record = WordRecord::new("Hi", "A").with_times(1.0, 1.5);
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["startTime"], 1.0);
        assert_eq!(json["fileId"], "");
    }

    #[test]
    fn plain_text_joins_words() {
        let items = vec![WordRecord::new("Hi", "A"), WordRecord::new("there", "A")];
        assert_eq!(plain_text(&items), "Hi there");
    }

    #[test]
    fn format_timestamp_handles_unknown_and_minutes() {
        assert_eq!(format_timestamp(-1.0), "--:--");
        assert_eq!(format_timestamp(75.9), "01:15");
    }
}
