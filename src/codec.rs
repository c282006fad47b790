//! Text wire formats for moving word records through the clipboard and
//! drag payloads.
//!
//! Two formats share [`WordRecord`]:
//!
//! * [`WireFormat::PaperCut`]: `word,start,end,index|segment,segStart,segEnd,speaker|fileName,fileId`
//! * [`WireFormat::Compact`]: `text|start|end|segment|speaker|fileId|index`
//!
//! Tokens are separated by whitespace. Neither format escapes delimiters, so a
//! field containing `,`, `|` or whitespace cannot survive a round trip; see
//! [`is_representable`].
//!
//! Decoding never fails as a whole. A token with the wrong shape, or with a
//! numeric field that is present but not a finite number, is dropped. A
//! numeric field that is absent or empty decodes as `-1`.

use crate::error::CodecError;
use crate::record::{UNKNOWN_INDEX, UNKNOWN_TIME, WordRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireFormat {
    #[default]
    #[serde(rename = "papercut")]
    PaperCut,
    Compact,
}

impl WireFormat {
    pub fn encode(self, items: &[WordRecord]) -> String {
        match self {
            WireFormat::PaperCut => encode(items),
            WireFormat::Compact => compact::encode(items),
        }
    }

    pub fn decode(self, text: &str) -> Vec<WordRecord> {
        match self {
            WireFormat::PaperCut => decode(text),
            WireFormat::Compact => compact::decode(text),
        }
    }
}

pub fn encode(items: &[WordRecord]) -> String {
    items.iter().map(encode_word).collect::<Vec<_>>().join(" ")
}

pub fn encode_word(item: &WordRecord) -> String {
    format!(
        "{},{},{},{}|{},{},{},{}|{},{}",
        item.word,
        item.start_time,
        item.end_time,
        item.word_index,
        item.segment_id,
        item.segment_start_time,
        item.segment_end_time,
        item.speaker,
        item.file_name,
        item.file_id,
    )
}

pub fn decode(text: &str) -> Vec<WordRecord> {
    decode_with(text, decode_token)
}

pub fn decode_token(token: &str) -> Result<WordRecord, CodecError> {
    let groups = split_groups(token, 3)?;
    let word_part: Vec<&str> = groups[0].split(',').collect();
    let segment_part: Vec<&str> = groups[1].split(',').collect();
    let file_part: Vec<&str> = groups[2].split(',').collect();

    let word = field(&word_part, 0);
    if word.is_empty() {
        return Err(CodecError::EmptyWord);
    }

    Ok(WordRecord {
        word: word.to_string(),
        start_time: parse_time("startTime", field(&word_part, 1))?,
        end_time: parse_time("endTime", field(&word_part, 2))?,
        word_index: parse_index("wordIndex", field(&word_part, 3))?,
        segment_id: field(&segment_part, 0).to_string(),
        segment_start_time: parse_time("segmentStartTime", field(&segment_part, 1))?,
        segment_end_time: parse_time("segmentEndTime", field(&segment_part, 2))?,
        speaker: field(&segment_part, 3).to_string(),
        file_name: field(&file_part, 0).to_string(),
        file_id: field(&file_part, 1).to_string(),
    })
}

/// True when `item` survives `decode(encode(..))` unchanged.
pub fn is_representable(item: &WordRecord) -> bool {
    let strings = [
        &item.word,
        &item.segment_id,
        &item.speaker,
        &item.file_name,
        &item.file_id,
    ];
    !item.word.is_empty()
        && item.is_finite()
        && strings.iter().all(|s| !s.contains(is_delimiter))
}

/// Replaces delimiter characters with `-` so the result is safe to embed in
/// either wire format.
pub fn sanitize_field(value: &str) -> String {
    value
        .trim()
        .chars()
        .map(|c| if is_delimiter(c) { '-' } else { c })
        .collect()
}

fn is_delimiter(c: char) -> bool {
    c == ',' || c == '|' || c.is_whitespace()
}

fn decode_with(
    text: &str,
    mut decode_one: impl FnMut(&str) -> Result<WordRecord, CodecError>,
) -> Vec<WordRecord> {
    let mut items = Vec::new();
    let mut dropped = 0usize;
    for token in text.split_whitespace() {
        match decode_one(token) {
            Ok(item) => items.push(item),
            Err(err) => {
                dropped += 1;
                debug!(token, %err, "dropping clipboard token");
            }
        }
    }
    if dropped > 0 {
        debug!(decoded = items.len(), dropped, "partial clipboard decode");
    }
    items
}

fn split_groups(token: &str, expected: usize) -> Result<Vec<&str>, CodecError> {
    let groups: Vec<&str> = token.split('|').collect();
    if groups.len() != expected {
        return Err(CodecError::GroupCount {
            expected,
            found: groups.len(),
        });
    }
    if let Some(idx) = groups.iter().position(|g| g.is_empty()) {
        return Err(CodecError::EmptyGroup(idx));
    }
    Ok(groups)
}

fn field<'a>(parts: &[&'a str], idx: usize) -> &'a str {
    parts.get(idx).copied().unwrap_or("")
}

fn parse_time(name: &'static str, raw: &str) -> Result<f64, CodecError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(UNKNOWN_TIME);
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(CodecError::InvalidNumber {
            field: name,
            value: raw.to_string(),
        }),
    }
}

fn parse_index(name: &'static str, raw: &str) -> Result<i64, CodecError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(UNKNOWN_INDEX);
    }
    raw.parse::<i64>().map_err(|_| CodecError::InvalidNumber {
        field: name,
        value: raw.to_string(),
    })
}

/// The seven-field single-`|` format used by the node-tree editing surface.
pub mod compact {
    use super::{decode_with, field, parse_index, parse_time};
    use crate::error::CodecError;
    use crate::record::{UNKNOWN_TIME, WordRecord};

    pub fn encode(items: &[WordRecord]) -> String {
        items.iter().map(encode_word).collect::<Vec<_>>().join(" ")
    }

    pub fn encode_word(item: &WordRecord) -> String {
        format!(
            "{}|{}|{}|{}|{}|{}|{}",
            item.word,
            item.start_time,
            item.end_time,
            item.segment_id,
            item.speaker,
            item.file_id,
            item.word_index,
        )
    }

    pub fn decode(text: &str) -> Vec<WordRecord> {
        decode_with(text, decode_token)
    }

    pub fn decode_token(token: &str) -> Result<WordRecord, CodecError> {
        let parts: Vec<&str> = token.split('|').collect();
        if parts.len() != 7 {
            return Err(CodecError::GroupCount {
                expected: 7,
                found: parts.len(),
            });
        }
        let word = field(&parts, 0);
        if word.is_empty() {
            return Err(CodecError::EmptyWord);
        }
        Ok(WordRecord {
            word: word.to_string(),
            start_time: parse_time("start", field(&parts, 1))?,
            end_time: parse_time("end", field(&parts, 2))?,
            word_index: parse_index("wordIndex", field(&parts, 6))?,
            segment_id: field(&parts, 3).to_string(),
            segment_start_time: UNKNOWN_TIME,
            segment_end_time: UNKNOWN_TIME,
            speaker: field(&parts, 4).to_string(),
            file_name: String::new(),
            file_id: field(&parts, 5).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{compact, decode, decode_token, encode, is_representable, sanitize_field, WireFormat};
    use crate::error::CodecError;
    use crate::record::WordRecord;

    fn hi() -> WordRecord {
        WordRecord::new("Hi", "A")
            .with_times(1.0, 1.5)
            .with_word_index(0)
            .with_segment("s1", 0.0, 5.0)
            .with_source("a.json", "f1")
    }

    #[test]
    fn encodes_single_record_in_papercut_format() {
        assert_eq!(encode(&[hi()]), "Hi,1,1.5,0|s1,0,5,A|a.json,f1");
    }

    #[test]
    fn decodes_single_record() {
        let decoded = decode("Hi,1,1.5,0|s1,0,5,A|a.json,f1");
        assert_eq!(decoded, vec![hi()]);
    }

    #[test]
    fn round_trips_representable_records() {
        let items = vec![
            hi(),
            WordRecord::new("there", "A")
                .with_times(1.5, 1.9)
                .with_word_index(1)
                .with_segment("s1", 0.0, 5.0)
                .with_source("a.json", "f1"),
            WordRecord::new("Bye", "B"),
        ];
        assert!(items.iter().all(is_representable));
        assert_eq!(decode(&encode(&items)), items);
    }

    #[test]
    fn round_trips_awkward_numbers_and_unicode_words() {
        let items = vec![
            WordRecord::new("négatif", "Zoë")
                .with_times(-2.5, -0.125)
                .with_word_index(-7)
                .with_segment("s-1", -10.0, 0.0),
            WordRecord::new("0.1+0.2", "A").with_times(0.1 + 0.2, 1.0 / 3.0),
            WordRecord::new("大きい", "話者1")
                .with_times(1e15 + 0.5, 123456789.123456789)
                .with_word_index(i64::MAX)
                .with_segment("段落", f64::MAX, f64::MIN_POSITIVE)
                .with_source("日本語.json", "f✓"),
            WordRecord::new("emoji🎙", "B").with_times(5e-324, 1e300),
        ];
        assert!(items.iter().all(is_representable));
        let decoded = decode(&encode(&items));
        assert_eq!(decoded, items);
        for (got, want) in decoded.iter().zip(&items) {
            assert_eq!(got.start_time.to_bits(), want.start_time.to_bits());
            assert_eq!(got.end_time.to_bits(), want.end_time.to_bits());
            assert_eq!(got.segment_start_time.to_bits(), want.segment_start_time.to_bits());
            assert_eq!(got.segment_end_time.to_bits(), want.segment_end_time.to_bits());
        }
    }

    #[test]
    fn negative_zero_keeps_its_sign() {
        let item = WordRecord::new("zero", "A").with_times(-0.0, 0.0);
        let text = encode(&[item]);
        assert!(text.starts_with("zero,-0,0,"));
        let decoded = decode(&text);
        assert!(decoded[0].start_time.is_sign_negative());
        assert!(decoded[0].end_time.is_sign_positive());

        let compact_item = &compact::decode(&compact::encode(&decoded))[0];
        assert!(compact_item.start_time.is_sign_negative());
    }

    #[test]
    fn floats_are_written_as_shortest_round_tripping_decimals() {
        let item = WordRecord::new("w", "A").with_times(0.1 + 0.2, 2.0);
        assert!(encode(&[item]).starts_with("w,0.30000000000000004,2,"));
    }

    #[test]
    fn tokens_are_space_joined() {
        let text = encode(&[hi(), hi()]);
        assert_eq!(text.split(' ').count(), 2);
    }

    #[test]
    fn garbage_without_pipes_decodes_to_nothing() {
        assert!(decode("garbage-no-pipes").is_empty());
        assert!(decode("").is_empty());
        assert!(decode("   \n\t ").is_empty());
    }

    #[test]
    fn malformed_tokens_are_dropped_and_the_rest_kept() {
        let text = format!("{} a|b {} ||| x,1|y|", encode(&[hi()]), encode(&[hi()]));
        assert_eq!(decode(&text).len(), 2);
    }

    #[test]
    fn missing_numeric_fields_default_to_unknown() {
        let item = decode_token("Hi|s1,,,A|a.json,f1").expect("decodes");
        assert_eq!(item.start_time, -1.0);
        assert_eq!(item.end_time, -1.0);
        assert_eq!(item.word_index, -1);
        assert_eq!(item.segment_start_time, -1.0);
        assert_eq!(item.speaker, "A");
    }

    #[test]
    fn non_numeric_field_drops_the_token() {
        let err = decode_token("Hi,abc,1,0|s1,0,5,A|a.json,f1").unwrap_err();
        assert_eq!(
            err,
            CodecError::InvalidNumber {
                field: "startTime",
                value: "abc".to_string()
            }
        );
        assert!(decode("Hi,NaN,1,0|s1,0,5,A|a.json,f1").is_empty());
        assert!(decode("Hi,1,1,zero|s1,0,5,A|a.json,f1").is_empty());
    }

    #[test]
    fn wrong_group_count_is_reported() {
        assert_eq!(
            decode_token("a|b").unwrap_err(),
            CodecError::GroupCount {
                expected: 3,
                found: 2
            }
        );
        assert_eq!(decode_token("|b|c").unwrap_err(), CodecError::EmptyGroup(0));
        assert_eq!(decode_token(",1|b|c").unwrap_err(), CodecError::EmptyWord);
    }

    #[test]
    fn delimiter_in_field_is_not_representable() {
        let mut item = hi();
        item.speaker = "Speaker One".to_string();
        assert!(!is_representable(&item));
        assert_ne!(decode(&encode(&[item.clone()])), vec![item]);
    }

    #[test]
    fn sanitize_field_replaces_delimiters() {
        assert_eq!(sanitize_field(" John Smith, Jr| "), "John-Smith--Jr-");
    }

    #[test]
    fn compact_format_round_trips_the_fields_it_carries() {
        let text = compact::encode(&[hi()]);
        assert_eq!(text, "Hi|1|1.5|s1|A|f1|0");
        let decoded = compact::decode(&text);
        assert_eq!(decoded.len(), 1);
        let item = &decoded[0];
        assert_eq!(item.word, "Hi");
        assert_eq!(item.end_time, 1.5);
        assert_eq!(item.file_id, "f1");
        assert_eq!(item.word_index, 0);
        assert_eq!(item.segment_start_time, -1.0);
        assert_eq!(item.file_name, "");
    }

    #[test]
    fn compact_decoder_rejects_papercut_tokens_and_vice_versa() {
        assert!(compact::decode(&encode(&[hi()])).is_empty());
        assert!(decode(&compact::encode(&[hi()])).is_empty());
    }

    #[test]
    fn wire_format_dispatches_by_variant() {
        let items = vec![hi()];
        assert_eq!(WireFormat::PaperCut.decode(&WireFormat::PaperCut.encode(&items)), items);
        assert_eq!(WireFormat::Compact.decode(&WireFormat::Compact.encode(&items)).len(), 1);
    }
}
