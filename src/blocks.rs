//! Speaker blocks derived from the flat word list.
//!
//! Blocks are a view: they are rebuilt from the content after every change
//! and get fresh ids each time. Concatenating the items of all blocks always
//! reproduces the content.

use crate::id::IdGenerator;
use crate::record::WordRecord;
use std::ops::Range;

pub type BlockId = String;

pub const DEFAULT_MAX_GAP_SECONDS: f64 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub id: BlockId,
    pub speaker: String,
    /// Content offset of the first item.
    pub start: usize,
    pub items: Vec<WordRecord>,
}

impl Block {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn end(&self) -> usize {
        self.start + self.items.len()
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end()
    }

    /// Start time of the first timed word, if any.
    pub fn start_time(&self) -> Option<f64> {
        self.items
            .iter()
            .find(|item| item.start_time >= 0.0)
            .map(|item| item.start_time)
    }
}

/// When a new block starts.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SegmentationRule {
    /// A new block on every speaker change.
    #[default]
    Speaker,
    /// Also start a new block when the silence between two timed words
    /// exceeds `max_gap` seconds.
    SpeakerOrGap { max_gap: f64 },
}

impl SegmentationRule {
    pub fn speaker_or_gap() -> Self {
        SegmentationRule::SpeakerOrGap {
            max_gap: DEFAULT_MAX_GAP_SECONDS,
        }
    }

    pub fn breaks_between(&self, prev: &WordRecord, next: &WordRecord) -> bool {
        if prev.speaker != next.speaker {
            return true;
        }
        match *self {
            SegmentationRule::Speaker => false,
            SegmentationRule::SpeakerOrGap { max_gap } => {
                prev.end_time >= 0.0
                    && next.start_time >= 0.0
                    && next.start_time - prev.end_time > max_gap
            }
        }
    }
}

/// Groups `content` into blocks under `rule`.
pub fn derive_blocks(
    content: &[WordRecord],
    rule: SegmentationRule,
    ids: &mut dyn IdGenerator,
) -> Vec<Block> {
    derive_blocks_with_splits(content, &[], rule, ids)
}

/// Like [`derive_blocks`], but an item whose entry in `splits` is `true`
/// always opens a new block. Missing entries count as `false`.
pub fn derive_blocks_with_splits(
    content: &[WordRecord],
    splits: &[bool],
    rule: SegmentationRule,
    ids: &mut dyn IdGenerator,
) -> Vec<Block> {
    let mut blocks: Vec<Block> = Vec::new();
    for (idx, item) in content.iter().enumerate() {
        let forced = splits.get(idx).copied().unwrap_or(false);
        let opens = match blocks.last() {
            None => true,
            Some(current) => {
                forced
                    || current
                        .items
                        .last()
                        .is_some_and(|prev| rule.breaks_between(prev, item))
            }
        };
        if opens {
            blocks.push(Block {
                id: ids.next_id(),
                speaker: item.speaker.clone(),
                start: idx,
                items: Vec::new(),
            });
        }
        if let Some(current) = blocks.last_mut() {
            current.items.push(item.clone());
        }
    }
    blocks
}

pub fn flatten(blocks: &[Block]) -> Vec<WordRecord> {
    blocks
        .iter()
        .flat_map(|block| block.items.iter().cloned())
        .collect()
}

pub fn find_block<'a>(blocks: &'a [Block], id: &str) -> Option<(usize, &'a Block)> {
    blocks.iter().enumerate().find(|(_, block)| block.id == id)
}

/// Index of the block holding content item `item`.
pub fn block_index_of_item(blocks: &[Block], item: usize) -> Option<usize> {
    blocks.iter().position(|block| block.range().contains(&item))
}
