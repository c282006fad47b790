//! Addressing edit points as `(block, offset)` pairs.
//!
//! An offset is a gap: `0` is before the first word of the block and
//! `block.len()` is after the last one. The end of one block and the start of
//! the next name the same content gap but different caret positions, which
//! decides where a paste lands.

use crate::blocks::{find_block, Block, BlockId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub block_id: BlockId,
    pub word_index: usize,
}

impl CursorPosition {
    pub fn new(block_id: impl Into<BlockId>, word_index: usize) -> Self {
        Self {
            block_id: block_id.into(),
            word_index,
        }
    }
}

/// Which block a gap on a block boundary belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    /// The end of the earlier block.
    Upstream,
    /// The start of the later block.
    Downstream,
}

/// Content gap named by `pos`, or `None` if its block is gone or the offset
/// is past the end of the block.
pub fn resolve(blocks: &[Block], pos: &CursorPosition) -> Option<usize> {
    let (_, block) = find_block(blocks, &pos.block_id)?;
    (pos.word_index <= block.len()).then(|| block.start + pos.word_index)
}

/// Content index of the item at `offset` inside `block_id`.
pub fn resolve_item(blocks: &[Block], block_id: &str, offset: usize) -> Option<usize> {
    let (_, block) = find_block(blocks, block_id)?;
    (offset < block.len()).then(|| block.start + offset)
}

/// Caret position for content gap `gap`.
pub fn locate(blocks: &[Block], gap: usize, affinity: Affinity) -> Option<CursorPosition> {
    let last = blocks.last()?;
    if gap > last.end() {
        return None;
    }
    let found = match affinity {
        Affinity::Downstream => blocks
            .iter()
            .find(|block| gap >= block.start && gap < block.end())
            .or(Some(last)),
        Affinity::Upstream => blocks
            .iter()
            .find(|block| gap > block.start && gap <= block.end())
            .or(blocks.first()),
    }?;
    Some(CursorPosition::new(found.id.clone(), gap - found.start))
}

pub fn move_left(blocks: &[Block], pos: &CursorPosition) -> Option<CursorPosition> {
    let (idx, _) = find_block(blocks, &pos.block_id)?;
    if pos.word_index > 0 {
        return Some(CursorPosition::new(pos.block_id.clone(), pos.word_index - 1));
    }
    if idx == 0 {
        return Some(pos.clone());
    }
    let prev = &blocks[idx - 1];
    Some(CursorPosition::new(prev.id.clone(), prev.len()))
}

pub fn move_right(blocks: &[Block], pos: &CursorPosition) -> Option<CursorPosition> {
    let (idx, block) = find_block(blocks, &pos.block_id)?;
    if pos.word_index < block.len() {
        return Some(CursorPosition::new(pos.block_id.clone(), pos.word_index + 1));
    }
    match blocks.get(idx + 1) {
        Some(next) => Some(CursorPosition::new(next.id.clone(), 0)),
        None => Some(CursorPosition::new(block.id.clone(), block.len())),
    }
}

/// Same offset (clamped) in the previous (`delta < 0`) or next block.
pub fn move_block(blocks: &[Block], pos: &CursorPosition, delta: isize) -> Option<CursorPosition> {
    let (idx, _) = find_block(blocks, &pos.block_id)?;
    let target = idx.checked_add_signed(delta)?.min(blocks.len().saturating_sub(1));
    let block = blocks.get(target)?;
    Some(CursorPosition::new(
        block.id.clone(),
        pos.word_index.min(block.len()),
    ))
}

pub fn block_start(blocks: &[Block], pos: &CursorPosition) -> Option<CursorPosition> {
    find_block(blocks, &pos.block_id).map(|(_, block)| CursorPosition::new(block.id.clone(), 0))
}

pub fn block_end(blocks: &[Block], pos: &CursorPosition) -> Option<CursorPosition> {
    find_block(blocks, &pos.block_id)
        .map(|(_, block)| CursorPosition::new(block.id.clone(), block.len()))
}

/// Caret after the last word of the document.
pub fn document_end(blocks: &[Block]) -> Option<CursorPosition> {
    blocks
        .last()
        .map(|block| CursorPosition::new(block.id.clone(), block.len()))
}

#[cfg(test)]
mod tests {
    use super::{
        block_end, document_end, locate, move_block, move_left, move_right, resolve,
        resolve_item, Affinity, CursorPosition,
    };
    use crate::blocks::{derive_blocks, Block, SegmentationRule};
    use crate::id::SequentialIdGen;
    use crate::record::WordRecord;

    fn blocks() -> Vec<Block> {
        let content = vec![
            WordRecord::new("Hi", "A"),
            WordRecord::new("there", "A"),
            WordRecord::new("Bye", "B"),
        ];
        derive_blocks(&content, SegmentationRule::Speaker, &mut SequentialIdGen::default())
    }

    #[test]
    fn resolves_gaps_and_rejects_stale_positions() {
        let blocks = blocks();
        assert_eq!(resolve(&blocks, &CursorPosition::new("block-0", 2)), Some(2));
        assert_eq!(resolve(&blocks, &CursorPosition::new("block-1", 1)), Some(3));
        assert_eq!(resolve(&blocks, &CursorPosition::new("block-1", 2)), None);
        assert_eq!(resolve(&blocks, &CursorPosition::new("gone", 0)), None);
        assert_eq!(resolve_item(&blocks, "block-0", 1), Some(1));
        assert_eq!(resolve_item(&blocks, "block-0", 2), None);
    }

    #[test]
    fn locate_honours_affinity_on_block_boundaries() {
        let blocks = blocks();
        assert_eq!(
            locate(&blocks, 2, Affinity::Downstream),
            Some(CursorPosition::new("block-1", 0))
        );
        assert_eq!(
            locate(&blocks, 2, Affinity::Upstream),
            Some(CursorPosition::new("block-0", 2))
        );
        assert_eq!(
            locate(&blocks, 0, Affinity::Upstream),
            Some(CursorPosition::new("block-0", 0))
        );
        assert_eq!(
            locate(&blocks, 3, Affinity::Downstream),
            Some(CursorPosition::new("block-1", 1))
        );
        assert_eq!(locate(&blocks, 4, Affinity::Downstream), None);
        assert_eq!(locate(&[], 0, Affinity::Downstream), None);
    }

    #[test]
    fn horizontal_moves_visit_both_sides_of_a_boundary() {
        let blocks = blocks();
        let end_of_a = CursorPosition::new("block-0", 2);
        let start_of_b = move_right(&blocks, &end_of_a).expect("move");
        assert_eq!(start_of_b, CursorPosition::new("block-1", 0));
        assert_eq!(move_left(&blocks, &start_of_b), Some(end_of_a));
        let doc_start = CursorPosition::new("block-0", 0);
        assert_eq!(move_left(&blocks, &doc_start), Some(doc_start));
        let doc_end = document_end(&blocks).expect("end");
        assert_eq!(move_right(&blocks, &doc_end), Some(doc_end));
    }

    #[test]
    fn vertical_moves_clamp_offset() {
        let blocks = blocks();
        let pos = CursorPosition::new("block-0", 2);
        assert_eq!(
            move_block(&blocks, &pos, 1),
            Some(CursorPosition::new("block-1", 1))
        );
        assert_eq!(move_block(&blocks, &pos, -1), None);
        assert_eq!(
            block_end(&blocks, &CursorPosition::new("block-1", 0)),
            Some(CursorPosition::new("block-1", 1))
        );
    }
}
