//! The mutation engine: every change to a PaperCut's word list goes through
//! [`Document`].
//!
//! Content is the only source of truth. After each change the blocks are
//! derived again and the cursor is carried over through its absolute content
//! gap, so callers may hold on to a `CursorPosition` only until the next
//! mutation. Lookups with a stale block id are no-ops that return `false`.

use crate::blocks::{derive_blocks_with_splits, find_block, Block, SegmentationRule};
use crate::codec::sanitize_field;
use crate::colors::{SpeakerColors, SpeakerPalette};
use crate::cursor::{self, Affinity, CursorPosition};
use crate::id::{IdGenerator, SequentialIdGen};
use crate::record::WordRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Range;
use tracing::debug;

/// Where a dragged block lands relative to its drop target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPosition {
    Above,
    Below,
}

/// A saved editor state. Snapshots are never modified after they are taken.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorSnapshot {
    pub blocks: Vec<Block>,
    pub content: Vec<WordRecord>,
    pub splits: Vec<bool>,
    pub cursor: Option<CursorPosition>,
    pub speaker_color_indices: HashMap<String, usize>,
}

pub struct Document {
    content: Vec<WordRecord>,
    splits: Vec<bool>,
    blocks: Vec<Block>,
    cursor: Option<CursorPosition>,
    colors: SpeakerColors,
    rule: SegmentationRule,
    ids: Box<dyn IdGenerator>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new(SegmentationRule::default())
    }
}

impl Document {
    pub fn new(rule: SegmentationRule) -> Self {
        Self::with_ids(rule, Box::new(SequentialIdGen::default()))
    }

    pub fn with_ids(rule: SegmentationRule, ids: Box<dyn IdGenerator>) -> Self {
        Self {
            content: Vec::new(),
            splits: Vec::new(),
            blocks: Vec::new(),
            cursor: None,
            colors: SpeakerColors::new(),
            rule,
            ids,
        }
    }

    pub fn from_content(content: Vec<WordRecord>, rule: SegmentationRule) -> Self {
        let mut doc = Self::new(rule);
        doc.set_content(content, Vec::new());
        doc
    }

    pub fn content(&self) -> &[WordRecord] {
        &self.content
    }

    pub fn splits(&self) -> &[bool] {
        &self.splits
    }

    /// Content offsets carrying a split mark.
    pub fn split_offsets(&self) -> Vec<usize> {
        self.splits
            .iter()
            .enumerate()
            .filter_map(|(idx, &split)| split.then_some(idx))
            .collect()
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        find_block(&self.blocks, id).map(|(_, block)| block)
    }

    pub fn cursor(&self) -> Option<&CursorPosition> {
        self.cursor.as_ref()
    }

    pub fn rule(&self) -> SegmentationRule {
        self.rule
    }

    pub fn colors(&self) -> &SpeakerColors {
        &self.colors
    }

    pub fn palette_for(&mut self, speaker: &str) -> SpeakerPalette {
        self.colors.palette_for(speaker)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn len(&self) -> usize {
        self.content.len()
    }

    /// Absolute content gap of the cursor.
    pub fn cursor_gap(&self) -> Option<usize> {
        self.cursor
            .as_ref()
            .and_then(|pos| cursor::resolve(&self.blocks, pos))
    }

    /// Moves the cursor. An unknown block or out of range offset leaves the
    /// cursor where it was.
    pub fn set_cursor(&mut self, pos: Option<CursorPosition>) -> bool {
        match pos {
            None => {
                self.cursor = None;
                true
            }
            Some(pos) => {
                if cursor::resolve(&self.blocks, &pos).is_none() {
                    debug!(block = %pos.block_id, offset = pos.word_index, "ignoring stale cursor");
                    return false;
                }
                self.cursor = Some(pos);
                true
            }
        }
    }

    pub fn set_rule(&mut self, rule: SegmentationRule) {
        if self.rule == rule {
            return;
        }
        let carried = self.carry_cursor();
        self.rule = rule;
        self.rebuild();
        self.restore_carried(carried);
    }

    /// Replaces the whole content. `splits` may be shorter than `content`;
    /// missing entries mean no split mark.
    pub fn set_content(&mut self, content: Vec<WordRecord>, mut splits: Vec<bool>) -> bool {
        splits.resize(content.len(), false);
        let changed = content != self.content || splits != self.splits;
        self.content = content;
        self.splits = splits;
        self.cursor = None;
        self.rebuild();
        changed
    }

    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot {
            blocks: self.blocks.clone(),
            content: self.content.clone(),
            splits: self.splits.clone(),
            cursor: self.cursor.clone(),
            speaker_color_indices: self.colors.indices().clone(),
        }
    }

    /// Puts the document back into `snapshot`'s state. Blocks are derived
    /// again under the current rule, which may differ from the one the
    /// snapshot was taken under; the cursor keeps its content gap. Speaker
    /// colours are only ever added to, never rolled back.
    pub fn restore(&mut self, snapshot: &EditorSnapshot) {
        let carried = snapshot.cursor.as_ref().and_then(|pos| {
            cursor::resolve(&snapshot.blocks, pos).map(|gap| (gap, affinity_of(pos)))
        });
        self.content = snapshot.content.clone();
        self.splits = snapshot.splits.clone();
        self.splits.resize(self.content.len(), false);
        self.colors.absorb(&snapshot.speaker_color_indices);
        self.rebuild();
        self.restore_carried(carried);
    }

    pub fn insert_at_end(&mut self, items: Vec<WordRecord>) -> bool {
        if items.is_empty() {
            return false;
        }
        let at = self.content.len();
        let count = items.len();
        self.splice(at..at, items);
        self.rebuild();
        self.place_cursor(at + count, Affinity::Upstream);
        true
    }

    /// Inserts at the cursor, or appends when there is no cursor or the
    /// document is empty.
    pub fn insert_at_cursor(&mut self, items: Vec<WordRecord>) -> bool {
        if items.is_empty() {
            return false;
        }
        let pos = match self.cursor.clone() {
            Some(pos) if !self.content.is_empty() => pos,
            _ => return self.insert_at_end(items),
        };
        let Some(gap) = cursor::resolve(&self.blocks, &pos) else {
            debug!(block = %pos.block_id, "insert at stale cursor ignored");
            return false;
        };

        let count = items.len();
        let moves_mark = pos.word_index == 0 && self.splits.get(gap).copied().unwrap_or(false);
        self.splice(gap..gap, items);
        if moves_mark {
            self.splits[gap] = true;
            self.splits[gap + count] = false;
        }
        self.rebuild();
        self.place_cursor(gap + count, Affinity::Upstream);
        true
    }

    /// Splits the cursor's block in two at the cursor. The cursor ends up at
    /// the start of the second half.
    pub fn split_at_cursor(&mut self) -> bool {
        let Some(pos) = self.cursor.clone() else {
            return false;
        };
        let Some((idx, block)) = find_block(&self.blocks, &pos.block_id) else {
            debug!(block = %pos.block_id, "split at stale cursor ignored");
            return false;
        };
        if pos.word_index == 0 || pos.word_index > block.len() {
            return false;
        }
        if pos.word_index == block.len() {
            if let Some(next) = self.blocks.get(idx + 1) {
                self.cursor = Some(CursorPosition::new(next.id.clone(), 0));
            }
            return false;
        }

        let gap = block.start + pos.word_index;
        self.splits[gap] = true;
        self.rebuild();
        self.place_cursor(gap, Affinity::Downstream);
        true
    }

    /// Removes the items from `(start_block, start_index)` through
    /// `(end_block, end_index)`, inclusive. The endpoints may come in either
    /// order.
    pub fn delete_range(
        &mut self,
        start_block: &str,
        start_index: usize,
        end_block: &str,
        end_index: usize,
    ) -> bool {
        let start = cursor::resolve_item(&self.blocks, start_block, start_index);
        let end = cursor::resolve_item(&self.blocks, end_block, end_index);
        let (Some(start), Some(end)) = (start, end) else {
            debug!(start_block, end_block, "delete of stale range ignored");
            return false;
        };
        let (lo, hi) = (start.min(end), start.max(end));
        self.remove_items(lo..hi + 1);
        self.rebuild();
        self.place_cursor(lo, Affinity::Downstream);
        true
    }

    /// Removes the item before a collapsed cursor.
    pub fn backspace(&mut self) -> bool {
        let Some(pos) = self.cursor.clone() else {
            return false;
        };
        let Some(gap) = cursor::resolve(&self.blocks, &pos) else {
            return false;
        };
        if gap == 0 {
            return false;
        }
        self.remove_items(gap - 1..gap);
        self.rebuild();
        self.place_cursor(gap - 1, affinity_of(&pos));
        true
    }

    /// Removes the item after a collapsed cursor.
    pub fn delete_forward(&mut self) -> bool {
        let Some(pos) = self.cursor.clone() else {
            return false;
        };
        let Some(gap) = cursor::resolve(&self.blocks, &pos) else {
            return false;
        };
        if gap >= self.content.len() {
            return false;
        }
        self.remove_items(gap..gap + 1);
        self.rebuild();
        self.place_cursor(gap, affinity_of(&pos));
        true
    }

    pub fn delete_block(&mut self, block_id: &str) -> bool {
        let Some((_, block)) = find_block(&self.blocks, block_id) else {
            debug!(block = block_id, "delete of stale block ignored");
            return false;
        };
        let range = block.range();
        let carried = self.carry_cursor();
        self.remove_items(range.clone());
        self.rebuild();
        match carried {
            Some((gap, affinity)) if gap <= range.start => self.place_cursor(gap, affinity),
            Some((gap, affinity)) if gap >= range.end => {
                self.place_cursor(gap - range.len(), affinity)
            }
            Some(_) => self.place_cursor(range.start, Affinity::Downstream),
            None => self.cursor = None,
        }
        true
    }

    /// Gives every word spoken by `from` the speaker `to`, then regroups, so a
    /// renamed block merges with a neighbour that already has the new name.
    /// The name is sanitised for the wire formats; an empty result, an
    /// unchanged name or an absent speaker is a no-op.
    pub fn rename_speaker(&mut self, from: &str, to: &str) -> bool {
        let to = sanitize_field(to);
        if to.is_empty() || to == from || !self.content.iter().any(|item| item.speaker == from) {
            return false;
        }
        let carried = self.carry_cursor();
        for item in self.content.iter_mut().filter(|item| item.speaker == from) {
            item.speaker.clone_from(&to);
        }
        self.rebuild();
        self.restore_carried(carried);
        true
    }

    /// Renames the speaker of `block_id` everywhere in the document.
    pub fn rename_block_speaker(&mut self, block_id: &str, to: &str) -> bool {
        let Some(block) = self.block(block_id) else {
            debug!(block = block_id, "rename of stale block ignored");
            return false;
        };
        let from = block.speaker.clone();
        self.rename_speaker(&from, to)
    }

    /// Moves the dragged block's run directly above or below the target
    /// block's run.
    pub fn reorder_block(&mut self, dragged: &str, target: &str, position: DropPosition) -> bool {
        let (Some((dragged_idx, dragged_block)), Some((target_idx, target_block))) = (
            find_block(&self.blocks, dragged),
            find_block(&self.blocks, target),
        ) else {
            debug!(dragged, target, "reorder with stale block ignored");
            return false;
        };
        if dragged_idx == target_idx {
            return false;
        }
        let unchanged = match position {
            DropPosition::Above => target_idx == dragged_idx + 1,
            DropPosition::Below => dragged_idx == target_idx + 1,
        };
        if unchanged {
            return false;
        }

        let run = dragged_block.range();
        let mut anchor = match position {
            DropPosition::Above => target_block.start,
            DropPosition::Below => target_block.end(),
        };
        if anchor > run.start {
            anchor -= run.len();
        }
        self.move_run(run, anchor, dragged)
    }

    /// Moves the dragged block's run to the end of the document.
    pub fn move_block_to_end(&mut self, dragged: &str) -> bool {
        let Some((idx, block)) = find_block(&self.blocks, dragged) else {
            debug!(dragged, "move of stale block ignored");
            return false;
        };
        if idx + 1 == self.blocks.len() {
            return false;
        }
        let run = block.range();
        let anchor = self.content.len() - run.len();
        self.move_run(run, anchor, dragged)
    }

    fn move_run(&mut self, run: Range<usize>, anchor: usize, dragged: &str) -> bool {
        let count = run.len();
        let carried = self.carry_cursor();
        let in_dragged = self
            .cursor
            .as_ref()
            .is_some_and(|pos| pos.block_id == dragged);

        let items: Vec<WordRecord> = self.content.drain(run.clone()).collect();
        self.splits.drain(run.clone());
        self.splice(anchor..anchor, items);
        self.splits[anchor] = true;
        if let Some(after) = self.splits.get_mut(anchor + count) {
            *after = true;
        }
        self.rebuild();

        let Some((gap, affinity)) = carried else {
            self.cursor = None;
            return true;
        };
        let gap = if in_dragged {
            anchor + (gap - run.start)
        } else {
            let without = if gap >= run.end { gap - count } else { gap };
            let shifts = without > anchor || (without == anchor && affinity == Affinity::Downstream);
            if shifts { without + count } else { without }
        };
        self.place_cursor(gap, affinity);
        true
    }

    fn splice(&mut self, at: Range<usize>, items: Vec<WordRecord>) {
        let count = items.len();
        self.content.splice(at.clone(), items);
        self.splits
            .splice(at, std::iter::repeat(false).take(count));
    }

    fn remove_items(&mut self, range: Range<usize>) {
        let carry = self.splits.get(range.start).copied().unwrap_or(false);
        self.content.drain(range.clone());
        self.splits.drain(range.clone());
        if carry {
            if let Some(next) = self.splits.get_mut(range.start) {
                *next = true;
            }
        }
    }

    fn rebuild(&mut self) {
        self.blocks =
            derive_blocks_with_splits(&self.content, &self.splits, self.rule, self.ids.as_mut());
        self.assign_colors();
    }

    fn assign_colors(&mut self) {
        for block in &self.blocks {
            self.colors.index_for(&block.speaker);
        }
    }

    fn carry_cursor(&self) -> Option<(usize, Affinity)> {
        let pos = self.cursor.as_ref()?;
        let gap = cursor::resolve(&self.blocks, pos)?;
        Some((gap, affinity_of(pos)))
    }

    fn restore_carried(&mut self, carried: Option<(usize, Affinity)>) {
        match carried {
            Some((gap, affinity)) => self.place_cursor(gap, affinity),
            None => self.cursor = None,
        }
    }

    fn place_cursor(&mut self, gap: usize, affinity: Affinity) {
        self.cursor = cursor::locate(&self.blocks, gap, affinity);
    }
}

fn affinity_of(pos: &CursorPosition) -> Affinity {
    if pos.word_index == 0 {
        Affinity::Downstream
    } else {
        Affinity::Upstream
    }
}
