//! One PaperCut editor: the document, its undo history and any drag in
//! progress.
//!
//! Every operation that changes the content pushes exactly one snapshot, and
//! only when something actually changed. Cursor moves are not recorded.

use crate::blocks::{Block, SegmentationRule};
use crate::codec::WireFormat;
use crate::colors::SpeakerPalette;
use crate::cursor::{self, CursorPosition};
use crate::document::{Document, DropPosition, EditorSnapshot};
use crate::drag::{DragSession, DropTarget};
use crate::history::History;
use crate::record::WordRecord;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Left,
    Right,
    PrevBlock,
    NextBlock,
    BlockStart,
    BlockEnd,
    DocumentStart,
    DocumentEnd,
}

pub struct Editor {
    doc: Document,
    history: History<EditorSnapshot>,
    drag: DragSession,
    format: WireFormat,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(SegmentationRule::default())
    }
}

impl Editor {
    pub fn new(rule: SegmentationRule) -> Self {
        Self::with_document(Document::new(rule))
    }

    pub fn with_document(doc: Document) -> Self {
        let history = History::new(doc.snapshot());
        Self {
            doc,
            history,
            drag: DragSession::new(),
            format: WireFormat::default(),
        }
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history = self.history.with_limit(limit);
        self
    }

    pub fn with_format(mut self, format: WireFormat) -> Self {
        self.format = format;
        self
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn content(&self) -> &[WordRecord] {
        self.doc.content()
    }

    pub fn blocks(&self) -> &[Block] {
        self.doc.blocks()
    }

    pub fn cursor(&self) -> Option<&CursorPosition> {
        self.doc.cursor()
    }

    pub fn format(&self) -> WireFormat {
        self.format
    }

    pub fn palette_for(&mut self, speaker: &str) -> SpeakerPalette {
        self.doc.palette_for(speaker)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn drag(&self) -> &DragSession {
        &self.drag
    }

    /// Opens `content` as a fresh document state with an empty history, as
    /// when a tab is opened.
    pub fn load(&mut self, content: Vec<WordRecord>, splits: Vec<bool>) {
        self.doc.set_content(content, splits);
        self.drag.cancel();
        self.history.reset(self.doc.snapshot());
    }

    pub fn set_rule(&mut self, rule: SegmentationRule) {
        self.doc.set_rule(rule);
    }

    pub fn set_cursor(&mut self, pos: Option<CursorPosition>) -> bool {
        self.doc.set_cursor(pos)
    }

    pub fn move_cursor(&mut self, motion: Motion) -> bool {
        let blocks = self.doc.blocks();
        let next = match (self.doc.cursor(), motion) {
            (_, Motion::DocumentStart) => blocks
                .first()
                .map(|block| CursorPosition::new(block.id.clone(), 0)),
            (_, Motion::DocumentEnd) | (None, _) => cursor::document_end(blocks),
            (Some(pos), Motion::Left) => cursor::move_left(blocks, pos),
            (Some(pos), Motion::Right) => cursor::move_right(blocks, pos),
            (Some(pos), Motion::PrevBlock) => cursor::move_block(blocks, pos, -1),
            (Some(pos), Motion::NextBlock) => cursor::move_block(blocks, pos, 1),
            (Some(pos), Motion::BlockStart) => cursor::block_start(blocks, pos),
            (Some(pos), Motion::BlockEnd) => cursor::block_end(blocks, pos),
        };
        match next {
            Some(pos) => self.doc.set_cursor(Some(pos)),
            None => false,
        }
    }

    pub fn set_content(&mut self, content: Vec<WordRecord>) -> bool {
        let changed = self.doc.set_content(content, Vec::new());
        self.commit(changed)
    }

    /// Decodes `text` and inserts the words at the cursor. Returns how many
    /// words were inserted.
    pub fn paste(&mut self, text: &str) -> usize {
        let items = self.format.decode(text);
        let count = items.len();
        if self.insert_at_cursor(items) { count } else { 0 }
    }

    /// Decodes `text` and appends the words.
    pub fn paste_at_end(&mut self, text: &str) -> usize {
        let items = self.format.decode(text);
        let count = items.len();
        if self.insert_at_end(items) { count } else { 0 }
    }

    pub fn insert_at_end(&mut self, items: Vec<WordRecord>) -> bool {
        let changed = self.doc.insert_at_end(items);
        self.commit(changed)
    }

    pub fn insert_at_cursor(&mut self, items: Vec<WordRecord>) -> bool {
        let changed = self.doc.insert_at_cursor(items);
        self.commit(changed)
    }

    pub fn split_at_cursor(&mut self) -> bool {
        let changed = self.doc.split_at_cursor();
        self.commit(changed)
    }

    pub fn delete_range(
        &mut self,
        start_block: &str,
        start_index: usize,
        end_block: &str,
        end_index: usize,
    ) -> bool {
        let changed = self
            .doc
            .delete_range(start_block, start_index, end_block, end_index);
        self.commit(changed)
    }

    pub fn backspace(&mut self) -> bool {
        let changed = self.doc.backspace();
        self.commit(changed)
    }

    pub fn delete_forward(&mut self) -> bool {
        let changed = self.doc.delete_forward();
        self.commit(changed)
    }

    pub fn delete_block(&mut self, block_id: &str) -> bool {
        let changed = self.doc.delete_block(block_id);
        self.commit(changed)
    }

    pub fn reorder_block(&mut self, dragged: &str, target: &str, position: DropPosition) -> bool {
        let changed = self.doc.reorder_block(dragged, target, position);
        self.commit(changed)
    }

    pub fn move_block_to_end(&mut self, dragged: &str) -> bool {
        let changed = self.doc.move_block_to_end(dragged);
        self.commit(changed)
    }

    pub fn rename_speaker(&mut self, from: &str, to: &str) -> bool {
        let changed = self.doc.rename_speaker(from, to);
        self.commit(changed)
    }

    pub fn rename_block_speaker(&mut self, block_id: &str, to: &str) -> bool {
        let changed = self.doc.rename_block_speaker(block_id, to);
        self.commit(changed)
    }

    pub fn undo(&mut self) -> bool {
        let doc = &mut self.doc;
        self.history.undo(|snapshot| doc.restore(snapshot))
    }

    pub fn redo(&mut self) -> bool {
        let doc = &mut self.doc;
        self.history.redo(|snapshot| doc.restore(snapshot))
    }

    pub fn copy_block(&self, block_id: &str) -> Option<String> {
        self.doc
            .block(block_id)
            .map(|block| self.format.encode(&block.items))
    }

    /// Encodes the items between two item positions, inclusive.
    pub fn copy_range(
        &self,
        start_block: &str,
        start_index: usize,
        end_block: &str,
        end_index: usize,
    ) -> Option<String> {
        let blocks = self.doc.blocks();
        let start = cursor::resolve_item(blocks, start_block, start_index)?;
        let end = cursor::resolve_item(blocks, end_block, end_index)?;
        let (lo, hi) = (start.min(end), start.max(end));
        Some(self.format.encode(&self.doc.content()[lo..=hi]))
    }

    pub fn copy_all(&self) -> String {
        self.format.encode(self.doc.content())
    }

    pub fn start_drag(&mut self, block_id: &str) -> bool {
        match self.doc.block(block_id) {
            Some(block) => {
                self.drag.start(block, self.format);
                true
            }
            None => false,
        }
    }

    pub fn hover_drag(&mut self, target: DropTarget) -> bool {
        self.drag.hover(target)
    }

    pub fn leave_drag(&mut self) {
        self.drag.leave();
    }

    pub fn cancel_drag(&mut self) {
        self.drag.cancel();
    }

    /// Finishes the drag, applying the reorder when the pointer is over a
    /// target.
    pub fn drop_drag(&mut self) -> bool {
        let Some(request) = self.drag.drop_here() else {
            return false;
        };
        debug!(dragged = %request.dragged, target = ?request.target, "drop");
        match request.target {
            DropTarget::Block { block_id, position } => {
                self.reorder_block(&request.dragged, &block_id, position)
            }
            DropTarget::Trailing => self.move_block_to_end(&request.dragged),
        }
    }

    fn commit(&mut self, changed: bool) -> bool {
        if changed {
            self.history.push_state(self.doc.snapshot());
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::{Editor, Motion};
    use crate::blocks::{flatten, SegmentationRule};
    use crate::codec::{self, WireFormat};
    use crate::cursor::CursorPosition;
    use crate::document::DropPosition;
    use crate::drag::DropTarget;
    use crate::record::WordRecord;

    fn scenario_a() -> Vec<WordRecord> {
        vec![
            WordRecord::new("Hi", "A"),
            WordRecord::new("there", "A"),
            WordRecord::new("Bye", "B"),
        ]
    }

    fn words(editor: &Editor) -> Vec<&str> {
        editor.content().iter().map(|i| i.word.as_str()).collect()
    }

    fn loaded() -> Editor {
        let mut editor = Editor::default();
        editor.load(scenario_a(), Vec::new());
        editor
    }

    #[test]
    fn malformed_paste_changes_nothing() {
        let mut editor = loaded();
        assert_eq!(editor.paste("garbage-no-pipes"), 0);
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);
        assert!(!editor.can_undo());
    }

    #[test]
    fn paste_then_undo_redo() {
        let mut editor = Editor::default();
        let text = codec::encode(&scenario_a());
        assert_eq!(editor.paste(&text), 3);
        assert!(editor.can_undo());
        assert!(editor.undo());
        assert!(editor.content().is_empty());
        assert!(editor.redo());
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);
    }

    #[test]
    fn every_mutation_is_undoable() {
        let mut editor = loaded();
        let b = editor.blocks()[1].id.clone();
        assert!(editor.delete_block(&b));
        assert!(editor.undo());
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);

        let (a, b) = (editor.blocks()[0].id.clone(), editor.blocks()[1].id.clone());
        assert!(editor.reorder_block(&b, &a, DropPosition::Above));
        assert_eq!(words(&editor), ["Bye", "Hi", "there"]);
        assert!(editor.undo());
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);

        let a = editor.blocks()[0].id.clone();
        assert!(editor.delete_range(&a, 0, &a, 1));
        assert!(editor.undo());
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);

        editor.set_cursor(Some(CursorPosition::new(a.clone(), 1)));
        assert!(editor.backspace());
        assert!(editor.undo());
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);
        assert!(!editor.can_undo());
    }

    #[test]
    fn undo_restores_split_and_cursor() {
        let mut editor = loaded();
        let a = editor.blocks()[0].id.clone();
        editor.set_cursor(Some(CursorPosition::new(a.clone(), 1)));
        assert!(editor.split_at_cursor());
        assert_eq!(editor.blocks().len(), 3);
        assert!(editor.undo());
        assert_eq!(editor.blocks().len(), 2);
        assert!(editor.redo());
        assert_eq!(editor.blocks().len(), 3);
        assert_eq!(editor.cursor().map(|c| c.word_index), Some(0));
    }

    #[test]
    fn undo_after_rule_change_regroups_under_the_new_rule() {
        let mut editor = Editor::new(SegmentationRule::Speaker);
        editor.load(
            vec![
                WordRecord::new("a", "A").with_times(0.0, 1.0),
                WordRecord::new("b", "A").with_times(5.0, 6.0),
            ],
            Vec::new(),
        );
        editor.insert_at_end(vec![WordRecord::new("c", "A").with_times(20.0, 21.0)]);
        editor.set_rule(SegmentationRule::speaker_or_gap());
        assert_eq!(editor.blocks().len(), 3);

        assert!(editor.undo());
        assert_eq!(editor.blocks().len(), 2);
        assert_eq!(flatten(editor.blocks()), editor.content());
        assert!(editor.redo());
        assert_eq!(editor.blocks().len(), 3);
        assert_eq!(editor.document().cursor_gap(), Some(3));
    }

    #[test]
    fn speaker_rename_is_one_undo_step() {
        let mut editor = loaded();
        let b = editor.blocks()[1].id.clone();
        assert!(editor.rename_block_speaker(&b, "A"));
        assert_eq!(editor.blocks().len(), 1);
        assert!(editor.content().iter().all(|i| i.speaker == "A"));

        assert!(editor.undo());
        assert_eq!(editor.blocks().len(), 2);
        assert_eq!(editor.blocks()[1].speaker, "B");
        assert!(!editor.can_undo());
        assert!(editor.redo());
        assert_eq!(editor.blocks().len(), 1);

        assert!(!editor.rename_speaker("A", "A"));
        assert!(!editor.can_redo());
        assert!(editor.can_undo());
    }

    #[test]
    fn no_op_operations_do_not_push_history() {
        let mut editor = loaded();
        assert!(!editor.split_at_cursor());
        assert!(!editor.delete_block("missing"));
        assert!(!editor.backspace());
        assert!(!editor.insert_at_end(Vec::new()));
        assert!(!editor.can_undo());
    }

    #[test]
    fn drag_drop_reorders_and_cancel_does_not() {
        let mut editor = loaded();
        let (a, b) = (editor.blocks()[0].id.clone(), editor.blocks()[1].id.clone());
        assert!(editor.start_drag(&b));
        editor.hover_drag(DropTarget::Block {
            block_id: a.clone(),
            position: DropPosition::Above,
        });
        editor.cancel_drag();
        assert!(!editor.drop_drag());
        assert_eq!(words(&editor), ["Hi", "there", "Bye"]);

        assert!(editor.start_drag(&a));
        editor.hover_drag(DropTarget::Trailing);
        assert!(editor.drop_drag());
        assert_eq!(words(&editor), ["Bye", "Hi", "there"]);
        assert!(editor.can_undo());
    }

    #[test]
    fn copy_encodes_blocks_and_ranges() {
        let editor = loaded();
        let (a, b) = (editor.blocks()[0].id.clone(), editor.blocks()[1].id.clone());
        let block = editor.copy_block(&b).expect("block");
        assert_eq!(codec::decode(&block), vec![WordRecord::new("Bye", "B")]);
        let range = editor.copy_range(&b, 0, &a, 1).expect("range");
        assert_eq!(codec::decode(&range).len(), 2);
        assert!(editor.copy_range(&a, 5, &b, 0).is_none());
        assert_eq!(codec::decode(&editor.copy_all()), scenario_a());
    }

    #[test]
    fn copy_and_paste_between_editors() {
        let source = loaded();
        let mut target = Editor::default();
        target.paste_at_end(&source.copy_all());
        assert_eq!(target.content(), source.content());
    }

    #[test]
    fn compact_format_editor_pastes_compact_text() {
        let mut editor = Editor::default().with_format(WireFormat::Compact);
        assert_eq!(editor.paste("Hi|1|1.5|s1|A|f1|0"), 1);
        assert_eq!(editor.paste("Hi,1,1.5,0|s1,0,5,A|a.json,f1"), 0);
    }

    #[test]
    fn motions_walk_the_document() {
        let mut editor = loaded();
        assert!(editor.move_cursor(Motion::DocumentStart));
        assert_eq!(editor.document().cursor_gap(), Some(0));
        editor.move_cursor(Motion::Right);
        editor.move_cursor(Motion::BlockEnd);
        assert_eq!(editor.document().cursor_gap(), Some(2));
        editor.move_cursor(Motion::NextBlock);
        assert_eq!(editor.cursor().map(|c| c.block_id.clone()), Some(editor.blocks()[1].id.clone()));
        editor.move_cursor(Motion::DocumentEnd);
        assert_eq!(editor.document().cursor_gap(), Some(3));
        assert!(!editor.can_undo());
    }

    #[test]
    fn palettes_follow_first_appearance() {
        let mut editor = loaded();
        assert_eq!(editor.palette_for("A").hue, 0.0);
        assert!((editor.palette_for("B").hue - 137.508).abs() < 1e-9);
        assert_eq!(editor.document().colors().get("B"), Some(1));
    }

    #[test]
    fn history_limit_bounds_undo_depth() {
        let mut editor = Editor::new(SegmentationRule::Speaker).with_history_limit(2);
        editor.insert_at_end(vec![WordRecord::new("a", "A")]);
        editor.insert_at_end(vec![WordRecord::new("b", "A")]);
        assert!(editor.undo());
        assert!(!editor.undo());
        assert_eq!(words(&editor), ["a"]);
    }
}
