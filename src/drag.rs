//! Block drag-and-drop as a small state machine:
//! `Idle -> Dragging -> Hovering -> (drop | cancel)`.
//!
//! Nothing here touches the document. A successful drop hands back a
//! [`DropRequest`] for the editor to apply; a cancel just forgets the drag.

use crate::blocks::{Block, BlockId};
use crate::codec::WireFormat;
use crate::document::DropPosition;

#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    Block {
        block_id: BlockId,
        position: DropPosition,
    },
    /// The empty zone below the last block.
    Trailing,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DragState {
    #[default]
    Idle,
    Dragging {
        block_id: BlockId,
        payload: String,
    },
    Hovering {
        block_id: BlockId,
        payload: String,
        target: DropTarget,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DropRequest {
    pub dragged: BlockId,
    pub target: DropTarget,
    /// The dragged words in clipboard format, for drops into another editor.
    pub payload: String,
}

impl DropPosition {
    /// Upper half of a block drops above it, lower half below.
    pub fn from_pointer(pointer_y: f64, block_top: f64, block_height: f64) -> Self {
        if pointer_y < block_top + block_height / 2.0 {
            DropPosition::Above
        } else {
            DropPosition::Below
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    pub fn dragged(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { block_id, .. } | DragState::Hovering { block_id, .. } => {
                Some(block_id)
            }
        }
    }

    pub fn target(&self) -> Option<&DropTarget> {
        match &self.state {
            DragState::Hovering { target, .. } => Some(target),
            _ => None,
        }
    }

    pub fn payload(&self) -> Option<&str> {
        match &self.state {
            DragState::Idle => None,
            DragState::Dragging { payload, .. } | DragState::Hovering { payload, .. } => {
                Some(payload)
            }
        }
    }

    /// Starts dragging `block`, replacing any drag already in progress. The
    /// payload is the block's words in `format`.
    pub fn start(&mut self, block: &Block, format: WireFormat) {
        self.state = DragState::Dragging {
            block_id: block.id.clone(),
            payload: format.encode(&block.items),
        };
    }

    /// Moves the pointer over `target`. Hovering the dragged block itself
    /// clears the target. Returns false when no drag is active.
    pub fn hover(&mut self, target: DropTarget) -> bool {
        let (block_id, payload) = match std::mem::take(&mut self.state) {
            DragState::Idle => return false,
            DragState::Dragging { block_id, payload }
            | DragState::Hovering {
                block_id, payload, ..
            } => (block_id, payload),
        };
        let over_self = matches!(&target, DropTarget::Block { block_id: id, .. } if *id == block_id);
        self.state = if over_self {
            DragState::Dragging { block_id, payload }
        } else {
            DragState::Hovering {
                block_id,
                payload,
                target,
            }
        };
        true
    }

    /// The pointer left every drop target.
    pub fn leave(&mut self) {
        if let DragState::Hovering {
            block_id, payload, ..
        } = std::mem::take(&mut self.state)
        {
            self.state = DragState::Dragging { block_id, payload };
        }
    }

    /// Ends the drag. Only a drag that is over a target produces a request.
    pub fn drop_here(&mut self) -> Option<DropRequest> {
        match std::mem::take(&mut self.state) {
            DragState::Hovering {
                block_id,
                payload,
                target,
            } => Some(DropRequest {
                dragged: block_id,
                target,
                payload,
            }),
            _ => None,
        }
    }

    pub fn cancel(&mut self) {
        self.state = DragState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::{DragSession, DragState, DropTarget};
    use crate::blocks::{derive_blocks, Block, SegmentationRule};
    use crate::codec::{self, WireFormat};
    use crate::document::DropPosition;
    use crate::id::SequentialIdGen;
    use crate::record::WordRecord;

    fn blocks() -> Vec<Block> {
        let content = vec![WordRecord::new("Hi", "A"), WordRecord::new("Bye", "B")];
        derive_blocks(&content, SegmentationRule::Speaker, &mut SequentialIdGen::default())
    }

    #[test]
    fn drop_over_target_commits() {
        let blocks = blocks();
        let mut drag = DragSession::new();
        drag.start(&blocks[1], WireFormat::PaperCut);
        assert!(drag.hover(DropTarget::Block {
            block_id: blocks[0].id.clone(),
            position: DropPosition::Above,
        }));
        let request = drag.drop_here().expect("drop request");
        assert_eq!(request.dragged, blocks[1].id);
        assert_eq!(codec::decode(&request.payload), blocks[1].items);
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn drop_without_target_cancels() {
        let blocks = blocks();
        let mut drag = DragSession::new();
        drag.start(&blocks[0], WireFormat::PaperCut);
        assert!(drag.drop_here().is_none());
        assert!(!drag.is_active());
    }

    #[test]
    fn hovering_own_block_or_leaving_clears_target() {
        let blocks = blocks();
        let mut drag = DragSession::new();
        drag.start(&blocks[0], WireFormat::PaperCut);
        drag.hover(DropTarget::Trailing);
        assert_eq!(drag.target(), Some(&DropTarget::Trailing));
        drag.leave();
        assert!(drag.target().is_none());
        drag.hover(DropTarget::Block {
            block_id: blocks[0].id.clone(),
            position: DropPosition::Below,
        });
        assert!(drag.target().is_none());
        assert_eq!(drag.dragged(), Some(blocks[0].id.as_str()));
    }

    #[test]
    fn payload_uses_the_requested_format() {
        let blocks = blocks();
        let mut drag = DragSession::new();
        drag.start(&blocks[1], WireFormat::Compact);
        let payload = drag.payload().expect("payload").to_string();
        assert_eq!(payload, codec::compact::encode(&blocks[1].items));
        assert_eq!(codec::compact::decode(&payload), blocks[1].items);
        assert!(codec::decode(&payload).is_empty());
    }

    #[test]
    fn hover_and_cancel_without_drag() {
        let mut drag = DragSession::new();
        assert!(!drag.hover(DropTarget::Trailing));
        drag.cancel();
        assert_eq!(drag.state(), &DragState::Idle);
    }

    #[test]
    fn pointer_half_decides_position() {
        assert_eq!(DropPosition::from_pointer(10.0, 0.0, 40.0), DropPosition::Above);
        assert_eq!(DropPosition::from_pointer(30.0, 0.0, 40.0), DropPosition::Below);
    }
}
