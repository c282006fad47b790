//! Word-level transcript editing: PaperCuts are documents assembled from
//! words lifted out of transcripts, grouped into speaker blocks and edited
//! with undo/redo.

pub mod blocks;
pub mod codec;
pub mod colors;
pub mod cursor;
pub mod document;
pub mod drag;
pub mod editor;
pub mod error;
pub mod history;
pub mod id;
pub mod record;
pub mod session;
pub mod transcript;

pub use blocks::{Block, BlockId, SegmentationRule};
pub use codec::WireFormat;
pub use cursor::CursorPosition;
pub use document::{Document, DropPosition, EditorSnapshot};
pub use editor::{Editor, Motion};
pub use error::{CodecError, SessionError, TranscriptError};
pub use record::WordRecord;
pub use session::{Session, Tab};
