pub mod batch;
pub mod canvas;
pub mod editor;
pub mod error;

pub use batch::{
    BatchConfig, BatchEngine, BatchError, BatchStats, CommitOutcome, Domain, Operation,
    Transaction,
};
pub use canvas::{CanvasEvent, CanvasState, CanvasStateError, CanvasStore};
pub use editor::{Editor, EditorConfig, EditorState};
pub use error::EditorError;
