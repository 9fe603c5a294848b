//! Flow editor engine: input events, gesture state machine, editor
//! session, keyboard shortcuts and the tutorial viewer.

pub mod gesture;
pub mod input;
pub mod session;
pub mod shortcuts;
pub mod viewer;

pub use gesture::{Gesture, LinkDrag, LinkOutcome};
pub use input::{InputEvent, Modifiers};
pub use session::{EditorSession, GraphMutation, HostRequest, Invalidation};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use viewer::{BlockView, ImageState, Screen, StepView, TutorialViewer, ViewerError, ViewerView};
