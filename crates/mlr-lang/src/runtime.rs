pub mod binding;
pub mod context;
pub mod error;
pub mod stack;
pub mod state;

pub use binding::TypedBinding;
pub use context::Context;
pub use error::ScopeError;
pub use stack::{Frame, FrameSet, Stack};
pub use state::{Output, State};
