//! Filtering of change events delivered to push sessions.

mod event;
mod filter;
mod session;

pub use event::{ChangeEvent, EventType, PushedEntity};
pub use filter::PushDispatchFilter;
pub use session::{PushSession, MODE_PARAMETER, NAMESPACE_PARAMETER, RECURSIVE_MODE};
