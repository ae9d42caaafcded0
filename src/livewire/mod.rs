//! Client side of Livewire's component protocol
//!
//! Livewire pages render server-side and paginate by round-tripping the
//! component state: v3 sends an opaque snapshot that the server replaces,
//! v2 sends a `serverMemo` the server answers with a partial diff.

pub mod session;
pub mod snapshot;

pub use session::LivewireSession;
pub use snapshot::{csrf_token, deep_merge, find_components, Component, LivewireVersion};
