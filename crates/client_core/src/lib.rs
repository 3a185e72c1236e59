//! Realtime chat client core.
//!
//! Owns one logical connection to the chat backend, decodes its push frames
//! into an append-only timeline, and keeps a presence view reconciled from the
//! backend's periodic participant snapshot. The presentation layer drives it
//! through [`ChatClient`] and renders [`SessionView`] / [`ClientEvent`]s.

pub mod backend;
pub mod codec;
pub mod config;
pub mod error;
pub mod liveness;
pub mod presence;
mod runtime;
pub mod session;
pub mod timeline;
mod transport;

pub use backend::{BackendApi, HttpBackend};
pub use config::{BackendUrl, ClientConfig};
pub use error::ClientError;
pub use liveness::{LivenessProbe, LivenessStatus};
pub use presence::{PresenceReconciler, PresenceView};
pub use runtime::ChatClient;
pub use session::{ClientEvent, ConnectionState, Session, SessionInput, SessionView};
pub use timeline::ChatTimeline;
