//! Webhook adapter: HTTP intake, signature verification, reply types.

pub mod server;
pub mod types;
pub mod verify;

pub use server::{router, AppState, WebhookServer};
pub use types::{LatencyBreakdown, WebhookReply};
pub use verify::{AuthError, WebhookVerifier, SIGNATURE_HEADER};
