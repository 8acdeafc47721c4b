//! Real-time rating broadcast.
//!
//! Architecture:
//! 1. [`EventBroker`]: single actor task owning the subscription registry
//! 2. [`Subscription`]: one live consumer's receiving end
//! 3. [`sse`]: the wire frames relayed to each open connection

pub mod broker;
pub mod sse;

pub use broker::{EventBroker, Subscription};
pub use sse::SseFrame;
