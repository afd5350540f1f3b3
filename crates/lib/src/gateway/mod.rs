//! Gateway: HTTP server for the relay.
//!
//! Serves the Telegram webhook endpoint plus health and service-info probes on a single port.

mod server;

pub use server::{build_state, build_state_with_notifier, router, run_gateway, RelayState, WEBHOOK_PATH};
