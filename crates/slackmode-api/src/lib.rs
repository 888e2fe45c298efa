//! # slackmode-api
//!
//! Wire types for the Slack Web API and Socket Mode protocol.
//!
//! These structs match the upstream JSON format exactly; field names and
//! the literal `type` discriminator strings are part of the protocol.
//! This crate does no I/O; the HTTP side lives in `slackmode-client` and
//! the socket side in `slackmode-socket`.

#![deny(unsafe_code)]

pub mod event;
pub mod response;
pub mod socket;

pub use event::{Event, TYPE_EVENTS_API, TYPE_EVENT_CALLBACK};
pub use response::{ApiResponse, ConnectionOpenResponse, Empty};
pub use socket::{Ack, ConnectionInfo, Envelope, Hello, TYPE_HELLO};
