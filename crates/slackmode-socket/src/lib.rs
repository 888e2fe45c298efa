//! # slackmode-socket
//!
//! Socket Mode session: connection lifecycle and nested type-routed
//! dispatch.
//!
//! [`Session::open`] negotiates the websocket endpoint, validates the
//! `hello` greeting, and returns a session carrying three
//! [`Registry`] levels (envelope → event → notification). Application
//! code registers typed handlers against the notification level, then
//! calls [`Session::serve`] to run the read→route→acknowledge loop.
//! Handlers run in independently spawned tasks so a slow handler never
//! delays the reader; every envelope with an identifier is acknowledged
//! exactly once.

#![deny(unsafe_code)]

mod chain;
pub mod errors;
pub mod registry;
pub mod session;

pub use errors::{DispatchError, SocketError};
pub use registry::Registry;
pub use session::Session;
