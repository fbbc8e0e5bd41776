//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → server stops accepting → in-flight cycles finish → exit
//! ```
//!
//! Per-request teardown is not handled here; every Application runs its own
//! exit handler when it is dropped.

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
