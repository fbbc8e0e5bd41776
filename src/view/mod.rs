//! Built-in views.
//!
//! Views here are pure functions of their inputs: no I/O, no container
//! lookups, no template engine. The failure path depends on that.

pub mod exception;
pub mod layout;

pub use exception::ExceptionView;
pub use layout::DefaultLayout;
