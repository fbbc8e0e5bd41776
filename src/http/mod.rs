//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, limits, timeout)
//!     → request.rs (buffered request, route parameters)
//!     → [Application::handle on a blocking worker]
//!     → response.rs (status, headers, body; sent once)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod session;

pub use request::{MakeRequestUuid, ParameterBag, Request, X_REQUEST_ID};
pub use response::Response;
pub use server::HttpServer;
pub use session::Session;
