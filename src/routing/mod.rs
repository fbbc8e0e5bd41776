//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     RouteCollection (insertion-ordered routes)
//!     → matcher.rs (parse patterns, index static paths)
//!     → Freeze as immutable PatternMatcher (shared via Arc)
//!
//! Per request:
//!     Request (method, path)
//!     → router.rs (one Router per request cycle)
//!     → matcher.rs (Matched / NotFound / MethodNotAllowed)
//!     → path params written into the request
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - Deterministic: same input always matches same route
//! - First registered wins on ambiguous registrations (flagged at add time)

pub mod matcher;
pub mod pattern;
pub mod route;
pub mod router;

pub use matcher::{MatchResult, PatternMatcher, RouteMatcher};
pub use pattern::{PathParams, PathPattern};
pub use route::{Route, RouteCollection, RouteConflict};
pub use router::{Router, RoutingState};
