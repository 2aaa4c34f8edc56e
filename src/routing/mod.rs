//! Route table and dispatch sequencing.
//!
//! # Data Flow
//! ```text
//! [[routes]] config / RouteDef builders
//!     → RouteTable (declaration order, patterns pre-compiled)
//!
//! Per request (method, path):
//!     DispatchSequence
//!     → pass 1: middleware, reverse order, prefix match
//!     → pass 2: terminal, forward order, exact match, first wins
//!     → PendingInvocation stream → execution pipeline
//! ```
//!
//! # Responsibilities
//! - Compile route and mount patterns once, at table build time
//! - Resolve configured handler names against the registry
//! - Decide which handlers a request visits, and in what order
//!
//! # Design Decisions
//! - The table is immutable after construction and shared behind an
//!   `Arc`; replacing routes means building a new table
//! - Sequencing is lazy. Pattern evaluation happens when the pipeline
//!   pulls the next invocation, so a short-circuiting middleware skips
//!   the matching work for everything after it
//! - Deterministic: same table, method, and path always produce the
//!   same invocation order

pub mod sequence;
pub mod table;

pub use sequence::{DispatchSequence, PendingInvocation};
pub use table::{RouteDef, RouteEntry, RouteTable, RouteTableBuilder, TableError};
