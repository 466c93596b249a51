//! lift-core
//!
//! Type-translation core for binary lifting: converts a host disassembler's
//! internal description of types and functions into a portable, owned type
//! IR that a downstream specification generator can consume without
//! depending on the host tool's data structures.
//!
//! This crate defines the type IR (model), the foreign accessor interfaces,
//! the conversion engine with its per-call identity cache, the weakly-owned
//! function registry, and platform selection. Host integration (concrete
//! database adapters, plugin glue, the on-disk spec serializer) lives
//! outside this crate.

pub mod model;
pub mod foreign;
pub mod convert;
pub mod functions;
pub mod platform;
pub mod session;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
