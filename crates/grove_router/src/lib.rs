//! Field resolution routing for grove.
//!
//! The router connects the outer execution engine's field-resolution
//! requests to the owning extension's sandbox:
//! - `error`: the resolution error taxonomy
//! - `router`: ownership lookup and dispatch

pub mod error;
pub mod router;

pub use error::ResolutionError;
pub use router::FieldRouter;
