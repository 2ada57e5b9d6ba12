//! Display-side extrapolation of a balance between authoritative syncs.

pub mod projector;
pub mod session;
