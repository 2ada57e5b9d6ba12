//! The only side-effecting part of the engine: day-by-day catch-up of
//! accounts against a store, plus the ports that store implements.

pub mod batch;
pub mod engine;
pub mod memory;
pub mod ports;
