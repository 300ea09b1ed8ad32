//! # Tutor Context Core
//!
//! Shared, runtime-free logic for Tutor Context: data models, the source
//! prioritizer, the citation builder, gateway traits, and an in-memory
//! vector index.
//!
//! This crate contains no tokio, HTTP clients, filesystem I/O, or other
//! native-only dependencies. The application crate supplies concrete
//! gateway implementations and the async orchestration around them.

pub mod citation;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod rank;
pub mod vector;
