//! Integration testing module
//!
//! End-to-end tests for the relay against a real mock upstream:
//! - Status and header passthrough
//! - Range round-trips
//! - Redirect chasing, loops and hop caps
//! - Input validation with zero upstream connections
//! - Rate-limit denials
//! - Client-disconnect propagation and flow control under a slow consumer

mod fixtures;
