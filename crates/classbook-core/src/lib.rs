//! Core types and trait definitions for Classbook.
//!
//! This crate is deliberately free of HTTP and database dependencies. The
//! grade and attendance rules live here as pure functions so every caller
//! (teacher sheets, student views, report exports) shares one definition.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod account;
pub mod attendance;
pub mod error;
pub mod grade;
pub mod school;
pub mod store;

pub use error::{Error, Result};
