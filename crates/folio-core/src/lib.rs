//! Core types and trait definitions for the Folio reading platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it. Feed ranking and comment threading live
//! here as pure functions so they can be tested without a store.

pub mod chapter;
pub mod character;
pub mod comment;
pub mod error;
pub mod identity;
pub mod interaction;
pub mod notification;
pub mod pagination;
pub mod ranking;
pub mod store;
pub mod text;

pub use error::{Error, Result};
