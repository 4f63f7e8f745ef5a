#![warn(missing_docs)]
//! Power consumption models for workflow carbon accounting.
//!
//! The crate provides CPU and memory power models together with a library of
//! named power profiles for known node configurations. Models are plain value
//! objects selected by configuration and passed explicitly into the consumer,
//! without any ambient global state.

pub mod power;
