//! Common types and utilities for the hubforge type layout builder.
//!
//! This crate provides foundational types used across all hubforge crates:
//! - Dense identifiers (`TypeId`, `MethodId`, `Selector`)
//! - Slot and table limits
//! - Build options (`LayoutOptions`, `WorldMode`)
//! - The build error type (`LayoutError`)

// Dense arena identifiers
pub mod ids;
pub use ids::{MethodId, Selector, TypeId};

// Centralized limits and thresholds
pub mod limits;

// Build options
pub mod options;
pub use options::{LayoutOptions, WorldMode};

// Build errors
pub mod error;
pub use error::{LayoutError, LayoutResult};
