//! Phase 2: cross-unit resolution
//!
//! Runs after every unit's graph is complete, so both endpoints of a link
//! always exist. Links are recorded beside the per-unit graphs rather than
//! inside them; each unit graph stays self-contained.

pub mod global_linker;

pub use global_linker::{CrossUnitLink, GlobalLinker, GlobalLinkerStats, LinkKind};
