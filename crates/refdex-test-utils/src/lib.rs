#![deny(unsafe_code)]

//! Shared test utilities for the refdex workspace.
//!
//! Provides manifest builders, on-disk documentation bundles, and tracing
//! helpers so that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! refdex-test-utils = { workspace = true }
//! ```

pub mod bundle;
pub mod manifest;
pub mod tracing_setup;

pub use bundle::TestBundle;
pub use manifest::TestManifestBuilder;
