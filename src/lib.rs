//! imgcache - cluster container image cache
//!
//! Keeps enroot squashfs imports of remote container images on shared
//! storage so jobs reuse them instead of re-importing, and checks that a
//! remote reference is reachable before any cluster time is spent on it.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod import;
pub mod prereq;
pub mod probe;
pub mod ui;

pub use error::{ImgCacheError, ImgCacheResult};
