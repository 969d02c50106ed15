//! Local cache of imported container images
//!
//! Images are imported once per slot and reused by later jobs.
//!
//! # Layout
//!
//! ```text
//! <install_root>/
//!   <subdirectory>/
//!     <filename>          # squashfs image, present only when complete
//! ```
//!
//! Callers pick `(subdirectory, filename)` so that distinct images never
//! share a slot; the cache does not deduplicate by content.

pub mod lock;
pub mod manager;
pub mod outcome;
pub mod store;

pub use lock::PopulateLock;
pub use manager::ArtifactCacheManager;
pub use outcome::{CacheKey, CacheSlotState, OperationOutcome};
pub use store::FilesystemCacheStore;
