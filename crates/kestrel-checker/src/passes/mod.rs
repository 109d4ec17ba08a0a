//! Checker passes.
//!
//! - [`collection`]: Pass 1 - reserve every top-level name, then bind imports
//! - [`checking`]: Pass 2 - file-level `using`, declarations on demand, `#test` blocks
//!
//! Both passes walk files in [`FileId`](kestrel_core::FileId) order, so the
//! entities, types and diagnostics of a run are the same on every run.

pub mod checking;
pub mod collection;

pub use checking::{CheckingOutput, CheckingPass};
pub use collection::{CollectionOutput, CollectionPass};
