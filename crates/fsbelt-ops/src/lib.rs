//! Bulk file operations for fsbelt.
//!
//! The crate currently hosts one operation: regex-driven bulk rename,
//! split into plan / conflict-check / apply phases so a caller can show
//! the plan before anything on disk moves.
//!
//! # Example
//!
//! ```rust,no_run
//! use fsbelt_ops::{RenameOptions, run};
//!
//! let mut options = RenameOptions::new(
//!     "/data/photos",
//!     r"IMG_(?<num>\d+)\.jpg",
//!     "vacation-$num.jpg",
//! )?;
//! options.dry_run = true;
//!
//! for entry in &run(&options)?.entries {
//!     println!("{} => {}", entry.original, entry.renamed);
//! }
//! # Ok::<(), fsbelt_ops::RenameError>(())
//! ```

mod rename;

pub use rename::{
    RenameEntry, RenameError, RenameOptions, RenameOutcome, apply, check_conflicts, plan, run,
    validate_filename,
};
