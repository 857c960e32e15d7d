//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Coordinating a concurrent scan and detecting when it is finished
//! - Folding scan events into fingerprint groups on a single consumer
//! - Duplicate group management

pub mod aggregator;
pub mod finder;
pub mod groups;

pub use aggregator::{Aggregate, Aggregator, AggregatorHandle};
pub use finder::{
    default_threads, DuplicateFinder, ErrorPolicy, FinderConfig, FinderError, ScanReport,
    ScanState, ScanStrategy, ScanSummary,
};
pub use groups::{DuplicateGroup, Grouping};
