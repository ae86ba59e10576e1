//! # remsync – core
//!
//! Protocol-agnostic reconciliation of a remote file set against the files a
//! caller has already processed:
//!   • Glob resolution of `dir/leaf-pattern` against a remote listing
//!   • Host-qualified identifiers (`[address]path`) and known-set diffing
//!   • Segment-by-segment remote directory creation
//!   • Collision-aware local naming with a per-batch timestamp fallback
//!   • Download orchestration with guaranteed session close
//!   • Per-file isolated upload batches

pub mod sync;
