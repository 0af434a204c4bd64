// Rust 1.92 compiler bug: false positives for thiserror/miette derive macro fields
// https://github.com/rust-lang/rust/issues/147648
#![allow(unused_assignments)]

//! monover - changeset-driven versioning for multi-module Go repositories
//!
//! The binary is a thin shell over [`monover_release`]: it parses arguments,
//! reads tags and changed files through the system `git`, and renders what
//! the release engine computed.
//!
//! # Workflow
//!
//! - `monover init` creates `.changeset/` with a config and a guide
//! - `monover add` records a changeset bumping one or more modules
//! - `monover status` shows pending changesets and the planned releases
//! - `monover version` applies the plan to `go.mod` files and changelogs
//! - `monover publish` tags the releases recorded by `version`

pub mod cli;
pub mod commands;
pub mod git;
pub mod tracing;
