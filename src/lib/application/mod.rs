//! # Application Module
//!
//! ## Submodules
//!
//! - [`conversation`] - the tool-augmented turn loop
//! - [`tooling`] - tool provider sessions and launching
//! - [`stdio`] - interactive query loop on the terminal
//! - [`crawl`] - `start_crawler` tool
//! - [`analysis`] - `wb_analysis_tool` tool

pub mod analysis;
pub mod conversation;
pub mod crawl;
pub mod stdio;
pub mod tooling;
