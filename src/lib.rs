//! svgbundle - Incremental SVG-to-module compiler
//!
//! This library provides functionality to:
//! - Discover `.svg` files below a source directory
//! - Optimize and rewrite their markup (namespaced ids, renamed style attributes)
//! - Compile each one into a self-registering module through a text template
//! - Skip assets whose generated module is already up to date
//! - Emit one barrel index per output directory

pub mod build;
pub mod cli;
pub mod config;
pub mod markup;
pub mod optimizer;
pub mod templates;
pub mod watch;
