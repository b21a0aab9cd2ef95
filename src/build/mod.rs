//! Build pipeline module for svgbundle
//!
//! Turns a tree of `.svg` files into self-registering code modules plus one
//! barrel index per output directory.
//!
//! # Overview
//!
//! The build pipeline consists of:
//! - **Discovery**: Find every `.svg` file below the source directory
//! - **Change detection**: Skip assets whose module already carries their
//!   modification time
//! - **Transformation**: Optimize, rewrite and template each changed asset in
//!   parallel
//! - **Indexing**: Regenerate the index files once every asset has settled
//!
//! # Example
//!
//! ```ignore
//! use svgbundle::build::{BuildContext, BuildPipeline};
//! use svgbundle::config::load_config;
//!
//! let config = load_config(None)?;
//! let context = BuildContext::new(config.build, project_root);
//! let result = BuildPipeline::new(context).build()?;
//! println!("{}", result.summary());
//! ```

pub mod asset;
pub mod context;
pub mod discovery;
pub mod incremental;
pub mod index;
pub mod pipeline;
pub mod progress;
pub mod result;

pub use asset::*;
pub use context::*;
pub use discovery::*;
pub use incremental::*;
pub use index::*;
pub use pipeline::*;
pub use result::*;
