//! MTA Rust GoPkgMap Core Library
//!
//! This library classifies the Go files of a directory the way the go tool does and
//! maps their imports, without invoking a compiler.
//!
//! # Features
//!
//! - Split a directory's files into package sources, internal tests, external
//!   (`package x_test`) tests and files excluded by the build context
//! - Read package clauses and import declarations with tree-sitter
//! - Evaluate `//go:build` / `// +build` constraints and `_GOOS_GOARCH` file suffixes
//! - Tell standard-library import paths and GOROOT directories apart
//! - Extract the module path from go.mod
//! - Output results in JSON, YAML or a text summary
//!
//! # Example
//!
//! ```no_run
//! use mta_rust_gopkgmap_core::{GoEnv, Importer};
//! use std::path::Path;
//!
//! let importer = Importer::new(GoEnv::from_env());
//! let names = vec!["a.go".to_string(), "a_test.go".to_string()];
//! let package = importer.import_dir(Path::new("./pkg/a"), &names).unwrap();
//!
//! println!("{} imports {:?}", package.name, package.imports);
//! ```

pub mod categorizer;
pub mod config;
pub mod goroot;
pub mod importer;
pub mod matcher;
pub mod models;
pub mod module;
pub mod output;
pub mod parsers;
pub mod scanner;

// Re-exports for convenience
pub use config::{GoEnv, ScanConfig};
pub use goroot::StdlibRoots;
pub use importer::{ImportError, Importer};
pub use matcher::{BuildContext, BuildMatcher, MatchError};
pub use models::*;
pub use module::module_path;
pub use output::{format_output, format_package, format_summary, OutputFormat};
pub use parsers::{GoHeaderReader, HeaderReader, ParserError};
pub use scanner::{PackageScanner, ScanError};
