//! Directory classification.
//!
//! [`Importer::import_dir`] turns the Go file names of one directory into a
//! [`Package`]: files excluded by the build context go to `IgnoredGoFiles`, the rest
//! are split into the package itself, its internal tests and its external (`_test`
//! package) tests, and the imports of each part are collected.

use crate::config::GoEnv;
use crate::goroot::StdlibRoots;
use crate::matcher::{BuildContext, BuildMatcher, MatchError};
use crate::models::{Bucket, FileHeader, Package};
use crate::module;
use crate::parsers::{GoHeaderReader, HeaderReader, ParserError};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// File name suffix of test files
pub const TEST_FILE_SUFFIX: &str = "_test.go";

/// Package name suffix of external test packages
pub const XTEST_PACKAGE_SUFFIX: &str = "_test";

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("{0}")]
    Match(#[from] MatchError),
    #[error("{path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ParserError,
    },
}

/// Pick the bucket of a file and the package name it contributes
pub fn classify<'a>(file_name: &str, package: &'a str) -> (Bucket, &'a str) {
    if file_name.ends_with(TEST_FILE_SUFFIX) {
        match package.strip_suffix(XTEST_PACKAGE_SUFFIX) {
            Some(base) => (Bucket::ExternalTest, base),
            None => (Bucket::InternalTest, package),
        }
    } else {
        (Bucket::Main, package)
    }
}

/// Accumulates one directory's classification before canonical ordering
#[derive(Debug, Default)]
struct PackageBuilder {
    package: Package,
}

impl PackageBuilder {
    fn ignore(&mut self, file_name: &str) {
        self.package.ignored_go_files.push(file_name.to_string());
    }

    fn add(&mut self, file_name: &str, header: &FileHeader) -> Bucket {
        let (bucket, name) = classify(file_name, &header.package);

        // the first classified file names the package, whatever its bucket
        if self.package.name.is_empty() {
            self.package.name = name.to_string();
        }

        let pkg = &mut self.package;
        let (files, imports) = match bucket {
            Bucket::Main => (&mut pkg.go_files, &mut pkg.imports),
            Bucket::InternalTest => (&mut pkg.test_go_files, &mut pkg.test_imports),
            Bucket::ExternalTest => (&mut pkg.x_test_go_files, &mut pkg.x_test_imports),
        };
        files.push(file_name.to_string());

        let paths = header.import_paths();
        for path in &paths {
            if !imports.contains(path) {
                imports.push(path.clone());
            }
        }
        // a repeated name re-reads the same file, so its raw list is replaced, not extended
        pkg.go_file_imports.insert(file_name.to_string(), paths);

        bucket
    }

    fn finish(mut self, goroot: bool) -> Package {
        let pkg = &mut self.package;
        pkg.imports.sort();
        pkg.test_imports.sort();
        pkg.x_test_imports.sort();
        pkg.go_files.sort();
        pkg.test_go_files.sort();
        pkg.x_test_go_files.sort();
        pkg.goroot = goroot;
        self.package
    }
}

/// Classifies Go package directories against a fixed [`GoEnv`]
pub struct Importer {
    env: GoEnv,
    roots: StdlibRoots,
    matcher: Box<dyn BuildMatcher>,
    reader: Box<dyn HeaderReader>,
}

impl Importer {
    /// Importer using the default build-context matcher and the tree-sitter reader
    pub fn new(env: GoEnv) -> Self {
        let matcher = BuildContext::new(env.clone());
        Self::with_collaborators(env, Box::new(matcher), Box::new(GoHeaderReader))
    }

    pub fn with_collaborators(
        env: GoEnv,
        matcher: Box<dyn BuildMatcher>,
        reader: Box<dyn HeaderReader>,
    ) -> Self {
        let roots = StdlibRoots::new(&env);
        Self {
            env,
            roots,
            matcher,
            reader,
        }
    }

    pub fn env(&self) -> &GoEnv {
        &self.env
    }

    pub fn roots(&self) -> &StdlibRoots {
        &self.roots
    }

    pub fn gopath(&self) -> &Path {
        &self.env.gopath
    }

    pub fn goroot(&self) -> &Path {
        &self.env.goroot
    }

    /// Module path declared in go.mod text
    pub fn module_path(&self, buf: &[u8]) -> String {
        module::module_path(buf)
    }

    /// Whether an import path resolves inside the standard distribution
    pub fn is_goroot(&self, import_path: &str) -> bool {
        self.roots.is_standard_library_path(import_path)
    }

    /// Classify `names` (base names inside `dir`) into a [`Package`].
    ///
    /// Files are processed in the given order. The first failure from the matcher or
    /// the header reader aborts the call.
    pub fn import_dir(&self, dir: &Path, names: &[String]) -> Result<Package, ImportError> {
        let mut builder = PackageBuilder::default();

        for name in names {
            if !self.matcher.match_file(dir, name)? {
                tracing::debug!("{}: excluded by build context", name);
                builder.ignore(name);
                continue;
            }

            let path = dir.join(name);
            let header = self
                .reader
                .read_header(&path)
                .map_err(|source| ImportError::Parse { path, source })?;

            let bucket = builder.add(name, &header);
            tracing::debug!(
                "{}: package {} ({:?}, {} imports)",
                name,
                header.package,
                bucket,
                header.imports.len()
            );
        }

        Ok(builder.finish(self.roots.is_standard_library_dir(dir)))
    }
}
