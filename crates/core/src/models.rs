use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Which part of a package a classified file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Bucket {
    /// Regular package source (`GoFiles`)
    Main,
    /// `_test.go` file in the package itself (`TestGoFiles`)
    InternalTest,
    /// `_test.go` file declaring `package <name>_test` (`XTestGoFiles`)
    ExternalTest,
}

/// Type of import source
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportType {
    /// Third-party module (first path element looks like a host name)
    External,
    /// Package inside the current module
    Internal,
    /// Relative import (./foo, ../bar)
    Local,
    /// Standard library (found under GOROOT)
    Stdlib,
    /// Unknown/unresolved
    Unknown,
}

impl Default for ImportType {
    fn default() -> Self {
        ImportType::Unknown
    }
}

/// A single import spec from a Go file header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    /// Import path with the surrounding quotes removed
    pub path: String,
    /// Local name (`_`, `.` or an identifier) if one was given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Line number in source file
    pub line: usize,
    /// Column position
    pub column: usize,
}

/// Package clause and imports of one Go source file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHeader {
    /// Declared package name
    pub package: String,
    /// Import specs in declaration order
    pub imports: Vec<ImportSpec>,
}

impl FileHeader {
    /// Import paths in declaration order, repeats included
    pub fn import_paths(&self) -> Vec<String> {
        self.imports.iter().map(|spec| spec.path.clone()).collect()
    }
}

/// Classification of one directory of Go files.
///
/// Field names serialize with the spelling used by the Go tooling so the output can be
/// consumed by the same build-file generators that read `go list -json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Package {
    pub name: String,
    pub goroot: bool,
    pub go_files: Vec<String>,
    pub test_go_files: Vec<String>,
    #[serde(rename = "XTestGoFiles")]
    pub x_test_go_files: Vec<String>,
    /// Files excluded by the build context, in the order they were given
    pub ignored_go_files: Vec<String>,
    pub imports: Vec<String>,
    pub test_imports: Vec<String>,
    #[serde(rename = "XTestImports")]
    pub x_test_imports: Vec<String>,
    /// Raw per-file imports, declaration order, not deduplicated
    pub go_file_imports: BTreeMap<String, Vec<String>>,
}

impl Package {
    /// File names of a bucket
    pub fn files(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Main => &self.go_files,
            Bucket::InternalTest => &self.test_go_files,
            Bucket::ExternalTest => &self.x_test_go_files,
        }
    }

    /// Aggregated imports of a bucket
    pub fn bucket_imports(&self, bucket: Bucket) -> &[String] {
        match bucket {
            Bucket::Main => &self.imports,
            Bucket::InternalTest => &self.test_imports,
            Bucket::ExternalTest => &self.x_test_imports,
        }
    }

    /// True if no file was classified or ignored
    pub fn is_empty(&self) -> bool {
        self.go_files.is_empty()
            && self.test_go_files.is_empty()
            && self.x_test_go_files.is_empty()
            && self.ignored_go_files.is_empty()
    }
}

/// A package together with the directory it was imported from
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirPackage {
    /// Directory relative to the scan root
    pub dir: PathBuf,
    pub package: Package,
}

/// A directory the scanner could not classify
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DirError {
    pub dir: PathBuf,
    pub message: String,
}

/// Aggregated results of scanning a directory tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageMap {
    /// Scan root path
    pub root: PathBuf,
    /// Module path from the governing go.mod, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub module_path: Option<String>,
    /// Packages ordered by directory
    pub packages: Vec<DirPackage>,
    /// Directories that failed to import
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<DirError>,
    /// Import statistics
    pub stats: ImportStats,
    /// Scan metadata
    pub metadata: ScanMetadata,
}

impl PackageMap {
    /// Drop everything except packages that import the given path in any bucket
    pub fn filter_importers(&self, import: &str) -> Self {
        let packages = self
            .packages
            .iter()
            .filter(|p| {
                [Bucket::Main, Bucket::InternalTest, Bucket::ExternalTest]
                    .iter()
                    .any(|b| p.package.bucket_imports(*b).iter().any(|i| i == import))
            })
            .cloned()
            .collect();

        PackageMap {
            root: self.root.clone(),
            module_path: self.module_path.clone(),
            packages,
            errors: vec![],
            stats: self.stats.clone(),
            metadata: self.metadata.clone(),
        }
    }
}

/// Statistics about classified files and imports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportStats {
    pub total_packages: usize,
    pub go_files: usize,
    pub test_go_files: usize,
    pub x_test_go_files: usize,
    pub ignored_go_files: usize,
    pub total_imports: usize,
    pub external_imports: usize,
    pub internal_imports: usize,
    pub local_imports: usize,
    pub stdlib_imports: usize,
    pub unknown_imports: usize,
}

impl ImportStats {
    pub fn count(&mut self, import_type: ImportType) {
        self.total_imports += 1;
        match import_type {
            ImportType::External => self.external_imports += 1,
            ImportType::Internal => self.internal_imports += 1,
            ImportType::Local => self.local_imports += 1,
            ImportType::Stdlib => self.stdlib_imports += 1,
            ImportType::Unknown => self.unknown_imports += 1,
        }
    }
}

/// Scan metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanMetadata {
    pub scan_duration_ms: u64,
    pub dirs_per_second: f64,
    pub timestamp: String,
    pub tool_version: String,
    pub goos: String,
    pub goarch: String,
}

impl Default for ScanMetadata {
    fn default() -> Self {
        Self {
            scan_duration_ms: 0,
            dirs_per_second: 0.0,
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            goos: String::new(),
            goarch: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_serializes_with_go_field_names() {
        let mut pkg = Package {
            name: "p".to_string(),
            go_files: vec!["a.go".to_string()],
            x_test_imports: vec!["os".to_string()],
            ..Default::default()
        };
        pkg.go_file_imports.insert("a.go".to_string(), vec![]);

        let json = serde_json::to_string(&pkg).unwrap();
        assert!(json.contains("\"Name\":\"p\""));
        assert!(json.contains("\"Goroot\":false"));
        assert!(json.contains("\"GoFiles\":[\"a.go\"]"));
        assert!(json.contains("\"XTestImports\":[\"os\"]"));
        assert!(json.contains("\"IgnoredGoFiles\":[]"));
        assert!(json.contains("\"GoFileImports\":{\"a.go\":[]}"));
    }

    #[test]
    fn test_bucket_accessors() {
        let pkg = Package {
            go_files: vec!["a.go".to_string()],
            test_imports: vec!["testing".to_string()],
            ..Default::default()
        };

        assert_eq!(pkg.files(Bucket::Main), ["a.go".to_string()]);
        assert!(pkg.files(Bucket::ExternalTest).is_empty());
        assert_eq!(pkg.bucket_imports(Bucket::InternalTest), ["testing".to_string()]);
        assert!(!pkg.is_empty());
        assert!(Package::default().is_empty());
    }

    #[test]
    fn test_stats_count() {
        let mut stats = ImportStats::default();
        stats.count(ImportType::Stdlib);
        stats.count(ImportType::Stdlib);
        stats.count(ImportType::External);

        assert_eq!(stats.total_imports, 3);
        assert_eq!(stats.stdlib_imports, 2);
        assert_eq!(stats.external_imports, 1);
    }
}
