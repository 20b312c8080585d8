use crate::categorizer::ImportCategorizer;
use crate::config::{GoEnv, IgnoreFilter, ScanConfig};
use crate::importer::{ImportError, Importer};
use crate::models::{
    Bucket, DirError, DirPackage, ImportStats, Package, PackageMap, ScanMetadata,
};
use crate::module::module_path_for_dir;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Config error: {0}")]
    ConfigError(#[from] crate::config::ConfigError),
    #[error("Import error: {0}")]
    ImportError(#[from] ImportError),
    #[error("Thread pool error: {0}")]
    ThreadPoolError(String),
}

/// Scans a directory (or a tree of directories) and classifies each Go package in it
pub struct PackageScanner {
    config: ScanConfig,
    ignore_filter: IgnoreFilter,
    importer: Importer,
}

impl PackageScanner {
    pub fn new(config: ScanConfig, env: GoEnv) -> Result<Self, ScanError> {
        Self::with_importer(config, Importer::new(env))
    }

    pub fn with_importer(config: ScanConfig, importer: Importer) -> Result<Self, ScanError> {
        let ignore_filter = IgnoreFilter::new(&config)?;
        Ok(Self {
            config,
            ignore_filter,
            importer,
        })
    }

    /// Classify the root directory only, failing on the first bad file
    pub fn import_root(&self) -> Result<Package, ScanError> {
        let names = list_go_files(&self.config.root)?;
        Ok(self.importer.import_dir(&self.config.root, &names)?)
    }

    /// Scan the configured root and return the package map
    pub fn scan(&self) -> Result<PackageMap, ScanError> {
        let start = Instant::now();

        // 1. Find every directory holding .go files
        let dirs = self.find_package_dirs()?;
        tracing::info!(
            "found {} package directories under {}",
            dirs.len(),
            self.config.root.display()
        );

        // 2. Import directories; each one is independent
        let results: Vec<(PathBuf, Result<Package, ImportError>)> = if self.config.threads == 1 {
            dirs.into_iter()
                .map(|(dir, names)| {
                    let result = self.importer.import_dir(&dir, &names);
                    (dir, result)
                })
                .collect()
        } else {
            let import = |(dir, names): &(PathBuf, Vec<String>)| {
                (dir.clone(), self.importer.import_dir(dir, names))
            };

            if self.config.threads > 0 {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(self.config.threads)
                    .build()
                    .map_err(|e| ScanError::ThreadPoolError(e.to_string()))?;
                pool.install(|| dirs.par_iter().map(import).collect())
            } else {
                dirs.par_iter().map(import).collect()
            }
        };

        // 3. Split successes from failures; the caller decides what a failure means
        let mut packages = Vec::new();
        let mut errors = Vec::new();
        for (dir, result) in results {
            let rel = self.relative(&dir);
            match result {
                Ok(package) => packages.push(DirPackage { dir: rel, package }),
                Err(err) => {
                    tracing::warn!("skipping {}: {}", dir.display(), err);
                    errors.push(DirError {
                        dir: rel,
                        message: err.to_string(),
                    });
                }
            }
        }
        packages.sort_by(|a, b| a.dir.cmp(&b.dir));
        errors.sort_by(|a, b| a.dir.cmp(&b.dir));

        // 4. Statistics
        let module_path = module_path_for_dir(&self.config.root);
        let stats = self.calculate_stats(&packages, module_path.clone());

        // 5. Metadata
        let duration = start.elapsed();
        let env = self.importer.env();
        let metadata = ScanMetadata {
            scan_duration_ms: duration.as_millis() as u64,
            dirs_per_second: if duration.as_secs_f64() > 0.0 {
                (packages.len() + errors.len()) as f64 / duration.as_secs_f64()
            } else {
                0.0
            },
            timestamp: chrono::Utc::now().to_rfc3339(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            goos: env.goos.clone(),
            goarch: env.goarch.clone(),
        };

        Ok(PackageMap {
            root: self.config.root.clone(),
            module_path,
            packages,
            errors,
            stats,
            metadata,
        })
    }

    /// Directories with at least one .go file, each with its sorted file names
    fn find_package_dirs(&self) -> Result<Vec<(PathBuf, Vec<String>)>, ScanError> {
        if !self.config.recursive {
            let names = list_go_files(&self.config.root)?;
            return Ok(if names.is_empty() {
                vec![]
            } else {
                vec![(self.config.root.clone(), names)]
            });
        }

        let mut dirs = Vec::new();
        let walker = WalkDir::new(&self.config.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !self.ignore_filter.should_ignore(e.path(), true)
            });

        for entry in walker.filter_map(|e| e.ok()) {
            if !entry.file_type().is_dir() {
                continue;
            }
            let names = list_go_files(entry.path())?;
            if !names.is_empty() {
                dirs.push((entry.path().to_path_buf(), names));
            }
        }

        Ok(dirs)
    }

    fn relative(&self, dir: &Path) -> PathBuf {
        match dir.strip_prefix(&self.config.root) {
            Ok(rel) if rel.as_os_str().is_empty() => PathBuf::from("."),
            Ok(rel) => rel.to_path_buf(),
            Err(_) => dir.to_path_buf(),
        }
    }

    fn calculate_stats(&self, packages: &[DirPackage], module_path: Option<String>) -> ImportStats {
        let categorizer = ImportCategorizer::new(self.importer.roots(), module_path);
        let mut stats = ImportStats {
            total_packages: packages.len(),
            ..Default::default()
        };

        for DirPackage { package, .. } in packages {
            stats.go_files += package.files(Bucket::Main).len();
            stats.test_go_files += package.files(Bucket::InternalTest).len();
            stats.x_test_go_files += package.files(Bucket::ExternalTest).len();
            stats.ignored_go_files += package.ignored_go_files.len();

            for bucket in [Bucket::Main, Bucket::InternalTest, Bucket::ExternalTest] {
                for import in package.bucket_imports(bucket) {
                    stats.count(categorizer.categorize(import));
                }
            }
        }

        stats
    }
}

/// Names of the regular `.go` files in `dir`, sorted
pub fn list_go_files(dir: &Path) -> Result<Vec<String>, std::io::Error> {
    let mut names = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            if name.ends_with(".go") {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn test_env(goroot: &Path) -> GoEnv {
        GoEnv::default()
            .with_goroot(goroot.to_path_buf())
            .with_goos("linux")
            .with_goarch("amd64")
            .with_cgo(false)
    }

    fn fixture() -> (TempDir, TempDir) {
        let project = TempDir::new().unwrap();
        let root = project.path();
        write(root, "go.mod", "module example.com/app\n\ngo 1.21\n");
        write(root, "main.go", "package main\n\nimport (\n\t\"fmt\"\n\t\"example.com/app/util\"\n)\n");
        write(root, "util/util.go", "package util\n\nimport \"strings\"\n");
        write(root, "util/util_test.go", "package util\n\nimport \"testing\"\n");
        write(root, "util/util_windows.go", "package util\n\nimport \"syscall\"\n");
        write(root, "broken/b.go", "import \"fmt\"\n");
        write(root, "testdata/skip.go", "package skip\n");
        write(root, "vendor/github.com/x/y/y.go", "package y\n");
        write(root, "docs/README.md", "no go here\n");

        let goroot = TempDir::new().unwrap();
        for pkg in ["fmt", "strings", "testing", "syscall"] {
            fs::create_dir_all(goroot.path().join("src").join(pkg)).unwrap();
        }

        (project, goroot)
    }

    #[test]
    fn test_list_go_files() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "b.go", "package p\n");
        write(temp.path(), "a.go", "package p\n");
        write(temp.path(), "notes.txt", "");
        fs::create_dir_all(temp.path().join("dir.go")).unwrap();

        assert_eq!(list_go_files(temp.path()).unwrap(), ["a.go", "b.go"]);
    }

    #[test]
    fn test_import_root() {
        let (project, goroot) = fixture();
        let scanner = PackageScanner::new(
            ScanConfig::new(project.path().join("util")),
            test_env(goroot.path()),
        )
        .unwrap();

        let pkg = scanner.import_root().unwrap();
        assert_eq!(pkg.name, "util");
        assert_eq!(pkg.go_files, ["util.go"]);
        assert_eq!(pkg.test_go_files, ["util_test.go"]);
        assert_eq!(pkg.ignored_go_files, ["util_windows.go"]);
    }

    #[test]
    fn test_recursive_scan() {
        let (project, goroot) = fixture();
        let config = ScanConfig::new(project.path().to_path_buf())
            .with_recursive(true)
            .with_threads(2);
        let scanner = PackageScanner::new(config, test_env(goroot.path())).unwrap();

        let map = scanner.scan().unwrap();
        let dirs: Vec<_> = map.packages.iter().map(|p| p.dir.clone()).collect();

        assert_eq!(dirs, [PathBuf::from("."), PathBuf::from("util")]);
        assert_eq!(map.module_path.as_deref(), Some("example.com/app"));
        assert_eq!(map.errors.len(), 1);
        assert_eq!(map.errors[0].dir, PathBuf::from("broken"));

        assert_eq!(map.stats.total_packages, 2);
        assert_eq!(map.stats.go_files, 2);
        assert_eq!(map.stats.test_go_files, 1);
        assert_eq!(map.stats.ignored_go_files, 1);
        assert_eq!(map.stats.internal_imports, 1);
        assert_eq!(map.stats.stdlib_imports, 3);
        assert_eq!(map.metadata.goos, "linux");
    }

    #[test]
    fn test_sequential_matches_parallel() {
        let (project, goroot) = fixture();
        let scan = |threads| {
            let config = ScanConfig::new(project.path().to_path_buf())
                .with_recursive(true)
                .with_threads(threads);
            PackageScanner::new(config, test_env(goroot.path()))
                .unwrap()
                .scan()
                .unwrap()
        };

        let sequential = scan(1);
        let parallel = scan(0);
        let packages = |map: &PackageMap| -> Vec<Package> {
            map.packages.iter().map(|p| p.package.clone()).collect()
        };
        assert_eq!(packages(&sequential), packages(&parallel));
    }

    #[test]
    fn test_include_vendor() {
        let (project, goroot) = fixture();
        let config = ScanConfig::new(project.path().to_path_buf())
            .with_recursive(true)
            .with_include_vendor(true);
        let map = PackageScanner::new(config, test_env(goroot.path()))
            .unwrap()
            .scan()
            .unwrap();

        assert!(map
            .packages
            .iter()
            .any(|p| p.dir == PathBuf::from("vendor/github.com/x/y")));
    }
}
