use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Newest Go release whose `go1.N` tag is satisfied by default
const LATEST_GO_MINOR: u32 = 23;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to build glob pattern: {0}")]
    GlobError(#[from] globset::Error),
    #[error("Failed to parse gitignore: {0}")]
    GitignoreError(#[from] ignore::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// The Go toolchain environment the analyzer classifies files against.
///
/// Built once and handed to the importer; nothing below it reads the process
/// environment at call time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GoEnv {
    /// Installation root of the Go distribution
    pub goroot: PathBuf,
    /// Workspace root for GOPATH mode
    pub gopath: PathBuf,
    /// Target operating system (Go spelling, e.g. `linux`, `darwin`)
    pub goos: String,
    /// Target architecture (Go spelling, e.g. `amd64`, `arm64`)
    pub goarch: String,
    /// Extra tags satisfied by `//go:build` constraints
    pub build_tags: Vec<String>,
    /// Whether the `cgo` tag is satisfied
    pub cgo_enabled: bool,
    /// `go1.N` release tags
    pub release_tags: Vec<String>,
}

impl Default for GoEnv {
    fn default() -> Self {
        let goos = host_goos().to_string();
        let goarch = host_goarch().to_string();
        Self {
            goroot: PathBuf::from("/usr/local/go"),
            gopath: default_gopath(),
            goos,
            goarch,
            build_tags: vec![],
            cgo_enabled: true,
            release_tags: default_release_tags(),
        }
    }
}

impl GoEnv {
    /// Read GOROOT, GOPATH, GOOS, GOARCH and CGO_ENABLED, falling back to host defaults
    pub fn from_env() -> Self {
        let mut go_env = Self::default();

        if let Some(goroot) = non_empty_var("GOROOT") {
            go_env.goroot = PathBuf::from(goroot);
        }
        if let Some(gopath) = non_empty_var("GOPATH") {
            go_env.gopath = PathBuf::from(gopath);
        }
        if let Some(goos) = non_empty_var("GOOS") {
            go_env.goos = goos;
        }
        if let Some(goarch) = non_empty_var("GOARCH") {
            go_env.goarch = goarch;
        }

        // cgo is off by default when cross-compiling
        go_env.cgo_enabled = match non_empty_var("CGO_ENABLED").as_deref() {
            Some("1") => true,
            Some(_) => false,
            None => go_env.goos == host_goos() && go_env.goarch == host_goarch(),
        };

        go_env
    }

    pub fn with_goroot(mut self, goroot: PathBuf) -> Self {
        self.goroot = goroot;
        self
    }

    pub fn with_gopath(mut self, gopath: PathBuf) -> Self {
        self.gopath = gopath;
        self
    }

    pub fn with_goos(mut self, goos: impl Into<String>) -> Self {
        self.goos = goos.into();
        self
    }

    pub fn with_goarch(mut self, goarch: impl Into<String>) -> Self {
        self.goarch = goarch.into();
        self
    }

    pub fn with_build_tags(mut self, tags: Vec<String>) -> Self {
        self.build_tags = tags;
        self
    }

    pub fn with_cgo(mut self, enabled: bool) -> Self {
        self.cgo_enabled = enabled;
        self
    }

    /// `<goroot>/src`
    pub fn goroot_src(&self) -> PathBuf {
        self.goroot.join("src")
    }

    /// `<goroot>/pkg/<goos>_<goarch>`
    pub fn goroot_pkg(&self) -> PathBuf {
        self.goroot
            .join("pkg")
            .join(format!("{}_{}", self.goos, self.goarch))
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.is_empty())
}

fn default_gopath() -> PathBuf {
    match non_empty_var("HOME") {
        Some(home) => PathBuf::from(home).join("go"),
        None => PathBuf::from("go"),
    }
}

fn default_release_tags() -> Vec<String> {
    (1..=LATEST_GO_MINOR).map(|minor| format!("go1.{}", minor)).collect()
}

/// Host operating system in Go spelling
pub fn host_goos() -> &'static str {
    match env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// Host architecture in Go spelling
pub fn host_goarch() -> &'static str {
    match env::consts::ARCH {
        "x86_64" => "amd64",
        "x86" => "386",
        "aarch64" => "arm64",
        "powerpc64" => {
            if cfg!(target_endian = "little") {
                "ppc64le"
            } else {
                "ppc64"
            }
        }
        "s390x" => "s390x",
        "riscv64" => "riscv64",
        "loongarch64" => "loong64",
        "wasm32" => "wasm",
        other => other,
    }
}

/// Configuration for scanning a directory tree
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Root directory to scan
    pub root: PathBuf,
    /// Descend into subdirectories
    pub recursive: bool,
    /// Additional ignore patterns (glob style)
    pub ignore_patterns: Vec<String>,
    /// Custom ignore file path
    pub ignore_file: Option<PathBuf>,
    /// Descend into vendor directories
    pub include_vendor: bool,
    /// Number of threads (0 = auto)
    pub threads: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            recursive: false,
            ignore_patterns: vec![],
            ignore_file: None,
            include_vendor: false,
            threads: 0,
        }
    }
}

impl ScanConfig {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            ..Default::default()
        }
    }

    pub fn with_recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    pub fn with_ignore_file(mut self, path: PathBuf) -> Self {
        self.ignore_file = Some(path);
        self
    }

    pub fn with_include_vendor(mut self, include: bool) -> Self {
        self.include_vendor = include;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }
}

/// Filter for ignoring directories during a scan
pub struct IgnoreFilter {
    gitignore: Option<Gitignore>,
    custom_globs: GlobSet,
    default_ignores: GlobSet,
}

impl IgnoreFilter {
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        // Load .gitignore if present
        let gitignore = if let Some(ref ignore_file) = config.ignore_file {
            let mut builder = GitignoreBuilder::new(&config.root);
            if let Some(err) = builder.add(ignore_file) {
                return Err(err.into());
            }
            Some(builder.build()?)
        } else {
            let gitignore_path = config.root.join(".gitignore");
            if gitignore_path.exists() {
                let mut builder = GitignoreBuilder::new(&config.root);
                builder.add(&gitignore_path);
                Some(builder.build()?)
            } else {
                None
            }
        };

        let mut custom_builder = GlobSetBuilder::new();
        for pattern in &config.ignore_patterns {
            custom_builder.add(Glob::new(pattern)?);
        }
        let custom_globs = custom_builder.build()?;

        let mut default_builder = GlobSetBuilder::new();
        default_builder.add(Glob::new("**/node_modules")?);
        if !config.include_vendor {
            default_builder.add(Glob::new("**/vendor")?);
        }
        let default_ignores = default_builder.build()?;

        Ok(Self {
            gitignore,
            custom_globs,
            default_ignores,
        })
    }

    /// Check if a directory should be skipped
    pub fn should_ignore(&self, path: &Path, is_dir: bool) -> bool {
        if is_dir && is_go_ignored_dir(path) {
            return true;
        }

        let path_str = path.to_string_lossy();

        if self.default_ignores.is_match(&*path_str) {
            return true;
        }

        if self.custom_globs.is_match(&*path_str) {
            return true;
        }

        if let Some(ref gi) = self.gitignore {
            if gi.matched(path, is_dir).is_ignore() {
                return true;
            }
        }

        false
    }
}

/// Directories the go command never treats as packages: `testdata` and names
/// starting with `.` or `_`
fn is_go_ignored_dir(path: &Path) -> bool {
    match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name == "testdata" || name.starts_with('.') || name.starts_with('_'),
        None => false,
    }
}
