use crate::config::GoEnv;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// Standard-distribution layout: precompiled archives and the source tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StdlibRoots {
    /// `<goroot>/pkg/<goos>_<goarch>`
    pub pkg_root: PathBuf,
    /// `<goroot>/src`
    pub src_root: PathBuf,
}

impl StdlibRoots {
    pub fn new(env: &GoEnv) -> Self {
        Self {
            pkg_root: env.goroot_pkg(),
            src_root: env.goroot_src(),
        }
    }

    /// True if `import_path` has an archive under the package root or a source
    /// directory under the source root. Stat failures count as "does not exist".
    pub fn is_standard_library_path(&self, import_path: &str) -> bool {
        // import paths are relative to the roots, even when spelled with a leading `/`
        let rel = import_path.trim_start_matches('/');
        if rel.is_empty()
            || Path::new(rel)
                .components()
                .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return false;
        }

        let archive = self.pkg_root.join(format!("{}.a", rel));
        let source = self.src_root.join(rel);

        [archive, source].iter().any(|candidate| exists(candidate))
    }

    /// True if `dir` is the source root or nested under it
    pub fn is_standard_library_dir(&self, dir: &Path) -> bool {
        dir.starts_with(&self.src_root)
    }
}

fn exists(path: &Path) -> bool {
    match fs::metadata(path) {
        Ok(_) => true,
        Err(err) => {
            if err.kind() != io::ErrorKind::NotFound {
                tracing::debug!("stat {} failed: {}", path.display(), err);
            }
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_goroot() -> (TempDir, StdlibRoots) {
        let temp = TempDir::new().unwrap();
        let env = GoEnv::default()
            .with_goroot(temp.path().to_path_buf())
            .with_goos("linux")
            .with_goarch("amd64");
        let roots = StdlibRoots::new(&env);

        fs::create_dir_all(roots.src_root.join("net/http")).unwrap();
        fs::create_dir_all(roots.pkg_root.join("encoding")).unwrap();
        fs::write(roots.pkg_root.join("encoding/json.a"), b"!<arch>\n").unwrap();

        (temp, roots)
    }

    #[test]
    fn test_standard_library_path_from_source_tree() {
        let (_temp, roots) = fake_goroot();
        assert!(roots.is_standard_library_path("net/http"));
        assert!(roots.is_standard_library_path("net"));
    }

    #[test]
    fn test_standard_library_path_from_archive() {
        let (_temp, roots) = fake_goroot();
        assert!(roots.is_standard_library_path("encoding/json"));
    }

    #[test]
    fn test_non_standard_library_path() {
        let (_temp, roots) = fake_goroot();
        assert!(!roots.is_standard_library_path("github.com/pkg/errors"));
        assert!(!roots.is_standard_library_path("encoding/xml"));
    }

    #[test]
    fn test_rooted_path_stays_under_goroot() {
        let (_temp, roots) = fake_goroot();
        let outside = TempDir::new().unwrap();
        let outside_path = outside.path().to_string_lossy().to_string();

        assert!(!roots.is_standard_library_path(&outside_path));
        assert!(!roots.is_standard_library_path("/usr"));
        assert!(!roots.is_standard_library_path("/"));
        // rooted spelling of a real stdlib package still resolves inside GOROOT
        assert!(roots.is_standard_library_path("/net/http"));
    }

    #[test]
    fn test_parent_components_are_rejected() {
        let (_temp, roots) = fake_goroot();
        assert!(!roots.is_standard_library_path("../src/net"));
        assert!(!roots.is_standard_library_path("net/../.."));
    }

    #[test]
    fn test_standard_library_dir() {
        let roots = StdlibRoots {
            pkg_root: PathBuf::from("/go/pkg/linux_amd64"),
            src_root: PathBuf::from("/go/src"),
        };

        assert!(roots.is_standard_library_dir(Path::new("/go/src")));
        assert!(roots.is_standard_library_dir(Path::new("/go/src/net/http")));
        assert!(!roots.is_standard_library_dir(Path::new("/go/srcfoo")));
        assert!(!roots.is_standard_library_dir(Path::new("/go/pkg")));
        assert!(!roots.is_standard_library_dir(Path::new("/home/me/project")));
    }
}
