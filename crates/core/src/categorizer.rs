use crate::goroot::StdlibRoots;
use crate::models::ImportType;

/// Categorizes Go import paths as stdlib, internal, external, local or unknown
pub struct ImportCategorizer<'a> {
    roots: &'a StdlibRoots,
    /// Path of the module being scanned
    module_path: Option<String>,
}

impl<'a> ImportCategorizer<'a> {
    pub fn new(roots: &'a StdlibRoots, module_path: Option<String>) -> Self {
        Self { roots, module_path }
    }

    /// Categorize an import path
    pub fn categorize(&self, import_path: &str) -> ImportType {
        // 1. Relative imports
        if import_path == "." || import_path.starts_with("./") || import_path.starts_with("../") {
            return ImportType::Local;
        }

        // 2. Packages of the module itself
        if let Some(ref module) = self.module_path {
            if import_path == module
                || import_path
                    .strip_prefix(module.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
            {
                return ImportType::Internal;
            }
        }

        // 3. Standard library
        if self.roots.is_standard_library_path(import_path) {
            return ImportType::Stdlib;
        }

        // 4. Module paths start with a host name
        let first = import_path.split('/').next().unwrap_or(import_path);
        if first.contains('.') {
            return ImportType::External;
        }

        ImportType::Unknown
    }
}
