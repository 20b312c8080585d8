mod json;
mod yaml;

pub use json::to_json;
pub use yaml::to_yaml;

use crate::models::{Package, PackageMap};

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Summary,
}

/// Format a PackageMap according to the specified format
pub fn format_output(map: &PackageMap, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => to_json(map),
        OutputFormat::Yaml => to_yaml(map),
        OutputFormat::Summary => Ok(format_summary(map)),
    }
}

/// Format a single directory's Package
pub fn format_package(package: &Package, format: OutputFormat) -> Result<String, FormatError> {
    match format {
        OutputFormat::Json => to_json(package),
        OutputFormat::Yaml => to_yaml(package),
        OutputFormat::Summary => Ok(format_package_summary(package)),
    }
}

fn push_list(output: &mut String, label: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    output.push_str(&format!("{}:\n", label));
    for item in items {
        output.push_str(&format!("  {}\n", item));
    }
}

/// Human-readable view of one package
pub fn format_package_summary(package: &Package) -> String {
    let mut output = String::new();

    let name = if package.name.is_empty() {
        "(none)"
    } else {
        package.name.as_str()
    };
    output.push_str(&format!("Package: {}\n", name));
    if package.goroot {
        output.push_str("Standard library: yes\n");
    }

    push_list(&mut output, "Go Files", &package.go_files);
    push_list(&mut output, "Imports", &package.imports);
    push_list(&mut output, "Test Go Files", &package.test_go_files);
    push_list(&mut output, "Test Imports", &package.test_imports);
    push_list(&mut output, "External Test Go Files", &package.x_test_go_files);
    push_list(&mut output, "External Test Imports", &package.x_test_imports);
    push_list(&mut output, "Ignored Go Files", &package.ignored_go_files);

    output
}

/// Generate a human-readable summary
pub fn format_summary(map: &PackageMap) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Go Package Summary\n\
         ==================\n\
         Root: {}\n",
        map.root.display()
    ));
    if let Some(ref module) = map.module_path {
        output.push_str(&format!("Module: {}\n", module));
    }
    output.push('\n');

    output.push_str(&format!(
        "Packages: {}\n\
         - Go files: {}\n\
         - Test files: {}\n\
         - External test files: {}\n\
         - Ignored files: {}\n\n",
        map.stats.total_packages,
        map.stats.go_files,
        map.stats.test_go_files,
        map.stats.x_test_go_files,
        map.stats.ignored_go_files
    ));

    output.push_str(&format!(
        "Total Imports: {}\n\
         - Stdlib: {}\n\
         - Internal: {}\n\
         - External: {}\n\
         - Local: {}\n\
         - Unknown: {}\n\n",
        map.stats.total_imports,
        map.stats.stdlib_imports,
        map.stats.internal_imports,
        map.stats.external_imports,
        map.stats.local_imports,
        map.stats.unknown_imports
    ));

    if !map.packages.is_empty() {
        output.push_str("Packages:\n");
        for entry in &map.packages {
            let pkg = &entry.package;
            output.push_str(&format!(
                "  {} ({}): {} files, {} test, {} xtest, {} ignored\n",
                entry.dir.display(),
                pkg.name,
                pkg.go_files.len(),
                pkg.test_go_files.len(),
                pkg.x_test_go_files.len(),
                pkg.ignored_go_files.len()
            ));
        }
        output.push('\n');
    }

    if !map.errors.is_empty() {
        output.push_str("Errors:\n");
        for err in &map.errors {
            output.push_str(&format!("  {}: {}\n", err.dir.display(), err.message));
        }
        output.push('\n');
    }

    output.push_str(&format!(
        "Target: {}/{}\n\
         Scan Duration: {}ms ({:.2} dirs/sec)\n\
         Timestamp: {}\n\
         Tool Version: {}\n",
        map.metadata.goos,
        map.metadata.goarch,
        map.metadata.scan_duration_ms,
        map.metadata.dirs_per_second,
        map.metadata.timestamp,
        map.metadata.tool_version
    ));

    output
}

#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("YAML serialization error: {0}")]
    YamlError(#[from] serde_yaml::Error),
}
