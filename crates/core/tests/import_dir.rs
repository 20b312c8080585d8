use mta_rust_gopkgmap_core::{GoEnv, ImportError, Importer, Package, ParserError};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn linux_env(goroot: &Path) -> GoEnv {
    GoEnv::default()
        .with_goroot(goroot.to_path_buf())
        .with_goos("linux")
        .with_goarch("amd64")
        .with_cgo(false)
}

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn names(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

fn all_files(pkg: &Package) -> Vec<&String> {
    pkg.go_files
        .iter()
        .chain(&pkg.test_go_files)
        .chain(&pkg.x_test_go_files)
        .chain(&pkg.ignored_go_files)
        .collect()
}

#[test]
fn every_input_file_lands_in_exactly_one_list() {
    let goroot = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.go", "package p\n\nimport \"fmt\"\n");
    write(dir.path(), "b_linux.go", "package p\n\nimport \"golang.org/x/sys/unix\"\n");
    write(dir.path(), "b_darwin.go", "package p\n");
    write(dir.path(), "c_test.go", "package p\n\nimport \"testing\"\n");
    write(dir.path(), "d_test.go", "package p_test\n\nimport (\n\t\"testing\"\n\t\"p\"\n)\n");
    write(dir.path(), "e.go", "// +build tools\n\npackage p\n\nimport _ \"golang.org/x/tools/cmd/stringer\"\n");

    let input = names(&["e.go", "d_test.go", "c_test.go", "b_linux.go", "b_darwin.go", "a.go"]);
    let pkg = Importer::new(linux_env(goroot.path()))
        .import_dir(dir.path(), &input)
        .unwrap();

    let seen = all_files(&pkg);
    assert_eq!(seen.len(), input.len());
    let unique: HashSet<_> = seen.iter().collect();
    assert_eq!(unique.len(), input.len());

    assert_eq!(pkg.name, "p");
    assert_eq!(pkg.go_files, ["a.go", "b_linux.go"]);
    assert_eq!(pkg.ignored_go_files, ["e.go", "b_darwin.go"]);
    assert_eq!(pkg.imports, ["fmt", "golang.org/x/sys/unix"]);
    assert_eq!(pkg.test_imports, ["testing"]);
    assert_eq!(pkg.x_test_imports, ["p", "testing"]);

    let classified: HashSet<_> = pkg
        .go_files
        .iter()
        .chain(&pkg.test_go_files)
        .chain(&pkg.x_test_go_files)
        .collect();
    let mapped: HashSet<_> = pkg.go_file_imports.keys().collect();
    assert_eq!(classified, mapped);
}

#[test]
fn build_tags_enable_files() {
    let goroot = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "e.go", "//go:build tools\n\npackage p\n\nimport _ \"example.com/tool\"\n");

    let env = linux_env(goroot.path()).with_build_tags(vec!["tools".to_string()]);
    let pkg = Importer::new(env).import_dir(dir.path(), &names(&["e.go"])).unwrap();

    assert_eq!(pkg.go_files, ["e.go"]);
    assert_eq!(pkg.imports, ["example.com/tool"]);
}

#[test]
fn goroot_directories_and_paths() {
    let goroot = TempDir::new().unwrap();
    let src = goroot.path().join("src");
    let strings_dir = src.join("strings");
    fs::create_dir_all(&strings_dir).unwrap();
    write(&strings_dir, "strings.go", "package strings\n\nimport \"unicode\"\n");

    let importer = Importer::new(linux_env(goroot.path()));
    let pkg = importer
        .import_dir(&strings_dir, &names(&["strings.go"]))
        .unwrap();

    assert!(pkg.goroot);
    assert!(importer.is_goroot("strings"));
    assert!(!importer.is_goroot("github.com/pkg/errors"));

    let elsewhere = TempDir::new().unwrap();
    write(elsewhere.path(), "x.go", "package x\n");
    let pkg = importer.import_dir(elsewhere.path(), &names(&["x.go"])).unwrap();
    assert!(!pkg.goroot);
}

#[test]
fn unparsable_header_aborts_whole_directory() {
    let goroot = TempDir::new().unwrap();
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a.go", "package p\n");
    write(dir.path(), "b.go", "not go at all\n");

    let result = Importer::new(linux_env(goroot.path()))
        .import_dir(dir.path(), &names(&["a.go", "b.go"]));

    assert!(matches!(
        result,
        Err(ImportError::Parse {
            source: ParserError::Syntax { .. },
            ..
        })
    ));
}
