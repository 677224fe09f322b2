/// Unit tests for the source loaders

use crate::shader::loader::*;
use crate::error::Error;
use std::fs;

#[test]
fn test_extension_of() {
    assert_eq!(extension_of("Water.vert"), Some("vert"));
    assert_eq!(extension_of("shaders/lib.v2/Common.shadinc"), Some("shadinc"));
    assert_eq!(extension_of("shaders.d/README"), None);
    assert_eq!(extension_of("noext"), None);
}

#[test]
fn test_memory_loader_read_and_list() {
    let loader = MemorySourceLoader::new()
        .with_source("b.frag", "void main() {}")
        .with_source("a.vert", "void main() {}");

    assert_eq!(loader.read_source("b.frag").unwrap(), "void main() {}");
    assert_eq!(loader.list_sources().unwrap(), vec!["a.vert", "b.frag"]);
}

#[test]
fn test_memory_loader_missing_is_io_error() {
    let loader = MemorySourceLoader::new();
    match loader.read_source("Missing.vert") {
        Err(Error::Io { path, .. }) => assert_eq!(path, "Missing.vert"),
        other => panic!("expected Io error, got {:?}", other),
    }
}

#[test]
fn test_filesystem_loader_reads_and_lists_shader_files() {
    let dir = std::env::temp_dir().join(format!("galaxy3d_loader_test_{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("Plain.vert"), "in vec3 aPosition;").unwrap();
    fs::write(dir.join("Common.shadinc"), "float x;").unwrap();
    fs::write(dir.join("notes.txt"), "ignored").unwrap();

    let loader = FileSystemLoader::new(&dir);
    assert_eq!(loader.read_source("Plain.vert").unwrap(), "in vec3 aPosition;");
    assert_eq!(loader.list_sources().unwrap(), vec!["Common.shadinc", "Plain.vert"]);
    assert!(matches!(loader.read_source("Missing.frag"), Err(Error::Io { .. })));

    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_filesystem_loader_missing_root() {
    let loader = FileSystemLoader::new("/definitely/not/a/shader/dir");
    assert!(loader.list_sources().is_err());
}
