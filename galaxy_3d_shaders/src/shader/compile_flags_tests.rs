/// Unit tests for ShaderCompileFlags

use crate::shader::compile_flags::*;

#[test]
fn test_flags_combine_sorted() {
    let flags = ShaderCompileFlag::textured() | ShaderCompileFlag::lit();
    assert_eq!(flags.key(), "LIT,TEXTURED");

    let other = ShaderCompileFlag::lit() | ShaderCompileFlag::textured();
    assert_eq!(flags, other);
}

#[test]
fn test_flag_with_value() {
    let mut flags = ShaderCompileFlags::from(ShaderCompileFlag::skeletal_animated());
    flags |= ShaderCompileFlag::with_value("MAX_BONES", "4");

    assert_eq!(flags.key(), "MAX_BONES=4,SKELETAL_ANIMATED");
    assert!(flags.contains("MAX_BONES"));
    assert!(!flags.contains("LIT"));
}

#[test]
fn test_setting_flag_twice_replaces_value() {
    let flags = ShaderCompileFlags::new()
        | ShaderCompileFlag::with_value("MAX_BONES", "4")
        | ShaderCompileFlag::with_value("MAX_BONES", "8");

    assert_eq!(flags.iter().count(), 1);
    assert_eq!(flags.key(), "MAX_BONES=8");
}

#[test]
fn test_union_of_sets() {
    let a = ShaderCompileFlags::from(ShaderCompileFlag::lit());
    let b = ShaderCompileFlag::textured() | ShaderCompileFlag::lit();
    assert_eq!((a | b).key(), "LIT,TEXTURED");
}

#[test]
fn test_apply_injects_after_version() {
    let flags = ShaderCompileFlag::lit() | ShaderCompileFlag::with_value("MAX_BONES", "4");
    let source = "#version 130\nin vec3 aPosition;\n";

    assert_eq!(
        flags.apply(source),
        "#version 130\n#define LIT\n#define MAX_BONES 4\nin vec3 aPosition;\n"
    );
}

#[test]
fn test_apply_without_version_prepends() {
    let flags = ShaderCompileFlags::from(ShaderCompileFlag::textured());
    assert_eq!(flags.apply("void main() {}"), "#define TEXTURED\nvoid main() {}");
}

#[test]
fn test_empty_flags_leave_source_untouched() {
    let flags = ShaderCompileFlags::new();
    assert!(flags.is_empty());
    assert_eq!(flags.key(), "");
    assert_eq!(flags.apply("#version 130\n"), "#version 130\n");
}
