//! Integration tests for Settings loading with layered merge semantics.
//!
//! Merge semantics: each layer replaces the fields it specifies.
//! These tests only write local config files into temp directories.

use std::fs;

use tempfile::TempDir;

use outline::config::{local_config_path, Settings};

#[test]
fn given_local_config_when_load_then_specified_fields_replace_defaults() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        r#"
default_name = "Untitled chapter"

[editor]
min_height = 48
"#,
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert_eq!(settings.default_name, "Untitled chapter");
    assert_eq!(settings.editor.min_height, 48);
    assert_eq!(settings.editor.holder, Settings::default().editor.holder);
}

#[test]
fn given_no_local_config_when_load_then_directory_is_ignored() {
    let dir = TempDir::new().unwrap();

    let with_dir = Settings::load(Some(dir.path())).expect("load settings");
    let without_dir = Settings::load(None).expect("load settings");

    assert_eq!(with_dir.default_name, without_dir.default_name);
    assert_eq!(with_dir.editor.min_height, without_dir.editor.min_height);
}

#[test]
fn given_media_dir_with_tilde_when_load_then_path_is_expanded() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[media]\ndir = \"~/outline-media\"\n",
    )
    .unwrap();

    let settings = Settings::load(Some(dir.path())).expect("load settings");

    assert!(!settings.media.dir.to_string_lossy().starts_with('~'));
    assert!(settings.media.dir.ends_with("outline-media"));
}

#[test]
fn given_invalid_local_config_when_load_then_config_error() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), "[editor]\nmin_height = \"tall\"\n").unwrap();

    let result = Settings::load(Some(dir.path()));

    assert!(result.is_err());
}

#[test]
fn given_template_when_written_as_local_config_then_it_loads() {
    let dir = TempDir::new().unwrap();
    fs::write(local_config_path(dir.path()), Settings::template()).unwrap();

    let settings = Settings::load(Some(dir.path())).expect("template loads");

    assert_eq!(settings.id_prefix, Settings::default().id_prefix);
}

/// Only fields no other test in this binary inspects, since env vars are process-wide.
#[test]
fn given_env_override_when_load_then_env_wins() {
    let dir = TempDir::new().unwrap();
    fs::write(
        local_config_path(dir.path()),
        "[editor]\nplaceholder = \"From file\"\n",
    )
    .unwrap();
    std::env::set_var("OUTLINE_EDITOR__PLACEHOLDER", "From env");
    std::env::set_var("OUTLINE_MEDIA__BASE_URL", "/static/media");

    let settings = Settings::load(Some(dir.path()));

    std::env::remove_var("OUTLINE_EDITOR__PLACEHOLDER");
    std::env::remove_var("OUTLINE_MEDIA__BASE_URL");
    let settings = settings.expect("load settings");
    assert_eq!(settings.editor.placeholder, "From env");
    assert_eq!(settings.media.base_url, "/static/media");
}
