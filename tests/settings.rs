//! Settings loaded from files.

use dashview::{DashviewError, Settings};
use std::io::Write;

#[test]
fn loads_settings_from_a_toml_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "default_list_limit = 5").unwrap();
    writeln!(file, "class_prefix = \"dash-\"").unwrap();
    writeln!(file, "trace_level = \"debug\"").unwrap();

    let settings = Settings::from_file(file.path()).unwrap();
    assert_eq!(settings.default_list_limit, Some(5));
    assert_eq!(settings.class_prefix, "dash-");
    assert_eq!(settings.trace_level.as_deref(), Some("debug"));
}

#[test]
fn missing_files_are_io_errors() {
    let dir = tempfile::tempdir().unwrap();
    let error = Settings::from_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(error, DashviewError::Io(_)));
}

#[test]
fn wrong_types_are_settings_errors() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "class_prefix = 3").unwrap();
    let error = Settings::from_file(file.path()).unwrap_err();
    assert!(matches!(error, DashviewError::Settings(_)));
}

#[test]
fn list_views_use_the_default_limit() {
    use dashview::text::{BoxType, TextBackend, TextRenderer};
    use futures::executor::block_on;
    use serde_json::json;

    let settings = Settings::from_toml_str("default_list_limit = 2").unwrap();
    let backend = TextBackend::new();
    let renderer = TextRenderer::builder(backend.clone()).settings(settings).build();
    let root = backend.root(BoxType::Block);
    block_on(renderer.render(&root, "list", json!(["a", "b", "c"]), json!({})));
    assert_eq!(backend.lines(&root), ["- a", "- b", "(1 more…)"]);
}
