//! Unit tests for path resolution and validation.

use std::path::PathBuf;

use gemini_bridge::tool::paths::resolve_paths;
use gemini_bridge::AppError;

#[tokio::test]
async fn resolves_relative_file_against_cwd() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("notes.txt"), "x").expect("write fixture");

    let resolved = resolve_paths(&["notes.txt".to_owned()], dir.path())
        .await
        .expect("existing file must resolve");

    assert_eq!(resolved.absolute, vec![dir.path().join("notes.txt")]);
    assert_eq!(resolved.relative, vec![PathBuf::from("notes.txt")]);
}

#[tokio::test]
async fn rebases_absolute_path_under_cwd() {
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("src.rs");
    std::fs::write(&file, "x").expect("write fixture");

    let input = file.to_string_lossy().into_owned();
    let resolved = resolve_paths(&[input], dir.path())
        .await
        .expect("absolute path must resolve");

    assert_eq!(resolved.relative, vec![PathBuf::from("src.rs")]);
}

#[tokio::test]
async fn accepts_directories() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::create_dir(dir.path().join("sub")).expect("mkdir");

    let resolved = resolve_paths(&["sub".to_owned()], dir.path())
        .await
        .expect("existing directory must resolve");

    assert_eq!(resolved.absolute.len(), 1);
}

#[tokio::test]
async fn missing_path_error_names_the_input() {
    let dir = tempfile::tempdir().expect("tempdir");

    let result = resolve_paths(&["ghost.rs".to_owned()], dir.path()).await;

    match result {
        Err(AppError::Path(msg)) => assert!(
            msg.contains("ghost.rs"),
            "error must name the offending path, got: {msg}"
        ),
        other => panic!("expected Err(AppError::Path), got: {other:?}"),
    }
}

#[tokio::test]
async fn output_lists_stay_index_aligned() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("a.rs"), "x").expect("write fixture");
    std::fs::write(dir.path().join("b.rs"), "x").expect("write fixture");

    let resolved = resolve_paths(&["a.rs".to_owned(), "b.rs".to_owned()], dir.path())
        .await
        .expect("both files must resolve");

    assert_eq!(resolved.absolute.len(), 2);
    assert_eq!(resolved.relative.len(), 2);
    assert_eq!(resolved.relative[0], PathBuf::from("a.rs"));
    assert_eq!(resolved.relative[1], PathBuf::from("b.rs"));
}

#[tokio::test]
async fn first_bad_path_fails_the_whole_batch() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(dir.path().join("real.rs"), "x").expect("write fixture");

    let result = resolve_paths(&["real.rs".to_owned(), "fake.rs".to_owned()], dir.path()).await;
    assert!(result.is_err(), "one bad path must fail resolution");
}
