//! Configuration resolver round trips and precedence.

mod common;

use std::collections::HashMap;

use rstest::rstest;

use common::{TestRepo, repo};
use wtr::CancelToken;

#[rstest]
fn set_get_round_trip(repo: TestRepo) {
    let manager = repo.manager();

    manager
        .config_set("wtr.worktrees.prefix", "wt-", false)
        .unwrap();
    assert_eq!(
        manager.config_get("wtr.worktrees.prefix", false).unwrap(),
        vec!["wt-"]
    );
}

#[rstest]
fn add_accumulates_and_unset_clears(repo: TestRepo) {
    let manager = repo.manager();

    manager
        .config_add("wtr.copy.include", ".env.local", false)
        .unwrap();
    manager
        .config_add("wtr.copy.include", ".env.example", false)
        .unwrap();
    assert_eq!(
        manager.config_get("wtr.copy.include", false).unwrap(),
        vec![".env.local", ".env.example"]
    );

    manager.config_unset("wtr.copy.include", false).unwrap();
    assert_eq!(
        manager.config_get("wtr.copy.include", false).unwrap(),
        Vec::<String>::new()
    );
}

#[rstest]
fn unset_of_missing_key_is_silent(repo: TestRepo) {
    let manager = repo.manager();
    manager.config_unset("wtr.never.set", false).unwrap();
    manager.config_unset("wtr.never.set", true).unwrap();
}

#[rstest]
fn global_scope_is_separate(repo: TestRepo) {
    let manager = repo.manager();

    manager.config_set("wtr.editor.default", "zed", true).unwrap();
    assert_eq!(
        manager.config_get("wtr.editor.default", true).unwrap(),
        vec!["zed"]
    );
    assert!(manager.config_get("wtr.editor.default", false).unwrap().is_empty());
}

#[rstest]
fn single_value_precedence_local_over_global_over_env(repo: TestRepo) {
    let cancel = CancelToken::new();
    let manager = repo.manager_with_env(HashMap::from([(
        "WTR_EDITOR_DEFAULT".to_string(),
        "from-env".to_string(),
    )]));

    // Environment only.
    let value = manager
        .config()
        .default_value(&cancel, "wtr.editor.default", "WTR_EDITOR_DEFAULT", "none", "")
        .unwrap();
    assert_eq!(value, "from-env");

    // Global beats environment.
    manager.config_set("wtr.editor.default", "global-ed", true).unwrap();
    let value = manager
        .config()
        .default_value(&cancel, "wtr.editor.default", "WTR_EDITOR_DEFAULT", "none", "")
        .unwrap();
    assert_eq!(value, "global-ed");

    // Local beats global.
    manager.config_set("wtr.editor.default", "local-ed", false).unwrap();
    let value = manager
        .config()
        .default_value(&cancel, "wtr.editor.default", "WTR_EDITOR_DEFAULT", "none", "")
        .unwrap();
    assert_eq!(value, "local-ed");
}

#[rstest]
fn fallback_applies_when_nothing_is_set(repo: TestRepo) {
    let cancel = CancelToken::new();
    let manager = repo.manager();

    let value = manager
        .config()
        .default_value(&cancel, "wtr.editor.default", "WTR_EDITOR_DEFAULT", "none", "")
        .unwrap();
    assert_eq!(value, "none");
}

#[rstest]
fn file_scope_sits_between_local_and_global(repo: TestRepo) {
    let cancel = CancelToken::new();
    let manager = repo.manager();

    std::fs::write(
        repo.root_path().join(".wtrconfig"),
        "[defaults]\n\teditor = file-ed\n",
    )
    .unwrap();
    manager.config_set("wtr.editor.default", "global-ed", true).unwrap();

    // File beats global.
    let value = manager
        .config()
        .default_value(
            &cancel,
            "wtr.editor.default",
            "WTR_EDITOR_DEFAULT",
            "none",
            "defaults.editor",
        )
        .unwrap();
    assert_eq!(value, "file-ed");

    // Local beats file.
    manager.config_set("wtr.editor.default", "local-ed", false).unwrap();
    let value = manager
        .config()
        .default_value(
            &cancel,
            "wtr.editor.default",
            "WTR_EDITOR_DEFAULT",
            "none",
            "defaults.editor",
        )
        .unwrap();
    assert_eq!(value, "local-ed");
}

#[rstest]
fn multi_value_merge_preserves_order_and_dedups(repo: TestRepo) {
    let cancel = CancelToken::new();
    let manager = repo.manager();

    manager.config_add("wtr.copy.include", "local-a", false).unwrap();
    manager.config_add("wtr.copy.include", "shared", false).unwrap();
    std::fs::write(
        repo.root_path().join(".wtrconfig"),
        "[copy]\n\tinclude = file-a\n\tinclude = shared\n",
    )
    .unwrap();
    manager.config_add("wtr.copy.include", "global-a", true).unwrap();
    manager.config_add("wtr.copy.include", "shared", true).unwrap();

    let merged = manager
        .config()
        .all(&cancel, "wtr.copy.include", "copy.include")
        .unwrap();
    assert_eq!(merged, vec!["local-a", "shared", "file-a", "global-a"]);
}

#[rstest]
fn worktreeinclude_lines_are_trimmed_and_filtered(repo: TestRepo) {
    let manager = repo.manager();

    std::fs::write(
        repo.root_path().join(".worktreeinclude"),
        "# seeds\n\n  .env.local\nconfig/*.env  \n#disabled\n",
    )
    .unwrap();

    assert_eq!(
        manager.config().worktree_include_patterns().unwrap(),
        vec![".env.local", "config/*.env"]
    );
}

#[rstest]
fn worktrees_dir_resolution(repo: TestRepo) {
    let manager = repo.manager();

    // Default: sibling of the main root.
    let paths = manager.worktree_paths().unwrap();
    assert_eq!(paths.base_dir, repo.default_base_dir());
    assert_eq!(paths.prefix, "");

    // Relative configured dir anchors at the main root.
    manager.config_set("wtr.worktrees.dir", "wts", false).unwrap();
    let paths = manager.worktree_paths().unwrap();
    assert_eq!(paths.base_dir, repo.root_path().join("wts"));

    manager.config_set("wtr.worktrees.prefix", "wt-", false).unwrap();
    let paths = manager.worktree_paths().unwrap();
    assert_eq!(paths.prefix, "wt-");
}

#[rstest]
fn worktrees_dir_env_override(repo: TestRepo) {
    let custom = repo.home_path().join("custom-worktrees");
    let manager = repo.manager_with_env(HashMap::from([(
        "WTR_WORKTREES_DIR".to_string(),
        custom.display().to_string(),
    )]));

    let paths = manager.worktree_paths().unwrap();
    assert_eq!(paths.base_dir, custom);

    // Local config still wins over the environment.
    manager
        .config_set("wtr.worktrees.dir", "from-config", false)
        .unwrap();
    let paths = manager.worktree_paths().unwrap();
    assert_eq!(paths.base_dir, repo.root_path().join("from-config"));
}
