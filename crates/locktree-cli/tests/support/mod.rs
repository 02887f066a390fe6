use assert_cmd::Command;
use std::fs;
use std::path::{Path, PathBuf};

pub fn new_command_with_temp_home() -> (Command, tempfile::TempDir) {
    let temp_home = tempfile::tempdir().expect("temp home");
    let binary = assert_cmd::cargo::cargo_bin!("locktree");
    let mut command = Command::new(binary);
    command.env("HOME", temp_home.path());
    command.env("XDG_CONFIG_HOME", temp_home.path().join(".config"));
    (command, temp_home)
}

pub fn write_config(home: &Path, repo_root: &Path) {
    let config_dir = home.join(".config").join("locktree");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(
        config_dir.join("config.toml"),
        format!(
            r#"
version = 1

[repository]
path = "{}"
name = "Athyl"
"#,
            repo_root.display()
        ),
    )
    .expect("write config");
}

pub fn write_invalid_config(home: &Path) {
    let config_dir = home.join(".config").join("locktree");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(
        config_dir.join("config.toml"),
        "version = 1\n\n[repository]\npath = \"/tmp\"\nname = \"\"\n",
    )
    .expect("write config");
}

pub fn create_plain_dir(home: &Path) -> PathBuf {
    let path = home.join("not-a-repo");
    fs::create_dir_all(&path).expect("create dir");
    path
}

pub fn assert_timestamp_log_names(entries: &[std::fs::DirEntry]) {
    assert!(!entries.is_empty(), "expected at least one diagnostics log");

    for entry in entries {
        let name = entry
            .file_name()
            .into_string()
            .expect("diagnostics filename utf8");
        let stem = name
            .strip_suffix(".log")
            .expect("diagnostics filename .log suffix");
        assert!(
            !stem.is_empty() && stem.chars().all(|character| character.is_ascii_digit()),
            "diagnostics filename must be <timestamp>.log, got: {name}"
        );
    }
}
