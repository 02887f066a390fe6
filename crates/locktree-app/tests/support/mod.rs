use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::anyhow;
use locktree_core::command_runner::{CommandOutput, CommandRunner};

pub static ENV_LOCK: Mutex<()> = Mutex::new(());

pub const LFS_ATTRIBUTES: &str = "\
# Unreal assets
*.uasset filter=lfs diff=lfs merge=lfs -text
*.umap filter=lfs diff=lfs merge=lfs -text
*.png text
";

#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub input: Option<String>,
}

#[derive(Default)]
pub struct QueueRunner {
    outputs: Mutex<VecDeque<anyhow::Result<CommandOutput>>>,
    calls: Mutex<Vec<Call>>,
}

impl QueueRunner {
    pub fn new(outputs: Vec<anyhow::Result<CommandOutput>>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().expect("calls lock").clone()
    }

    pub fn push(&self, output: anyhow::Result<CommandOutput>) {
        self.outputs.lock().expect("outputs lock").push_back(output);
    }
}

impl CommandRunner for QueueRunner {
    fn run_with_input(
        &self,
        program: &str,
        args: &[&str],
        cwd: Option<&Path>,
        input: Option<&str>,
    ) -> anyhow::Result<CommandOutput> {
        self.calls.lock().expect("calls lock").push(Call {
            program: program.to_string(),
            args: args.iter().map(|value| (*value).to_string()).collect(),
            cwd: cwd.map(Path::to_path_buf),
            input: input.map(str::to_string),
        });

        self.outputs
            .lock()
            .expect("outputs lock")
            .pop_front()
            .unwrap_or_else(|| Err(anyhow!("missing scripted output")))
    }
}

pub fn output(stdout: &str, stderr: &str, status: i32) -> anyhow::Result<CommandOutput> {
    Ok(CommandOutput {
        status_code: status,
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
    })
}

pub fn ls_files(paths: &[&str]) -> anyhow::Result<CommandOutput> {
    let mut stdout = String::new();
    for path in paths {
        stdout.push_str(path);
        stdout.push('\0');
    }
    output(&stdout, "", 0)
}

pub fn create_repo(parent: &Path) -> PathBuf {
    let repo_root = parent.join("Athyl");
    fs::create_dir_all(&repo_root).expect("create repo dir");
    fs::write(repo_root.join(".gitattributes"), LFS_ATTRIBUTES).expect("write attributes");
    repo_root
}

pub fn write_valid_config(home: &Path, repo_root: &Path) {
    let config_dir = home.join(".config").join("locktree");
    fs::create_dir_all(&config_dir).expect("create config dir");

    let config = format!(
        r#"
version = 1

[repository]
path = "{}"
name = "Athyl"
"#,
        repo_root.display()
    );

    fs::write(config_dir.join("config.toml"), config).expect("write config");
}
