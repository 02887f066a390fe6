use std::backtrace::Backtrace;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use locktree_app::{LockController, LockOutcome, Repository};
use locktree_core::lfs::LockAction;
use locktree_tui::TreeSummary;

/// One line of the diagnostics log.
pub enum Event<'a> {
    Command(&'a str),
    Opening(&'a Repository),
    Loaded(&'a LockController),
    Doctor(&'a str),
    Lock {
        action: LockAction,
        path: &'a str,
        outcome: LockOutcome,
    },
    TreeClosed(TreeSummary),
    Failed(&'a anyhow::Error),
}

impl fmt::Display for Event<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command(name) => write!(f, "command={name}"),
            Self::Opening(repository) => write!(
                f,
                "opening repository name={} root={}",
                repository.name,
                repository.root.display()
            ),
            Self::Loaded(controller) => {
                let extensions: Vec<&str> = controller
                    .filter()
                    .extensions()
                    .iter()
                    .map(String::as_str)
                    .collect();
                write!(
                    f,
                    "loaded tracked={} files={} locked={} extensions={}",
                    controller.tracked_count(),
                    controller.tree().file_count(),
                    controller.registry().len(),
                    extensions.join(",")
                )
            }
            Self::Doctor(summary) => write!(f, "doctor {summary}"),
            Self::Lock {
                action,
                path,
                outcome,
            } => {
                let outcome = match outcome {
                    LockOutcome::Applied => "applied",
                    LockOutcome::Skipped => "skipped",
                };
                write!(f, "{} path={path} outcome={outcome}", action.as_str())
            }
            Self::TreeClosed(summary) => write!(
                f,
                "tree closed applied={} failed={}",
                summary.applied, summary.failed
            ),
            Self::Failed(error) => write!(f, "command failed: {error:#}"),
        }
    }
}

type SharedLog = Arc<Mutex<Option<File>>>;

/// Opt-in log of one `locktree` run. Events are dropped when the session
/// is disabled.
pub struct DiagnosticsSession {
    path: Option<PathBuf>,
    log: SharedLog,
}

impl DiagnosticsSession {
    pub fn initialize(enabled: bool) -> Result<Self> {
        let session = if enabled {
            Self::create_in(&diagnostics_dir()?)?
        } else {
            Self::disabled()
        };
        session.install_panic_hook();
        Ok(session)
    }

    fn disabled() -> Self {
        Self {
            path: None,
            log: Arc::default(),
        }
    }

    fn create_in(dir: &Path) -> Result<Self> {
        fs::create_dir_all(dir)
            .with_context(|| format!("failed to create diagnostics directory {}", dir.display()))?;

        let path = dir.join(format!("{}.log", epoch_ms()));
        let mut file = OpenOptions::new()
            .create_new(true)
            .write(true)
            .open(&path)
            .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;
        write_header(&mut file)
            .with_context(|| format!("failed to write diagnostics header to {}", path.display()))?;

        Ok(Self {
            path: Some(path),
            log: Arc::new(Mutex::new(Some(file))),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn record(&self, event: Event<'_>) {
        append(&self.log, &event.to_string());
    }

    fn install_panic_hook(&self) {
        let log = Arc::clone(&self.log);
        let path = self.path.clone();

        std::panic::set_hook(Box::new(move |panic_info| {
            let location = panic_info
                .location()
                .map(|value| format!("{}:{}:{}", value.file(), value.line(), value.column()))
                .unwrap_or_else(|| "unknown".to_string());

            append(&log, "panic captured");
            append(&log, &format!("panic_message={}", panic_payload(panic_info)));
            append(&log, &format!("panic_location={location}"));
            append(&log, &format!("panic_backtrace={:?}", Backtrace::force_capture()));

            eprintln!("Fatal internal error in locktree.");
            match &path {
                Some(path) => eprintln!("Diagnostics written to {}", path.display()),
                None => eprintln!("Run `locktree --diagnostics` to capture a diagnostics log."),
            }
        }));
    }
}

fn write_header(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "locktree diagnostics start")?;
    writeln!(out, "version={}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "start_epoch_ms={}", epoch_ms())?;
    writeln!(out, "pid={}", std::process::id())?;
    writeln!(out, "os={}", std::env::consts::OS)?;
    writeln!(out, "argv={:?}", std::env::args().collect::<Vec<String>>())?;
    out.flush()
}

fn append(log: &SharedLog, line: &str) {
    let mut guard = log.lock().unwrap_or_else(PoisonError::into_inner);
    let Some(file) = guard.as_mut() else {
        return;
    };

    let _ = writeln!(file, "[{}] {line}", epoch_ms());
    let _ = file.flush();
}

fn panic_payload(panic_info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = panic_info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|value| (*value).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

fn epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// `diagnostics/` next to the config file.
fn diagnostics_dir() -> Result<PathBuf> {
    let config_path = locktree_core::config::resolve_config_path()
        .context("failed to resolve locktree config path for diagnostics")?;
    config_path
        .parent()
        .map(|config_dir| config_dir.join("diagnostics"))
        .ok_or_else(|| {
            anyhow!(
                "failed to resolve diagnostics directory from config path {}",
                config_path.display()
            )
        })
}
