use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "locktree")]
#[command(bin_name = "locktree")]
#[command(version)]
#[command(about = "Browse and toggle Git LFS file locks in a repository tree")]
pub struct Cli {
    #[arg(long, global = true, help = "Write a diagnostics log for this run")]
    pub diagnostics: bool,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    #[command(about = "Run environment and configuration checks")]
    Doctor,
    #[command(about = "Print lockable files and their lock state")]
    Status,
    #[command(about = "Lock a single file through git-lfs")]
    Lock {
        #[arg(value_name = "PATH")]
        path: String,
    },
    #[command(about = "Unlock a single file through git-lfs")]
    Unlock {
        #[arg(value_name = "PATH")]
        path: String,
    },
}
