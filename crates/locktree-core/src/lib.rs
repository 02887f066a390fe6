pub(crate) mod command_adapter;
pub mod command_runner;
pub mod config;
pub mod doctor;
pub mod filter;
pub mod git;
pub mod lfs;
pub mod locks;
pub mod paths;
#[cfg(test)]
pub(crate) mod test_support;
pub mod time;
pub mod tree;
