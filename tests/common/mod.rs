#![allow(dead_code)]

pub mod command;
pub mod file;

/// Split `log` output into its `===` blocks
pub fn log_blocks(stdout: &str) -> Vec<String> {
    stdout
        .split("===\n")
        .filter(|block| !block.is_empty())
        .map(|block| block.to_string())
        .collect()
}

/// Commit ids in the order `log` printed them
pub fn logged_commit_ids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter_map(|line| line.strip_prefix("commit "))
        .map(|oid| oid.to_string())
        .collect()
}
