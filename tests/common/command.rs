use crate::common::file::{FileSpec, write_file};
use assert_cmd::Command;
use assert_fs::TempDir;
use rstest::fixture;
use std::path::Path;

pub const DEFAULT_COMMIT_DATE: &str = "2023-01-01 12:00:00 +0000";
pub const DEFAULT_READABLE_DATE: &str = "Sun Jan 01 12:00:00 2023 +0000";
pub const ROOT_READABLE_DATE: &str = "Thu Jan 01 00:00:00 1970 +0000";

#[fixture]
pub fn repository_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp dir")
}

/// Repository with one commit tracking `f.txt` = "hello"
#[fixture]
pub fn init_repository_dir(repository_dir: TempDir) -> TempDir {
    run_bitlet_command(repository_dir.path(), &["init"])
        .assert()
        .success();

    commit_file(repository_dir.path(), "f.txt", "hello", "first");

    repository_dir
}

pub fn run_bitlet_command(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("bitlet").expect("Failed to find bitlet binary");
    cmd.env("NO_PAGER", "1");
    cmd.env_remove("BITLET_LOG");
    cmd.env("BITLET_COMMIT_DATE", DEFAULT_COMMIT_DATE);
    cmd.current_dir(dir);
    for arg in args {
        cmd.arg(arg);
    }
    cmd
}

pub fn bitlet_commit(dir: &Path, message: &str) -> Command {
    run_bitlet_command(dir, &["commit", message])
}

/// `date` uses the `%Y-%m-%d %H:%M:%S %z` format
pub fn bitlet_commit_at(dir: &Path, message: &str, date: &str) -> Command {
    let mut cmd = bitlet_commit(dir, message);
    cmd.env("BITLET_COMMIT_DATE", date);
    cmd
}

/// Write, stage and commit a single file
pub fn commit_file(dir: &Path, name: &str, content: &str, message: &str) {
    write_file(FileSpec::new(dir.join(name), content.to_string()));
    run_bitlet_command(dir, &["add", name]).assert().success();
    bitlet_commit(dir, message).assert().success();
}

pub fn bitlet_checkout(dir: &Path, branch: &str) {
    run_bitlet_command(dir, &["checkout", branch])
        .assert()
        .success();
}

/// Tip of the branch HEAD points at
pub fn get_head_commit_id(dir: &Path) -> Result<String, Box<dyn std::error::Error>> {
    let metadata = dir.join(".bitlet");
    let head_content = std::fs::read_to_string(metadata.join("HEAD"))?;

    let ref_path = head_content
        .trim()
        .strip_prefix("ref: ")
        .ok_or("HEAD is not a symbolic ref")?;
    let commit_id = std::fs::read_to_string(metadata.join(ref_path))?;

    Ok(commit_id.trim().to_string())
}

pub fn get_branch_commit_id(dir: &Path, branch: &str) -> Result<String, Box<dyn std::error::Error>> {
    let branch_path = dir.join(".bitlet").join("refs").join("heads").join(branch);
    Ok(std::fs::read_to_string(branch_path)?.trim().to_string())
}

pub fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success();
    String::from_utf8(output.get_output().stdout.clone()).expect("stdout is not UTF-8")
}
