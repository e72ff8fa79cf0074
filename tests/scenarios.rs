use crate::common::command::{
    DEFAULT_READABLE_DATE, ROOT_READABLE_DATE, bitlet_checkout, commit_file, get_head_commit_id,
    repository_dir, run_bitlet_command, stdout_of,
};
use crate::common::file::{FileSpec, read_file, write_file};
use crate::common::log_blocks;
use assert_fs::TempDir;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
fn first_commit_is_logged_above_the_initial_commit(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_bitlet_command(dir, &["init"]).assert().success();

    write_file(FileSpec::new(dir.join("f.txt"), "hello".to_string()));
    run_bitlet_command(dir, &["add", "f.txt"]).assert().success();
    run_bitlet_command(dir, &["commit", "first"])
        .assert()
        .success();
    let first = get_head_commit_id(dir)?;

    let stdout = stdout_of(&mut run_bitlet_command(dir, &["log"]));

    let blocks = log_blocks(&stdout);
    assert_eq!(blocks.len(), 2);
    assert_eq!(
        blocks[0],
        format!("commit {first}\nDate: {DEFAULT_READABLE_DATE}\nfirst\n\n")
    );
    assert!(blocks[1].ends_with(&format!("\nDate: {ROOT_READABLE_DATE}\ninitial commit\n\n")));

    // blob id of "hello" framed as `blob 5\0hello`
    let blob_path = dir
        .join(".bitlet")
        .join("objects")
        .join("blobs")
        .join("b6")
        .join("fc4c620b67d95f953a5c1c1230aaab5db5a1b0");
    assert!(blob_path.is_file());

    Ok(())
}

#[rstest]
fn older_version_is_restored_without_moving_head(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_bitlet_command(dir, &["init"]).assert().success();
    commit_file(dir, "f.txt", "hello", "first");
    let first = get_head_commit_id(dir)?;
    commit_file(dir, "f.txt", "world", "second");
    let second = get_head_commit_id(dir)?;

    run_bitlet_command(dir, &["checkout", &first, "--", "f.txt"])
        .assert()
        .success();

    assert_eq!(read_file(&dir.join("f.txt")), "hello");
    assert_eq!(get_head_commit_id(dir)?, second);

    Ok(())
}

#[rstest]
fn branch_changes_are_merged_back(
    repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = repository_dir.path();
    run_bitlet_command(dir, &["init"]).assert().success();
    commit_file(dir, "f.txt", "hello", "first");
    commit_file(dir, "f.txt", "world", "second");
    run_bitlet_command(dir, &["branch", "other"])
        .assert()
        .success();
    bitlet_checkout(dir, "other");
    commit_file(dir, "f.txt", "world-2", "third");
    bitlet_checkout(dir, "master");
    commit_file(dir, "g.txt", "g", "diverge");

    run_bitlet_command(dir, &["merge", "other"])
        .assert()
        .success();

    assert_eq!(read_file(&dir.join("f.txt")), "world-2");
    let stdout = stdout_of(&mut run_bitlet_command(dir, &["log"]));
    assert!(log_blocks(&stdout)[0].contains("\nMerge: "));

    Ok(())
}
