use crate::common::command::{
    bitlet_checkout, get_branch_commit_id, get_head_commit_id, init_repository_dir,
    run_bitlet_command,
};
use assert_fs::TempDir;
use predicates::prelude::*;
use pretty_assertions::assert_eq;
use rstest::rstest;

mod common;

#[rstest]
#[case("feature", "feature")]
#[case("Feature", "feature")]
#[case("topic/nested", "topic/nested")]
fn branch_is_created_at_head(
    init_repository_dir: TempDir,
    #[case] name: &str,
    #[case] stored_as: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir;

    run_bitlet_command(dir.path(), &["branch", name])
        .assert()
        .success();

    assert_eq!(
        get_branch_commit_id(dir.path(), stored_as)?,
        get_head_commit_id(dir.path())?
    );

    Ok(())
}

#[rstest]
fn duplicate_branch_fails(init_repository_dir: TempDir) {
    let dir = init_repository_dir;
    run_bitlet_command(dir.path(), &["branch", "other"])
        .assert()
        .success();

    run_bitlet_command(dir.path(), &["branch", "Other"])
        .assert()
        .code(1)
        .stderr(predicate::eq("A branch with that name already exists.\n"));
}

#[rstest]
#[case("bad..name")]
#[case("ends.lock")]
#[case("has space")]
fn invalid_branch_name_fails(init_repository_dir: TempDir, #[case] name: &str) {
    run_bitlet_command(init_repository_dir.path(), &["branch", name])
        .assert()
        .code(1)
        .stderr(predicate::eq(format!("Invalid branch name: {name}\n")));
}

#[rstest]
fn removing_a_branch_keeps_its_commits(
    init_repository_dir: TempDir,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = init_repository_dir;
    let head = get_head_commit_id(dir.path())?;
    run_bitlet_command(dir.path(), &["branch", "other"])
        .assert()
        .success();

    run_bitlet_command(dir.path(), &["rm-branch", "other"])
        .assert()
        .success();

    assert!(
        !dir.path()
            .join(".bitlet")
            .join("refs")
            .join("heads")
            .join("other")
            .exists()
    );
    run_bitlet_command(dir.path(), &["checkout", &head[..10], "--", "f.txt"])
        .assert()
        .success();

    Ok(())
}

#[rstest]
fn removing_the_current_or_a_missing_branch_fails(init_repository_dir: TempDir) {
    let dir = init_repository_dir;
    run_bitlet_command(dir.path(), &["branch", "other"])
        .assert()
        .success();
    bitlet_checkout(dir.path(), "other");

    run_bitlet_command(dir.path(), &["rm-branch", "other"])
        .assert()
        .code(1)
        .stderr(predicate::eq("Cannot remove the current branch.\n"));
    run_bitlet_command(dir.path(), &["rm-branch", "missing"])
        .assert()
        .code(1)
        .stderr(predicate::eq("A branch with that name does not exist.\n"));
}
