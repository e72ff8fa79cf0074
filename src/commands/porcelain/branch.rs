use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::errors::BitletError;

impl Repository {
    /// Create `branch_name` at the current commit
    pub fn branch(&mut self, branch_name: &str) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(branch_name.to_string())?;
        let head_oid = self.refs().read_head()?;

        self.refs().create_branch(&branch_name, &head_oid)?;

        Ok(())
    }

    /// Delete the pointer `branch_name`, leaving its commits in place
    pub fn rm_branch(&mut self, branch_name: &str) -> anyhow::Result<()> {
        let branch_name = BranchName::try_parse(branch_name.to_string())
            .map_err(|_| BitletError::BranchNotFound)?;

        if !self.refs().branch_exists(&branch_name) {
            return Err(BitletError::BranchNotFound.into());
        }
        if self.refs().is_current_branch(&branch_name)? {
            return Err(BitletError::RemoveCurrentBranch.into());
        }

        let oid = self.refs().delete_branch(&branch_name)?;
        tracing::info!(branch = %branch_name, commit = %oid, "deleted branch");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    async fn initialized() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let mut repository =
            Repository::new(&dir.path().to_string_lossy(), Box::new(std::io::sink())).unwrap();
        repository.init().await.unwrap();

        (dir, repository)
    }

    #[tokio::test]
    async fn new_branch_points_at_head_and_is_lowercased() {
        let (_dir, mut repository) = initialized().await;

        repository.branch("Feature").unwrap();

        let feature = BranchName::try_parse("feature".to_string()).unwrap();
        assert_eq!(
            repository.refs().read_branch(&feature).unwrap(),
            Some(repository.refs().read_head().unwrap())
        );
        assert_eq!(repository.refs().list_branches().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn duplicate_branch_is_refused() {
        let (_dir, mut repository) = initialized().await;
        repository.branch("other").unwrap();

        let error = repository.branch("OTHER").unwrap_err();

        assert_eq!(
            error.downcast_ref::<BitletError>(),
            Some(&BitletError::BranchAlreadyExists)
        );
    }

    #[rstest]
    #[case("master", BitletError::RemoveCurrentBranch)]
    #[case("missing", BitletError::BranchNotFound)]
    #[case("bad..name", BitletError::BranchNotFound)]
    #[tokio::test]
    async fn removal_errors(#[case] branch: &str, #[case] expected: BitletError) {
        let (_dir, mut repository) = initialized().await;

        let error = repository.rm_branch(branch).unwrap_err();

        assert_eq!(error.downcast_ref::<BitletError>(), Some(&expected));
    }

    #[tokio::test]
    async fn removed_branch_is_gone() {
        let (_dir, mut repository) = initialized().await;
        repository.branch("other").unwrap();

        repository.rm_branch("other").unwrap();

        assert_eq!(
            repository.refs().list_branches().unwrap(),
            vec![BranchName::default_branch()]
        );
    }
}
