use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::branch::revision::Revision;
use crate::artifacts::checkout::target::CheckoutTarget;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::BitletError;

impl Repository {
    pub async fn checkout(&mut self, target: CheckoutTarget) -> anyhow::Result<()> {
        match target {
            CheckoutTarget::HeadFile(file) => {
                let head_oid = self.refs().read_head()?;
                self.checkout_file(&head_oid, &file)
            }
            CheckoutTarget::CommitFile { commit, file } => {
                let commit_oid = Revision::parse(&commit).resolve(self.refs(), self.database())?;
                self.checkout_file(&commit_oid, &file)
            }
            CheckoutTarget::Branch(branch) => self.checkout_branch(&branch).await,
        }
    }

    /// Overwrite the working copy of `file` with its version in `commit_oid`
    fn checkout_file(&self, commit_oid: &ObjectId, file: &str) -> anyhow::Result<()> {
        let name = Workspace::normalize_name(file).map_err(|_| BitletError::FileNotInCommit)?;
        let commit = self.database().load_commit(commit_oid)?;
        let blob_oid = commit.blob(&name).ok_or(BitletError::FileNotInCommit)?;

        let blob = self.database().load_blob(blob_oid)?;
        self.workspace().write_file(&name, blob.content())?;

        Ok(())
    }

    async fn checkout_branch(&self, branch: &str) -> anyhow::Result<()> {
        let branch_name =
            BranchName::try_parse(branch.to_string()).map_err(|_| BitletError::BranchNotFound)?;
        let target_oid = self
            .refs()
            .read_branch(&branch_name)?
            .ok_or(BitletError::BranchNotFound)?;

        if self.refs().is_current_branch(&branch_name)? {
            return Err(BitletError::CheckoutCurrentBranch.into());
        }

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let head = self.head_commit()?;
        let target = self.database().load_commit(&target_oid)?;
        self.checkout_snapshot(&mut index, &head, &target)?;

        self.refs().set_head(&branch_name)?;
        tracing::info!(branch = %branch_name, commit = %target_oid, "switched branch");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use predicates::prelude::*;
    use pretty_assertions::assert_eq;

    async fn initialized() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let mut repository =
            Repository::new(&dir.path().to_string_lossy(), Box::new(std::io::sink())).unwrap();
        repository.init().await.unwrap();

        (dir, repository)
    }

    async fn commit_file(repository: &mut Repository, dir: &TempDir, name: &str, content: &str) {
        dir.child(name).write_str(content).unwrap();
        repository.add(name).await.unwrap();
        repository.commit(&format!("{name}: {content}")).await.unwrap();
    }

    #[tokio::test]
    async fn file_is_restored_from_an_older_commit_by_prefix() {
        let (dir, mut repository) = initialized().await;
        commit_file(&mut repository, &dir, "f.txt", "hello").await;
        let first = repository.refs().read_head().unwrap();
        commit_file(&mut repository, &dir, "f.txt", "world").await;
        let second = repository.refs().read_head().unwrap();

        let target = CheckoutTarget::CommitFile {
            commit: first.as_ref()[..8].to_string(),
            file: "f.txt".to_string(),
        };
        repository.checkout(target).await.unwrap();

        dir.child("f.txt").assert("hello");
        assert_eq!(repository.refs().read_head().unwrap(), second);
    }

    #[tokio::test]
    async fn file_missing_from_the_commit_is_reported() {
        let (dir, mut repository) = initialized().await;
        commit_file(&mut repository, &dir, "f.txt", "hello").await;

        let error = repository
            .checkout(CheckoutTarget::HeadFile("other.txt".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            error.downcast_ref::<BitletError>(),
            Some(&BitletError::FileNotInCommit)
        );
    }

    #[tokio::test]
    async fn switching_branches_replaces_the_snapshot() {
        let (dir, mut repository) = initialized().await;
        commit_file(&mut repository, &dir, "shared.txt", "base").await;
        repository.branch("other").unwrap();
        commit_file(&mut repository, &dir, "master-only.txt", "m").await;

        repository
            .checkout(CheckoutTarget::Branch("other".to_string()))
            .await
            .unwrap();

        dir.child("master-only.txt").assert(predicate::path::missing());
        dir.child("shared.txt").assert("base");
        assert_eq!(
            repository.refs().current_branch().unwrap().to_string(),
            "other"
        );
    }

    #[tokio::test]
    async fn untracked_file_blocks_branch_switch() {
        let (dir, mut repository) = initialized().await;
        repository.branch("other").unwrap();
        repository
            .checkout(CheckoutTarget::Branch("other".to_string()))
            .await
            .unwrap();
        commit_file(&mut repository, &dir, "f.txt", "on other").await;
        repository
            .checkout(CheckoutTarget::Branch("master".to_string()))
            .await
            .unwrap();
        dir.child("f.txt").write_str("untracked").unwrap();

        let error = repository
            .checkout(CheckoutTarget::Branch("other".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            error.downcast_ref::<BitletError>(),
            Some(&BitletError::UntrackedFileConflict)
        );
        dir.child("f.txt").assert("untracked");
    }

    #[tokio::test]
    async fn current_and_unknown_branches_are_refused() {
        let (_dir, mut repository) = initialized().await;

        let current = repository
            .checkout(CheckoutTarget::Branch("master".to_string()))
            .await
            .unwrap_err();
        let unknown = repository
            .checkout(CheckoutTarget::Branch("nope".to_string()))
            .await
            .unwrap_err();

        assert_eq!(
            current.downcast_ref::<BitletError>(),
            Some(&BitletError::CheckoutCurrentBranch)
        );
        assert_eq!(
            unknown.downcast_ref::<BitletError>(),
            Some(&BitletError::BranchNotFound)
        );
    }
}
