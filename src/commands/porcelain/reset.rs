use crate::areas::repository::Repository;
use crate::artifacts::branch::revision::Revision;

impl Repository {
    /// Check out the snapshot of `commit` and move the current branch to it
    pub async fn reset(&mut self, commit: &str) -> anyhow::Result<()> {
        let target_oid = Revision::parse(commit).resolve(self.refs(), self.database())?;

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let head = self.head_commit()?;
        let target = self.database().load_commit(&target_oid)?;
        self.checkout_snapshot(&mut index, &head, &target)?;

        self.refs().update_head(&target_oid)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BitletError;
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

    #[tokio::test]
    async fn reset_moves_branch_and_restores_snapshot() {
        let (dir, mut repository) = initialized().await;
        dir.child("f.txt").write_str("hello").unwrap();
        repository.add("f.txt").await.unwrap();
        repository.commit("first").await.unwrap();
        let first = repository.refs().read_head().unwrap();

        dir.child("f.txt").write_str("world").unwrap();
        dir.child("g.txt").write_str("g").unwrap();
        repository.add("f.txt").await.unwrap();
        repository.add("g.txt").await.unwrap();
        repository.commit("second").await.unwrap();
        dir.child("pending.txt").write_str("p").unwrap();
        repository.add("pending.txt").await.unwrap();

        repository.reset(first.as_ref()).await.unwrap();

        assert_eq!(repository.refs().read_head().unwrap(), first);
        dir.child("f.txt").assert("hello");
        dir.child("g.txt").assert(predicate::path::missing());
        // staged but never committed files stay in the working directory
        dir.child("pending.txt").assert("p");

        let index = repository.index();
        let mut index = index.lock().await;
        index.rehydrate().unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn unknown_commit_is_reported() {
        let (_dir, mut repository) = initialized().await;

        let error = repository.reset("deadbeef").await.unwrap_err();

        assert_eq!(
            error.downcast_ref::<BitletError>(),
            Some(&BitletError::CommitNotFound)
        );
    }
}
