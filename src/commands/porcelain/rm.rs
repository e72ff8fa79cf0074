use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;
use crate::errors::BitletError;

impl Repository {
    pub async fn rm(&mut self, file: &str) -> anyhow::Result<()> {
        let name = Workspace::normalize_name(file).map_err(|_| BitletError::NothingToRemove)?;

        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let head = self.head_commit()?;
        match head.blob(&name) {
            Some(tracked_oid) => {
                index.stage_removal(&name, tracked_oid.clone())?;
                if self.workspace().exists(&name) {
                    self.workspace().remove_file(&name)?;
                }
            }
            None if index.is_staged_for_addition(&name) => {
                index.unstage_addition(&name)?;
            }
            None => return Err(BitletError::NothingToRemove.into()),
        }

        index.write_updates()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_fs::TempDir;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    async fn initialized() -> (TempDir, Repository) {
        let dir = TempDir::new().unwrap();
        let mut repository =
            Repository::new(&dir.path().to_string_lossy(), Box::new(std::io::sink())).unwrap();
        repository.init().await.unwrap();

        (dir, repository)
    }

    #[tokio::test]
    async fn removing_a_tracked_file_stages_removal_and_deletes_it() {
        let (dir, mut repository) = initialized().await;
        dir.child("f.txt").write_str("hello").unwrap();
        repository.add("f.txt").await.unwrap();
        repository.commit("first").await.unwrap();

        repository.rm("f.txt").await.unwrap();

        dir.child("f.txt").assert(predicate::path::missing());
        let index = repository.index();
        let mut index = index.lock().await;
        index.rehydrate().unwrap();
        assert!(index.is_staged_for_removal("f.txt"));
    }

    #[tokio::test]
    async fn removing_a_staged_file_only_unstages_it() {
        let (dir, mut repository) = initialized().await;
        dir.child("f.txt").write_str("hello").unwrap();
        repository.add("f.txt").await.unwrap();

        repository.rm("f.txt").await.unwrap();

        dir.child("f.txt").assert("hello");
        let index = repository.index();
        let mut index = index.lock().await;
        index.rehydrate().unwrap();
        assert!(index.is_empty());
    }

    #[tokio::test]
    async fn removing_an_unknown_file_fails() {
        let (dir, mut repository) = initialized().await;
        dir.child("stray.txt").write_str("x").unwrap();

        let error = repository.rm("stray.txt").await.unwrap_err();

        assert_eq!(
            error.downcast_ref::<BitletError>(),
            Some(&BitletError::NothingToRemove)
        );
    }
}
