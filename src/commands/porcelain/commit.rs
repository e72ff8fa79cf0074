use crate::areas::repository::Repository;
use crate::errors::BitletError;

impl Repository {
    pub async fn commit(&mut self, message: &str) -> anyhow::Result<()> {
        if message.trim().is_empty() {
            return Err(BitletError::EmptyCommitMessage.into());
        }

        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        if index.is_empty() {
            return Err(BitletError::EmptyChangeSet.into());
        }

        let parent = self.refs().read_head()?;
        let commit = self.write_commit(&mut index, vec![parent], message)?;

        tracing::debug!(
            commit = ?commit.oid(),
            files = commit.blobs().len(),
            "created commit"
        );

        Ok(())
    }
}
