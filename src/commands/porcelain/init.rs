use crate::areas::repository::Repository;
use crate::artifacts::branch::branch_name::BranchName;
use crate::artifacts::objects::commit::Commit;
use crate::errors::BitletError;
use anyhow::Context;
use std::fs;

impl Repository {
    pub async fn init(&mut self) -> anyhow::Result<()> {
        if self.is_initialized() {
            return Err(BitletError::AlreadyInitialized.into());
        }

        fs::create_dir_all(self.metadata_path())
            .context("Failed to create .bitlet directory")?;
        let _lock = self.lock()?;

        fs::create_dir_all(self.objects_path())
            .context("Failed to create .bitlet/objects directory")?;
        fs::create_dir_all(self.refs().heads_path())
            .context("Failed to create .bitlet/refs/heads directory")?;

        let mut root = Commit::root();
        let root_oid = self.database().store_commit(&mut root)?;
        {
            let mut graph = self.graph()?;
            graph.add_commit(&root)?;
            graph.persist()?;
        }

        let default_branch = BranchName::default_branch();
        self.refs()
            .create_branch(&default_branch, &root_oid)
            .context("Failed to create the default branch")?;
        self.refs()
            .set_head(&default_branch)
            .context("Failed to create initial HEAD reference")?;

        let index = self.index();
        let mut index = index.lock().await;
        index.clear()?;
        index.write_updates()?;

        tracing::info!(path = ?self.path(), root = %root_oid, "initialized repository");
        Ok(())
    }
}
