use crate::areas::repository::Repository;
use crate::areas::workspace::Workspace;

impl Repository {
    pub async fn add(&mut self, file: &str) -> anyhow::Result<()> {
        let name = Workspace::normalize_name(file)?;

        let index = self.index();
        let mut index = index.lock().await;

        // Load the index file from the disk
        index.rehydrate()?;

        let blob = self.workspace().parse_blob(&name)?;
        let head = self.head_commit()?;
        self.stage_blob(&mut index, &head, &name, &blob)?;

        index.write_updates()?;

        Ok(())
    }
}
