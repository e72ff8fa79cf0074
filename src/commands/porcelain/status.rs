use crate::areas::repository::Repository;
use crate::artifacts::status::status_info::StatusInfo;
use std::io::Write;

impl Repository {
    pub async fn status(&mut self) -> anyhow::Result<()> {
        let index = self.index();
        let mut index = index.lock().await;
        index.rehydrate()?;

        let head = self.head_commit()?;
        let status = StatusInfo::inspect(
            self.refs().current_branch()?,
            self.refs().list_branches()?,
            head.blobs(),
            &index,
            self.workspace(),
        )?;

        write!(self.writer(), "{}", status.render())?;

        Ok(())
    }
}
