use crate::areas::repository::Repository;
use crate::artifacts::log::rev_list::RevList;
use crate::artifacts::objects::commit::Commit;
use crate::errors::BitletError;
use anyhow::Context;
use colored::Colorize;
use std::io::Write;

impl Repository {
    /// First-parent history of the current branch
    pub fn log(&self) -> anyhow::Result<()> {
        let head_oid = self.refs().read_head()?;

        for commit in RevList::new(self.database(), head_oid) {
            self.show_commit(&commit?)?;
        }

        Ok(())
    }

    /// Every stored commit, newest first
    pub fn global_log(&self) -> anyhow::Result<()> {
        let mut commits = self.database().load_all_commits()?;
        commits.sort_by(|a, b| {
            b.timestamp()
                .cmp(&a.timestamp())
                .then_with(|| a.oid().cmp(&b.oid()))
        });

        for commit in &commits {
            self.show_commit(commit)?;
        }

        Ok(())
    }

    /// Ids of the commits whose message is exactly `message`
    pub fn find(&self, message: &str) -> anyhow::Result<()> {
        let mut matches = self
            .database()
            .load_all_commits()?
            .into_iter()
            .filter(|commit| commit.message() == message)
            .filter_map(|commit| commit.oid().cloned())
            .collect::<Vec<_>>();

        if matches.is_empty() {
            return Err(BitletError::NoCommitWithMessage.into());
        }
        matches.sort();

        for oid in matches {
            writeln!(self.writer(), "{oid}")?;
        }

        Ok(())
    }

    fn show_commit(&self, commit: &Commit) -> anyhow::Result<()> {
        let oid = commit.oid().context("cannot show an unwritten commit")?;
        let mut writer = self.writer();

        writeln!(writer, "===")?;
        writeln!(writer, "{}", format!("commit {oid}").yellow())?;
        if let (Some(first), Some(second)) = (commit.parent(), commit.second_parent()) {
            writeln!(
                writer,
                "Merge: {} {}",
                first.to_short_oid(),
                second.to_short_oid()
            )?;
        }
        writeln!(writer, "Date: {}", commit.readable_timestamp())?;
        writeln!(writer, "{}", commit.message())?;
        writeln!(writer)?;

        Ok(())
    }
}
