use crate::areas::database::Database;
use crate::areas::refs::{HEAD_REF_NAME, Refs};
use crate::artifacts::branch::REF_ALIASES;
use crate::artifacts::objects::OBJECT_ID_LENGTH;
use crate::artifacts::objects::object_id::ObjectId;
use crate::errors::BitletError;

/// A commit-id argument as typed on the command line.
///
/// Supported formats:
/// - `HEAD` and its aliases (`@`): the tip of the current branch
/// - Full or abbreviated ids: any non-empty hexadecimal prefix of a stored commit id
///
/// Resolution is strict. A prefix matching no stored commit fails with
/// `CommitNotFound` and a prefix matching several fails with
/// `AmbiguousOrInvalidArgs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Revision {
    Head,
    Prefix(String),
}

impl Revision {
    pub fn parse(revision: &str) -> Self {
        let revision = revision.trim();
        let aliased = REF_ALIASES
            .get(revision.to_ascii_lowercase().as_str())
            .copied()
            .unwrap_or(revision);

        if aliased == HEAD_REF_NAME {
            Revision::Head
        } else {
            Revision::Prefix(aliased.to_ascii_lowercase())
        }
    }

    pub fn resolve(&self, refs: &Refs, database: &Database) -> anyhow::Result<ObjectId> {
        match self {
            Revision::Head => refs.read_head(),
            Revision::Prefix(prefix) => Self::resolve_prefix(prefix, database),
        }
    }

    fn resolve_prefix(prefix: &str, database: &Database) -> anyhow::Result<ObjectId> {
        if !Self::looks_like_oid(prefix) {
            return Err(BitletError::CommitNotFound.into());
        }

        let mut matches = database.find_commits_by_prefix(prefix)?;
        match matches.len() {
            0 => Err(BitletError::CommitNotFound.into()),
            1 => Ok(matches.remove(0)),
            n => {
                tracing::debug!(prefix, candidates = n, "ambiguous commit id prefix");
                Err(BitletError::AmbiguousOrInvalidArgs(format!(
                    "Commit id prefix {prefix} is ambiguous ({n} candidates)."
                ))
                .into())
            }
        }
    }

    fn looks_like_oid(s: &str) -> bool {
        !s.is_empty() && s.len() <= OBJECT_ID_LENGTH && s.chars().all(|c| c.is_ascii_hexdigit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::branch::branch_name::BranchName;
    use crate::artifacts::objects::commit::{BlobMapping, Commit};
    use assert_fs::TempDir;
    use rstest::{fixture, rstest};

    struct Fixture {
        _dir: TempDir,
        refs: Refs,
        database: Database,
        commits: Vec<ObjectId>,
    }

    #[fixture]
    fn repository() -> Fixture {
        let dir = TempDir::new().unwrap();
        let refs = Refs::new(dir.path().to_path_buf().into_boxed_path());
        let database = Database::in_memory();

        let commits = (0..40)
            .map(|i| {
                let mut commit = Commit::new(
                    vec![],
                    BlobMapping::new(),
                    format!("commit {i}"),
                    Commit::root().timestamp(),
                );
                database.store_commit(&mut commit).unwrap()
            })
            .collect::<Vec<_>>();

        let master = BranchName::default_branch();
        refs.update_branch(&master, &commits[0]).unwrap();
        refs.set_head(&master).unwrap();

        Fixture {
            _dir: dir,
            refs,
            database,
            commits,
        }
    }

    #[rstest]
    #[case("HEAD")]
    #[case("@")]
    #[case("head")]
    fn head_aliases_resolve_to_the_current_tip(repository: Fixture, #[case] alias: &str) {
        let resolved = Revision::parse(alias)
            .resolve(&repository.refs, &repository.database)
            .unwrap();

        assert_eq!(resolved, repository.commits[0]);
    }

    #[rstest]
    fn unique_prefixes_resolve(repository: Fixture) {
        let target = &repository.commits[7];

        for length in [8, 12, OBJECT_ID_LENGTH] {
            let prefix = target.as_ref()[..length].to_ascii_uppercase();
            let resolved = Revision::parse(&prefix)
                .resolve(&repository.refs, &repository.database)
                .unwrap();
            assert_eq!(&resolved, target);
        }
    }

    #[rstest]
    fn shared_prefixes_are_ambiguous(repository: Fixture) {
        // 40 commits over 16 leading digits always share one
        let first_chars = repository
            .commits
            .iter()
            .map(|oid| oid.as_ref()[..1].to_string())
            .collect::<Vec<_>>();
        let shared = first_chars
            .iter()
            .find(|c| first_chars.iter().filter(|other| other == c).count() > 1)
            .unwrap();

        let error = Revision::parse(shared)
            .resolve(&repository.refs, &repository.database)
            .unwrap_err();

        assert!(matches!(
            error.downcast_ref::<BitletError>(),
            Some(BitletError::AmbiguousOrInvalidArgs(_))
        ));
    }

    #[rstest]
    #[case("master")]
    #[case("")]
    #[case("0000000000000000000000000000000000000000")]
    fn unknown_ids_are_not_found(repository: Fixture, #[case] revision: &str) {
        let error = Revision::parse(revision)
            .resolve(&repository.refs, &repository.database)
            .unwrap_err();

        assert_eq!(
            error.downcast_ref::<BitletError>(),
            Some(&BitletError::CommitNotFound)
        );
    }
}
