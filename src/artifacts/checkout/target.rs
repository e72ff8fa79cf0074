use crate::errors::BitletError;

/// What a `checkout` invocation restores
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckoutTarget {
    /// `checkout <branch>`
    Branch(String),
    /// `checkout -- <file>`: the file as of the current commit
    HeadFile(String),
    /// `checkout <commit> -- <file>`
    CommitFile { commit: String, file: String },
}

impl CheckoutTarget {
    /// Build a target from the positional arguments before and after `--`
    pub fn try_from_args(target: Option<String>, file: Option<String>) -> anyhow::Result<Self> {
        match (target, file) {
            (Some(branch), None) => Ok(CheckoutTarget::Branch(branch)),
            (None, Some(file)) => Ok(CheckoutTarget::HeadFile(file)),
            (Some(commit), Some(file)) => Ok(CheckoutTarget::CommitFile { commit, file }),
            (None, None) => Err(BitletError::incorrect_operands().into()),
        }
    }
}
