//! Branch names and commit references
//!
//! - `branch_name`: validated, case-normalized branch names
//! - `revision`: commit-id arguments (hex prefixes and `HEAD` aliases)

pub mod branch_name;
pub mod revision;

/// Name of the branch created by `init`
pub const DEFAULT_BRANCH: &str = "master";

pub const INVALID_BRANCH_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
pub const REF_ALIASES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "@" => "HEAD",
    "head" => "HEAD",
};
