//! Repository walker (spec §4.1) and `.cgrignore` ignore-file parser
//! (spec §6.3).

mod ignore_file;
mod walker;

pub use ignore_file::IgnoreRules;
pub use walker::{walk_repo, FileDescriptor, RepoWalker};
