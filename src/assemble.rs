//! Document assembly.
//!
//! Combines the reader's per-file facts into one [`FileDocument`]. No I/O,
//! no reordering: history and blame pass through in the order the reader
//! produced them.

use crate::models::{BlameLine, CommitRecord, FileDocument};

pub fn assemble(
    path: &str,
    latest: &CommitRecord,
    commit_history: Vec<CommitRecord>,
    blame: Vec<BlameLine>,
    file_content: String,
) -> FileDocument {
    FileDocument {
        file_path: path.to_string(),
        last_modified: latest.timestamp,
        last_commit: latest.id.clone(),
        last_commit_message: latest.message.clone(),
        last_author: latest.author.clone(),
        commit_history,
        blame,
        file_content,
    }
}
