//! One-shot directory snapshot trees.
//!
//! `build_tree` walks a root once, depth-first in the platform's natural
//! entry order, and produces an immutable `Node` tree. The tree is
//! serialized to the peer at session start and never refreshed; anything
//! that changes on disk afterwards is invisible until the next session.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::error::FileError;

/// Files larger than this (1 MiB) are never embedded in a snapshot.
pub const LARGE_FILE_LIMIT: u64 = 1_048_576;

/// Name and path of the snapshot root node.
const ROOT_MARKER: &str = ".";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Dir,
    File,
}

/// Classification of a file's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    /// Decodable text; the snapshot carries the decoded content.
    Text,
    /// Binary or oversized; content stays empty.
    Other,
}

/// One entry in a snapshot tree.
///
/// Invariants: a file node has no child list at all, a dir node has empty
/// content and no content type, and child names are unique within a
/// parent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    /// Path relative to the snapshot root; the root itself is `"."`.
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    /// Present on files only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub content_type: Option<ContentKind>,
    /// Decoded text for `text` files, empty otherwise.
    pub content: String,
    /// Ordered child list; present (possibly empty) on directories only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub children: Option<Vec<Node>>,
}

impl Node {
    fn dir(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            kind: NodeKind::Dir,
            content_type: None,
            content: String::new(),
            children: Some(Vec::new()),
        }
    }

    /// File node. Oversized files are classified without reading a byte;
    /// everything else is read fully and run through charset detection.
    fn file(name: String, rel_path: String, disk_path: &Path, size: u64) -> Result<Self, FileError> {
        let (content_type, content) = if size > LARGE_FILE_LIMIT {
            (ContentKind::Other, String::new())
        } else {
            let bytes = fs::read(disk_path).map_err(|source| FileError::Read {
                path: disk_path.to_path_buf(),
                source,
            })?;
            classify(&bytes)
        };
        Ok(Self {
            name,
            path: rel_path,
            kind: NodeKind::File,
            content_type: Some(content_type),
            content,
            children: None,
        })
    }

    /// Attach `node` under this subtree. `segments` is the node's path
    /// relative to `self`, the last segment being the node's own name;
    /// intermediate directories are created on demand.
    fn insert(&mut self, node: Node, segments: &[String]) -> Result<(), FileError> {
        let children = match self.children.as_mut() {
            Some(children) => children,
            None => return Err(FileError::NotADirectory(self.path.clone())),
        };

        if segments.len() <= 1 {
            children.push(node);
            return Ok(());
        }

        let branch_name = &segments[0];
        let branch = match children.iter_mut().position(|child| child.name == *branch_name) {
            Some(found) => &mut children[found],
            None => {
                let branch_path = join_rel(&self.path, branch_name);
                children.push(Node::dir(branch_name.clone(), branch_path));
                let end = children.len() - 1;
                &mut children[end]
            }
        };
        branch.insert(node, &segments[1..])
    }

    /// Look up a direct child by name.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.as_ref()?.iter().find(|child| child.name == name)
    }
}

/// Join a child name onto a relative node path; the root marker itself
/// never appears as a prefix.
fn join_rel(parent: &str, name: &str) -> String {
    if parent == ROOT_MARKER {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Walk `root` and build the snapshot tree.
///
/// Fail-fast: a single unreadable entry aborts the whole snapshot, no
/// partial tree is returned.
pub fn build_tree(root: &Path) -> Result<Node, FileError> {
    let mut tree = Node::dir(ROOT_MARKER, ROOT_MARKER);

    for entry in WalkDir::new(root).min_depth(1) {
        let entry = entry.map_err(FileError::Walk)?;
        let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
        let segments: Vec<String> = rel
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .collect();
        let name = match segments.last() {
            Some(name) => name.clone(),
            None => continue,
        };
        let rel_path = segments.join("/");

        let node = if entry.file_type().is_dir() {
            Node::dir(name, rel_path)
        } else {
            let meta = entry.metadata().map_err(FileError::Walk)?;
            Node::file(name, rel_path, entry.path(), meta.len())?
        };

        tree.insert(node, &segments)?;
    }

    Ok(tree)
}

/// Best-effort text detection. Accepts UTF-8 and the ISO-8859-1 family
/// (detected as its windows-1252 superset); everything else is opaque.
fn classify(bytes: &[u8]) -> (ContentKind, String) {
    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    let encoding = detector.guess(None, true);
    if encoding == encoding_rs::UTF_8 || encoding == encoding_rs::WINDOWS_1252 {
        let (text, _, _) = encoding.decode(bytes);
        (ContentKind::Text, text.into_owned())
    } else {
        (ContentKind::Other, String::new())
    }
}
