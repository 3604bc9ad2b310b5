//! Repository tree DTOs.
//!
//! - `LocationParams`: owner/repo/path/ref identifying a remote listing
//! - `RemoteEntry`: one item of a contents listing, as the remote API returns it
//! - `TreeEntry`: a kept file/dir annotated with extension and fetch params

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationParams {
    pub owner: String,
    pub repo: String,
    #[serde(default)]
    pub path: String,
    #[serde(rename = "ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

impl LocationParams {
    /// Params for a subdirectory: same repository and ref, the entry's path.
    pub fn descend(&self, path: &str) -> Self {
        Self {
            path: path.to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Dir,
    Symlink,
    Submodule,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RemoteEntry {
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub html_url: Option<String>,
    #[serde(default)]
    pub download_url: Option<String>,
}

/// The contents endpoint answers with an array for directories and a single
/// object when the path names a file.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ContentListing {
    Many(Vec<RemoteEntry>),
    One(Box<RemoteEntry>),
}

impl ContentListing {
    pub fn into_entries(self) -> Vec<RemoteEntry> {
        match self {
            ContentListing::Many(entries) => entries,
            ContentListing::One(entry) => vec![*entry],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreeEntry {
    #[serde(flatten)]
    pub entry: RemoteEntry,
    pub extension: String,
    pub params: LocationParams,
}

impl TreeEntry {
    pub fn new(entry: RemoteEntry, params: &LocationParams) -> Self {
        let extension = extension_of(&entry.name).to_string();
        Self {
            entry,
            extension,
            params: params.clone(),
        }
    }

    pub fn is_dir(&self) -> bool {
        self.entry.entry_type == EntryType::Dir
    }
}

/// Text after the final `.`, or the whole name when there is none.
pub fn extension_of(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(_, ext)| ext)
}

#[derive(Debug, Clone, Serialize)]
pub struct TreeResponse {
    pub data: Vec<TreeEntry>,
    pub params: LocationParams,
}
