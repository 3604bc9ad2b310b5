//! Recursive walk of a remote repository tree.
//!
//! Each directory level is listed with one remote call; subdirectories are
//! expanded concurrently and their results flattened into the parent's list
//! before the markdown/text filter runs, so matching files surface at any
//! depth. A semaphore shared by the whole walk caps the number of listings in
//! flight. The first failing listing aborts the walk.

use std::sync::Arc;

use futures::future::BoxFuture;
use futures::stream::{self, StreamExt, TryStreamExt};
use tokio::sync::Semaphore;

use crate::error::{AppError, Result};
use crate::models::{EntryType, LocationParams, TreeEntry};

use super::client::ContentLister;

/// Extensions kept in the final result.
pub const TEXT_EXTENSIONS: &[&str] = &["md", "txt"];

pub struct TreeFetcher {
    lister: Arc<dyn ContentLister>,
    permits: Arc<Semaphore>,
    fan_out: usize,
}

impl TreeFetcher {
    pub fn new(lister: Arc<dyn ContentLister>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);
        Self {
            lister,
            permits: Arc::new(Semaphore::new(concurrency)),
            fan_out: concurrency,
        }
    }

    /// List one directory, keeping files and directories only.
    pub async fn fetch_level(&self, params: &LocationParams) -> Result<Vec<TreeEntry>> {
        let entries = {
            let _permit = self
                .permits
                .acquire()
                .await
                .map_err(|e| AppError::RemoteFetch(e.to_string()))?;
            self.lister.list(params).await?
        };

        Ok(entries
            .into_iter()
            .filter(|e| matches!(e.entry_type, EntryType::File | EntryType::Dir))
            .map(|e| TreeEntry::new(e, params))
            .collect())
    }

    /// Every entry reachable from `params`, directories replaced by their contents.
    pub fn expand<'a>(&'a self, params: LocationParams) -> BoxFuture<'a, Result<Vec<TreeEntry>>> {
        Box::pin(async move {
            let level = self.fetch_level(&params).await?;

            let nested: Vec<Vec<TreeEntry>> = stream::iter(level)
                .map(|entry| {
                    let params = &params;
                    async move {
                        if entry.is_dir() {
                            self.expand(params.descend(&entry.entry.path)).await
                        } else {
                            Ok(vec![entry])
                        }
                    }
                })
                .buffered(self.fan_out)
                .try_collect()
                .await?;

            Ok(nested.into_iter().flatten().collect())
        })
    }

    /// Markdown and text files anywhere under `params`.
    pub async fn fetch_text_files(&self, params: &LocationParams) -> Result<Vec<TreeEntry>> {
        let entries = self.expand(params.clone()).await?;
        Ok(entries.into_iter().filter(is_text_file).collect())
    }
}

fn is_text_file(entry: &TreeEntry) -> bool {
    entry.entry.entry_type == EntryType::File
        && TEXT_EXTENSIONS.contains(&entry.extension.as_str())
}
