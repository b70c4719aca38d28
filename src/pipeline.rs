//! Lister → fetcher → aggregator.
//!
//! The HTTP side sits behind [`RepoSource`] so pagination, fork filtering and
//! the failure policy can be exercised without the network.

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::github::{ApiError, Repository};
use crate::languages::{LanguageBytes, LanguageTotals};

/// Upper bound on list pages, in case the API never returns an empty one.
pub const MAX_PAGES: u32 = 1000;

#[async_trait]
pub trait RepoSource: Send + Sync {
    /// One page (1-based) of the owner's repositories, forks included.
    async fn list_page(&self, owner: &str, page: u32) -> Result<Vec<Repository>, ApiError>;
    async fn languages(&self, repo: &Repository) -> Result<LanguageBytes, ApiError>;
}

/// What to do when a single repository's languages cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    #[default]
    Abort,
    /// Log and continue. Authentication failures still abort.
    Skip,
}

/// Lazily walks the owner's repositories one page at a time, yielding only
/// non-fork records.
pub struct RepoPages<'a, S: ?Sized> {
    source: &'a S,
    owner: &'a str,
    page: u32,
    done: bool,
}

impl<'a, S: RepoSource + ?Sized> RepoPages<'a, S> {
    pub fn new(source: &'a S, owner: &'a str) -> Self {
        Self {
            source,
            owner,
            page: 1,
            done: false,
        }
    }

    /// Next batch of non-fork repositories, or `None` once the API reports
    /// an empty page.
    pub async fn next_page(&mut self) -> Result<Option<Vec<Repository>>> {
        if self.done {
            return Ok(None);
        }
        if self.page > MAX_PAGES {
            anyhow::bail!(
                "gave up listing repositories for {} after {MAX_PAGES} pages",
                self.owner
            );
        }

        let batch = self
            .source
            .list_page(self.owner, self.page)
            .await
            .with_context(|| {
                format!(
                    "Failed to list repositories for {} (page {})",
                    self.owner, self.page
                )
            })?;
        debug!(page = self.page, count = batch.len(), "fetched repository page");

        if batch.is_empty() {
            self.done = true;
            return Ok(None);
        }
        self.page += 1;

        Ok(Some(batch.into_iter().filter(|r| !r.fork).collect()))
    }
}

/// Walk every non-fork repository of `owner` and sum its language bytes into
/// `totals`. Returns the number of repositories that contributed.
pub async fn collect_totals<S: RepoSource + ?Sized>(
    source: &S,
    owner: &str,
    policy: FailurePolicy,
    totals: &mut LanguageTotals,
) -> Result<usize> {
    let mut pages = RepoPages::new(source, owner);
    let mut counted = 0usize;
    let mut skipped = 0usize;

    while let Some(repos) = pages.next_page().await? {
        for repo in repos {
            match source.languages(&repo).await {
                Ok(langs) => {
                    totals.add(&langs);
                    counted += 1;
                }
                Err(e) if policy == FailurePolicy::Skip && !e.is_auth() => {
                    warn!(repo = %repo.name, "skipping repository: {e}");
                    skipped += 1;
                }
                Err(e) => {
                    return Err(e).with_context(|| {
                        format!("Failed to fetch languages for {}/{}", owner, repo.name)
                    });
                }
            }
        }
    }

    info!(
        repos = counted,
        skipped,
        languages = totals.len(),
        bytes = totals.total(),
        "aggregated language totals"
    );

    Ok(counted)
}
