//! Mirrors the remote catalog into the local store.

use crate::error::Result;
use crate::models::{BasicComicRecord, Comic, DetailedComicRecord, Page};
use crate::remote::{page_urls, thumbnail_url, CatalogSource};
use crate::store::Catalog;
use serde::Serialize;
use std::time::{Duration, Instant};

/// Comic whose stored pages were replaced.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ComicUpdate {
    pub name: String,
    pub pages_before: i64,
    pub pages_after: usize,
}

/// Comic left untouched this cycle because its detail fetch failed.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SkippedComic {
    pub name: String,
    pub reason: String,
}

#[derive(Serialize, Debug, Clone, Default)]
pub struct SyncReport {
    /// Entries in the remote listing.
    pub examined: usize,
    pub updated: Vec<ComicUpdate>,
    pub skipped: Vec<SkippedComic>,
    pub elapsed: Duration,
}

/// Drives synchronization cycles against one [`CatalogSource`].
///
/// `&mut Catalog` keeps a single writer per process. Separate processes
/// syncing the same database file are not coordinated: every upsert is
/// still atomic, but their cycles may interleave and repeat detail fetches.
pub struct Synchronizer<S> {
    source: S,
}

impl<S: CatalogSource> Synchronizer<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Fetches comics that are new or have grown since the last cycle.
    ///
    /// A failing listing aborts the cycle before anything is written. A
    /// failing detail fetch skips that comic only; store failures abort.
    pub fn run(&self, catalog: &mut Catalog) -> Result<SyncReport> {
        self.cycle(catalog, false)
    }

    /// Re-fetches and replaces every listed comic regardless of stored pages.
    pub fn run_full(&self, catalog: &mut Catalog) -> Result<SyncReport> {
        self.cycle(catalog, true)
    }

    fn cycle(&self, catalog: &mut Catalog, full: bool) -> Result<SyncReport> {
        let start = Instant::now();
        let listing = self.source.list_all()?;
        let mut report = SyncReport {
            examined: listing.len(),
            ..SyncReport::default()
        };

        for basic in &listing {
            let existing = catalog.page_count(&basic.name)?;
            if !full && existing >= i64::from(basic.number_of_pages) {
                continue;
            }

            let detail = match self.source.get_detail(&basic.name) {
                Ok(detail) => detail,
                Err(e) if e.is_transient() => {
                    log::warn!("Skipping {}: {}", basic.name, e);
                    report.skipped.push(SkippedComic {
                        name: basic.name.clone(),
                        reason: e.to_string(),
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };

            let comic = self.merge(basic, detail);
            catalog.upsert_comic(&comic)?;

            log::info!(
                "{} ({} -> {})",
                comic.name,
                existing,
                comic.number_of_pages
            );
            report.updated.push(ComicUpdate {
                name: comic.name,
                pages_before: existing,
                pages_after: comic.number_of_pages,
            });
        }

        report.elapsed = start.elapsed();
        log::info!(
            "Updated {} comics in {:.2} seconds.",
            report.updated.len(),
            report.elapsed.as_secs_f64()
        );
        if !report.skipped.is_empty() {
            log::warn!("{} comics skipped this cycle", report.skipped.len());
        }
        Ok(report)
    }

    /// Listing fields win; the detail record only contributes rating and keywords.
    fn merge(&self, basic: &BasicComicRecord, detail: DetailedComicRecord) -> Comic {
        let root = self.source.static_root();
        let pages = page_urls(root, &basic.name, basic.number_of_pages)
            .into_iter()
            .zip(1..)
            .map(|(url, number)| Page { number, url })
            .collect::<Vec<_>>();

        Comic {
            id: basic.id,
            name: basic.name.clone(),
            thumbnail: thumbnail_url(root, &basic.name),
            category: basic.category.clone(),
            tag: basic.tag.clone(),
            artist: basic.artist.clone(),
            state: basic.state,
            created: basic.created,
            updated: basic.updated,
            user_rating: detail.user_rating,
            number_of_pages: pages.len(),
            pages,
            keywords: detail.keywords,
        }
    }
}
