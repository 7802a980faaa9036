//! Read-only queries over the catalog.
//! Every result is a fully hydrated [`Comic`].

use crate::error::Result;
use crate::models::Comic;
use crate::similarity::close_matches;
use crate::store::{Catalog, Field};
use serde::Serialize;
use std::convert::TryFrom;

pub const DEFAULT_LIMIT: usize = 10;
pub const NAME_CUTOFF: f64 = 0.3;
pub const FIELD_CUTOFF: f64 = 0.6;

/// Keyword with the number of comics carrying it.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
}

/// One page of the keyword frequency list.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct KeywordPage {
    pub page: usize,
    pub max_page: usize,
    pub keywords: Vec<KeywordCount>,
}

pub struct SearchEngine<'a> {
    catalog: &'a Catalog,
    name_cutoff: f64,
    field_cutoff: f64,
}

impl<'a> SearchEngine<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            catalog,
            name_cutoff: NAME_CUTOFF,
            field_cutoff: FIELD_CUTOFF,
        }
    }

    pub fn name_cutoff(mut self, cutoff: f64) -> Self {
        self.name_cutoff = cutoff;
        self
    }

    pub fn field_cutoff(mut self, cutoff: f64) -> Self {
        self.field_cutoff = cutoff;
        self
    }

    /// Exact lookup. `None` means the catalog has no such comic.
    pub fn get(&self, name: &str) -> Result<Option<Comic>> {
        self.catalog.get_by_name(name)
    }

    /// 1-based page of comics, best rated first. Page 0 is always empty.
    pub fn by_page(&self, page: usize, limit: usize) -> Result<Vec<Comic>> {
        if page == 0 || limit == 0 {
            return Ok(Vec::new());
        }
        let offset = match page_offset(page, limit).and_then(|o| i64::try_from(o).ok()) {
            Some(offset) => offset,
            None => return Ok(Vec::new()),
        };
        let names = self.catalog.page_range(offset, sql_limit(limit))?;
        self.hydrate_names(names.iter().map(String::as_str))
    }

    /// Last page index as `floor((comics - 1) / limit)`; zero for an empty catalog.
    pub fn max_page(&self, limit: usize) -> Result<usize> {
        let total = self.catalog.count_comics()? as usize;
        Ok(last_page(total, limit))
    }

    pub fn by_name(&self, query: &str, limit: usize) -> Result<Vec<Comic>> {
        let names = self.catalog.list_names()?;
        let matches = close_matches(
            query,
            names.iter().map(String::as_str),
            limit,
            self.name_cutoff,
        );
        log::debug!("{} names match {:?}", matches.len(), query);
        self.hydrate_names(matches.iter().map(|m| m.value))
    }

    pub fn by_artist(&self, query: &str, limit: usize) -> Result<Vec<Comic>> {
        self.by_field(Field::Artist, query, limit)
    }

    pub fn by_category(&self, query: &str, limit: usize) -> Result<Vec<Comic>> {
        self.by_field(Field::Category, query, limit)
    }

    pub fn by_tag(&self, query: &str, limit: usize) -> Result<Vec<Comic>> {
        self.by_field(Field::Tag, query, limit)
    }

    /// Fuzzy match over the distinct values of `field`. Each matching value
    /// brings in every comic carrying it, best values first.
    pub fn by_field(&self, field: Field, query: &str, limit: usize) -> Result<Vec<Comic>> {
        let values = self.catalog.list_by_field(field)?;
        let matches = close_matches(
            query,
            values.iter().map(|(_, value)| value.as_str()),
            limit,
            self.field_cutoff,
        );
        log::debug!("{} {:?} values match {:?}", matches.len(), field, query);

        let mut comics = Vec::new();
        for m in matches {
            for id in self.catalog.ids_by_field(field, m.value)? {
                if comics.len() == limit {
                    return Ok(comics);
                }
                if let Some(comic) = self.catalog.get_by_id(id)? {
                    comics.push(comic);
                }
            }
        }
        Ok(comics)
    }

    /// Comics with at least one of `keywords`, compared exactly.
    pub fn by_keywords(&self, keywords: &[String], limit: usize) -> Result<Vec<Comic>> {
        let ids = self.catalog.ids_with_keywords(keywords, sql_limit(limit))?;
        let mut comics = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(comic) = self.catalog.get_by_id(id)? {
                comics.push(comic);
            }
        }
        Ok(comics)
    }

    /// Every keyword with its usage count, most used first.
    pub fn keyword_frequency(&self) -> Result<Vec<KeywordCount>> {
        Ok(self
            .catalog
            .keyword_counts()?
            .into_iter()
            .map(|(keyword, count)| KeywordCount { keyword, count })
            .collect())
    }

    /// 1-based page of [`SearchEngine::keyword_frequency`].
    pub fn keyword_page(&self, page: usize, limit: usize) -> Result<KeywordPage> {
        let all = self.keyword_frequency()?;
        let max_page = last_page(all.len(), limit);
        let keywords = match page_offset(page, limit) {
            Some(offset) if limit > 0 => all.into_iter().skip(offset).take(limit).collect(),
            _ => Vec::new(),
        };
        Ok(KeywordPage {
            page,
            max_page,
            keywords,
        })
    }

    fn hydrate_names<'n>(&self, names: impl Iterator<Item = &'n str>) -> Result<Vec<Comic>> {
        let mut comics = Vec::new();
        for name in names {
            match self.catalog.get_by_name(name)? {
                Some(comic) => comics.push(comic),
                None => log::debug!("Comic {} vanished before it could be loaded", name),
            }
        }
        Ok(comics)
    }
}

/// Rows before 1-based `page`; `None` for page 0 or when it cannot be addressed.
fn page_offset(page: usize, limit: usize) -> Option<usize> {
    page.checked_sub(1)?.checked_mul(limit)
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn last_page(total: usize, limit: usize) -> usize {
    if limit == 0 {
        return 0;
    }
    total.saturating_sub(1) / limit
}
