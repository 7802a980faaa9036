//! Catalog store.
//! Uses diesel with SQLite backend.

use crate::error::{Error, Result};
use crate::models::{Comic, ComicRecord, KeywordRecord, PageRecord};
use crate::schema::{comics, keywords, pages};
use diesel::connection::SimpleConnection;
use diesel::dsl::sql;
use diesel::prelude::*;
use diesel::sql_types::BigInt;
use diesel::sqlite::SqliteConnection;
use std::collections::BTreeSet;
use std::path::Path;

embed_migrations!("migrations");

const CONNECTION_PRAGMAS: &str = "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;";

/// Single-valued comic attribute the fuzzy field search runs over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Artist,
    Category,
    Tag,
}

/// Row counts of the three catalog tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CatalogStats {
    pub comics: i64,
    pub pages: i64,
    pub keywords: i64,
}

/// Comic catalog database.
/// Each instance owns one connection. Readers may open their own instances
/// concurrently; writes go through [`Catalog::upsert_comic`] only.
pub struct Catalog {
    conn: SqliteConnection,
}

impl Catalog {
    /// Opens (or creates) the catalog at `path` and applies pending migrations.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let url = path
            .to_str()
            .ok_or("Database path is not valid UTF-8")?;
        log::debug!("Opening SQLite DB at {:?}", path);
        Self::establish(url)
    }

    /// Private catalog living only as long as this instance.
    pub fn in_memory() -> Result<Self> {
        Self::establish(":memory:")
    }

    fn establish(url: &str) -> Result<Self> {
        let conn = SqliteConnection::establish(url)?;
        conn.batch_execute(CONNECTION_PRAGMAS)?;
        embedded_migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Writes `comic` and replaces its full page and keyword sets.
    ///
    /// Any previous row with the same id or the same name is deleted first;
    /// its pages and keywords go with it through `ON DELETE CASCADE`.
    /// Everything happens in one immediate transaction, so readers see either
    /// the old comic or the new one, never a mix.
    pub fn upsert_comic(&mut self, comic: &Comic) -> Result<()> {
        if comic
            .pages
            .iter()
            .enumerate()
            .any(|(idx, page)| page.number != idx as i32 + 1)
        {
            return Err(Error::InvalidPages(comic.name.clone()));
        }

        let record = comic.to_record();
        let page_recs = comic
            .pages
            .iter()
            .map(|page| PageRecord {
                comic_name: comic.name.clone(),
                page_number: page.number,
                page_url: page.url.clone(),
            })
            .collect::<Vec<_>>();
        let keyword_recs = comic
            .keywords
            .iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(|keyword| KeywordRecord {
                comic_id: comic.id,
                keyword: keyword.clone(),
            })
            .collect::<Vec<_>>();

        let conn = &self.conn;
        conn.immediate_transaction::<_, Error, _>(|| {
            diesel::delete(
                comics::table.filter(comics::id.eq(record.id).or(comics::name.eq(&record.name))),
            )
            .execute(conn)?;
            diesel::insert_into(comics::table)
                .values(&record)
                .execute(conn)?;
            if !page_recs.is_empty() {
                diesel::insert_into(pages::table)
                    .values(&page_recs)
                    .execute(conn)?;
            }
            if !keyword_recs.is_empty() {
                diesel::insert_into(keywords::table)
                    .values(&keyword_recs)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    /// Removes a comic with its pages and keywords. Returns whether it existed.
    pub fn remove_comic(&mut self, name: &str) -> Result<bool> {
        let removed = diesel::delete(comics::table.filter(comics::name.eq(name)))
            .execute(&self.conn)?;
        Ok(removed > 0)
    }

    pub fn get_by_name(&self, name: &str) -> Result<Option<Comic>> {
        let record = comics::table
            .filter(comics::name.eq(name))
            .first::<ComicRecord>(&self.conn)
            .optional()?;
        record.map(|rec| self.hydrate(rec)).transpose()
    }

    pub fn get_by_id(&self, id: i32) -> Result<Option<Comic>> {
        let record = comics::table
            .find(id)
            .first::<ComicRecord>(&self.conn)
            .optional()?;
        record.map(|rec| self.hydrate(rec)).transpose()
    }

    fn hydrate(&self, rec: ComicRecord) -> Result<Comic> {
        let page_recs = pages::table
            .filter(pages::comic_name.eq(&rec.name))
            .order_by(pages::page_number)
            .load::<PageRecord>(&self.conn)?;
        let keyword_recs = keywords::table
            .filter(keywords::comic_id.eq(rec.id))
            .order_by(keywords::keyword)
            .load::<KeywordRecord>(&self.conn)?;
        Ok(Comic::from_records(rec, page_recs, keyword_recs))
    }

    pub fn list_names(&self) -> Result<Vec<String>> {
        Ok(comics::table
            .select(comics::name)
            .order_by(comics::name)
            .load(&self.conn)?)
    }

    /// `(id, value)` pairs of the given field for every comic, by id.
    pub fn list_by_field(&self, field: Field) -> Result<Vec<(i32, String)>> {
        let query = comics::table.order_by(comics::id);
        Ok(match field {
            Field::Artist => query
                .select((comics::id, comics::artist))
                .load(&self.conn)?,
            Field::Category => query
                .select((comics::id, comics::category))
                .load(&self.conn)?,
            Field::Tag => query.select((comics::id, comics::tag)).load(&self.conn)?,
        })
    }

    pub fn count_comics(&self) -> Result<i64> {
        Ok(comics::table.count().get_result(&self.conn)?)
    }

    /// Stored page count of a comic; zero if it is unknown.
    pub fn page_count(&self, name: &str) -> Result<i64> {
        Ok(pages::table
            .filter(pages::comic_name.eq(name))
            .count()
            .get_result(&self.conn)?)
    }

    /// Names of comics ordered by rating (unrated last), then name.
    pub fn page_range(&self, offset: i64, limit: i64) -> Result<Vec<String>> {
        Ok(comics::table
            .select(comics::name)
            .order_by((comics::user_rating.desc(), comics::name.asc()))
            .limit(limit)
            .offset(offset)
            .load(&self.conn)?)
    }

    /// Distinct ids of comics tagged with any of `wanted`, by id.
    pub fn ids_with_keywords(&self, wanted: &[String], limit: i64) -> Result<Vec<i32>> {
        if wanted.is_empty() {
            return Ok(Vec::new());
        }
        Ok(keywords::table
            .select(keywords::comic_id)
            .filter(keywords::keyword.eq_any(wanted))
            .distinct()
            .order_by(keywords::comic_id)
            .limit(limit)
            .load(&self.conn)?)
    }

    /// Ids of comics whose field equals `value` exactly, best rated first.
    pub fn ids_by_field(&self, field: Field, value: &str) -> Result<Vec<i32>> {
        let query = comics::table
            .select(comics::id)
            .order_by((comics::user_rating.desc(), comics::name.asc()));
        Ok(match field {
            Field::Artist => query.filter(comics::artist.eq(value)).load(&self.conn)?,
            Field::Category => query
                .filter(comics::category.eq(value))
                .load(&self.conn)?,
            Field::Tag => query.filter(comics::tag.eq(value)).load(&self.conn)?,
        })
    }

    /// Number of comics carrying each keyword, most used first, ties by keyword.
    pub fn keyword_counts(&self) -> Result<Vec<(String, i64)>> {
        let uses = || sql::<BigInt>("COUNT(*)");
        Ok(keywords::table
            .group_by(keywords::keyword)
            .select((keywords::keyword, uses()))
            .order_by((uses().desc(), keywords::keyword.asc()))
            .load(&self.conn)?)
    }

    pub fn stats(&self) -> Result<CatalogStats> {
        Ok(CatalogStats {
            comics: self.count_comics()?,
            pages: pages::table.count().get_result(&self.conn)?,
            keywords: keywords::table.count().get_result(&self.conn)?,
        })
    }
}
