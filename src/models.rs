use crate::schema::{comics, keywords, pages};
use chrono::{DateTime, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql};
use diesel::serialize::{self, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Deserializer, Serialize};
use std::io::Write;

/// Publication state reported by the remote catalog.
#[derive(AsExpression, FromSqlRow, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[sql_type = "Text"]
#[serde(rename_all = "lowercase")]
pub enum ComicState {
    Finished,
    #[serde(rename = "wip")]
    WorkInProgress,
    Cancelled,
}

impl ComicState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Finished => "finished",
            Self::WorkInProgress => "wip",
            Self::Cancelled => "cancelled",
        }
    }
}

impl ToSql<Text, Sqlite> for ComicState {
    fn to_sql<W: Write>(&self, out: &mut Output<W, Sqlite>) -> serialize::Result {
        <str as ToSql<Text, Sqlite>>::to_sql(self.as_str(), out)
    }
}

impl FromSql<Text, Sqlite> for ComicState {
    fn from_sql(bytes: Option<&<Sqlite as Backend>::RawValue>) -> deserialize::Result<Self> {
        Ok(<String as FromSql<Text, Sqlite>>::from_sql(bytes)?.parse()?)
    }
}

impl std::str::FromStr for ComicState {
    type Err = &'static str;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "finished" => Ok(Self::Finished),
            "wip" => Ok(Self::WorkInProgress),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err("Unrecognized comic state"),
        }
    }
}

impl std::fmt::Display for ComicState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Queryable, Insertable, Debug, Clone, PartialEq)]
#[table_name = "comics"]
pub(crate) struct ComicRecord {
    pub(crate) id: i32,
    pub(crate) name: String,
    pub(crate) thumbnail: String,
    pub(crate) category: String,
    pub(crate) tag: String,
    pub(crate) artist: String,
    pub(crate) state: ComicState,
    pub(crate) created: NaiveDateTime,
    pub(crate) updated: NaiveDateTime,
    pub(crate) user_rating: Option<f64>,
}

#[derive(Queryable, Insertable, Debug)]
#[table_name = "pages"]
pub(crate) struct PageRecord {
    pub(crate) comic_name: String,
    pub(crate) page_number: i32,
    pub(crate) page_url: String,
}

#[derive(Queryable, Insertable, Debug)]
#[table_name = "keywords"]
pub(crate) struct KeywordRecord {
    pub(crate) comic_id: i32,
    pub(crate) keyword: String,
}

/// Single page image of a comic. Numbers start at 1.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Page {
    pub number: i32,
    pub url: String,
}

/// Fully hydrated comic: metadata, every page and every keyword.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Comic {
    pub id: i32,
    pub name: String,
    pub thumbnail: String,
    pub category: String,
    pub tag: String,
    pub artist: String,
    pub state: ComicState,
    pub created: NaiveDateTime,
    pub updated: NaiveDateTime,
    pub user_rating: Option<f64>,
    /// Always equal to `pages.len()`.
    pub number_of_pages: usize,
    pub pages: Vec<Page>,
    pub keywords: Vec<String>,
}

impl Comic {
    pub(crate) fn from_records(
        rec: ComicRecord,
        page_recs: Vec<PageRecord>,
        keyword_recs: Vec<KeywordRecord>,
    ) -> Self {
        let pages = page_recs
            .into_iter()
            .map(|p| Page {
                number: p.page_number,
                url: p.page_url,
            })
            .collect::<Vec<_>>();

        Self {
            id: rec.id,
            name: rec.name,
            thumbnail: rec.thumbnail,
            category: rec.category,
            tag: rec.tag,
            artist: rec.artist,
            state: rec.state,
            created: rec.created,
            updated: rec.updated,
            user_rating: rec.user_rating,
            number_of_pages: pages.len(),
            pages,
            keywords: keyword_recs.into_iter().map(|k| k.keyword).collect(),
        }
    }

    pub(crate) fn to_record(&self) -> ComicRecord {
        ComicRecord {
            id: self.id,
            name: self.name.clone(),
            thumbnail: self.thumbnail.clone(),
            category: self.category.clone(),
            tag: self.tag.clone(),
            artist: self.artist.clone(),
            state: self.state,
            created: self.created,
            updated: self.updated,
            user_rating: self.user_rating,
        }
    }
}

/// Entry of the bulk listing endpoint. Carries no keywords or rating.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BasicComicRecord {
    pub id: i32,
    pub name: String,
    #[serde(rename = "cat")]
    pub category: String,
    pub tag: String,
    pub artist: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated: NaiveDateTime,
    pub state: ComicState,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created: NaiveDateTime,
    pub number_of_pages: u32,
}

/// Response of the per-name detail endpoint. Carries keywords and rating but no thumbnail.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DetailedComicRecord {
    pub id: i32,
    pub name: String,
    pub number_of_pages: u32,
    pub artist: String,
    #[serde(rename = "cat")]
    pub category: String,
    pub tag: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub created: NaiveDateTime,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub updated: NaiveDateTime,
    pub user_rating: Option<f64>,
    pub keywords: Vec<String>,
}

/// Accepts RFC 3339 (converted to UTC) or a naive `YYYY-MM-DD[ T]HH:MM:SS[.fff]` timestamp.
pub(crate) fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.naive_utc())
        .ok()
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f").ok())
        .or_else(|| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").ok())
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    parse_timestamp(&s)
        .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp {:?}", s)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn parses_listing_entry() {
        let rec: BasicComicRecord = serde_json::from_str(
            r#"{
                "id": 12, "name": "Fox Tales", "cat": "MF", "tag": "Furry",
                "artist": "Reynard", "updated": "2021-03-04T05:06:07.000Z",
                "state": "wip", "created": "2019-01-02 03:04:05", "numberOfPages": 24
            }"#,
        )
        .unwrap();

        assert_eq!(rec.category, "MF");
        assert_eq!(rec.state, ComicState::WorkInProgress);
        assert_eq!(rec.number_of_pages, 24);
        assert_eq!(
            rec.created,
            NaiveDate::from_ymd(2019, 1, 2).and_hms(3, 4, 5)
        );
        assert_eq!(
            rec.updated,
            NaiveDate::from_ymd(2021, 3, 4).and_hms(5, 6, 7)
        );
    }

    #[test]
    fn detail_rating_may_be_null() {
        let rec: DetailedComicRecord = serde_json::from_str(
            r#"{
                "id": 12, "name": "Fox Tales", "numberOfPages": 24, "artist": "Reynard",
                "cat": "MF", "tag": "Furry", "created": "2019-01-02T03:04:05Z",
                "updated": "2019-01-02T03:04:05Z", "userRating": null,
                "keywords": ["feral", "forest"]
            }"#,
        )
        .unwrap();

        assert_eq!(rec.user_rating, None);
        assert_eq!(rec.keywords, vec!["feral", "forest"]);
    }

    #[test]
    fn missing_field_is_rejected() {
        let res = serde_json::from_str::<BasicComicRecord>(
            r#"{"id": 1, "name": "x", "tag": "t", "artist": "a", "updated": "2020-01-01 00:00:00",
                "state": "finished", "created": "2020-01-01 00:00:00", "numberOfPages": 1}"#,
        );
        assert!(res.unwrap_err().to_string().contains("cat"));
    }

    #[test]
    fn unknown_state_is_rejected() {
        assert!("paused".parse::<ComicState>().is_err());
        assert_eq!("cancelled".parse::<ComicState>(), Ok(ComicState::Cancelled));
    }
}
