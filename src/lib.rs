#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;

pub mod config;
pub mod error;
pub mod models;
pub mod remote;
pub mod schema;
pub mod search;
pub mod similarity;
pub mod store;
pub mod sync;

pub use crate::config::{BaseUrl, RemoteConfig};
pub use crate::error::{Error, Result};
pub use crate::models::{Comic, ComicState, Page};
pub use crate::remote::{CatalogSource, RemoteClient};
pub use crate::search::SearchEngine;
pub use crate::store::{Catalog, Field};
pub use crate::sync::{SyncReport, Synchronizer};
