use diesel::result::{ConnectionError, Error as DieselError};
use diesel_migrations::RunMigrationsError;
use url::ParseError as URLError;

use err_derive::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error(display = "Remote catalog unavailable: {}", _0)]
    RemoteUnavailable(String),
    #[error(display = "Comic not found: {}", _0)]
    NotFound(String),
    #[error(display = "Malformed record from remote catalog: {}", _0)]
    MalformedRecord(String),
    #[error(display = "Catalog store failure")]
    StoreIO(#[error(source)] DieselError),
    #[error(display = "Cannot connect catalog database")]
    Connection(#[error(source)] ConnectionError),
    #[error(display = "Catalog migration failure")]
    Migration(#[error(source)] RunMigrationsError),
    #[error(display = "URL parse error")]
    URL(#[error(source)] URLError),
    #[error(display = "Page numbers of comic {} are not contiguous from 1", _0)]
    InvalidPages(String),
    #[error(display = "Invalid configuration: {}", _0)]
    Config(String),
    #[error(display = "{}", _0)]
    StaticStr(&'static str),
}

impl Error {
    /// Failures that only affect a single comic during synchronization.
    /// The synchronizer skips the comic and carries on with the cycle.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RemoteUnavailable(_) | Self::NotFound(_) | Self::MalformedRecord(_)
        )
    }
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Self::StaticStr(s)
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remote_failures_are_transient() {
        assert!(Error::RemoteUnavailable("timeout".into()).is_transient());
        assert!(Error::NotFound("Fox Tales".into()).is_transient());
        assert!(Error::MalformedRecord("missing field `cat`".into()).is_transient());
        assert!(!Error::StoreIO(DieselError::NotFound).is_transient());
        assert!(!Error::InvalidPages("Fox Tales".into()).is_transient());
    }

    #[test]
    fn display_names_the_comic() {
        assert_eq!(
            Error::NotFound("Fox Tales".into()).to_string(),
            "Comic not found: Fox Tales"
        );
    }
}
