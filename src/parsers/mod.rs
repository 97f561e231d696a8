// Text scrapers for the external tools
//
// None of lsscsi, skdump or nwipe offer a machine-readable mode, so each fact
// is a regex over captured stdout. Every function returns a typed value or a
// ParseError::NotFound; a missing marker never panics.

pub mod lsscsi;
pub mod nwipe;
pub mod skdump;

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{tool} output has no {marker} for {subject}")]
    NotFound {
        tool: &'static str,
        marker: &'static str,
        subject: String,
    },

    #[error("{tool} output has an unreadable {marker}: {value}")]
    Malformed {
        tool: &'static str,
        marker: &'static str,
        value: String,
    },
}

pub type ParseResult<T> = Result<T, ParseError>;
