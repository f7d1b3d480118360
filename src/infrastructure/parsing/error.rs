//! Extraction failures that mark a page as unusable.

use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A field the record cannot exist without was absent from the page.
    #[error("required field '{field}' not found in page")]
    RequiredFieldMissing { field: &'static str },

    /// Every card-line extraction strategy came up empty.
    #[error("no card lines found by any extraction strategy")]
    NoCardLines,

    /// A raw date string matched none of the accepted formats.
    #[error("date '{raw}' matches no accepted format")]
    UnparsableDate { raw: String },
}

impl ParseError {
    pub fn required(field: &'static str) -> Self {
        Self::RequiredFieldMissing { field }
    }

    pub fn unparsable_date(raw: impl Into<String>) -> Self {
        Self::UnparsableDate { raw: raw.into() }
    }
}
