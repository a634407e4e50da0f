//! Query construction errors.

use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum QueryError {
    /// Clause text not of the form `field[.op]=value`.
    #[error("Invalid filter clause: {text}")]
    InvalidClause { text: String },

    /// Unknown load-type tag in a `data_types` list.
    #[error("Invalid data type: {text}")]
    InvalidDataType { text: String },

    /// Parameter object was not a JSON object.
    #[error("Query parameters must be an object, got {kind}")]
    NotAnObject { kind: &'static str },
}
