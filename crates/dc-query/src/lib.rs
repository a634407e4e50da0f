//! dc-query: request description and query-string encoding.
//!
//! A [`FilterRequest`] says what a caller needs from a model; a [`Query`] is
//! the ordered parameter object sent to the backend, and [`encode`] turns it
//! into the canonical query string.

pub mod encode;
pub mod error;
pub mod filter;
pub mod params;

pub use encode::{ArrayEncoding, EncodeOptions, PaginationStyle, encode, with_query};
pub use error::{QueryError, QueryResult};
pub use filter::{FilterClause, FilterOp, FilterRequest};
pub use params::{ListOptions, Pagination, Param, Query};
