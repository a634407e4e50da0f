//! Query-string encoding.
//!
//! Keys and values are percent-encoded; the grammar's structural characters
//! (`[]` after array keys, `{}` around filter fields, `,` between joined
//! values) are written literally.

use serde::{Deserialize, Serialize};

use crate::filter::FilterOp;
use crate::params::{Param, Query};

/// How array parameters and `in` filter clauses are rendered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayEncoding {
    /// `k[]=a&k[]=b`, `filter{id.in}=1&filter{id.in}=2`
    #[default]
    Repeated,
    /// `k=a,b`, `filter{id.in}=1,2` (legacy pagination endpoints)
    CommaJoined,
}

/// Page-size key naming.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationStyle {
    /// `page_size`
    #[default]
    Snake,
    /// `pageSize`
    Camel,
}

impl PaginationStyle {
    pub fn page_size_key(self) -> &'static str {
        match self {
            PaginationStyle::Snake => "page_size",
            PaginationStyle::Camel => "pageSize",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncodeOptions {
    #[serde(default)]
    pub arrays: ArrayEncoding,
    #[serde(default)]
    pub pagination: PaginationStyle,
}

impl EncodeOptions {
    /// Conventions of the older paginated list endpoints.
    pub fn legacy() -> Self {
        Self {
            arrays: ArrayEncoding::CommaJoined,
            pagination: PaginationStyle::Camel,
        }
    }
}

fn enc(text: &str) -> std::borrow::Cow<'_, str> {
    urlencoding::encode(text)
}

/// Encode `query` without a leading `?`. Empty queries encode to `""`.
pub fn encode(query: &Query, options: EncodeOptions) -> String {
    let mut pairs = Vec::new();

    for (key, param) in query.iter() {
        match param {
            Param::Scalar(value) => pairs.push(format!("{}={}", enc(key), enc(value))),
            Param::Array(values) => match options.arrays {
                ArrayEncoding::Repeated => push_repeated(&mut pairs, key, values),
                ArrayEncoding::CommaJoined => push_joined(&mut pairs, &enc(key), values),
            },
            Param::Directive(values) => push_repeated(&mut pairs, key, values),
            Param::Filter(clause) => {
                let filter_key = match clause.op.suffix() {
                    Some(op) => format!("filter{{{}.{op}}}", enc(&clause.field)),
                    None => format!("filter{{{}}}", enc(&clause.field)),
                };
                match (clause.op, options.arrays) {
                    (FilterOp::In, ArrayEncoding::CommaJoined) => {
                        push_joined(&mut pairs, &filter_key, &clause.values)
                    }
                    _ => {
                        for value in &clause.values {
                            pairs.push(format!("{filter_key}={}", enc(value)));
                        }
                    }
                }
            }
            Param::PageSize(size) => {
                pairs.push(format!("{}={size}", options.pagination.page_size_key()))
            }
        }
    }

    pairs.join("&")
}

fn push_repeated(pairs: &mut Vec<String>, key: &str, values: &[String]) {
    let key = enc(key);
    for value in values {
        pairs.push(format!("{key}[]={}", enc(value)));
    }
}

fn push_joined(pairs: &mut Vec<String>, key: &str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    let joined: Vec<_> = values.iter().map(|v| enc(v)).collect();
    pairs.push(format!("{key}={}", joined.join(",")));
}

/// Append the encoded `query` to `route`.
///
/// An absent or empty query returns `route` unchanged, with no trailing `?`.
pub fn with_query(route: &str, query: Option<&Query>, options: EncodeOptions) -> String {
    let encoded = query.map(|q| encode(q, options)).unwrap_or_default();
    if encoded.is_empty() {
        return route.to_string();
    }
    let sep = if route.contains('?') { '&' } else { '?' };
    format!("{route}{sep}{encoded}")
}
