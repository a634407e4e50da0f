//! What a caller needs from a model.

use std::fmt::Display;

use dc_core::EntityId;
use dc_frames::LoadType;

use crate::error::{QueryError, QueryResult};
use crate::params::{Param, Query};

/// Comparison operator of a filter clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Eq,
    In,
    Gt,
    Gte,
    Lt,
    Lte,
    Icontains,
}

impl FilterOp {
    const SUFFIXED: [FilterOp; 6] = [
        FilterOp::In,
        FilterOp::Gt,
        FilterOp::Gte,
        FilterOp::Lt,
        FilterOp::Lte,
        FilterOp::Icontains,
    ];

    /// Operator suffix inside `filter{field.op}`; equality has none.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            FilterOp::Eq => None,
            FilterOp::In => Some("in"),
            FilterOp::Gt => Some("gt"),
            FilterOp::Gte => Some("gte"),
            FilterOp::Lt => Some("lt"),
            FilterOp::Lte => Some("lte"),
            FilterOp::Icontains => Some("icontains"),
        }
    }

    fn from_suffix(suffix: &str) -> Option<Self> {
        Self::SUFFIXED
            .into_iter()
            .find(|op| op.suffix() == Some(suffix))
    }
}

/// A structured predicate rendered as `filter{field[.op]}=value`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterClause {
    pub field: String,
    pub op: FilterOp,
    pub values: Vec<String>,
}

impl FilterClause {
    pub fn eq(field: impl Into<String>, value: impl Display) -> Self {
        Self::compare(field, FilterOp::Eq, value)
    }

    /// Membership test, `field in [values]`.
    pub fn one_of<I>(field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        Self {
            field: field.into(),
            op: FilterOp::In,
            values: values.into_iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn compare(field: impl Into<String>, op: FilterOp, value: impl Display) -> Self {
        Self {
            field: field.into(),
            op,
            values: vec![value.to_string()],
        }
    }

    /// Unencoded parameter key, e.g. `filter{id.in}`.
    pub fn key(&self) -> String {
        match self.op.suffix() {
            Some(op) => format!("filter{{{}.{op}}}", self.field),
            None => format!("filter{{{}}}", self.field),
        }
    }

    /// Parse `field=value`, `field.op=value` or `field.in=a,b,c`.
    ///
    /// A trailing `.segment` that is not an operator stays part of the field,
    /// so relation paths like `meter_group.id=3` keep working.
    pub fn parse(text: &str) -> QueryResult<Self> {
        let invalid = || QueryError::InvalidClause {
            text: text.to_string(),
        };
        let (lhs, rhs) = text.split_once('=').ok_or_else(invalid)?;
        let lhs = lhs.trim();
        if lhs.is_empty() {
            return Err(invalid());
        }

        let (field, op) = match lhs.rsplit_once('.') {
            Some((field, suffix)) => match FilterOp::from_suffix(suffix) {
                Some(op) => (field, op),
                None => (lhs, FilterOp::Eq),
            },
            None => (lhs, FilterOp::Eq),
        };
        if field.is_empty() {
            return Err(invalid());
        }

        let values = match op {
            FilterOp::In => rhs
                .split(',')
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .collect(),
            _ => vec![rhs.trim().to_string()],
        };
        Ok(Self {
            field: field.to_string(),
            op,
            values,
        })
    }
}

/// Description of the data a caller needs.
///
/// `data_types` and `period` constrain what must already be cached on a
/// model; `clauses` are list filters evaluated by the backend. Tags keep the
/// order they were first requested in, without duplicates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FilterRequest {
    pub data_types: Option<Vec<LoadType>>,
    pub period: Option<u32>,
    pub clauses: Vec<FilterClause>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn data_type(self, tag: LoadType) -> Self {
        self.data_types([tag])
    }

    /// Add tags to the requested set.
    pub fn data_types<I>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = LoadType>,
    {
        let requested = self.data_types.get_or_insert_with(Vec::new);
        for tag in tags {
            if !requested.contains(&tag) {
                requested.push(tag);
            }
        }
        self
    }

    pub fn period(mut self, minutes: u32) -> Self {
        self.period = Some(minutes);
        self
    }

    pub fn clause(mut self, clause: FilterClause) -> Self {
        self.clauses.push(clause);
        self
    }

    /// Parse a comma-separated tag list such as `default,average`.
    pub fn parse_data_types(text: &str) -> QueryResult<Vec<LoadType>> {
        text.split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| {
                t.parse::<LoadType>()
                    .map_err(|_| QueryError::InvalidDataType {
                        text: t.to_string(),
                    })
            })
            .collect()
    }

    /// True when the request constrains cached `data`.
    pub fn has_data_constraints(&self) -> bool {
        self.data_types.is_some() || self.period.is_some()
    }

    pub fn is_unconstrained(&self) -> bool {
        !self.has_data_constraints() && self.clauses.is_empty()
    }

    /// Ids pinned by an `id` equality or `id in` clause.
    pub fn pinned_ids(&self) -> Option<Vec<EntityId>> {
        self.clauses
            .iter()
            .find(|c| c.field == "id" && matches!(c.op, FilterOp::Eq | FilterOp::In))
            .map(|c| {
                c.values
                    .iter()
                    .filter_map(|v| EntityId::parse(v).ok())
                    .collect()
            })
    }

    /// Wire parameters: `data_types`, then `period`, then clauses in order.
    pub fn to_query(&self) -> Query {
        let mut query = Query::new();
        if let Some(tags) = &self.data_types
            && !tags.is_empty()
        {
            query.insert(
                "data_types",
                Param::Array(tags.iter().map(|t| t.as_str().to_string()).collect()),
            );
        }
        if let Some(period) = self.period {
            query.insert("period", Param::Scalar(period.to_string()));
        }
        for clause in &self.clauses {
            query.insert(clause.key(), Param::Filter(clause.clone()));
        }
        query
    }
}
