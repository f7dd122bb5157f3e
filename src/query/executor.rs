//! Query execution over a collection's documents

use crate::storage::document::{Document, Value};
use std::cmp::Ordering;

use super::filter::Filter;

/// A filtered, ordered and windowed read of one collection
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub filter: Filter,
    pub order_by: Vec<OrderBy>,
    pub offset: usize,
    pub limit: Option<usize>,
}

/// ORDER BY clause
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrderDirection {
    #[default]
    Asc,
    Desc,
}

impl Query {
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            order_by: Vec::new(),
            offset: 0,
            limit: None,
        }
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: OrderDirection) -> Self {
        self.order_by.push(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Apply a query to documents already loaded from a collection
pub fn execute(mut docs: Vec<Document>, query: &Query) -> Vec<Document> {
    docs.retain(|doc| query.filter.matches(doc));

    if !query.order_by.is_empty() {
        docs.sort_by(|a, b| {
            for order in &query.order_by {
                let cmp = compare_values(sort_key(a, &order.field), sort_key(b, &order.field));
                if cmp != Ordering::Equal {
                    return match order.direction {
                        OrderDirection::Asc => cmp,
                        OrderDirection::Desc => cmp.reverse(),
                    };
                }
            }
            Ordering::Equal
        });
    }

    docs.into_iter()
        .skip(query.offset)
        .take(query.limit.unwrap_or(usize::MAX))
        .collect()
}

fn sort_key<'a>(doc: &'a Document, field: &str) -> Option<&'a Value> {
    doc.resolve_path(field).into_iter().next()
}

/// Missing values sort before present ones
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => a.compare(b).unwrap_or(Ordering::Equal),
    }
}
