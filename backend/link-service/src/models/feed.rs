//! Feed query arguments: substring filter, offset pagination and multi-key ordering

use crate::error::{ApiError, Result};
use crate::models::Link;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Link columns a feed may be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOrderField {
    Description,
    Url,
    CreatedAt,
}

impl LinkOrderField {
    pub fn column(&self) -> &'static str {
        match self {
            LinkOrderField::Description => "description",
            LinkOrderField::Url => "url",
            LinkOrderField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkOrder {
    pub field: LinkOrderField,
    pub direction: SortDirection,
}

impl LinkOrder {
    fn compare(&self, a: &Link, b: &Link) -> Ordering {
        let ordering = match self.field {
            LinkOrderField::Description => a.description.cmp(&b.description),
            LinkOrderField::Url => a.url.cmp(&b.url),
            LinkOrderField::CreatedAt => a.created_at.cmp(&b.created_at),
        };

        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Validated `feed` arguments
///
/// `count` is always computed over `filter` alone; `skip`/`take` only shape
/// the returned page. Results are ordered by `order_by` in sequence with
/// `id ASC` as the final tie-breaker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedQuery {
    pub filter: Option<String>,
    pub skip: Option<i64>,
    pub take: Option<i64>,
    pub order_by: Vec<LinkOrder>,
}

impl FeedQuery {
    pub fn new(
        filter: Option<String>,
        skip: Option<i32>,
        take: Option<i32>,
        order_by: Vec<LinkOrder>,
    ) -> Result<Self> {
        if let Some(skip) = skip {
            if skip < 0 {
                return Err(ApiError::BadRequest("skip must be non-negative".to_string()));
            }
        }
        if let Some(take) = take {
            if take < 0 {
                return Err(ApiError::BadRequest("take must be non-negative".to_string()));
            }
        }

        Ok(Self {
            filter,
            skip: skip.map(i64::from),
            take: take.map(i64::from),
            order_by,
        })
    }

    /// Whether `link` belongs to the filtered set
    ///
    /// Case-sensitive substring match against description or url.
    pub fn matches(&self, link: &Link) -> bool {
        match self.filter.as_deref() {
            Some(needle) => link.description.contains(needle) || link.url.contains(needle),
            None => true,
        }
    }

    /// Total order used to sort the filtered set
    pub fn compare(&self, a: &Link, b: &Link) -> Ordering {
        self.order_by
            .iter()
            .map(|order| order.compare(a, b))
            .find(|ordering| ordering.is_ne())
            .unwrap_or_else(|| a.id.cmp(&b.id))
    }

    /// Offset as a `usize`, zero when absent
    pub fn offset(&self) -> usize {
        self.skip
            .and_then(|skip| usize::try_from(skip).ok())
            .unwrap_or(0)
    }

    /// Limit as a `usize`, unbounded when absent
    pub fn limit(&self) -> usize {
        self.take
            .and_then(|take| usize::try_from(take).ok())
            .unwrap_or(usize::MAX)
    }
}
