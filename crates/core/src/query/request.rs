//! Parsed pagination request.

use crate::error::{QueryError, QueryResult};
use crate::models::CREATED_AT_FIELD;
use crate::query::key::{ORDER_PREFIX, OrderDirection, SEPARATOR};

/// Name of the page-number parameter. Its presence selects page mode.
pub const PAGE_PARAM: &str = "page";
/// Name of the page-size parameter.
pub const TAKE_PARAM: &str = "take";
/// Default page size.
pub const DEFAULT_TAKE: u32 = 20;
/// Default upper bound on page size.
pub const MAX_TAKE: u32 = 100;

/// Page-size bounds applied while parsing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestLimits {
    pub default_take: u32,
    pub max_take: u32,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            default_take: DEFAULT_TAKE,
            max_take: MAX_TAKE,
        }
    }
}

/// A validated list request, built once from raw query pairs.
///
/// `params` keeps every non-empty parameter except `page` and `take`,
/// in arrival order. A repeated key keeps its first position and its
/// last value. `order__createdAt` is always present (default `ASC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationRequest {
    page: Option<u32>,
    take: u32,
    params: Vec<(String, String)>,
}

impl PaginationRequest {
    /// Parse raw query pairs with the default limits.
    pub fn from_pairs<I, K, V>(pairs: I) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self::parse(pairs, RequestLimits::default())
    }

    /// Parse raw query pairs.
    ///
    /// Empty values are treated as absent. `take` above `limits.max_take`
    /// is clamped.
    pub fn parse<I, K, V>(pairs: I, limits: RequestLimits) -> QueryResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut page = None;
        let mut take = None;
        let mut params: Vec<(String, String)> = Vec::new();

        for (key, value) in pairs {
            let key = key.into();
            let value = value.into();
            if value.is_empty() {
                continue;
            }

            match key.as_str() {
                PAGE_PARAM => page = Some(positive(PAGE_PARAM, &value)?),
                TAKE_PARAM => take = Some(positive(TAKE_PARAM, &value)?),
                _ => match params.iter_mut().find(|(k, _)| *k == key) {
                    Some(slot) => slot.1 = value,
                    None => params.push((key, value)),
                },
            }
        }

        let created_at_key = created_at_order_key();
        if !params.iter().any(|(k, _)| *k == created_at_key) {
            params.push((created_at_key, OrderDirection::Asc.to_string()));
        }

        Ok(Self {
            page,
            take: take
                .unwrap_or(limits.default_take)
                .min(limits.max_take)
                .max(1),
            params,
        })
    }

    /// Page number, if page mode was requested.
    pub fn page(&self) -> Option<u32> {
        self.page
    }

    /// Effective page size.
    pub fn take(&self) -> u32 {
        self.take
    }

    /// Offset of the requested page, if page mode was requested.
    pub fn offset(&self) -> Option<u64> {
        self.page
            .filter(|p| *p >= 1)
            .map(|p| u64::from(self.take) * u64::from(p - 1))
    }

    /// Filter, sort and other parameters in arrival order.
    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Value of a parameter, if present.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Direction of the `createdAt` sort, which decides which id bound a
    /// continuation carries.
    pub fn created_at_direction(&self) -> OrderDirection {
        self.get(&created_at_order_key())
            .and_then(OrderDirection::parse)
            .unwrap_or_default()
    }
}

fn created_at_order_key() -> String {
    format!("{ORDER_PREFIX}{SEPARATOR}{CREATED_AT_FIELD}")
}

fn positive(name: &str, value: &str) -> QueryResult<u32> {
    value
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n >= 1)
        .ok_or_else(|| QueryError::InvalidParameter {
            name: name.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PaginationRequest::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(req.page(), None);
        assert_eq!(req.take(), DEFAULT_TAKE);
        assert_eq!(req.offset(), None);
        assert_eq!(req.get("order__createdAt"), Some("ASC"));
    }

    #[test]
    fn test_page_offset() {
        let req = PaginationRequest::from_pairs([("page", "3"), ("take", "10")]).unwrap();
        assert_eq!(req.page(), Some(3));
        assert_eq!(req.offset(), Some(20));
    }

    // Test critique: page/take invalides sont rejetés, pas ignorés
    #[test]
    fn test_rejects_non_positive_page_and_take() {
        for (k, v) in [("page", "0"), ("page", "-1"), ("take", "0"), ("take", "abc")] {
            assert!(matches!(
                PaginationRequest::from_pairs([(k, v)]),
                Err(QueryError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_take_is_clamped() {
        let limits = RequestLimits {
            default_take: 5,
            max_take: 50,
        };
        let req = PaginationRequest::parse([("take", "500")], limits).unwrap();
        assert_eq!(req.take(), 50);
        let req = PaginationRequest::parse(Vec::<(&str, &str)>::new(), limits).unwrap();
        assert_eq!(req.take(), 5);
    }

    #[test]
    fn test_repeated_keys_keep_position_and_last_value() {
        let req = PaginationRequest::from_pairs([
            ("where__id__more_than", "1"),
            ("order__createdAt", "DESC"),
            ("where__id__more_than", "4"),
            ("where__title", ""),
        ])
        .unwrap();
        let params: Vec<_> = req.params().collect();
        assert_eq!(
            params,
            vec![("where__id__more_than", "4"), ("order__createdAt", "DESC")]
        );
        assert_eq!(req.created_at_direction(), OrderDirection::Desc);
    }
}
