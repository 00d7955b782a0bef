//! Filter key grammar.
//!
//! Query keys follow a small `__`-separated grammar:
//!
//! ```text
//! where__<field>              exact match
//! where__<field>__<operator>  operator match (more_than, less_than, i_like)
//! order__<field>              sort direction, value ASC or DESC
//! ```
//!
//! Any other key (`page`, `take`, unrelated parameters) is ignored.

use std::fmt;

use serde::Serialize;

use crate::error::{QueryError, QueryResult};

/// Prefix of filter keys.
pub const WHERE_PREFIX: &str = "where";
/// Prefix of sort keys.
pub const ORDER_PREFIX: &str = "order";
/// Segment separator.
pub const SEPARATOR: &str = "__";

/// Ordering direction for sorted queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl OrderDirection {
    /// Parse the query-string form. Only `ASC` and `DESC` are accepted.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ASC" => Some(Self::Asc),
            "DESC" => Some(Self::Desc),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One classified query key, borrowed from the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterInstruction<'a> {
    /// `where__field` or `where__field__operator`.
    Where {
        field: &'a str,
        operator: Option<&'a str>,
        value: &'a str,
    },
    /// `order__field`.
    Order {
        field: &'a str,
        direction: OrderDirection,
    },
    /// Not part of the filter grammar.
    Ignored,
}

/// Classify a single key/value pair.
pub fn parse<'a>(key: &'a str, value: &'a str) -> QueryResult<FilterInstruction<'a>> {
    let Some((prefix, _)) = key.split_once(SEPARATOR) else {
        return Ok(FilterInstruction::Ignored);
    };

    match prefix {
        WHERE_PREFIX => parse_where(key, value),
        ORDER_PREFIX => parse_order(key, value),
        _ => Ok(FilterInstruction::Ignored),
    }
}

fn parse_where<'a>(key: &'a str, value: &'a str) -> QueryResult<FilterInstruction<'a>> {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();

    let (field, operator) = match segments.as_slice() {
        [_, field] => (*field, None),
        [_, field, operator] if !operator.is_empty() => (*field, Some(*operator)),
        _ => return Err(malformed(key)),
    };

    if field.is_empty() {
        return Err(malformed(key));
    }

    Ok(FilterInstruction::Where {
        field,
        operator,
        value,
    })
}

fn parse_order<'a>(key: &'a str, value: &'a str) -> QueryResult<FilterInstruction<'a>> {
    let segments: Vec<&str> = key.split(SEPARATOR).collect();

    let [_, field] = segments.as_slice() else {
        return Err(malformed(key));
    };

    if field.is_empty() {
        return Err(malformed(key));
    }

    let direction = OrderDirection::parse(value).ok_or_else(|| QueryError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: "expected ASC or DESC".to_string(),
    })?;

    Ok(FilterInstruction::Order { field, direction })
}

fn malformed(key: &str) -> QueryError {
    QueryError::MalformedFilterKey {
        key: key.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_recovers_field_and_operator() {
        for (key, field, op) in [
            ("where__id", "id", None),
            ("where__id__more_than", "id", Some("more_than")),
            ("where__likeCount__less_than", "likeCount", Some("less_than")),
            ("where__title__i_like", "title", Some("i_like")),
        ] {
            assert_eq!(
                parse(key, "1").unwrap(),
                FilterInstruction::Where {
                    field,
                    operator: op,
                    value: "1"
                }
            );
        }
    }

    // Test critique: toute autre longueur de segments est rejetée avec la clé fautive
    #[test]
    fn test_where_rejects_bad_segment_counts() {
        for key in ["where__a__b__c", "where__", "where____more_than", "where__id__"] {
            let err = parse(key, "1").unwrap_err();
            assert_eq!(err, QueryError::MalformedFilterKey { key: key.into() });
        }
    }

    #[test]
    fn test_order_with_operator_is_malformed() {
        assert!(matches!(
            parse("order__createdAt__more_than", "ASC"),
            Err(QueryError::MalformedFilterKey { .. })
        ));
    }

    #[test]
    fn test_order_direction_is_strict() {
        assert_eq!(
            parse("order__createdAt", "DESC").unwrap(),
            FilterInstruction::Order {
                field: "createdAt",
                direction: OrderDirection::Desc
            }
        );
        assert!(matches!(
            parse("order__createdAt", "asc"),
            Err(QueryError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_non_filter_keys_are_ignored() {
        for key in ["page", "take", "whereabouts", "ordering__x", "foo__bar"] {
            assert_eq!(parse(key, "1").unwrap(), FilterInstruction::Ignored);
        }
    }
}
