//! Operator registry: maps operator tokens to predicate constructors.

use std::collections::HashMap;
use std::fmt;

use crate::error::{QueryError, QueryResult};
use crate::models::{FieldDef, FieldKind, FieldValue};

/// Store-level comparison of one field against one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Comparison {
    Equal,
    MoreThan,
    LessThan,
    /// Case-insensitive `LIKE`; the value carries the `%` wildcards.
    ILike,
}

impl Comparison {
    pub fn sql_operator(self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::MoreThan => ">",
            Self::LessThan => "<",
            Self::ILike => "ILIKE",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_operator())
    }
}

/// A typed condition on one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub field: &'static FieldDef,
    pub comparison: Comparison,
    pub value: FieldValue,
}

impl Predicate {
    pub fn new(field: &'static FieldDef, comparison: Comparison, value: FieldValue) -> Self {
        Self {
            field,
            comparison,
            value,
        }
    }

    /// Exact match, the meaning of a two-segment `where__field` key.
    pub fn equal(field: &'static FieldDef, value: FieldValue) -> Self {
        Self::new(field, Comparison::Equal, value)
    }
}

/// A registered operator.
#[derive(Clone, Copy)]
pub struct Operator {
    pub comparison: Comparison,
    /// Field kinds this operator may be applied to.
    pub accepts: fn(FieldKind) -> bool,
    /// Rewrites the raw value before it is coerced.
    pub prepare: fn(&str) -> String,
}

impl Operator {
    /// Build a predicate for `field` from a raw query value.
    pub fn construct(
        &self,
        key: &str,
        field: &'static FieldDef,
        token: &str,
        raw: &str,
    ) -> QueryResult<Predicate> {
        if !(self.accepts)(field.kind) {
            return Err(QueryError::OperatorNotApplicable {
                field: field.name.to_string(),
                operator: token.to_string(),
            });
        }
        let value = coerce(key, field, &(self.prepare)(raw))?;
        Ok(Predicate::new(field, self.comparison, value))
    }
}

impl fmt::Debug for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Operator")
            .field("comparison", &self.comparison)
            .finish_non_exhaustive()
    }
}

/// Token for `field > value`.
pub const MORE_THAN: &str = "more_than";
/// Token for `field < value`.
pub const LESS_THAN: &str = "less_than";
/// Token for case-insensitive substring match.
pub const I_LIKE: &str = "i_like";

/// Registry of operator tokens.
///
/// Immutable once built; share it behind an `Arc` across requests.
#[derive(Debug, Clone)]
pub struct OperatorRegistry {
    operators: HashMap<&'static str, Operator>,
}

impl OperatorRegistry {
    /// An empty registry. Only exact matches will be accepted.
    pub fn empty() -> Self {
        Self {
            operators: HashMap::new(),
        }
    }

    /// The standard operator set: `more_than`, `less_than`, `i_like`.
    pub fn standard() -> Self {
        let mut registry = Self::empty();
        registry.register(
            MORE_THAN,
            Operator {
                comparison: Comparison::MoreThan,
                accepts: FieldKind::is_ordered,
                prepare: str::to_string,
            },
        );
        registry.register(
            LESS_THAN,
            Operator {
                comparison: Comparison::LessThan,
                accepts: FieldKind::is_ordered,
                prepare: str::to_string,
            },
        );
        registry.register(
            I_LIKE,
            Operator {
                comparison: Comparison::ILike,
                accepts: |kind| kind == FieldKind::Text,
                prepare: |raw| format!("%{}%", raw),
            },
        );
        registry
    }

    /// Register (or replace) an operator token.
    pub fn register(&mut self, token: &'static str, operator: Operator) {
        self.operators.insert(token, operator);
    }

    /// Get the operator for a token.
    pub fn get(&self, token: &str) -> Option<&Operator> {
        self.operators.get(token)
    }

    /// List all registered tokens, sorted.
    pub fn tokens(&self) -> Vec<&'static str> {
        let mut tokens: Vec<_> = self.operators.keys().copied().collect();
        tokens.sort_unstable();
        tokens
    }

    /// Resolve an optional operator token against a field and build the predicate.
    ///
    /// `None` means exact equality on the coerced value.
    pub fn predicate(
        &self,
        key: &str,
        field: &'static FieldDef,
        token: Option<&str>,
        raw: &str,
    ) -> QueryResult<Predicate> {
        let Some(token) = token else {
            return Ok(Predicate::equal(field, coerce(key, field, raw)?));
        };

        let operator = self.get(token).ok_or_else(|| QueryError::UnknownOperator {
            field: field.name.to_string(),
            operator: token.to_string(),
        })?;

        operator.construct(key, field, token, raw)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

fn coerce(key: &str, field: &FieldDef, raw: &str) -> QueryResult<FieldValue> {
    FieldValue::parse(field.kind, raw).map_err(|reason| QueryError::InvalidValue {
        key: key.to_string(),
        value: raw.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Post, Resource};

    fn field(name: &str) -> &'static FieldDef {
        Post::field(name).unwrap()
    }

    #[test]
    fn test_standard_tokens() {
        assert_eq!(
            OperatorRegistry::standard().tokens(),
            vec![I_LIKE, LESS_THAN, MORE_THAN]
        );
    }

    #[test]
    fn test_equality_coerces_to_field_type() {
        let registry = OperatorRegistry::standard();
        let p = registry.predicate("where__id", field("id"), None, "3").unwrap();
        assert_eq!(p.comparison, Comparison::Equal);
        assert_eq!(p.value, FieldValue::Integer(3));

        let err = registry.predicate("where__id", field("id"), None, "three").unwrap_err();
        assert!(matches!(err, QueryError::InvalidValue { .. }));
    }

    // Test critique: i_like entoure la valeur de % avant la construction
    #[test]
    fn test_i_like_wraps_value() {
        let registry = OperatorRegistry::standard();
        let p = registry
            .predicate("where__title__i_like", field("title"), Some(I_LIKE), "foo")
            .unwrap();
        assert_eq!(p.comparison, Comparison::ILike);
        assert_eq!(p.value, FieldValue::Text("%foo%".into()));
    }

    #[test]
    fn test_unknown_operator_reports_field_and_token() {
        let err = OperatorRegistry::standard()
            .predicate("where__id__between", field("id"), Some("between"), "1")
            .unwrap_err();
        assert_eq!(
            err,
            QueryError::UnknownOperator {
                field: "id".into(),
                operator: "between".into()
            }
        );
    }

    #[test]
    fn test_operator_kind_mismatch() {
        let registry = OperatorRegistry::standard();
        assert!(matches!(
            registry.predicate("where__title__more_than", field("title"), Some(MORE_THAN), "a"),
            Err(QueryError::OperatorNotApplicable { .. })
        ));
        assert!(matches!(
            registry.predicate("where__likeCount__i_like", field("likeCount"), Some(I_LIKE), "1"),
            Err(QueryError::OperatorNotApplicable { .. })
        ));
    }

    #[test]
    fn test_empty_registry_only_accepts_equality() {
        let registry = OperatorRegistry::empty();
        assert!(registry.predicate("where__id", field("id"), None, "1").is_ok());
        assert!(registry
            .predicate("where__id__more_than", field("id"), Some(MORE_THAN), "1")
            .is_err());
    }
}
