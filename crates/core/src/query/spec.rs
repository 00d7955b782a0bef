//! Structured query specification.
//!
//! A [`QuerySpec`] is the store-facing form of a list request: typed
//! predicates, sort order and window. It is produced by folding the
//! request's parsed instructions through a [`QuerySpecBuilder`] and is
//! immutable afterwards. Nothing here touches a store.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use crate::error::{QueryError, QueryResult};
use crate::models::{FieldDef, FieldValue, ID_FIELD, Resource};
use crate::query::key::{self, FilterInstruction, OrderDirection};
use crate::query::operator::{Comparison, OperatorRegistry, Predicate};
use crate::query::request::PaginationRequest;

// =============================================================================
// Filter
// =============================================================================

/// Predicates keyed by field and comparison.
///
/// A later predicate with the same field and comparison replaces the
/// earlier one. Distinct comparisons on one field intersect, so
/// `where__id__more_than` and `where__id__less_than` can coexist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    predicates: BTreeMap<(&'static str, Comparison), Predicate>,
}

impl Filter {
    pub fn insert(&mut self, predicate: Predicate) {
        self.predicates
            .insert((predicate.field.name, predicate.comparison), predicate);
    }

    /// Drop every predicate on a field.
    fn remove_field(&mut self, field: &str) {
        self.predicates.retain(|(name, _), _| *name != field);
    }

    pub fn get(&self, field: &str, comparison: Comparison) -> Option<&Predicate> {
        self.iter()
            .find(|p| p.field.name == field && p.comparison == comparison)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Predicate> {
        self.predicates.values()
    }

    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Whether a record's values satisfy every predicate.
    ///
    /// Used by stores that evaluate filters in process.
    pub fn matches<R: Resource>(&self, record: &R) -> bool {
        self.iter().all(|p| {
            record
                .value(p.field.name)
                .is_some_and(|value| evaluate(p, &value))
        })
    }
}

fn evaluate(predicate: &Predicate, value: &FieldValue) -> bool {
    match predicate.comparison {
        Comparison::Equal => value == &predicate.value,
        Comparison::MoreThan => value.compare(&predicate.value) == Some(Ordering::Greater),
        Comparison::LessThan => value.compare(&predicate.value) == Some(Ordering::Less),
        Comparison::ILike => match (value, &predicate.value) {
            (FieldValue::Text(text), FieldValue::Text(pattern)) => ilike(pattern, text),
            _ => false,
        },
    }
}

/// SQL `ILIKE` semantics: `%` matches any run, `_` matches one character.
pub fn ilike(pattern: &str, text: &str) -> bool {
    let pattern: Vec<char> = pattern.to_lowercase().chars().collect();
    let text: Vec<char> = text.to_lowercase().chars().collect();

    // Iterative wildcard match with backtracking to the last `%`.
    let (mut p, mut t) = (0, 0);
    let mut star: Option<(usize, usize)> = None;
    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            p += 1;
            t += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            star = Some((p, t));
            p += 1;
        } else if let Some((sp, st)) = star {
            p = sp + 1;
            t = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    pattern[p..].iter().all(|c| *c == '%')
}

// =============================================================================
// Ordering
// =============================================================================

/// One sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static FieldDef,
    pub direction: OrderDirection,
}

// =============================================================================
// Overrides
// =============================================================================

/// Fixed predicates injected by the caller (e.g. "comments of post 7").
///
/// Overrides are merged after user filters and replace any user predicate
/// on the same field. They are never echoed into continuation URLs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    conditions: Vec<(&'static str, Comparison, FieldValue)>,
}

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require `field = value`.
    pub fn equal(self, field: &'static str, value: FieldValue) -> Self {
        self.with(field, Comparison::Equal, value)
    }

    pub fn with(mut self, field: &'static str, comparison: Comparison, value: FieldValue) -> Self {
        self.conditions.push((field, comparison, value));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Whether `field` is fixed by an override.
    pub fn pins(&self, field: &str) -> bool {
        self.conditions.iter().any(|(name, _, _)| *name == field)
    }
}

// =============================================================================
// QuerySpec
// =============================================================================

/// Store-facing query: filter, order and window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    filter: Filter,
    order: Vec<OrderBy>,
    limit: u32,
    offset: Option<u64>,
}

impl QuerySpec {
    /// Build the spec for resource `R` from a request.
    pub fn build<R: Resource>(
        request: &PaginationRequest,
        overrides: &Overrides,
        registry: &OperatorRegistry,
    ) -> QueryResult<Self> {
        let builder = QuerySpecBuilder::<R>::new(registry, request.take(), request.offset());

        request
            .params()
            .map(|(k, v)| key::parse(k, v).map(|instruction| (k, instruction)))
            .try_fold(builder, |builder, parsed| {
                let (k, instruction) = parsed?;
                builder.apply(k, instruction)
            })?
            .with_overrides(overrides)
            .map(QuerySpecBuilder::finish)
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    pub fn order(&self) -> &[OrderBy] {
        &self.order
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn offset(&self) -> Option<u64> {
        self.offset
    }

    /// Compare two records by the sort keys.
    pub fn compare<R: Resource>(&self, a: &R, b: &R) -> Ordering {
        for order in &self.order {
            let ordering = match (a.value(order.field.name), b.value(order.field.name)) {
                (Some(x), Some(y)) => x.compare(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            let ordering = match order.direction {
                OrderDirection::Asc => ordering,
                OrderDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Filter, sort and window records held in process.
    pub fn apply<R: Resource>(&self, records: &[R]) -> Vec<R> {
        let mut matched: Vec<R> = records
            .iter()
            .filter(|r| self.filter.matches(*r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| self.compare(a, b));

        let skip = usize::try_from(self.offset.unwrap_or(0)).unwrap_or(usize::MAX);
        matched
            .into_iter()
            .skip(skip)
            .take(self.limit as usize)
            .collect()
    }
}

// =============================================================================
// Builder
// =============================================================================

/// Accumulates parsed instructions for resource `R`.
///
/// Consumed and returned by each step so a request folds into one spec
/// without shared mutable state.
pub struct QuerySpecBuilder<'r, R: Resource> {
    registry: &'r OperatorRegistry,
    filter: Filter,
    order: Vec<OrderBy>,
    limit: u32,
    offset: Option<u64>,
    _resource: std::marker::PhantomData<R>,
}

impl<'r, R: Resource> QuerySpecBuilder<'r, R> {
    pub fn new(registry: &'r OperatorRegistry, limit: u32, offset: Option<u64>) -> Self {
        Self {
            registry,
            filter: Filter::default(),
            order: Vec::new(),
            limit,
            offset,
            _resource: std::marker::PhantomData,
        }
    }

    /// Apply one instruction parsed from `key`.
    pub fn apply(mut self, key: &str, instruction: FilterInstruction<'_>) -> QueryResult<Self> {
        match instruction {
            FilterInstruction::Ignored => {}
            FilterInstruction::Where {
                field,
                operator,
                value,
            } => {
                let field = resolve::<R>(field)?;
                let predicate = self.registry.predicate(key, field, operator, value)?;
                self.filter.insert(predicate);
            }
            FilterInstruction::Order { field, direction } => {
                let field = resolve::<R>(field)?;
                match self.order.iter_mut().find(|o| o.field.name == field.name) {
                    Some(existing) => existing.direction = direction,
                    None => self.order.push(OrderBy { field, direction }),
                }
            }
        }
        Ok(self)
    }

    /// Merge caller predicates. They win over user predicates on the same field.
    pub fn with_overrides(mut self, overrides: &Overrides) -> QueryResult<Self> {
        for (name, _, _) in &overrides.conditions {
            self.filter.remove_field(name);
        }
        for (name, comparison, value) in &overrides.conditions {
            let field = resolve::<R>(name)?;
            self.filter
                .insert(Predicate::new(field, *comparison, value.clone()));
        }
        Ok(self)
    }

    /// Freeze into a [`QuerySpec`].
    ///
    /// `id` is appended as a final sort key when absent, in the direction of
    /// the first sort key, so equal sort values still come back in a
    /// deterministic order.
    pub fn finish(mut self) -> QuerySpec {
        if !self.order.iter().any(|o| o.field.name == ID_FIELD) {
            let direction = self.order.first().map(|o| o.direction).unwrap_or_default();
            if let Some(field) = R::field(ID_FIELD) {
                self.order.push(OrderBy { field, direction });
            }
        }

        QuerySpec {
            filter: self.filter,
            order: self.order,
            limit: self.limit,
            offset: self.offset,
        }
    }
}

fn resolve<R: Resource>(name: &str) -> QueryResult<&'static FieldDef> {
    R::field(name).ok_or_else(|| QueryError::UnknownField {
        field: name.to_string(),
    })
}
