//! SQL rendering of query specs.
//!
//! SAFETY: the dynamic SQL built here is safe from injection because:
//! 1. Table and column names come from the resource's static field table,
//!    never from user input (unknown fields are rejected while parsing)
//! 2. Operators come from the `Comparison` enum
//! 3. Sort directions come from the `OrderDirection` enum
//! 4. All values, including LIMIT and OFFSET, are bound parameters

use sqlx::{Postgres, QueryBuilder};

use sift_core::models::{FieldValue, Resource};
use sift_core::query::{Filter, QuerySpec};

/// Column carrying the unwindowed match count in [`select_counted`].
pub const TOTAL_COLUMN: &str = "total";

/// `SELECT <columns> FROM <table> WHERE ... ORDER BY ... LIMIT ... [OFFSET ...]`
pub fn select<R: Resource>(spec: &QuerySpec) -> QueryBuilder<'static, Postgres> {
    render::<R>(spec, None)
}

/// Like [`select`], with `COUNT(*) OVER()` as an extra column.
///
/// The window function runs before LIMIT/OFFSET, so every returned row
/// carries the total for the whole filter in one round trip.
pub fn select_counted<R: Resource>(spec: &QuerySpec) -> QueryBuilder<'static, Postgres> {
    render::<R>(spec, Some(TOTAL_COLUMN))
}

fn render<R: Resource>(spec: &QuerySpec, total: Option<&str>) -> QueryBuilder<'static, Postgres> {
    let mut columns: Vec<String> = R::FIELDS.iter().map(|f| f.column.to_string()).collect();
    if let Some(alias) = total {
        columns.push(format!("COUNT(*) OVER() AS {}", alias));
    }
    let mut builder = QueryBuilder::new(format!("SELECT {} FROM {}", columns.join(", "), R::TABLE));

    push_where(&mut builder, spec.filter());

    let mut separated = false;
    for order in spec.order() {
        builder.push(if separated { ", " } else { " ORDER BY " });
        builder.push(order.field.column).push(" ").push(order.direction.as_str());
        separated = true;
    }

    builder.push(" LIMIT ").push_bind(i64::from(spec.limit()));
    if let Some(offset) = spec.offset() {
        builder
            .push(" OFFSET ")
            .push_bind(i64::try_from(offset).unwrap_or(i64::MAX));
    }

    builder
}

/// `SELECT COUNT(*) FROM <table> WHERE ...`
pub fn count<R: Resource>(filter: &Filter) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(format!("SELECT COUNT(*) FROM {}", R::TABLE));
    push_where(&mut builder, filter);
    builder
}

fn push_where(builder: &mut QueryBuilder<'static, Postgres>, filter: &Filter) {
    for (i, predicate) in filter.iter().enumerate() {
        builder.push(if i == 0 { " WHERE " } else { " AND " });
        builder
            .push(predicate.field.column)
            .push(" ")
            .push(predicate.comparison.sql_operator())
            .push(" ");
        push_value(builder, &predicate.value);
    }
}

fn push_value(builder: &mut QueryBuilder<'static, Postgres>, value: &FieldValue) {
    match value {
        FieldValue::Integer(v) => builder.push_bind(*v),
        FieldValue::Text(v) => builder.push_bind(v.clone()),
        FieldValue::Timestamp(v) => builder.push_bind(*v),
        FieldValue::Boolean(v) => builder.push_bind(*v),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use sift_core::models::{Comment, Post};
    use sift_core::query::{OperatorRegistry, Overrides, PaginationRequest};

    fn spec<R: Resource>(pairs: &[(&str, &str)], overrides: &Overrides) -> QuerySpec {
        let request = PaginationRequest::from_pairs(pairs.iter().copied()).unwrap();
        QuerySpec::build::<R>(&request, overrides, &OperatorRegistry::standard()).unwrap()
    }

    #[test]
    fn test_select_renders_bound_predicates() {
        let spec = spec::<Post>(
            &[
                ("take", "10"),
                ("where__title__i_like", "rust"),
                ("where__id__more_than", "4"),
            ],
            &Overrides::new(),
        );
        let builder = select::<Post>(&spec);
        assert_eq!(
            builder.sql(),
            "SELECT id, created_at, updated_at, author_id, title, content, like_count, comment_count \
             FROM posts WHERE id > $1 AND title ILIKE $2 \
             ORDER BY created_at ASC, id ASC LIMIT $3"
        );
    }

    #[test]
    fn test_select_with_offset_and_override() {
        let overrides = Overrides::new().equal("postId", FieldValue::Integer(7));
        let spec = spec::<Comment>(
            &[("page", "2"), ("take", "5"), ("order__createdAt", "DESC")],
            &overrides,
        );
        let sql = select::<Comment>(&spec).sql().to_string();
        assert!(sql.contains("FROM comments WHERE post_id = $1"));
        assert!(sql.ends_with("ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3"));
    }

    // Test critique: le total et la fenêtre sortent de la même requête
    #[test]
    fn test_select_counted_adds_window_count() {
        let spec = spec::<Post>(
            &[("page", "2"), ("take", "2"), ("where__authorId", "3")],
            &Overrides::new(),
        );
        assert_eq!(
            select_counted::<Post>(&spec).sql(),
            "SELECT id, created_at, updated_at, author_id, title, content, like_count, comment_count, \
             COUNT(*) OVER() AS total \
             FROM posts WHERE author_id = $1 \
             ORDER BY created_at ASC, id ASC LIMIT $2 OFFSET $3"
        );
    }

    // Test critique: le COUNT ignore la fenêtre mais garde les filtres
    #[test]
    fn test_count_ignores_window() {
        let spec = spec::<Post>(
            &[("page", "3"), ("where__likeCount__more_than", "1")],
            &Overrides::new(),
        );
        assert_eq!(
            count::<Post>(spec.filter()).sql(),
            "SELECT COUNT(*) FROM posts WHERE like_count > $1"
        );
    }
}
