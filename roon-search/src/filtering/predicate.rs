//! Predicate trees and their compilation to Sea-ORM conditions.
//!
//! A [`Predicate`] names fields by path (`answers__tags__title`) and is only
//! turned into SQL against a [`SchemaRegistry`], which resolves the path and
//! tells the compiler what kind of column sits at the end of it.
//!
//! Nested paths compile to `IN (SELECT ...)` subqueries, one per relationship
//! hop, so to-many relations never duplicate root rows:
//!
//! ```sql
//! "questions"."question_id" IN (
//!     SELECT "answers"."question_id" FROM "answers"
//!     WHERE UPPER("answers"."description") LIKE 'FOO%' ESCAPE '\'
//! )
//! ```
//!
//! Every compiled condition is two-valued. Comparisons only hold on non-null
//! columns, so negating one keeps the rows where the column is NULL. A nested
//! `IS NULL` also matches owners with no related row at all.

use std::ops::{BitAnd, BitOr, Not};

use chrono::NaiveDateTime;
use sea_orm::{
    Condition,
    prelude::Uuid,
    sea_query::{Alias, Expr, Func, LikeExpr, Query, SelectStatement, SimpleExpr},
};

use super::transform::classify_boolean;
use crate::{
    errors::SearchError,
    schema::{FieldKind, RelationshipEdge, ResolvedPath, SchemaRegistry},
};

/// How a single field is compared.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// Case-insensitive starts-with.
    IStartsWith(String),
    /// Case-insensitive contains.
    IContains(String),
    /// `true` for `IS NULL`, `false` for `IS NOT NULL`.
    IsNull(bool),
    /// Inclusive on both ends.
    Range(NaiveDateTime, NaiveDateTime),
    Gte(NaiveDateTime),
    Lte(NaiveDateTime),
    In(Vec<String>),
}

/// A boolean filter over field paths.
///
/// `&`, `|` and `!` compose predicates. Nodes of the same kind are flattened,
/// so `(a & b) & c` and `a & (b & c)` build the same tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Field { path: String, lookup: Lookup },
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn field(path: impl Into<String>, lookup: Lookup) -> Self {
        Self::Field {
            path: path.into(),
            lookup,
        }
    }

    /// Fold with AND. `None` when there is nothing to fold.
    pub fn all(predicates: impl IntoIterator<Item = Self>) -> Option<Self> {
        predicates.into_iter().reduce(BitAnd::bitand)
    }

    /// Fold with OR. `None` when there is nothing to fold.
    pub fn any(predicates: impl IntoIterator<Item = Self>) -> Option<Self> {
        predicates.into_iter().reduce(BitOr::bitor)
    }

    /// Compile against the schema of `root`.
    ///
    /// # Errors
    ///
    /// `UnknownField` for paths that do not resolve, `InvalidBooleanValue`
    /// for boolean fields compared with an unrecognised token, and
    /// `InvalidParameter` for values the column kind cannot hold.
    pub fn compile(&self, registry: &SchemaRegistry, root: &str) -> Result<Condition, SearchError> {
        match self {
            Self::Field { path, lookup } => {
                let resolved = registry.resolve_path(root, path)?;
                compile_field(path, &resolved, lookup)
            }
            Self::And(children) => children
                .iter()
                .try_fold(Condition::all(), |cond, child| {
                    Ok(cond.add(child.compile(registry, root)?))
                }),
            Self::Or(children) => children
                .iter()
                .try_fold(Condition::any(), |cond, child| {
                    Ok(cond.add(child.compile(registry, root)?))
                }),
            Self::Not(inner) => Ok(Condition::all()
                .add(inner.compile(registry, root)?)
                .not()),
        }
    }
}

impl BitAnd for Predicate {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::And(mut left), Self::And(right)) => {
                left.extend(right);
                Self::And(left)
            }
            (Self::And(mut left), right) => {
                left.push(right);
                Self::And(left)
            }
            (left, Self::And(mut right)) => {
                right.insert(0, left);
                Self::And(right)
            }
            (left, right) => Self::And(vec![left, right]),
        }
    }
}

impl BitOr for Predicate {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        match (self, rhs) {
            (Self::Or(mut left), Self::Or(right)) => {
                left.extend(right);
                Self::Or(left)
            }
            (Self::Or(mut left), right) => {
                left.push(right);
                Self::Or(left)
            }
            (left, Self::Or(mut right)) => {
                right.insert(0, left);
                Self::Or(right)
            }
            (left, right) => Self::Or(vec![left, right]),
        }
    }
}

impl Not for Predicate {
    type Output = Self;

    fn not(self) -> Self {
        match self {
            Self::Not(inner) => *inner,
            other => Self::Not(Box::new(other)),
        }
    }
}

pub(crate) fn column(table: &str, name: &str) -> Expr {
    Expr::col((Alias::new(table), Alias::new(name)))
}

/// Escape LIKE wildcards so client values match literally.
fn escape_like_wildcards(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

fn compile_field(
    path: &str,
    resolved: &ResolvedPath,
    lookup: &Lookup,
) -> Result<Condition, SearchError> {
    let mut condition = Condition::all().add(leaf(path, resolved, lookup)?);
    if !matches!(lookup, Lookup::IsNull(_)) {
        condition = condition.add(column(&resolved.table, &resolved.column).is_not_null());
    }
    let missing_matches = matches!(lookup, Lookup::IsNull(true));

    // innermost hop first, each one wraps the previous condition
    for hop in resolved.hops.iter().rev() {
        let edge = &hop.edge;
        let local = || column(&hop.owner, &edge.local_column);

        let related = Condition::all()
            .add(local().is_not_null())
            .add(local().in_subquery(related_keys(edge, Some(condition))));

        condition = if missing_matches {
            let mut any = Condition::any().add(local().is_null());
            if !edge.is_foreign_key() {
                any = any.add(local().not_in_subquery(related_keys(edge, None)));
            }
            any.add(related)
        } else {
            related
        };
    }

    Ok(condition)
}

/// Owner-side keys of the rows across `edge`, optionally narrowed to the
/// target rows matching `condition`.
fn related_keys(edge: &RelationshipEdge, condition: Option<Condition>) -> SelectStatement {
    let mut target_rows = Query::select();
    target_rows
        .column((Alias::new(&edge.target), Alias::new(&edge.remote_column)))
        .from(Alias::new(&edge.target))
        .and_where(column(&edge.target, &edge.remote_column).is_not_null());
    if let Some(condition) = condition {
        target_rows.cond_where(condition);
    }
    let target_rows = target_rows.to_owned();

    match &edge.junction {
        None => target_rows,
        Some(junction) => Query::select()
            .column((Alias::new(&junction.table), Alias::new(&junction.owner_column)))
            .from(Alias::new(&junction.table))
            .and_where(column(&junction.table, &junction.target_column).in_subquery(target_rows))
            .and_where(column(&junction.table, &junction.owner_column).is_not_null())
            .to_owned(),
    }
}

fn leaf(path: &str, resolved: &ResolvedPath, lookup: &Lookup) -> Result<SimpleExpr, SearchError> {
    let col = || column(&resolved.table, &resolved.column);

    if let Lookup::IsNull(is_null) = lookup {
        return Ok(if *is_null {
            col().is_null()
        } else {
            col().is_not_null()
        });
    }

    match resolved.kind {
        FieldKind::Boolean => boolean_leaf(path, col(), lookup),
        FieldKind::DateTime | FieldKind::Date => {
            temporal_leaf(path, resolved.kind, col(), lookup)
        }
        FieldKind::Text => Ok(match lookup {
            Lookup::In(values) => col().is_in(values.iter().map(String::as_str)),
            _ => pattern_leaf(path, col().into(), lookup)?,
        }),
        FieldKind::Uuid => uuid_leaf(path, col(), lookup),
        FieldKind::Integer => match lookup {
            Lookup::In(values) => Ok(col().is_in(
                values
                    .iter()
                    .map(|v| parse_number::<i64>(path, v))
                    .collect::<Result<Vec<_>, _>>()?,
            )),
            _ => pattern_leaf(path, as_text(col()), lookup),
        },
        FieldKind::Float | FieldKind::Other => pattern_leaf(path, as_text(col()), lookup),
    }
}

fn as_text(col: Expr) -> SimpleExpr {
    col.cast_as(Alias::new("TEXT"))
}

/// Case-insensitive LIKE for `IStartsWith` / `IContains`, membership on the
/// text form for `In`.
fn pattern_leaf(path: &str, target: SimpleExpr, lookup: &Lookup) -> Result<SimpleExpr, SearchError> {
    let pattern = match lookup {
        Lookup::IStartsWith(value) => {
            format!("{}%", escape_like_wildcards(value).to_uppercase())
        }
        Lookup::IContains(value) => {
            format!("%{}%", escape_like_wildcards(value).to_uppercase())
        }
        Lookup::In(values) => {
            return Ok(Expr::expr(target).is_in(values.iter().map(String::as_str)));
        }
        Lookup::IsNull(_) | Lookup::Range(..) | Lookup::Gte(_) | Lookup::Lte(_) => {
            return Err(SearchError::invalid_parameter(
                path,
                "date comparisons need a date or datetime field",
            ));
        }
    };

    Ok(Expr::expr(Func::upper(target)).like(LikeExpr::new(pattern).escape('\\')))
}

fn boolean_leaf(path: &str, col: Expr, lookup: &Lookup) -> Result<SimpleExpr, SearchError> {
    let parse = |value: &str| {
        classify_boolean(value).ok_or_else(|| SearchError::InvalidBooleanValue {
            field: path.to_string(),
            value: value.to_string(),
        })
    };

    match lookup {
        Lookup::IStartsWith(value) | Lookup::IContains(value) => Ok(col.eq(parse(value)?)),
        Lookup::In(values) => Ok(col.is_in(
            values
                .iter()
                .map(|v| parse(v))
                .collect::<Result<Vec<_>, _>>()?,
        )),
        _ => Err(SearchError::invalid_parameter(
            path,
            "date comparisons need a date or datetime field",
        )),
    }
}

fn temporal_leaf(
    path: &str,
    kind: FieldKind,
    col: Expr,
    lookup: &Lookup,
) -> Result<SimpleExpr, SearchError> {
    let date_only = kind == FieldKind::Date;
    let bound = |value: &NaiveDateTime| -> SimpleExpr {
        if date_only {
            value.date().into()
        } else {
            (*value).into()
        }
    };

    match lookup {
        Lookup::Range(start, end) => Ok(col.between(bound(start), bound(end))),
        Lookup::Gte(start) => Ok(col.gte(bound(start))),
        Lookup::Lte(end) => Ok(col.lte(bound(end))),
        _ => pattern_leaf(path, as_text(col), lookup),
    }
}

fn uuid_leaf(path: &str, col: Expr, lookup: &Lookup) -> Result<SimpleExpr, SearchError> {
    match lookup {
        Lookup::IStartsWith(value) => match Uuid::parse_str(value) {
            Ok(id) => Ok(col.eq(id)),
            Err(_) => pattern_leaf(path, as_text(col), lookup),
        },
        Lookup::In(values) => {
            let ids = values
                .iter()
                .map(|v| {
                    Uuid::parse_str(v).map_err(|_| {
                        SearchError::invalid_parameter(path, format!("'{v}' is not a valid UUID"))
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(col.is_in(ids))
        }
        _ => pattern_leaf(path, as_text(col), lookup),
    }
}

fn parse_number<T: std::str::FromStr>(path: &str, value: &str) -> Result<T, SearchError> {
    value
        .trim()
        .parse()
        .map_err(|_| SearchError::invalid_parameter(path, format!("'{value}' is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::fixtures;
    use chrono::NaiveDate;
    use sea_orm::sea_query::{Asterisk, SqliteQueryBuilder};

    fn sql(registry: &SchemaRegistry, root: &str, predicate: &Predicate) -> String {
        let condition = predicate.compile(registry, root).unwrap();
        Query::select()
            .column(Asterisk)
            .from(Alias::new(root))
            .cond_where(condition)
            .to_string(SqliteQueryBuilder)
    }

    fn title(value: &str) -> Predicate {
        Predicate::field("title", Lookup::IStartsWith(value.into()))
    }

    #[test]
    fn test_composition_flattens() {
        let a = title("a");
        let b = title("b");
        let c = title("c");

        let left = (a.clone() & b.clone()) & c.clone();
        let right = a.clone() & (b.clone() & c.clone());
        assert_eq!(left, right);
        assert_eq!(left, Predicate::And(vec![a.clone(), b.clone(), c.clone()]));

        let any = Predicate::any([a.clone(), b.clone(), c.clone()]).unwrap();
        assert_eq!(any, Predicate::Or(vec![a.clone(), b, c]));

        assert_eq!(!!a.clone(), a);
        assert!(Predicate::all(Vec::new()).is_none());
    }

    #[test]
    fn test_istartswith_is_case_insensitive_and_escaped() {
        let registry = fixtures::registry();
        let rendered = sql(&registry, "questions", &title("how_10%"));
        assert!(rendered.contains(r#"UPPER("questions"."title") LIKE"#), "{rendered}");
        assert!(rendered.contains("'HOW"), "{rendered}");
        assert!(rendered.contains(r"\_10"), "{rendered}");
        assert!(rendered.contains(r"\%"), "{rendered}");
        assert!(rendered.contains("ESCAPE"), "{rendered}");
    }

    #[test]
    fn test_icontains_wraps_pattern() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("context", Lookup::IContains("setup".into()));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(rendered.contains("'%SETUP%'"), "{rendered}");
    }

    #[test]
    fn test_boolean_field_compares_by_equality() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("is_active", Lookup::IStartsWith("0".into()));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(rendered.contains(r#""questions"."is_active" = "#), "{rendered}");
        assert!(!rendered.contains("LIKE"), "{rendered}");

        let bad = Predicate::field("is_active", Lookup::IContains("maybe".into()));
        assert!(matches!(
            bad.compile(&registry, "questions"),
            Err(SearchError::InvalidBooleanValue { .. })
        ));
    }

    #[test]
    fn test_non_text_fields_cast_for_patterns() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("created_at", Lookup::IStartsWith("2024".into()));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(rendered.contains("CAST("), "{rendered}");
    }

    #[test]
    fn test_is_null() {
        let registry = fixtures::registry();
        let rendered = sql(
            &registry,
            "questions",
            &Predicate::field("context", Lookup::IsNull(true)),
        );
        assert!(rendered.contains(r#""questions"."context" IS NULL"#), "{rendered}");
    }

    #[test]
    fn test_range_on_datetime() {
        let registry = fixtures::registry();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let rendered = sql(
            &registry,
            "questions",
            &Predicate::field("created_at", Lookup::Range(start, end)),
        );
        assert!(rendered.contains("BETWEEN"), "{rendered}");
        assert!(rendered.contains("2020-01-01"), "{rendered}");
    }

    #[test]
    fn test_range_on_text_is_rejected() {
        let registry = fixtures::registry();
        let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let predicate = Predicate::field("title", Lookup::Gte(start));
        assert!(matches!(
            predicate.compile(&registry, "questions"),
            Err(SearchError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_nested_path_uses_subquery() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("answers__description", Lookup::IStartsWith("foo".into()));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(
            rendered.contains(r#""questions"."question_id" IN (SELECT "answers"."question_id" FROM "answers""#),
            "{rendered}"
        );
        assert!(rendered.contains(r#"UPPER("answers"."description")"#), "{rendered}");
    }

    #[test]
    fn test_junction_adds_a_level() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("topics__title", Lookup::IStartsWith("rust".into()));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(rendered.contains(r#"FROM "questions_topics""#), "{rendered}");
        assert!(rendered.contains(r#"FROM "question_topics""#), "{rendered}");
    }

    #[test]
    fn test_not_negates() {
        let registry = fixtures::registry();
        let rendered = sql(&registry, "questions", &!title("Foo"));
        assert!(rendered.contains("NOT"), "{rendered}");
    }

    #[test]
    fn test_negated_comparison_keeps_null_rows() {
        let registry = fixtures::registry();
        let predicate = !Predicate::field("context", Lookup::IContains("setup".into()));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(rendered.contains("NOT ("), "{rendered}");
        assert!(rendered.contains(r#""questions"."context" IS NOT NULL"#), "{rendered}");
    }

    #[test]
    fn test_nested_is_null_on_foreign_key_matches_missing_key() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("canonical_answer__description", Lookup::IsNull(true));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(
            rendered.contains(r#""questions"."canonical_answer_id" IS NULL OR"#),
            "{rendered}"
        );
        assert!(rendered.contains(r#""answers"."description" IS NULL"#), "{rendered}");
        assert!(!rendered.contains("NOT IN"), "{rendered}");
    }

    #[test]
    fn test_nested_is_null_on_reverse_edge_matches_no_related_rows() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("answers__description", Lookup::IsNull(true));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(
            rendered.contains(r#""questions"."question_id" NOT IN (SELECT "answers"."question_id""#),
            "{rendered}"
        );

        // IS NOT NULL still needs a related row
        let predicate = Predicate::field("answers__description", Lookup::IsNull(false));
        let rendered = sql(&registry, "questions", &predicate);
        assert!(!rendered.contains("NOT IN"), "{rendered}");
    }

    #[test]
    fn test_in_on_uuid_requires_valid_ids() {
        let registry = fixtures::registry();
        let predicate = Predicate::field("question_id", Lookup::In(vec!["nope".into()]));
        assert!(matches!(
            predicate.compile(&registry, "questions"),
            Err(SearchError::InvalidParameter { .. })
        ));

        let ok = Predicate::field(
            "title",
            Lookup::In(vec!["a".into(), "b".into()]),
        );
        let rendered = sql(&registry, "questions", &ok);
        assert!(rendered.contains(r#""questions"."title" IN ('a', 'b')"#), "{rendered}");
    }

    #[test]
    fn test_unknown_field() {
        let registry = fixtures::registry();
        assert!(matches!(
            title("x").compile(&registry, "answers"),
            Err(SearchError::UnknownField { .. })
        ));
    }
}
