//! Generic field search: one predicate per parameter value, all ANDed.
//!
//! | Value            | Lookup                         |
//! |------------------|--------------------------------|
//! | `^How`           | starts with `How` (any case)   |
//! | `$setup`         | contains `setup` (any case)    |
//! | `NULL` / `none`  | is null                        |
//! | JSON `null`      | is null                        |
//! | anything else    | starts with the value          |

use serde_json::Value;

use super::{
    predicate::{Lookup, Predicate},
    scope::QueryScope,
};
use crate::{
    errors::SearchError,
    params::{ParameterSet, value_text},
};

const MAX_FIELD_VALUE_LENGTH: usize = 10_000;

/// Pick the lookup for one client value.
///
/// # Errors
///
/// `InvalidParameter` for arrays, objects, and values that are too long.
pub fn lookup_for(field: &str, value: &Value) -> Result<Lookup, SearchError> {
    if value.is_null() {
        return Ok(Lookup::IsNull(true));
    }
    let Some(text) = value_text(value) else {
        return Err(SearchError::invalid_parameter(
            field,
            "expected a string, number or boolean",
        ));
    };
    if text.len() > MAX_FIELD_VALUE_LENGTH {
        return Err(SearchError::invalid_parameter(field, "value is too long"));
    }

    Ok(if let Some(rest) = text.strip_prefix('^') {
        Lookup::IStartsWith(rest.to_string())
    } else if let Some(rest) = text.strip_prefix('$') {
        Lookup::IContains(rest.to_string())
    } else if text.eq_ignore_ascii_case("null") || text.eq_ignore_ascii_case("none") {
        Lookup::IsNull(true)
    } else {
        Lookup::IStartsWith(text.into_owned())
    })
}

/// Predicates for every value of every key not in `excluded`.
///
/// # Errors
///
/// Any error from [`lookup_for`].
pub fn compile<S: AsRef<str>>(
    params: &ParameterSet,
    excluded: &[S],
) -> Result<Vec<Predicate>, SearchError> {
    let mut predicates = Vec::new();
    for (key, values) in params.iter() {
        if excluded.iter().any(|e| e.as_ref() == key) {
            continue;
        }
        for value in values {
            predicates.push(Predicate::field(key, lookup_for(key, value)?));
        }
    }
    Ok(predicates)
}

/// Narrow `scope` by the generic search over `params`. Without any
/// predicates the scope is returned as it was.
///
/// # Errors
///
/// Any error from compiling or validating the predicates.
pub fn apply<S: AsRef<str>>(
    scope: QueryScope,
    params: &ParameterSet,
    excluded: &[S],
) -> Result<QueryScope, SearchError> {
    match Predicate::all(compile(params, excluded)?) {
        Some(predicate) => scope.filter(predicate),
        None => Ok(scope),
    }
}
