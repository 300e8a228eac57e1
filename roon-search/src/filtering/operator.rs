//! # Boolean Expression Search
//!
//! Selected with the `operator` parameter (`AND`, `OR`, `NOT`, `IN` or
//! `ADVANCED`, any case). The remaining parameters form an expression tree:
//!
//! ```json
//! {
//!   "operator": "AND",
//!   "_AND": [
//!     {"title": "^How"},
//!     {"_OR": [{"context": "$setup"}, {"context": "$install"}]}
//!   ]
//! }
//! ```
//!
//! A node is a list of nodes or an object. Object keys `_AND`, `_OR` and
//! `_NOT` open a sub-expression over their value; any other key is a field
//! term compiled with the generic field-search rules (a list value yields one
//! term per element).
//!
//! - `_AND` folds its children with AND
//! - `_OR` folds with OR
//! - `_NOT` folds with OR and negates the result
//!
//! Every operator needs at least one child.
//!
//! `ADVANCED` takes exactly one of `_AND` / `_OR` / `_NOT` at the top level,
//! whose elements may be JSON-encoded strings, which lets a query string
//! carry a whole tree. Other top-level keys are ignored.

use std::{fmt, str::FromStr};

use serde_json::{Map, Value};

use super::{
    field_search::lookup_for,
    predicate::{Lookup, Predicate},
    scope::QueryScope,
};
use crate::{
    errors::SearchError,
    params::{ParameterSet, value_text},
};

/// Parameter that selects an operator search.
pub const OPERATOR_PARAM: &str = "operator";

const AND_KEY: &str = "_AND";
const OR_KEY: &str = "_OR";
const NOT_KEY: &str = "_NOT";
const ALLOWED_OPERATIONS: [&str; 3] = [OR_KEY, AND_KEY, NOT_KEY];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOperator {
    And,
    Or,
    Not,
    In,
    Advanced,
}

impl FromStr for SearchOperator {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "AND" => Ok(Self::And),
            "OR" => Ok(Self::Or),
            "NOT" => Ok(Self::Not),
            "IN" => Ok(Self::In),
            "ADVANCED" => Ok(Self::Advanced),
            _ => Err(SearchError::operator(format!(
                "Unknown search operator '{s}'. Choose one of AND, OR, NOT, IN, ADVANCED"
            ))),
        }
    }
}

impl fmt::Display for SearchOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Not => "NOT",
            Self::In => "IN",
            Self::Advanced => "ADVANCED",
        };
        f.write_str(name)
    }
}

impl SearchOperator {
    /// Operator requested by `params`, if any.
    ///
    /// # Errors
    ///
    /// `SearchWithOperator` when the value is not a known operator.
    pub fn from_params(params: &ParameterSet) -> Option<Result<Self, SearchError>> {
        let value = params.get(OPERATOR_PARAM)?;
        Some(match value_text(value) {
            Some(text) => text.parse(),
            None => Err(SearchError::operator(format!(
                "Unknown search operator {value}. Choose one of AND, OR, NOT, IN, ADVANCED"
            ))),
        })
    }
}

/// Parsed expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Vec<Expression>),
    Term { field: String, value: Value },
}

impl Expression {
    fn operation(key: &str, children: Vec<Self>) -> Option<Self> {
        match key {
            AND_KEY => Some(Self::And(children)),
            OR_KEY => Some(Self::Or(children)),
            NOT_KEY => Some(Self::Not(children)),
            _ => None,
        }
    }

    /// Children of a node: a list is flattened, an object yields one entry
    /// per key.
    ///
    /// # Errors
    ///
    /// `SearchWithOperator` for scalars in node position.
    pub fn parse_children(node: &Value) -> Result<Vec<Self>, SearchError> {
        match node {
            Value::Array(items) => {
                let mut children = Vec::new();
                for item in items {
                    children.extend(Self::parse_children(item)?);
                }
                Ok(children)
            }
            Value::Object(map) => Self::parse_object(map),
            other => Err(SearchError::operator(format!(
                "Invalid search expression: expected an object or a list, got {other}"
            ))),
        }
    }

    fn parse_object(map: &Map<String, Value>) -> Result<Vec<Self>, SearchError> {
        let mut children = Vec::new();
        for (key, value) in map {
            if ALLOWED_OPERATIONS.contains(&key.as_str()) {
                let nested = Self::parse_children(value)?;
                children.extend(Self::operation(key, nested));
            } else {
                children.extend(Self::terms(key, value));
            }
        }
        Ok(children)
    }

    fn terms(field: &str, value: &Value) -> Vec<Self> {
        match value {
            Value::Array(items) => items.iter().flat_map(|item| Self::terms(field, item)).collect(),
            other => vec![Self::Term {
                field: field.to_string(),
                value: other.clone(),
            }],
        }
    }

    /// # Errors
    ///
    /// `SearchWithOperator` for an operator without children, plus any
    /// field-search error raised by a term.
    pub fn to_predicate(&self) -> Result<Predicate, SearchError> {
        let fold = |key: &str, children: &[Self]| -> Result<Vec<Predicate>, SearchError> {
            if children.is_empty() {
                return Err(SearchError::operator(format!(
                    "{key} needs at least one search term"
                )));
            }
            children.iter().map(Self::to_predicate).collect()
        };

        let predicate = match self {
            Self::And(children) => Predicate::all(fold(AND_KEY, children)?),
            Self::Or(children) => Predicate::any(fold(OR_KEY, children)?),
            Self::Not(children) => Predicate::any(fold(NOT_KEY, children)?).map(|p| !p),
            Self::Term { field, value } => Some(Predicate::field(field, lookup_for(field, value)?)),
        };
        predicate.ok_or_else(|| SearchError::operator("Empty search expression"))
    }
}

/// Top-level view of the remaining parameters: every key with all its values.
fn params_as_node(params: &ParameterSet) -> Value {
    Value::Object(
        params
            .iter()
            .map(|(key, values)| (key.to_string(), Value::Array(values.to_vec())))
            .collect(),
    )
}

fn in_predicate(params: &ParameterSet) -> Result<Option<Predicate>, SearchError> {
    let Some((field, values)) = params.iter().next() else {
        return Ok(None);
    };

    let mut members = Vec::new();
    for value in values {
        let text = value_text(value).ok_or_else(|| {
            SearchError::invalid_parameter(field, "IN search values must be strings or numbers")
        })?;
        members.push(text.into_owned());
    }
    if let [single] = members.as_slice() {
        if single.contains(',') {
            members = single.split(',').map(|m| m.trim().to_string()).collect();
        }
    }

    Ok(Some(Predicate::field(field, Lookup::In(members))))
}

fn advanced_expression(params: &ParameterSet) -> Result<Expression, SearchError> {
    let operations: Vec<&str> = params
        .keys()
        .filter(|key| ALLOWED_OPERATIONS.contains(key))
        .collect();

    let operation = match operations.as_slice() {
        [single] => *single,
        [] => {
            return Err(SearchError::operator(format!(
                "Invalid usage of Advanced search. You have not sent an operation. \
                 Choose one \"outer\" operation Ex: {ALLOWED_OPERATIONS:?}"
            )));
        }
        many => {
            return Err(SearchError::operator(format!(
                "Invalid usage of Advanced search. You have sent: {many:?}. \
                 Choose only one \"outer\" operation"
            )));
        }
    };

    let decoded = params
        .get_all(operation)
        .iter()
        .map(|element| match element {
            Value::String(text) => serde_json::from_str::<Value>(text).map_err(|err| {
                SearchError::operator(format!(
                    "Invalid usage of Advanced search. Could not decode {text}: {err}"
                ))
            }),
            other => Ok(other.clone()),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let children = Expression::parse_children(&Value::Array(decoded))?;
    Expression::operation(operation, children)
        .ok_or_else(|| SearchError::operator("Unknown outer operation"))
}

fn compile(
    operator: SearchOperator,
    params: &ParameterSet,
) -> Result<Option<Predicate>, SearchError> {
    let expression = match operator {
        SearchOperator::In => return in_predicate(params),
        SearchOperator::Advanced => advanced_expression(params)?,
        SearchOperator::And => {
            Expression::And(Expression::parse_children(&params_as_node(params))?)
        }
        SearchOperator::Or => Expression::Or(Expression::parse_children(&params_as_node(params))?),
        SearchOperator::Not => {
            Expression::Not(Expression::parse_children(&params_as_node(params))?)
        }
    };
    expression.to_predicate().map(Some)
}

/// Narrow `scope` with an operator search over `params` and restrict it to
/// active records.
///
/// Keys in `search_filters` are dropped first. When nothing is left the
/// scope is returned as it was. Every error is reported as
/// `SearchWithOperator`, with the underlying error as its source.
///
/// # Errors
///
/// `SearchWithOperator` for malformed trees, bad `ADVANCED` usage, and any
/// error raised while compiling terms.
pub fn apply<S: AsRef<str>>(
    scope: QueryScope,
    operator: SearchOperator,
    params: &ParameterSet,
    search_filters: &[S],
) -> Result<QueryScope, SearchError> {
    let remaining = params.without(search_filters);
    if remaining.is_empty() {
        return Ok(scope);
    }

    tracing::debug!(%operator, keys = remaining.len(), "Compiling operator search");
    let predicate = compile(operator, &remaining).map_err(SearchError::into_operator_error)?;
    let scope = match predicate {
        Some(predicate) => scope
            .filter(predicate)
            .map_err(SearchError::into_operator_error)?,
        None => scope,
    };
    Ok(scope.active_only())
}
