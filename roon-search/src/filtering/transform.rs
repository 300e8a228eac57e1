//! Parameter transformer: boolean coercion and client-facing renames.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    errors::SearchError,
    params::{ParameterSet, value_text},
    schema::{PATH_SEPARATOR, RenameTable, SchemaRegistry},
};

const TRUE_TOKENS: [&str; 5] = ["true", "1", "t", "y", "yes"];
const FALSE_TOKENS: [&str; 5] = ["false", "0", "f", "n", "no"];

/// Classify a boolean token, ignoring case. `None` when unrecognised.
#[must_use]
pub fn classify_boolean(token: &str) -> Option<bool> {
    let token = token.to_lowercase();
    if TRUE_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSE_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

fn coerce_value(field: &str, value: &Value) -> Result<Value, SearchError> {
    let parsed = value_text(value).and_then(|text| classify_boolean(&text));
    match parsed {
        Some(flag) => Ok(Value::String(if flag { "1" } else { "0" }.to_string())),
        None => Err(SearchError::InvalidBooleanValue {
            field: field.to_string(),
            value: value_text(value).map_or_else(|| value.to_string(), |t| t.into_owned()),
        }),
    }
}

/// Rewrite every value of each named key to `"1"` / `"0"`.
///
/// # Errors
///
/// `InvalidBooleanValue` for the first value outside the token sets.
pub fn coerce_booleans<S: AsRef<str>>(
    params: &ParameterSet,
    names: &[S],
) -> Result<ParameterSet, SearchError> {
    let mut coerced = params.clone();
    for name in names {
        let name = name.as_ref();
        let values = params.get_all(name);
        if values.is_empty() {
            continue;
        }
        let values = values
            .iter()
            .map(|v| coerce_value(name, v))
            .collect::<Result<Vec<_>, _>>()?;
        coerced.set_list(name, values);
    }
    Ok(coerced)
}

/// Applies an entity's rename table and boolean coercion to inbound
/// parameters.
pub struct ParamTransformer {
    renames: Arc<RenameTable>,
    boolean_fields: Vec<String>,
}

impl ParamTransformer {
    /// # Errors
    ///
    /// `UnknownEntity` for an unregistered root, `UnresolvedRename` when the
    /// merged rename table does not resolve.
    pub fn new(registry: &SchemaRegistry, root: &str) -> Result<Self, SearchError> {
        let discovery = registry.discovery(root)?;
        let renames = registry.renames(root)?;

        let mut boolean_fields: Vec<String> = discovery
            .root()
            .descriptor
            .boolean_fields()
            .map(String::from)
            .collect();
        for nested in discovery.nested() {
            boolean_fields.extend(
                nested
                    .descriptor
                    .boolean_fields()
                    .map(|field| format!("{}{PATH_SEPARATOR}{field}", nested.prefix)),
            );
        }

        Ok(Self {
            renames,
            boolean_fields,
        })
    }

    #[must_use]
    pub fn renames(&self) -> &RenameTable {
        &self.renames
    }

    /// Whether `path` is the storage path of some rename.
    #[must_use]
    pub fn is_rename_target(&self, path: &str) -> bool {
        self.renames.iter().any(|(_, target)| target == path)
    }

    /// Return a transformed copy of `params`.
    ///
    /// Boolean fields (root and nested) are coerced first, then renamed keys
    /// move with all their values, then `order_by` gets the first rename key
    /// it contains replaced.
    ///
    /// # Errors
    ///
    /// `InvalidBooleanValue` when a boolean field carries an unknown token.
    pub fn process(&self, params: &ParameterSet) -> Result<ParameterSet, SearchError> {
        let coerced = coerce_booleans(params, &self.boolean_fields)?;

        let mut transformed = ParameterSet::new();
        for (key, values) in coerced.iter() {
            let target = self.renames.get(key).unwrap_or(key);
            if target != key {
                tracing::debug!(from = key, to = target, "Renaming search parameter");
            }
            for value in values {
                transformed.push(target, value.clone());
            }
        }

        let order_by = transformed.get_all("order_by");
        if !order_by.is_empty() {
            let rewritten = order_by.iter().map(|v| self.rewrite_order_by(v)).collect();
            transformed.set_list("order_by", rewritten);
        }

        Ok(transformed)
    }

    fn rewrite_order_by(&self, value: &Value) -> Value {
        let Some(text) = value_text(value) else {
            return value.clone();
        };
        for (key, target) in self.renames.iter() {
            if text.contains(key) {
                return Value::String(text.replace(key, target));
            }
        }
        value.clone()
    }
}
