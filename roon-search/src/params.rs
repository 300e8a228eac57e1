//! Ordered multimap of inbound search parameters.

use std::borrow::Cow;

use serde_json::Value;

use crate::errors::SearchError;

/// Search parameters as sent by the client.
///
/// Keys keep their arrival order and may carry several values
/// (`?tag=a&tag=b`, or a JSON array). Values from a query string are always
/// JSON strings; values from a JSON body keep their JSON type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    entries: Vec<(String, Vec<Value>)>,
}

impl ParameterSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse an `application/x-www-form-urlencoded` query string.
    #[must_use]
    pub fn from_query_str(query: &str) -> Self {
        let mut params = Self::new();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            params.push(key.into_owned(), Value::String(value.into_owned()));
        }
        params
    }

    /// Build from a JSON object. Top-level arrays become multiple values.
    ///
    /// # Errors
    ///
    /// Returns `InvalidParameter` when the body is not a JSON object.
    pub fn from_json(body: Value) -> Result<Self, SearchError> {
        let Value::Object(map) = body else {
            return Err(SearchError::invalid_parameter(
                "body",
                "search parameters must be a JSON object",
            ));
        };

        let mut params = Self::new();
        for (key, value) in map {
            match value {
                Value::Array(items) => params.set_list(key, items),
                other => params.push(key, other),
            }
        }
        Ok(params)
    }

    /// Append a value to `key`, creating the key if needed.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, values)) => values.push(value),
            None => self.entries.push((key, vec![value])),
        }
    }

    /// Replace every value of `key`. A new key is appended at the end.
    pub fn set_list(&mut self, key: impl Into<String>, values: Vec<Value>) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = values,
            None => self.entries.push((key, values)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Vec<Value>> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Last value sent for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.get_all(key).last()
    }

    /// Last value for `key` in text form (see [`value_text`]).
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<Cow<'_, str>> {
        self.get(key).and_then(value_text)
    }

    #[must_use]
    pub fn get_all(&self, key: &str) -> &[Value] {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(&[], |(_, values)| values.as_slice())
    }

    /// Case-insensitive key lookup, returning the key as stored.
    #[must_use]
    pub fn find_key_ignore_case(&self, key: &str) -> Option<&str> {
        self.keys().find(|k| k.eq_ignore_ascii_case(key))
    }

    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Copy with every key in `excluded` dropped.
    #[must_use]
    pub fn without<S: AsRef<str>>(&self, excluded: &[S]) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .filter(|(k, _)| !excluded.iter().any(|e| e.as_ref() == k))
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (key, value) in iter {
            params.push(key, value);
        }
        params
    }
}

/// Text form of a scalar value: strings as-is, numbers and booleans printed.
/// `null`, arrays and objects have no text form.
#[must_use]
pub fn value_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s)),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_string_keeps_order_and_repeats() {
        let params = ParameterSet::from_query_str("title=%5EWhy&tag=a&page=2&tag=b");
        let keys: Vec<_> = params.keys().collect();
        assert_eq!(keys, vec!["title", "tag", "page"]);
        assert_eq!(params.get_all("tag"), &[json!("a"), json!("b")]);
        assert_eq!(params.get_str("title").as_deref(), Some("^Why"));
    }

    #[test]
    fn test_json_arrays_become_multiple_values() {
        let params = ParameterSet::from_json(json!({
            "operator": "AND",
            "title": ["Why", "How"],
            "page": 1
        }))
        .unwrap();
        assert_eq!(params.get_all("title").len(), 2);
        assert_eq!(params.get_str("page").as_deref(), Some("1"));
    }

    #[test]
    fn test_json_body_must_be_object() {
        assert!(ParameterSet::from_json(json!(["title"])).is_err());
    }

    #[test]
    fn test_get_returns_last_value() {
        let params: ParameterSet = [("page", "1"), ("page", "3")].into_iter().collect();
        assert_eq!(params.get_str("page").as_deref(), Some("3"));
    }

    #[test]
    fn test_without_and_remove() {
        let mut params: ParameterSet =
            [("page", "1"), ("title", "x"), ("operator", "OR")].into_iter().collect();
        let filtered = params.without(&["page", "operator"]);
        assert_eq!(filtered.keys().collect::<Vec<_>>(), vec!["title"]);

        assert_eq!(params.remove("title"), Some(vec![json!("x")]));
        assert!(!params.contains_key("title"));
        assert_eq!(params.remove("title"), None);
    }

    #[test]
    fn test_find_key_ignore_case() {
        let params: ParameterSet = [("Operator", "or")].into_iter().collect();
        assert_eq!(params.find_key_ignore_case("operator"), Some("Operator"));
    }
}
