use serde::Deserialize;

/// Knobs for the search pipeline.
///
/// Usually loaded as the `search` table of the application config; every
/// field has a default so an empty table is valid.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Keys that steer the pipeline and are never treated as field searches.
    pub search_filters: Vec<String>,
    pub default_per_page: u64,
    /// Ordering applied when the request has no `order_by`. A leading `-`
    /// sorts descending.
    pub default_order_by: String,
    /// Flag that lifts the active-only restriction.
    pub include_inactive_param: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            search_filters: ["page", "per_page", "order_by", "operator", "include_inactive", "format"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_per_page: 100,
            default_order_by: "-created_at".to_string(),
            include_inactive_param: "include_inactive".to_string(),
        }
    }
}

impl SearchConfig {
    #[must_use]
    pub fn is_search_filter(&self, key: &str) -> bool {
        self.search_filters.iter().any(|f| f == key)
    }
}
