//! The search pipeline.
//!
//! [`SearchEngine::prepare`] runs the synchronous stages and produces a
//! [`PreparedSearch`]; [`PreparedSearch::fetch`] runs it against a database.

use std::sync::Arc;

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QuerySelect};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::{
    config::SearchConfig,
    errors::{ApiError, SearchError},
    filtering::{
        OrderBy, Pagination, PaginationInfo, ParamTransformer, QueryScope, SearchOperator,
        coerce_booleans, date_search, field_search, operator, sort::ORDER_BY_PARAM,
    },
    params::ParameterSet,
    schema::{SchemaRegistry, Searchable},
};

/// Shared search engine: the schema registry plus configuration.
#[derive(Debug, Clone)]
pub struct SearchEngine {
    registry: Arc<SchemaRegistry>,
    config: SearchConfig,
}

/// A search ready to run: filters, ordering, and the requested page.
#[derive(Debug, Clone)]
pub struct PreparedSearch {
    pub scope: QueryScope,
    pub order: OrderBy,
    pub pagination: Pagination,
}

/// One page of results.
#[derive(Debug, Clone)]
pub struct SearchPage<M> {
    pub pagination_info: PaginationInfo,
    pub items: Vec<M>,
}

impl<M: Serialize> SearchPage<M> {
    /// `{"pagination_info": {...}, "<resources>": [...]}`
    ///
    /// # Errors
    ///
    /// Returns the serializer error if an item cannot be serialized.
    pub fn into_body(self, resources: &str) -> Result<Value, serde_json::Error> {
        let mut body = Map::new();
        body.insert(
            "pagination_info".to_string(),
            serde_json::to_value(self.pagination_info)?,
        );
        body.insert(resources.to_string(), serde_json::to_value(self.items)?);
        Ok(Value::Object(body))
    }
}

impl SearchEngine {
    #[must_use]
    pub fn new(registry: SchemaRegistry, config: SearchConfig) -> Self {
        Self {
            registry: Arc::new(registry),
            config,
        }
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    #[must_use]
    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Turn client parameters into a runnable search over `root`.
    ///
    /// Stages, in order: renames and boolean coercion, date bounds, then the
    /// operator search when an `operator` key is present or the generic field
    /// search otherwise, the active-only restriction (lifted by
    /// `include_inactive`), ordering, and pagination.
    ///
    /// # Errors
    ///
    /// Any [`SearchError`] raised by a stage. `UnknownEntity` when `root` is
    /// not registered.
    pub fn prepare(&self, root: &str, params: &ParameterSet) -> Result<PreparedSearch, SearchError> {
        let config = &self.config;

        let transformer = ParamTransformer::new(&self.registry, root)?;
        let params = transformer.process(params)?;
        let params = coerce_booleans(&params, &[&config.include_inactive_param])?;
        let include_inactive = params
            .get_str(&config.include_inactive_param)
            .is_some_and(|flag| flag == "1");

        let scope = QueryScope::new(Arc::clone(&self.registry), root)?;
        let (scope, params) = date_search::resolve(scope, &params, transformer.renames())?;

        let scope = match SearchOperator::from_params(&params) {
            Some(requested) => {
                let requested = requested?;
                tracing::debug!(root, operator = %requested, "Using operator search");
                operator::apply(scope, requested, &params, &config.search_filters)?
            }
            None => {
                tracing::debug!(root, "Using generic field search");
                field_search::apply(scope, &params, &config.search_filters)?
            }
        };

        let scope = if include_inactive {
            scope.include_inactive()
        } else {
            scope.active_only()
        };

        let order_by = params
            .get_str(ORDER_BY_PARAM)
            .map_or_else(|| config.default_order_by.clone(), |value| value.into_owned());
        let order = OrderBy::parse(&order_by, &self.registry, root)?;
        let pagination = Pagination::from_params(&params, config.default_per_page)?;

        Ok(PreparedSearch {
            scope,
            order,
            pagination,
        })
    }

    /// Prepare and run a search over `E`.
    ///
    /// # Errors
    ///
    /// Search errors map to `400`, database errors to `500`.
    pub async fn execute<E, C>(
        &self,
        db: &C,
        params: &ParameterSet,
    ) -> Result<SearchPage<E::Model>, ApiError>
    where
        E: Searchable,
        E::Model: Sync,
        C: ConnectionTrait,
    {
        let prepared = self.prepare(E::default().table_name(), params)?;
        Ok(prepared.fetch::<E, C>(db).await?)
    }
}

impl PreparedSearch {
    /// Count every match, then load the requested page.
    ///
    /// # Errors
    ///
    /// Propagates database errors.
    pub async fn fetch<E, C>(&self, db: &C) -> Result<SearchPage<E::Model>, DbErr>
    where
        E: EntityTrait,
        E::Model: Sync,
        C: ConnectionTrait,
    {
        let select = self.scope.apply(E::find());
        let total_count = select.clone().count(db).await?;

        let items = match self.pagination.offset() {
            Some(offset) if offset < total_count => {
                self.order
                    .apply(select)
                    .offset(offset)
                    .limit(self.pagination.limit())
                    .all(db)
                    .await?
            }
            _ => Vec::new(),
        };

        let page_count = u64::try_from(items.len()).unwrap_or(u64::MAX);
        Ok(SearchPage {
            pagination_info: self.pagination.info(page_count, total_count),
            items,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        filtering::{Lookup, Predicate},
        schema::fixtures,
    };
    use sea_orm::sea_query::Order;

    fn engine() -> SearchEngine {
        SearchEngine::new(fixtures::registry(), SearchConfig::default())
    }

    fn prepare(query: &str) -> Result<PreparedSearch, SearchError> {
        engine().prepare("questions", &ParameterSet::from_query_str(query))
    }

    #[test]
    fn test_generic_path_with_defaults() {
        let prepared = prepare("title=^How&is_active=yes").unwrap();
        assert!(prepared.scope.is_active_only());
        assert_eq!(prepared.order.field, "created_at");
        assert_eq!(prepared.pagination, Pagination { page: 1, per_page: 100 });
        assert_eq!(
            prepared.scope.predicates(),
            &[Predicate::And(vec![
                Predicate::field("title", Lookup::IStartsWith("How".into())),
                Predicate::field("is_active", Lookup::IStartsWith("1".into())),
            ])]
        );
    }

    #[test]
    fn test_search_filters_are_not_fields() {
        let prepared = prepare("page=2&per_page=5&order_by=title&format=json").unwrap();
        assert!(prepared.scope.predicates().is_empty());
        assert_eq!(prepared.order.field, "title");
        assert_eq!(prepared.pagination.offset(), Some(5));
    }

    #[test]
    fn test_include_inactive_lifts_restriction() {
        let prepared = prepare("include_inactive=true").unwrap();
        assert!(!prepared.scope.is_active_only());
        assert!(prepared.scope.predicates().is_empty());

        let prepared = prepare("operator=AND&title=^a&include_inactive=yes").unwrap();
        assert!(!prepared.scope.is_active_only());

        assert!(matches!(
            prepare("include_inactive=perhaps"),
            Err(SearchError::InvalidBooleanValue { .. })
        ));
    }

    #[test]
    fn test_rename_then_date_then_operator() {
        let prepared = prepare(
            "operator=OR&topic=^rust&title=^Why&created_at_date_start=2020-01-01",
        )
        .unwrap();
        let predicates = prepared.scope.predicates();
        assert_eq!(predicates.len(), 2);
        assert!(matches!(&predicates[0], Predicate::Field { path, .. } if path == "created_at"));
        assert_eq!(
            predicates[1],
            Predicate::Or(vec![
                Predicate::field("topics__title", Lookup::IStartsWith("rust".into())),
                Predicate::field("title", Lookup::IStartsWith("Why".into())),
            ])
        );
    }

    #[test]
    fn test_ordering_errors() {
        assert!(matches!(
            prepare("order_by=-answers__colour"),
            Err(SearchError::InvalidOrdering(_))
        ));
    }

    #[test]
    fn test_renamed_ordering_resolves_through_relations() {
        let prepared = prepare("order_by=-topic").unwrap();
        assert_eq!(prepared.order.field, "topics__title");
        assert!(matches!(prepared.order.direction, Order::Desc));
    }

    #[test]
    fn test_unknown_operator() {
        assert!(matches!(
            prepare("operator=XOR&title=x"),
            Err(SearchError::SearchWithOperator { .. })
        ));
    }

    #[test]
    fn test_unknown_root() {
        let err = engine()
            .prepare("users", &ParameterSet::new())
            .unwrap_err();
        assert!(matches!(err, SearchError::UnknownEntity(_)));
    }

    #[test]
    fn test_body_shape() {
        let page = SearchPage {
            pagination_info: Pagination { page: 1, per_page: 10 }.info(1, 1),
            items: vec![serde_json::json!({"title": "How"})],
        };
        let body = page.into_body("questions").unwrap();
        assert_eq!(body["pagination_info"]["total_count"], 1);
        assert_eq!(body["questions"][0]["title"], "How");
        let keys: Vec<_> = body.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["pagination_info", "questions"]);
    }
}
