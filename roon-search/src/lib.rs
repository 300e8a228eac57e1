//! # roon-search
//!
//! Turns untyped, client-supplied search parameters (query strings or JSON
//! bodies) into composed Sea-ORM queries across a graph of related entities.
//!
//! ## Pipeline
//!
//! ```text
//! params ─► ParamTransformer ─► date_search ─┬─► field_search ─┐
//!                                            └─► operator ─────┴─► active-only ─► order ─► page
//! ```
//!
//! The operator compiler is chosen when the parameters carry an `operator`
//! key; otherwise every remaining key becomes a field search.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use roon_search::{SchemaRegistry, SearchConfig, SearchEngine, ParameterSet};
//!
//! let registry = SchemaRegistry::builder()
//!     .register::<question::Entity>()
//!     .register::<answer::Entity>()
//!     .build()?;
//! let engine = SearchEngine::new(registry, SearchConfig::default());
//!
//! let params = ParameterSet::from_query_str("title=^Why&is_active=yes");
//! let page = engine.execute::<question::Entity, _>(&db, &params).await?;
//! ```

pub mod config;
pub mod errors;
pub mod filtering;
pub mod graph;
pub mod params;
pub mod schema;
pub mod search;

pub use config::SearchConfig;
pub use errors::{ApiError, SearchError};
pub use filtering::{
    Lookup, OrderBy, Pagination, PaginationInfo, Predicate, QueryScope, SearchOperator,
};
pub use graph::Discovery;
pub use params::ParameterSet;
pub use schema::{
    EntityDescriptor, FieldDescriptor, FieldKind, RelationshipEdge, RenameTable, SchemaRegistry,
    Searchable,
};
pub use search::{PreparedSearch, SearchEngine, SearchPage};
