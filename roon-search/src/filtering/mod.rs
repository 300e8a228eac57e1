//! # Dynamic Filtering
//!
//! Each stage of the search pipeline lives in its own module:
//!
//! - [`transform`]: boolean coercion and client-facing renames
//! - [`date_search`]: `<field>_date_start` / `<field>_date_end` bounds
//! - [`field_search`]: one case-insensitive predicate per parameter value
//! - [`operator`]: `AND` / `OR` / `NOT` / `IN` / `ADVANCED` expression trees
//! - [`sort`] and [`pagination`]: `order_by`, `page` and `per_page`
//!
//! Stages produce [`Predicate`]s and add them to a [`QueryScope`], which
//! compiles them into a Sea-ORM `Condition` as they arrive.
//!
//! ## Query Parameter Examples
//!
//! ```text
//! # title starts with "How", context contains "setup"
//! GET /api/v1/questions/search?title=^How&context=$setup
//!
//! # questions without context, created in 2024
//! GET /api/v1/questions/search?context=NULL&created_at_date_start=2024-01-01&created_at_date_end=2025-01-01
//!
//! # nested field, through a rename
//! GET /api/v1/questions/search?answers__description=$restart&topic=^billing
//!
//! # either title
//! GET /api/v1/questions/search?operator=OR&title=^How&title=^Why
//!
//! # set membership
//! GET /api/v1/answers/search?operator=IN&question_id=<uuid>,<uuid>
//! ```

pub mod date_search;
pub mod field_search;
pub mod operator;
pub mod pagination;
pub mod predicate;
pub mod scope;
pub mod sort;
pub mod transform;

pub use operator::{Expression, SearchOperator};
pub use pagination::{Pagination, PaginationInfo};
pub use predicate::{Lookup, Predicate};
pub use scope::QueryScope;
pub use sort::OrderBy;
pub use transform::{ParamTransformer, classify_boolean, coerce_booleans};
