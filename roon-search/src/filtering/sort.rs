use sea_orm::{
    EntityTrait, QueryOrder, Select,
    sea_query::{Alias, Expr, Func, JoinType, Order, Query, SimpleExpr, SubQueryStatement},
};

use super::predicate::column;
use crate::{
    errors::SearchError,
    schema::{ResolvedPath, SchemaRegistry},
};

pub const ORDER_BY_PARAM: &str = "order_by";

/// Ordering on a field path, written `field` or `-field` by clients.
///
/// Root fields sort on the column itself. A nested path sorts on the
/// smallest related value when ascending and the largest when descending,
/// so to-many relations never repeat a root row. Rows with no related value
/// sort as NULL.
#[derive(Debug, Clone)]
pub struct OrderBy {
    pub field: String,
    pub direction: Order,
    key: SimpleExpr,
}

/// A leading `-` sorts descending.
fn parse_order(value: &str) -> (&str, Order) {
    value
        .strip_prefix('-')
        .map_or((value, Order::Asc), |field| (field, Order::Desc))
}

impl OrderBy {
    /// # Errors
    ///
    /// `InvalidOrdering` for paths that do not resolve from `root`.
    pub fn parse(value: &str, registry: &SchemaRegistry, root: &str) -> Result<Self, SearchError> {
        let (field, direction) = parse_order(value.trim());
        if field.is_empty() {
            return Err(SearchError::InvalidOrdering(value.to_string()));
        }
        let resolved = registry
            .resolve_path(root, field)
            .map_err(|_| SearchError::InvalidOrdering(value.to_string()))?;

        let key = if resolved.is_nested() {
            related_value(root, &resolved, &direction)
        } else {
            column(&resolved.table, &resolved.column).into()
        };

        Ok(Self {
            field: field.to_string(),
            direction,
            key,
        })
    }

    pub fn apply<E: EntityTrait>(&self, select: Select<E>) -> Select<E> {
        select.order_by(self.key.clone(), self.direction.clone())
    }
}

/// `(SELECT MIN(..) FROM .. WHERE <correlated to root>)` across every hop.
///
/// Tables inside the subquery are aliased per hop so a path that returns to
/// the root table still correlates with the outer row.
fn related_value(root: &str, resolved: &ResolvedPath, direction: &Order) -> SimpleExpr {
    let mut sources: Vec<(String, Alias, SimpleExpr)> = Vec::new();
    let mut owner = Alias::new(root);

    for (depth, hop) in resolved.hops.iter().enumerate() {
        let edge = &hop.edge;
        let target = Alias::new(format!("order_{depth}"));

        let owner_key = match &edge.junction {
            None => (owner.clone(), Alias::new(&edge.local_column)),
            Some(junction) => {
                let link = Alias::new(format!("order_{depth}_link"));
                sources.push((
                    junction.table.clone(),
                    link.clone(),
                    Expr::col((link.clone(), Alias::new(&junction.owner_column)))
                        .equals((owner.clone(), Alias::new(&edge.local_column))),
                ));
                (link, Alias::new(&junction.target_column))
            }
        };
        sources.push((
            edge.target.clone(),
            target.clone(),
            Expr::col((target.clone(), Alias::new(&edge.remote_column))).equals(owner_key),
        ));
        owner = target;
    }

    let value = Expr::col((owner, Alias::new(&resolved.column)));
    let mut query = Query::select();
    query.expr(match direction {
        Order::Desc => Func::max(value),
        _ => Func::min(value),
    });

    let mut sources = sources.into_iter();
    if let Some((table, alias, correlation)) = sources.next() {
        query.from_as(Alias::new(table), alias).and_where(correlation);
    }
    for (table, alias, on) in sources {
        query.join_as(JoinType::InnerJoin, Alias::new(table), alias, on);
    }

    SimpleExpr::SubQuery(
        None,
        Box::new(SubQueryStatement::SelectStatement(query.to_owned())),
    )
}
