//! `<field>_date_start` / `<field>_date_end` range searches.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::{
    predicate::{Lookup, Predicate},
    scope::QueryScope,
};
use crate::{errors::SearchError, params::ParameterSet, schema::RenameTable};

const START_MARKER: &str = "date_start";
const END_MARKER: &str = "date_end";

const BAD_FORMAT: &str = "For date search, please format datetime as follows: YYYY-MM-DDTH:M:S";
const BAD_ATTRIBUTE: &str = "For date search, a valid model attribute needs to be provided.";
const NOT_A_DATE: &str = "For date search, a valid datetime model attribute needs to be provided.";
const BAD_RANGE: &str =
    "For date range search, the date_end has to be greater than the date_start.";
const MIXED_FIELDS: &str =
    "For date range search, date_start and date_end have to refer to the same attribute.";

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse a timestamp, dropping any timezone offset.
///
/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM[:SS[.f]]` with `T` or a space, and a
/// bare `YYYY-MM-DD` (midnight).
#[must_use]
pub fn parse_naive_datetime(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.naive_local());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Field named by a date key: everything before the last two `_` segments.
fn field_of(key: &str) -> &str {
    key.rsplitn(3, '_').last().unwrap_or(key)
}

#[derive(Default)]
struct Bounds<'p> {
    field: Option<&'p str>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    matched: Vec<&'p str>,
}

impl<'p> Bounds<'p> {
    fn record(&mut self, key: &'p str, params: &ParameterSet) -> Result<(), SearchError> {
        let is_start = key.contains(START_MARKER);
        let field = field_of(key);
        self.matched.push(key);

        match self.field {
            Some(existing) if existing != field => return Err(SearchError::date(MIXED_FIELDS)),
            _ => self.field = Some(field),
        }

        let parsed = params
            .get_str(key)
            .and_then(|text| parse_naive_datetime(&text))
            .ok_or_else(|| SearchError::date(BAD_FORMAT))?;

        if is_start {
            self.start = Some(parsed);
        } else {
            self.end = Some(parsed);
        }
        Ok(())
    }
}

/// Apply any date bounds found in `params` to `scope`.
///
/// Returns the narrowed scope and the parameters without the date keys.
/// Renamed fields skip validation and use their storage path; any other
/// field must resolve, through relation prefixes if needed, to a date or
/// datetime column.
///
/// # Errors
///
/// `DateSearch` for malformed timestamps, unknown or non-date fields, bounds
/// on different fields, or a start that is not before the end.
pub fn resolve(
    scope: QueryScope,
    params: &ParameterSet,
    renames: &RenameTable,
) -> Result<(QueryScope, ParameterSet), SearchError> {
    let mut bounds = Bounds::default();
    for key in params.keys() {
        if key.contains(START_MARKER) || key.contains(END_MARKER) {
            bounds.record(key, params)?;
        }
    }

    let Some(field) = bounds.field else {
        return Ok((scope, params.clone()));
    };
    let remaining = params.without(&bounds.matched);

    let path = if let Some(target) = renames.get(field) {
        target.to_string()
    } else {
        let resolved = scope
            .registry()
            .resolve_path(scope.root().name(), field)
            .map_err(|err| match err {
                SearchError::UnknownField { .. } => SearchError::date(BAD_ATTRIBUTE),
                other => other,
            })?;
        if !resolved.kind.is_temporal() {
            return Err(SearchError::date(NOT_A_DATE));
        }
        field.to_string()
    };

    let lookup = match (bounds.start, bounds.end) {
        (Some(start), Some(end)) if start < end => Lookup::Range(start, end),
        (Some(_), Some(_)) => return Err(SearchError::date(BAD_RANGE)),
        (Some(start), None) => Lookup::Gte(start),
        (None, Some(end)) => Lookup::Lte(end),
        (None, None) => return Ok((scope, remaining)),
    };

    tracing::debug!(field = %path, ?lookup, "Applying date search");
    let scope = scope.filter(Predicate::field(path, lookup))?;
    Ok((scope, remaining))
}
