//! SurrealDB repository implementations.

mod checkout;
mod join_request;
mod review;
mod travel_plan;

pub use checkout::SurrealCheckoutRepository;
pub use join_request::SurrealJoinRequestRepository;
pub use review::SurrealReviewRepository;
pub use travel_plan::SurrealTravelPlanRepository;

use std::str::FromStr;

use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::DbError;

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// Row struct for queries that only project a record's status.
#[derive(Debug, SurrealValue)]
struct StatusRow {
    status: String,
}

/// Explain why a conditional status write did not apply.
///
/// `write_err` is what the write itself returned, if it failed. It is
/// only discarded when the record has since left `expected`, which is
/// what the loser of a concurrent write observes. Anything else stays a
/// store failure.
fn conditional_miss_error(
    entity: &str,
    id: &str,
    expected: &str,
    write_err: Option<DbError>,
    current: Result<Option<String>, DbError>,
) -> DbError {
    match (current, write_err) {
        (Ok(Some(found)), write_err) if found == expected => write_err.unwrap_or_else(|| {
            DbError::Query(format!(
                "conditional write on {entity} {id} matched nothing while still {found}"
            ))
        }),
        (Ok(Some(found)), _) => DbError::StaleState {
            entity: entity.into(),
            id: id.into(),
            expected: expected.into(),
            found,
        },
        (Ok(None), _) => DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        },
        (Err(_), Some(write_err)) => write_err,
        (Err(read_err), None) => read_err,
    }
}

fn parse_uuid(what: &str, s: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(s).map_err(|e| DbError::decode(&format!("invalid {what} UUID"), e))
}

/// Parse a stored enum string through the domain type's `FromStr`.
fn parse_enum<T>(what: &str, s: &str) -> Result<T, DbError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    s.parse().map_err(|e| DbError::decode(what, e))
}
