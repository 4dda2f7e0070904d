//! SurrealDB implementation of [`TravelPlanRepository`].

use chrono::{DateTime, NaiveDate, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use tripmate_core::error::TripmateResult;
use tripmate_core::models::travel_plan::{
    CreateTravelPlan, MAX_PLAN_IMAGES, PlanFilter, PlanStatus, TravelPlan, UpdateTravelPlan,
};
use tripmate_core::repository::{PaginatedResult, Pagination, TravelPlanRepository};
use uuid::Uuid;

use super::{CountRow, StatusRow, conditional_miss_error, parse_enum, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "travel_plan";

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct PlanRow {
    owner_id: String,
    destination: String,
    start_date: String,
    end_date: String,
    budget: f64,
    travel_type: String,
    description: String,
    interests: Vec<String>,
    images: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct PlanRowWithId {
    record_id: String,
    owner_id: String,
    destination: String,
    start_date: String,
    end_date: String,
    budget: f64,
    travel_type: String,
    description: String,
    interests: Vec<String>,
    images: Vec<String>,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn parse_date(what: &str, s: &str) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|e| DbError::decode(what, e))
}

fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

impl PlanRow {
    fn into_plan(self, id: Uuid) -> Result<TravelPlan, DbError> {
        Ok(TravelPlan {
            id,
            owner_id: parse_uuid("owner", &self.owner_id)?,
            destination: self.destination,
            start_date: parse_date("start_date", &self.start_date)?,
            end_date: parse_date("end_date", &self.end_date)?,
            budget: self.budget,
            travel_type: parse_enum("travel_type", &self.travel_type)?,
            description: self.description,
            interests: self.interests,
            images: self.images,
            status: parse_enum("plan status", &self.status)?,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl PlanRowWithId {
    fn try_into_plan(self) -> Result<TravelPlan, DbError> {
        let id = parse_uuid("plan", &self.record_id)?;
        PlanRow {
            owner_id: self.owner_id,
            destination: self.destination,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
            travel_type: self.travel_type,
            description: self.description,
            interests: self.interests,
            images: self.images,
            status: self.status,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .into_plan(id)
    }
}

/// SurrealDB implementation of the TravelPlan repository.
#[derive(Clone)]
pub struct SurrealTravelPlanRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealTravelPlanRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn current_status(&self, id_str: &str) -> Result<String, DbError> {
        let mut result = self
            .db
            .query("SELECT status FROM type::record('travel_plan', $id)")
            .bind(("id", id_str.to_string()))
            .await?;
        let rows: Vec<StatusRow> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(|r| r.status)
            .ok_or_else(|| DbError::NotFound {
                entity: ENTITY.into(),
                id: id_str.to_string(),
            })
    }

    /// Explain why a conditional write matched no row.
    async fn conditional_miss(
        &self,
        id_str: &str,
        expected: PlanStatus,
        write_err: Option<DbError>,
    ) -> DbError {
        let current = match self.current_status(id_str).await {
            Ok(found) => Ok(Some(found)),
            Err(DbError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        };
        conditional_miss_error(ENTITY, id_str, expected.as_str(), write_err, current)
    }
}

/// WHERE clauses and bindings for a search filter.
fn filter_clauses(filter: &PlanFilter) -> (Vec<&'static str>, Vec<(&'static str, FilterValue)>) {
    let mut clauses = vec!["status = $status"];
    let mut binds = vec![(
        "status",
        FilterValue::Text(filter.status.unwrap_or(PlanStatus::Active).as_str().into()),
    )];

    if let Some(destination) = filter.destination.as_deref().map(str::trim)
        && !destination.is_empty()
    {
        clauses.push("string::contains(string::lowercase(destination), $destination)");
        binds.push(("destination", FilterValue::Text(destination.to_lowercase())));
    }
    if let Some(travel_type) = filter.travel_type {
        clauses.push("travel_type = $travel_type");
        binds.push(("travel_type", FilterValue::Text(travel_type.as_str().into())));
    }
    if let Some(interest) = filter.interest.as_deref().map(str::trim)
        && !interest.is_empty()
    {
        clauses.push("interests CONTAINS $interest");
        binds.push(("interest", FilterValue::Text(interest.to_lowercase())));
    }
    if let Some(from) = filter.from {
        clauses.push("end_date >= $from");
        binds.push(("from", FilterValue::Text(format_date(from))));
    }
    if let Some(to) = filter.to {
        clauses.push("start_date <= $to");
        binds.push(("to", FilterValue::Text(format_date(to))));
    }
    if let Some(max_budget) = filter.max_budget {
        clauses.push("budget <= $max_budget");
        binds.push(("max_budget", FilterValue::Number(max_budget)));
    }

    (clauses, binds)
}

enum FilterValue {
    Text(String),
    Number(f64),
}

impl<C: Connection> TravelPlanRepository for SurrealTravelPlanRepository<C> {
    async fn create(&self, owner_id: Uuid, input: CreateTravelPlan) -> TripmateResult<TravelPlan> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('travel_plan', $id) SET \
                 owner_id = $owner_id, \
                 destination = $destination, \
                 start_date = $start_date, end_date = $end_date, \
                 budget = $budget, travel_type = $travel_type, \
                 description = $description, \
                 interests = $interests, images = $images, \
                 status = 'ACTIVE'",
            )
            .bind(("id", id_str.clone()))
            .bind(("owner_id", owner_id.to_string()))
            .bind(("destination", input.destination))
            .bind(("start_date", format_date(input.start_date)))
            .bind(("end_date", format_date(input.end_date)))
            .bind(("budget", input.budget))
            .bind(("travel_type", input.travel_type.as_str().to_string()))
            .bind(("description", input.description))
            .bind(("interests", input.interests))
            .bind(("images", input.images))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TripmateResult<TravelPlan> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('travel_plan', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row.into_plan(id)?)
    }

    async fn update(&self, id: Uuid, input: UpdateTravelPlan) -> TripmateResult<TravelPlan> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.destination.is_some() {
            sets.push("destination = $destination");
        }
        if input.start_date.is_some() {
            sets.push("start_date = $start_date");
        }
        if input.end_date.is_some() {
            sets.push("end_date = $end_date");
        }
        if input.budget.is_some() {
            sets.push("budget = $budget");
        }
        if input.travel_type.is_some() {
            sets.push("travel_type = $travel_type");
        }
        if input.description.is_some() {
            sets.push("description = $description");
        }
        if input.interests.is_some() {
            sets.push("interests = $interests");
        }
        if input.images.is_some() {
            sets.push("images = $images");
        }
        sets.push("updated_at = time::now()");

        // Edits are only accepted while the trip is still open.
        let query = format!(
            "UPDATE type::record('travel_plan', $id) SET {} \
             WHERE status = 'ACTIVE'",
            sets.join(", ")
        );

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(destination) = input.destination {
            builder = builder.bind(("destination", destination));
        }
        if let Some(start_date) = input.start_date {
            builder = builder.bind(("start_date", format_date(start_date)));
        }
        if let Some(end_date) = input.end_date {
            builder = builder.bind(("end_date", format_date(end_date)));
        }
        if let Some(budget) = input.budget {
            builder = builder.bind(("budget", budget));
        }
        if let Some(travel_type) = input.travel_type {
            builder = builder.bind(("travel_type", travel_type.as_str().to_string()));
        }
        if let Some(description) = input.description {
            builder = builder.bind(("description", description));
        }
        if let Some(interests) = input.interests {
            builder = builder.bind(("interests", interests));
        }
        if let Some(images) = input.images {
            builder = builder.bind(("images", images));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(row.into_plan(id)?),
            None => Err(self
                .conditional_miss(&id_str, PlanStatus::Active, None)
                .await
                .into()),
        }
    }

    async fn transition_status(
        &self,
        id: Uuid,
        expected: PlanStatus,
        next: PlanStatus,
    ) -> TripmateResult<TravelPlan> {
        let id_str = id.to_string();

        let outcome = self
            .db
            .query(
                "UPDATE type::record('travel_plan', $id) SET \
                 status = $next, updated_at = time::now() \
                 WHERE status = $expected",
            )
            .bind(("id", id_str.clone()))
            .bind(("expected", expected.as_str().to_string()))
            .bind(("next", next.as_str().to_string()))
            .await
            .map_err(DbError::from)
            .and_then(|r| r.check().map_err(|e| DbError::from_write(ENTITY, e)));

        let (rows, write_err): (Vec<PlanRow>, _) = match outcome {
            Ok(mut result) => (result.take(0).map_err(DbError::from)?, None),
            Err(e) => {
                debug!(plan_id = %id, error = %e, "Conditional status write failed");
                (Vec::new(), Some(e))
            }
        };

        match rows.into_iter().next() {
            Some(row) => {
                info!(plan_id = %id, from = %expected, to = %next, "Travel plan status changed");
                Ok(row.into_plan(id)?)
            }
            None => Err(self
                .conditional_miss(&id_str, expected, write_err)
                .await
                .into()),
        }
    }

    async fn append_image(&self, id: Uuid, url: String) -> TripmateResult<TravelPlan> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('travel_plan', $id) SET \
                 images += $url, updated_at = time::now() \
                 WHERE status = 'ACTIVE' AND array::len(images) < $max",
            )
            .bind(("id", id_str.clone()))
            .bind(("url", url))
            .bind(("max", MAX_PLAN_IMAGES as u64))
            .await
            .map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<PlanRow> = result.take(0).map_err(DbError::from)?;
        if let Some(row) = rows.into_iter().next() {
            return Ok(row.into_plan(id)?);
        }

        let found = self.current_status(&id_str).await?;
        if found == PlanStatus::Active.as_str() {
            Err(DbError::Rejected(format!(
                "a plan may carry at most {MAX_PLAN_IMAGES} images"
            ))
            .into())
        } else {
            Err(DbError::StaleState {
                entity: ENTITY.into(),
                id: id_str,
                expected: PlanStatus::Active.as_str().into(),
                found,
            }
            .into())
        }
    }

    async fn delete_with_requests(&self, id: Uuid) -> TripmateResult<u64> {
        let id_str = id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM join_request \
                 WHERE plan_id = $id GROUP ALL",
            )
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let removed = count_rows.first().map(|r| r.total).unwrap_or(0);

        self.db
            .query(
                "BEGIN TRANSACTION; \
                 DELETE join_request WHERE plan_id = $id; \
                 DELETE type::record('travel_plan', $id); \
                 COMMIT TRANSACTION;",
            )
            .bind(("id", id_str))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(plan_id = %id, removed_requests = removed, "Travel plan rows deleted");

        Ok(removed)
    }

    async fn search(
        &self,
        filter: PlanFilter,
        pagination: Pagination,
    ) -> TripmateResult<PaginatedResult<TravelPlan>> {
        let (clauses, binds) = filter_clauses(&filter);
        let where_clause = clauses.join(" AND ");

        let count_query =
            format!("SELECT count() AS total FROM travel_plan WHERE {where_clause} GROUP ALL");
        let list_query = format!(
            "SELECT meta::id(id) AS record_id, * FROM travel_plan \
             WHERE {where_clause} \
             ORDER BY created_at DESC \
             LIMIT $limit START $offset"
        );

        let mut count_builder = self.db.query(count_query);
        let mut list_builder = self
            .db
            .query(list_query)
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset));
        for (name, value) in binds {
            match value {
                FilterValue::Text(text) => {
                    count_builder = count_builder.bind((name, text.clone()));
                    list_builder = list_builder.bind((name, text));
                }
                FilterValue::Number(number) => {
                    count_builder = count_builder.bind((name, number));
                    list_builder = list_builder.bind((name, number));
                }
            }
        }

        let mut count_result = count_builder.await.map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = list_builder.await.map_err(DbError::from)?;
        let rows: Vec<PlanRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_plan())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_by_owner(&self, owner_id: Uuid) -> TripmateResult<Vec<TravelPlan>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM travel_plan \
                 WHERE owner_id = $owner_id \
                 ORDER BY created_at DESC",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<PlanRowWithId> = result.take(0).map_err(DbError::from)?;

        let plans = rows
            .into_iter()
            .map(|row| row.try_into_plan())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(plans)
    }

    async fn count_active_by_owner(&self, owner_id: Uuid) -> TripmateResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM travel_plan \
                 WHERE owner_id = $owner_id AND status = 'ACTIVE' GROUP ALL",
            )
            .bind(("owner_id", owner_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
