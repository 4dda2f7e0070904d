//! SurrealDB implementation of [`JoinRequestRepository`].
//!
//! Duplicate prevention rides on the `idx_join_request_live_slot` unique
//! index rather than on any in-process lock, and status responses are a
//! single conditional `UPDATE … WHERE status = $expected`.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{debug, info};
use tripmate_core::error::TripmateResult;
use tripmate_core::models::join_request::{CreateJoinRequest, JoinRequest, JoinRequestStatus};
use tripmate_core::repository::{JoinRequestRepository, PaginatedResult, Pagination};
use uuid::Uuid;

use super::{CountRow, StatusRow, conditional_miss_error, parse_enum, parse_uuid};
use crate::error::DbError;

const ENTITY: &str = "join_request";
const LIVE_SLOT: &str = "live";

#[derive(Debug, SurrealValue)]
struct JoinRequestRow {
    requester_id: String,
    plan_id: String,
    message: String,
    status: String,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, SurrealValue)]
struct JoinRequestRowWithId {
    record_id: String,
    requester_id: String,
    plan_id: String,
    message: String,
    status: String,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn row_to_request(row: JoinRequestRow, id: Uuid) -> Result<JoinRequest, DbError> {
    Ok(JoinRequest {
        id,
        requester_id: parse_uuid("requester", &row.requester_id)?,
        plan_id: parse_uuid("plan", &row.plan_id)?,
        message: row.message,
        status: parse_enum("join request status", &row.status)?,
        created_at: row.created_at,
        updated_at: row.updated_at,
        responded_at: row.responded_at,
    })
}

impl JoinRequestRowWithId {
    fn try_into_request(self) -> Result<JoinRequest, DbError> {
        let id = parse_uuid("join request", &self.record_id)?;
        row_to_request(
            JoinRequestRow {
                requester_id: self.requester_id,
                plan_id: self.plan_id,
                message: self.message,
                status: self.status,
                responded_at: self.responded_at,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            id,
        )
    }
}

fn rows_to_requests(rows: Vec<JoinRequestRowWithId>) -> Result<Vec<JoinRequest>, DbError> {
    rows.into_iter()
        .map(|row| row.try_into_request())
        .collect()
}

/// SurrealDB implementation of the JoinRequest repository.
#[derive(Clone)]
pub struct SurrealJoinRequestRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealJoinRequestRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn conditional_miss(
        &self,
        id_str: &str,
        expected: JoinRequestStatus,
        write_err: Option<DbError>,
    ) -> DbError {
        let current = async {
            let mut result = self
                .db
                .query("SELECT status FROM type::record('join_request', $id)")
                .bind(("id", id_str.to_string()))
                .await?;
            let rows: Vec<StatusRow> = result.take(0)?;
            Ok::<_, DbError>(rows.into_iter().next().map(|r| r.status))
        };

        conditional_miss_error(ENTITY, id_str, expected.as_str(), write_err, current.await)
    }

    async fn list_where(
        &self,
        clause: &str,
        name: &'static str,
        value: String,
    ) -> TripmateResult<Vec<JoinRequest>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, * FROM join_request \
             WHERE {clause} \
             ORDER BY created_at DESC, record_id ASC"
        );
        let mut result = self
            .db
            .query(query)
            .bind((name, value))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<JoinRequestRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_to_requests(rows)?)
    }

    async fn approved_values(
        &self,
        column: &str,
        clause: &str,
        name: &'static str,
        value: String,
    ) -> TripmateResult<Vec<Uuid>> {
        let query = format!(
            "SELECT VALUE {column} FROM join_request \
             WHERE {clause} AND status = 'APPROVED'"
        );
        let mut result = self
            .db
            .query(query)
            .bind((name, value))
            .await
            .map_err(DbError::from)?;

        let values: Vec<String> = result.take(0).map_err(DbError::from)?;
        let ids = values
            .iter()
            .map(|v| parse_uuid(column, v))
            .collect::<Result<Vec<_>, DbError>>()?;
        Ok(ids)
    }
}

impl<C: Connection> JoinRequestRepository for SurrealJoinRequestRepository<C> {
    async fn create(
        &self,
        requester_id: Uuid,
        input: CreateJoinRequest,
    ) -> TripmateResult<JoinRequest> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('join_request', $id) SET \
                 requester_id = $requester_id, \
                 plan_id = $plan_id, \
                 message = $message, \
                 status = 'PENDING', \
                 slot = $slot, \
                 responded_at = NONE",
            )
            .bind(("id", id_str.clone()))
            .bind(("requester_id", requester_id.to_string()))
            .bind(("plan_id", input.plan_id.to_string()))
            .bind(("message", input.message))
            .bind(("slot", LIVE_SLOT.to_string()))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::from_write(ENTITY, e))?;

        let rows: Vec<JoinRequestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row_to_request(row, id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> TripmateResult<JoinRequest> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('join_request', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<JoinRequestRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: ENTITY.into(),
            id: id_str,
        })?;

        Ok(row_to_request(row, id)?)
    }

    async fn find_live(
        &self,
        requester_id: Uuid,
        plan_id: Uuid,
    ) -> TripmateResult<Option<JoinRequest>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM join_request \
                 WHERE requester_id = $requester_id \
                 AND plan_id = $plan_id \
                 AND slot = $slot",
            )
            .bind(("requester_id", requester_id.to_string()))
            .bind(("plan_id", plan_id.to_string()))
            .bind(("slot", LIVE_SLOT.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<JoinRequestRowWithId> = result.take(0).map_err(DbError::from)?;
        Ok(rows_to_requests(rows)?.into_iter().next())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: JoinRequestStatus,
        next: JoinRequestStatus,
    ) -> TripmateResult<JoinRequest> {
        let id_str = id.to_string();
        let slot = if next.holds_slot() {
            LIVE_SLOT.to_string()
        } else {
            id_str.clone()
        };
        let responded = if next.is_terminal() {
            "time::now()"
        } else {
            "NONE"
        };

        let query = format!(
            "UPDATE type::record('join_request', $id) SET \
             status = $next, slot = $slot, \
             responded_at = {responded}, updated_at = time::now() \
             WHERE status = $expected"
        );

        let outcome = self
            .db
            .query(query)
            .bind(("id", id_str.clone()))
            .bind(("expected", expected.as_str().to_string()))
            .bind(("next", next.as_str().to_string()))
            .bind(("slot", slot))
            .await
            .map_err(DbError::from)
            .and_then(|r| r.check().map_err(|e| DbError::from_write(ENTITY, e)));

        let (rows, write_err): (Vec<JoinRequestRow>, _) = match outcome {
            Ok(mut result) => (result.take(0).map_err(DbError::from)?, None),
            Err(e) => {
                debug!(request_id = %id, error = %e, "Conditional status write failed");
                (Vec::new(), Some(e))
            }
        };

        match rows.into_iter().next() {
            Some(row) => {
                info!(
                    request_id = %id,
                    from = %expected,
                    to = %next,
                    "Join request status changed"
                );
                Ok(row_to_request(row, id)?)
            }
            None => Err(self.conditional_miss(&id_str, expected, write_err).await.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> TripmateResult<()> {
        self.db
            .query("DELETE type::record('join_request', $id)")
            .bind(("id", id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list_by_plan(&self, plan_id: Uuid) -> TripmateResult<Vec<JoinRequest>> {
        self.list_where("plan_id = $plan_id", "plan_id", plan_id.to_string())
            .await
    }

    async fn list_by_requester(&self, requester_id: Uuid) -> TripmateResult<Vec<JoinRequest>> {
        self.list_where(
            "requester_id = $requester_id",
            "requester_id",
            requester_id.to_string(),
        )
        .await
    }

    async fn list_by_plan_owner(&self, owner_id: Uuid) -> TripmateResult<Vec<JoinRequest>> {
        self.list_where(
            "plan_id IN (\
                 SELECT VALUE meta::id(id) FROM travel_plan \
                 WHERE owner_id = $owner_id\
             )",
            "owner_id",
            owner_id.to_string(),
        )
        .await
    }

    async fn list_all(
        &self,
        pagination: Pagination,
    ) -> TripmateResult<PaginatedResult<JoinRequest>> {
        let mut count_result = self
            .db
            .query("SELECT count() AS total FROM join_request GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM join_request \
                 ORDER BY created_at DESC, record_id ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<JoinRequestRowWithId> = result.take(0).map_err(DbError::from)?;

        Ok(PaginatedResult {
            items: rows_to_requests(rows)?,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn approved_requesters(&self, plan_id: Uuid) -> TripmateResult<Vec<Uuid>> {
        self.approved_values("requester_id", "plan_id = $plan_id", "plan_id", plan_id.to_string())
            .await
    }

    async fn approved_plan_ids(&self, requester_id: Uuid) -> TripmateResult<Vec<Uuid>> {
        self.approved_values(
            "plan_id",
            "requester_id = $requester_id",
            "requester_id",
            requester_id.to_string(),
        )
        .await
    }
}
