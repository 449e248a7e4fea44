use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ActiveValue::Set, ColumnTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, FromQueryResult, JoinType, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use moodzic_api_schema::{endpoints, methods, outbox_events, requests, roles, users};
use moodzic_domain::id::UserId;
use moodzic_domain::method::ApiMethod;
use moodzic_domain::user::UserRole;

use crate::domain::repository::{RequestLogRepository, UsageRepository, UserRepository};
use crate::domain::types::{
    EndpointUsage, NewUser, OutboxEvent, RequestRecord, ResetCode, User, UserUsage,
};
use crate::error::ApiError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl DbUserRepository {
    async fn find_one(
        &self,
        filter: sea_orm::sea_query::SimpleExpr,
        what: &'static str,
    ) -> Result<Option<User>, ApiError> {
        let row = users::Entity::find()
            .find_also_related(roles::Entity)
            .filter(filter)
            .one(&self.db)
            .await
            .context(what)?;
        row.map(|(user, role)| user_from_model(user, role))
            .transpose()
    }
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        self.find_one(users::Column::Email.eq(email), "find user by email")
            .await
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>, ApiError> {
        self.find_one(users::Column::Id.eq(id.0), "find user by id")
            .await
    }

    async fn find_role(&self, id: UserId) -> Result<Option<UserRole>, ApiError> {
        let role = roles::Entity::find()
            .inner_join(users::Entity)
            .filter(users::Column::Id.eq(id.0))
            .one(&self.db)
            .await
            .context("find user role")?;
        role.map(|r| role_from_name(&r.name)).transpose()
    }

    async fn create(&self, user: &NewUser) -> Result<(), ApiError> {
        let now = Utc::now();
        let result = users::ActiveModel {
            id: Set(user.id.0),
            email: Set(user.email.clone()),
            password: Set(user.password_hash.clone()),
            salt: Set(user.salt.clone()),
            role_id: Set(user.role.role_id()),
            reset_code: Set(None),
            reset_code_expiry: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            last_login: Set(None),
            is_active: Set(true),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(ApiError::UserAlreadyExists),
            Err(e) => Err(anyhow::Error::new(e).context("create user").into()),
        }
    }

    async fn record_login(&self, id: UserId, at: DateTime<Utc>) -> Result<(), ApiError> {
        users::Entity::update_many()
            .col_expr(users::Column::LastLogin, Expr::value(Some(at)))
            .col_expr(users::Column::UpdatedAt, Expr::value(at))
            .filter(users::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .context("record login")?;
        Ok(())
    }

    async fn set_reset_code_with_outbox(
        &self,
        id: UserId,
        code: &ResetCode,
        event: &OutboxEvent,
    ) -> Result<(), ApiError> {
        self.db
            .transaction::<_, (), DbErr>(|txn| {
                let code = code.clone();
                let event = event.clone();
                Box::pin(async move {
                    users::Entity::update_many()
                        .col_expr(users::Column::ResetCode, Expr::value(Some(code.code)))
                        .col_expr(
                            users::Column::ResetCodeExpiry,
                            Expr::value(Some(code.expires_at)),
                        )
                        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
                        .filter(users::Column::Id.eq(id.0))
                        .exec(txn)
                        .await?;
                    insert_outbox_event(txn, &event).await?;
                    Ok(())
                })
            })
            .await
            .context("store reset code with outbox")?;
        Ok(())
    }

    async fn consume_reset_code(
        &self,
        id: UserId,
        code: &str,
        password_hash: &str,
        salt: &str,
    ) -> Result<bool, ApiError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Password, Expr::value(password_hash.to_owned()))
            .col_expr(users::Column::Salt, Expr::value(salt.to_owned()))
            .col_expr(users::Column::ResetCode, Expr::value(None::<String>))
            .col_expr(
                users::Column::ResetCodeExpiry,
                Expr::value(None::<DateTime<Utc>>),
            )
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .filter(users::Column::ResetCode.eq(code))
            .exec(&self.db)
            .await
            .context("consume reset code")?;
        Ok(result.rows_affected == 1)
    }

    async fn update_role(&self, id: UserId, role: UserRole) -> Result<bool, ApiError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::RoleId, Expr::value(role.role_id()))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .context("update user role")?;
        Ok(result.rows_affected > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, ApiError> {
        let result = users::Entity::delete_many()
            .filter(users::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .context("delete user")?;
        Ok(result.rows_affected > 0)
    }
}

fn is_unique_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

fn is_foreign_key_violation(e: &DbErr) -> bool {
    matches!(e.sql_err(), Some(SqlErr::ForeignKeyConstraintViolation(_)))
}

fn role_from_name(name: &str) -> Result<UserRole, ApiError> {
    name.parse::<UserRole>()
        .map_err(|e| ApiError::Internal(anyhow!(e)))
}

fn user_from_model(model: users::Model, role: Option<roles::Model>) -> Result<User, ApiError> {
    let role = role
        .ok_or_else(|| anyhow!("user {} references missing role {}", model.id, model.role_id))?;
    Ok(User {
        id: UserId(model.id),
        email: model.email,
        password_hash: model.password,
        salt: model.salt,
        role: role_from_name(&role.name)?,
        reset_code: model.reset_code,
        reset_code_expiry: model.reset_code_expiry,
        created_at: model.created_at,
        updated_at: model.updated_at,
        last_login: model.last_login,
        is_active: model.is_active,
    })
}

async fn insert_outbox_event(
    txn: &DatabaseTransaction,
    event: &OutboxEvent,
) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        user_id: Set(event.user_id.0),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(txn)
    .await?;
    Ok(())
}

// ── Usage repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUsageRepository {
    pub db: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct UserUsageRow {
    user_id: Uuid,
    email: String,
    role: String,
    number_of_requests: i64,
}

#[derive(Debug, FromQueryResult)]
struct EndpointUsageRow {
    method: String,
    endpoint: String,
    number_of_requests: i64,
}

impl From<EndpointUsageRow> for EndpointUsage {
    fn from(row: EndpointUsageRow) -> Self {
        Self {
            method: row.method,
            endpoint: row.endpoint,
            number_of_requests: row.number_of_requests,
        }
    }
}

/// `requests ⋈ endpoints ⋈ methods`, grouped by (method name, endpoint name).
fn endpoint_usage_query() -> sea_orm::Select<requests::Entity> {
    requests::Entity::find()
        .select_only()
        .column_as(methods::Column::Name, "method")
        .column_as(endpoints::Column::EndpointName, "endpoint")
        .column_as(requests::Column::Id.count(), "number_of_requests")
        .join(JoinType::InnerJoin, requests::Relation::Endpoint.def())
        .join(JoinType::InnerJoin, endpoints::Relation::Method.def())
        .group_by(methods::Column::Name)
        .group_by(endpoints::Column::EndpointName)
        .order_by_asc(endpoints::Column::EndpointName)
        .order_by_asc(methods::Column::Name)
}

impl UsageRepository for DbUsageRepository {
    async fn users_with_request_counts(&self) -> Result<Vec<UserUsage>, ApiError> {
        let rows = users::Entity::find()
            .select_only()
            .column_as(users::Column::Id, "user_id")
            .column_as(users::Column::Email, "email")
            .column_as(roles::Column::Name, "role")
            .column_as(requests::Column::Id.count(), "number_of_requests")
            .join(JoinType::InnerJoin, users::Relation::Role.def())
            .join(JoinType::LeftJoin, users::Relation::Requests.def())
            .group_by(users::Column::Id)
            .group_by(users::Column::Email)
            .group_by(roles::Column::Name)
            .order_by_asc(users::Column::Email)
            .into_model::<UserUsageRow>()
            .all(&self.db)
            .await
            .context("list users with request counts")?;

        rows.into_iter()
            .map(|row| {
                Ok(UserUsage {
                    user_id: UserId(row.user_id),
                    email: row.email,
                    role: role_from_name(&row.role)?,
                    number_of_requests: row.number_of_requests,
                })
            })
            .collect()
    }

    async fn endpoint_totals(&self) -> Result<Vec<EndpointUsage>, ApiError> {
        let rows = endpoint_usage_query()
            .into_model::<EndpointUsageRow>()
            .all(&self.db)
            .await
            .context("aggregate requests by endpoint")?;
        Ok(rows.into_iter().map(EndpointUsage::from).collect())
    }

    async fn endpoint_totals_for_user(&self, id: UserId) -> Result<Vec<EndpointUsage>, ApiError> {
        let rows = endpoint_usage_query()
            .filter(requests::Column::UserId.eq(id.0))
            .into_model::<EndpointUsageRow>()
            .all(&self.db)
            .await
            .context("aggregate requests by endpoint for user")?;
        Ok(rows.into_iter().map(EndpointUsage::from).collect())
    }

    async fn count_user_calls(
        &self,
        id: UserId,
        method: ApiMethod,
        endpoint: &str,
    ) -> Result<u64, ApiError> {
        let count = requests::Entity::find()
            .join(JoinType::InnerJoin, requests::Relation::Endpoint.def())
            .join(JoinType::InnerJoin, endpoints::Relation::Method.def())
            .filter(requests::Column::UserId.eq(id.0))
            .filter(methods::Column::Name.eq(method.as_str()))
            .filter(endpoints::Column::EndpointName.eq(endpoint))
            .count(&self.db)
            .await
            .context("count user calls")?;
        Ok(count)
    }
}

// ── Request log repository ────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbRequestLogRepository {
    pub db: DatabaseConnection,
}

impl RequestLogRepository for DbRequestLogRepository {
    async fn find_endpoint_id(
        &self,
        method: ApiMethod,
        endpoint: &str,
    ) -> Result<Option<i32>, ApiError> {
        let model = endpoints::Entity::find()
            .inner_join(methods::Entity)
            .filter(methods::Column::Name.eq(method.as_str()))
            .filter(endpoints::Column::EndpointName.eq(endpoint))
            .one(&self.db)
            .await
            .context("find endpoint id")?;
        Ok(model.map(|m| m.id))
    }

    async fn append(&self, record: &RequestRecord) -> Result<(), ApiError> {
        let status_code =
            i16::try_from(record.status_code).context("status code out of range")?;
        let row = |user_id: Option<Uuid>| requests::ActiveModel {
            id: NotSet,
            user_id: Set(user_id),
            endpoint_id: Set(record.endpoint_id),
            status_code: Set(status_code),
            created_at: Set(Utc::now()),
        };

        let user_id = record.user_id.map(Uuid::from);
        match row(user_id).insert(&self.db).await {
            Ok(_) => {}
            // The caller's account is gone (deleted while its token is still
            // valid); keep the row, anonymously.
            Err(e) if user_id.is_some() && is_foreign_key_violation(&e) => {
                tracing::debug!(
                    user_id = ?record.user_id,
                    "logging request without deleted user"
                );
                row(None)
                    .insert(&self.db)
                    .await
                    .context("append anonymous request record")?;
            }
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context("append request record")
                    .into());
            }
        }
        Ok(())
    }
}
