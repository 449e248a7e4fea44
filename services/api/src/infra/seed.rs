//! Startup seeding of reference rows (roles, methods, endpoints) and the
//! optional bootstrap admin. Every insert is skip-if-present, so reruns are no-ops.

use std::collections::HashMap;

use anyhow::Context as _;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue::NotSet, ActiveValue::Set, DatabaseConnection, EntityTrait};

use moodzic_api_schema::{endpoints, methods, roles};
use moodzic_domain::id::UserId;
use moodzic_domain::method::ApiMethod;
use moodzic_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::NewUser;
use crate::error::ApiError;
use crate::infra::db::DbUserRepository;
use crate::route::RouteTable;
use crate::usecase::credential::{generate_salt, hash_password};

pub async fn seed_reference_data<H>(
    db: &DatabaseConnection,
    routes: &RouteTable<H>,
) -> anyhow::Result<()> {
    roles::Entity::insert_many(UserRole::ALL.map(|role| roles::ActiveModel {
        id: Set(role.role_id()),
        name: Set(role.as_str().to_owned()),
    }))
    .on_conflict(OnConflict::column(roles::Column::Id).do_nothing().to_owned())
    .do_nothing()
    .exec(db)
    .await
    .context("seed roles")?;

    methods::Entity::insert_many(ApiMethod::ALL.map(|method| methods::ActiveModel {
        id: NotSet,
        name: Set(method.as_str().to_owned()),
    }))
    .on_conflict(OnConflict::column(methods::Column::Name).do_nothing().to_owned())
    .do_nothing()
    .exec(db)
    .await
    .context("seed methods")?;

    let method_ids: HashMap<String, i32> = methods::Entity::find()
        .all(db)
        .await
        .context("load methods")?
        .into_iter()
        .map(|m| (m.name, m.id))
        .collect();

    let mut seeded = 0usize;
    for route in routes.routes() {
        // Preflight (`*`) routes and untracked methods have no endpoint row.
        let Some(base) = route.pattern.base_path() else {
            continue;
        };
        let Some(&method_id) = method_ids.get(route.method.as_str()) else {
            continue;
        };
        endpoints::Entity::insert(endpoints::ActiveModel {
            id: NotSet,
            method_id: Set(method_id),
            endpoint_name: Set(base),
        })
        .on_conflict(
            OnConflict::columns([endpoints::Column::MethodId, endpoints::Column::EndpointName])
                .do_nothing()
                .to_owned(),
        )
        .do_nothing()
        .exec(db)
        .await
        .context("seed endpoint")?;
        seeded += 1;
    }

    tracing::info!(endpoints = seeded, "reference data seeded");
    Ok(())
}

/// Create the admin account named by configuration unless the email is taken.
pub async fn ensure_admin(
    db: &DatabaseConnection,
    email: &str,
    password: &str,
) -> Result<(), ApiError> {
    let users = DbUserRepository { db: db.clone() };
    if users.find_by_email(email).await?.is_some() {
        return Ok(());
    }

    let salt = generate_salt();
    let admin = NewUser {
        id: UserId::generate(),
        email: email.to_owned(),
        password_hash: hash_password(password, &salt)?,
        salt,
        role: UserRole::Admin,
    };
    match users.create(&admin).await {
        Ok(()) => {
            tracing::info!(user_id = %admin.id, "bootstrap admin created");
            Ok(())
        }
        // Another replica won the race.
        Err(ApiError::UserAlreadyExists) => Ok(()),
        Err(e) => Err(e),
    }
}
