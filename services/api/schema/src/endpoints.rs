use sea_orm::entity::prelude::*;

/// One row per (method, route base path). Unique on `(method_id, endpoint_name)`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "endpoints")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub method_id: i32,
    pub endpoint_name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::methods::Entity",
        from = "Column::MethodId",
        to = "super::methods::Column::Id"
    )]
    Method,
    #[sea_orm(has_many = "super::requests::Entity")]
    Requests,
}

impl Related<super::methods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Method.def()
    }
}

impl Related<super::requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Requests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
