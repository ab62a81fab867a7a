use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::sea_query::{Expr, Func, LikeExpr};
use sea_orm::{QueryOrder, QuerySelect, Set};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

pub struct NewUserEntity {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub struct UpdateUserEntity {
    pub email: String,
    pub full_name: String,
    pub profile_pic: String,
    pub updated_at: DateTime<Utc>,
}

pub async fn find_by_id(db: &DatabaseConnection, id: Uuid) -> Result<Option<Model>, DbErr> {
    Entity::find_by_id(id).one(db).await
}

pub async fn find_many_by_ids(db: &DatabaseConnection, ids: &[Uuid]) -> Result<Vec<Model>, DbErr> {
    Entity::find()
        .filter(Column::Id.is_in(ids.iter().copied()))
        .all(db)
        .await
}

pub async fn exists_by_id(db: &DatabaseConnection, id: Uuid) -> Result<bool, DbErr> {
    let count = Entity::find().filter(Column::Id.eq(id)).count(db).await?;
    Ok(count > 0)
}

pub async fn find_by_email(db: &DatabaseConnection, email: &str) -> Result<Option<Model>, DbErr> {
    Entity::find().filter(Column::Email.eq(email)).one(db).await
}

/// `keyword` must already be lowercase; `%` and `_` match literally.
pub async fn search_by_email(
    db: &DatabaseConnection,
    keyword: &str,
    limit: u64,
) -> Result<Vec<Model>, DbErr> {
    let escaped = keyword
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    let pattern = LikeExpr::new(format!("%{escaped}%")).escape('\\');

    Entity::find()
        .filter(Expr::expr(Func::lower(Expr::col(Column::Email))).like(pattern))
        .order_by_asc(Column::Email)
        .limit(limit)
        .all(db)
        .await
}

pub async fn create(db: &DatabaseConnection, new_user: NewUserEntity) -> Result<Model, DbErr> {
    let active_model = ActiveModel {
        id: Set(new_user.id),
        email: Set(new_user.email),
        full_name: Set(new_user.full_name),
        profile_pic: Set(new_user.profile_pic),
        created_at: Set(new_user.created_at),
        updated_at: Set(new_user.updated_at),
    };

    active_model.insert(db).await
}

pub async fn update(
    db: &DatabaseConnection,
    id: Uuid,
    update_data: UpdateUserEntity,
) -> Result<Model, DbErr> {
    let active_model = ActiveModel {
        id: Set(id),
        email: Set(update_data.email),
        full_name: Set(update_data.full_name),
        profile_pic: Set(update_data.profile_pic),
        updated_at: Set(update_data.updated_at),
        ..Default::default()
    };

    active_model.update(db).await
}
