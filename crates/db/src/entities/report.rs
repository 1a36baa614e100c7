//! Report (signalement) entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Intake classification, fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ReceptionStatus {
    #[sea_orm(string_value = "Reçu")]
    Recu,
    #[sea_orm(string_value = "Rejeté")]
    Rejete,
}

/// Triage state, mutable by district agents.
#[derive(Debug, Clone, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum TraitementStatus {
    #[sea_orm(string_value = "En attente")]
    EnAttente,
    #[sea_orm(string_value = "Traité")]
    Traite,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "report")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The account that filed the report
    pub user_id: String,

    pub district_id: String,

    pub title: String,

    #[sea_orm(column_type = "Text")]
    pub description: String,

    /// Base64-encoded image, stored exactly as supplied (data-URI prefix included)
    #[sea_orm(column_type = "Text", nullable)]
    pub image_base64: Option<String>,

    pub latitude: f64,

    pub longitude: f64,

    pub reception_status: ReceptionStatus,

    pub traitement_status: TraitementStatus,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,

    #[sea_orm(
        belongs_to = "super::district::Entity",
        from = "Column::DistrictId",
        to = "super::district::Column::Id"
    )]
    District,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::district::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::District.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
