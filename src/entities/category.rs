//! Menu category entity - Groups menu items (starters, mains, drinks, cocktails).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Where items of a category are prepared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum Station {
    /// Kitchen
    #[sea_orm(string_value = "kitchen")]
    Kitchen,
    /// Bar
    #[sea_orm(string_value = "bar")]
    Bar,
}

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu_categories")]
pub struct Model {
    /// Unique identifier for the category
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Category name, unique
    #[sea_orm(unique)]
    pub name: String,
    /// Description shown on the menu
    pub description: String,
    /// Preparing station
    pub station: Station,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One category has many items
    #[sea_orm(has_many = "super::menu_item::Entity")]
    MenuItems,
}

impl Related<super::menu_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MenuItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
