//! Seed configuration loading from config.toml
//!
//! `config.toml` describes the restaurant floor (tables), the menu (categories and
//! items) and the staff sessions accepted by the web layer. Tables, categories and
//! items are inserted on startup when they are missing; existing rows are left
//! untouched so that edits made through the application survive restarts.

use crate::{
    core::{menu, table},
    entities::{Location, Station},
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Tables to create on first run
    #[serde(default)]
    pub tables: Vec<TableConfig>,
    /// Menu categories to create on first run
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
    /// Menu items to create on first run
    #[serde(default)]
    pub menu_items: Vec<MenuItemConfig>,
    /// Staff members and their session tokens
    #[serde(default)]
    pub staff: Vec<StaffConfig>,
}

/// Configuration for a single table
#[derive(Debug, Deserialize, Clone)]
pub struct TableConfig {
    /// Table number
    pub number: i32,
    /// Seats
    pub capacity: i32,
    /// Area of the restaurant
    pub location: Location,
}

/// Configuration for a single menu category
#[derive(Debug, Deserialize, Clone)]
pub struct CategoryConfig {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Preparing station
    #[serde(default = "default_station")]
    pub station: Station,
}

/// Configuration for a single menu item
#[derive(Debug, Deserialize, Clone)]
pub struct MenuItemConfig {
    /// Item name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Name of the category the item belongs to
    pub category: Option<String>,
    /// Menu price
    pub price: Decimal,
    /// Whether the item can be ordered
    #[serde(default = "default_available")]
    pub available: bool,
    /// Preparation time in minutes
    #[serde(default = "default_prep_minutes")]
    pub prep_minutes: i32,
}

/// A staff member allowed to change data through the web layer
#[derive(Debug, Deserialize, Clone)]
pub struct StaffConfig {
    /// Username recorded on reservations and orders
    pub name: String,
    /// Session cookie value identifying this staff member
    pub session_token: String,
}

const fn default_station() -> Station {
    Station::Kitchen
}

const fn default_available() -> bool {
    true
}

const fn default_prep_minutes() -> i32 {
    menu::DEFAULT_PREP_MINUTES
}

/// Loads seed configuration from a TOML file
///
/// # Errors
/// Returns an error if the file cannot be read, the TOML syntax is invalid or
/// required fields are missing.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
        message: format!("Failed to read config file: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads the configuration at `path`, falling back to an empty configuration when
/// the file does not exist.
pub fn load_config_or_default<P: AsRef<Path>>(path: P) -> Result<Config> {
    if path.as_ref().exists() {
        load_config(path)
    } else {
        info!(
            "No configuration file at {}; starting without seed data.",
            path.as_ref().display()
        );
        Ok(Config::default())
    }
}

/// Inserts the tables, categories and menu items from `config` that are not in the
/// database yet.
pub async fn seed_from_config(db: &DatabaseConnection, config: &Config) -> Result<()> {
    for t in &config.tables {
        if table::get_table_by_number(db, t.number).await?.is_none() {
            table::create_table(
                db,
                table::TableSpec {
                    number: t.number,
                    capacity: t.capacity,
                    location: t.location,
                },
            )
            .await?;
            debug!("Seeded table {}", t.number);
        }
    }

    for c in &config.categories {
        if menu::get_category_by_name(db, &c.name).await?.is_none() {
            menu::create_category(db, c.name.clone(), c.description.clone(), c.station).await?;
            debug!("Seeded category {}", c.name);
        }
    }

    for item in &config.menu_items {
        if menu::get_item_by_name(db, &item.name).await?.is_some() {
            continue;
        }
        let category_id = match &item.category {
            Some(name) => menu::get_category_by_name(db, name)
                .await?
                .map(|c| c.id)
                .ok_or_else(|| Error::Config {
                    message: format!("Menu item '{}' refers to unknown category '{name}'", item.name),
                })
                .map(Some)?,
            None => None,
        };
        menu::create_item(
            db,
            menu::ItemSpec {
                name: item.name.clone(),
                description: item.description.clone(),
                category_id,
                price: item.price,
                available: item.available,
                prep_minutes: item.prep_minutes,
            },
        )
        .await?;
        debug!("Seeded menu item {}", item.name);
    }

    info!(
        "Seed data applied ({} tables, {} categories, {} items configured).",
        config.tables.len(),
        config.categories.len(),
        config.menu_items.len()
    );
    Ok(())
}
