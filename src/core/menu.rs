//! Menu catalog business logic: categories and the items that can be ordered.

use crate::{
    core::order,
    entities::{
        Category, MenuItem, OrderLine, Station, category, menu_item, order_line,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use sea_orm::{
    PaginatorTrait, QueryOrder, QuerySelect, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, info};

/// Preparation time assumed when none is given.
pub const DEFAULT_PREP_MINUTES: i32 = 15;

/// Editable attributes of a menu item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemSpec {
    /// Display name
    pub name: String,
    /// Description
    pub description: String,
    /// Category, if any
    pub category_id: Option<i64>,
    /// Menu price
    pub price: Decimal,
    /// Whether the item can be ordered
    pub available: bool,
    /// Preparation time in minutes
    pub prep_minutes: i32,
}

/// Filters for [`list_items`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemFilter {
    /// Only items in this category
    pub category_id: Option<i64>,
    /// Only items with this availability
    pub available: Option<bool>,
}

// Categories

async fn ensure_category_name_free(
    db: &DatabaseConnection,
    name: &str,
    excluding: Option<i64>,
) -> Result<()> {
    let mut query = Category::find().filter(category::Column::Name.eq(name));
    if let Some(id) = excluding {
        query = query.filter(category::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(Error::invalid(
            "name",
            format!("Category '{name}' already exists"),
        ));
    }
    Ok(())
}

fn required_name(name: String) -> Result<String> {
    let name = name.trim().to_string();
    if name.is_empty() {
        return Err(Error::invalid("name", "Name is required"));
    }
    Ok(name)
}

/// Creates a menu category with a unique name.
pub async fn create_category(
    db: &DatabaseConnection,
    name: String,
    description: String,
    station: Station,
) -> Result<category::Model> {
    let name = required_name(name)?;
    ensure_category_name_free(db, &name, None).await?;

    let created = category::ActiveModel {
        name: Set(name),
        description: Set(description),
        station: Set(station),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Created menu category {}", created.name);
    Ok(created)
}

/// Renames or re-describes a category.
pub async fn update_category(
    db: &DatabaseConnection,
    category_id: i64,
    name: String,
    description: String,
    station: Station,
) -> Result<category::Model> {
    let name = required_name(name)?;
    let existing = require_category(db, category_id).await?;
    ensure_category_name_free(db, &name, Some(category_id)).await?;

    let mut active: category::ActiveModel = existing.into();
    active.name = Set(name);
    active.description = Set(description);
    active.station = Set(station);
    active.update(db).await.map_err(Into::into)
}

/// Loads a category or fails with `NotFound`.
pub async fn require_category(db: &DatabaseConnection, category_id: i64) -> Result<category::Model> {
    Category::find_by_id(category_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))
}

/// Finds a category by its unique name.
pub async fn get_category_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<category::Model>> {
    Category::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists all categories ordered by name.
pub async fn list_categories(db: &DatabaseConnection) -> Result<Vec<category::Model>> {
    Category::find()
        .order_by_asc(category::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes a category; its items stay on the menu uncategorised.
pub async fn delete_category(db: &DatabaseConnection, category_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = Category::find_by_id(category_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("category", category_id))?;

    MenuItem::update_many()
        .col_expr(menu_item::Column::CategoryId, Expr::value(Option::<i64>::None))
        .filter(menu_item::Column::CategoryId.eq(category_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;
    txn.commit().await?;
    info!("Deleted menu category {category_id}");
    Ok(())
}

// Items

fn validate_item(spec: ItemSpec) -> Result<ItemSpec> {
    let name = required_name(spec.name)?;
    if spec.price < Decimal::ZERO {
        return Err(Error::invalid("price", "Price cannot be negative"));
    }
    if spec.prep_minutes < 1 {
        return Err(Error::invalid(
            "prep_minutes",
            "Preparation time must be at least 1 minute",
        ));
    }
    Ok(ItemSpec { name, ..spec })
}

/// Adds an item to the menu.
pub async fn create_item(db: &DatabaseConnection, spec: ItemSpec) -> Result<menu_item::Model> {
    let spec = validate_item(spec)?;
    if let Some(category_id) = spec.category_id {
        require_category(db, category_id).await?;
    }

    let created = menu_item::ActiveModel {
        name: Set(spec.name),
        description: Set(spec.description),
        category_id: Set(spec.category_id),
        price: Set(spec.price.round_dp(2)),
        available: Set(spec.available),
        prep_minutes: Set(spec.prep_minutes),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!("Added menu item {} at {}", created.name, created.price);
    Ok(created)
}

/// Updates a menu item. Lines already on orders keep the price they were taken at.
pub async fn update_item(
    db: &DatabaseConnection,
    item_id: i64,
    spec: ItemSpec,
) -> Result<menu_item::Model> {
    let spec = validate_item(spec)?;
    let existing = require_item(db, item_id).await?;
    if let Some(category_id) = spec.category_id {
        require_category(db, category_id).await?;
    }

    let mut active: menu_item::ActiveModel = existing.into();
    active.name = Set(spec.name);
    active.description = Set(spec.description);
    active.category_id = Set(spec.category_id);
    active.price = Set(spec.price.round_dp(2));
    active.available = Set(spec.available);
    active.prep_minutes = Set(spec.prep_minutes);
    active.update(db).await.map_err(Into::into)
}

/// Switches an item on or off the orderable menu.
pub async fn set_item_availability(
    db: &DatabaseConnection,
    item_id: i64,
    available: bool,
) -> Result<menu_item::Model> {
    let existing = require_item(db, item_id).await?;
    let mut active: menu_item::ActiveModel = existing.into();
    active.available = Set(available);
    let updated = active.update(db).await?;
    info!(
        "Menu item {} is now {}",
        updated.name,
        if available { "available" } else { "unavailable" }
    );
    Ok(updated)
}

/// Finds a menu item by ID.
pub async fn get_item(db: &DatabaseConnection, item_id: i64) -> Result<Option<menu_item::Model>> {
    MenuItem::find_by_id(item_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Loads a menu item or fails with `NotFound`.
pub async fn require_item(db: &DatabaseConnection, item_id: i64) -> Result<menu_item::Model> {
    get_item(db, item_id)
        .await?
        .ok_or_else(|| Error::not_found("menu item", item_id))
}

/// Loads an item that may be put on an order.
///
/// Fails with `ItemUnavailable` when the item is switched off.
pub async fn get_available_item(
    db: &DatabaseConnection,
    item_id: i64,
) -> Result<menu_item::Model> {
    let item = require_item(db, item_id).await?;
    if !item.available {
        return Err(Error::ItemUnavailable { name: item.name });
    }
    Ok(item)
}

/// Finds a menu item by exact name.
pub async fn get_item_by_name(
    db: &DatabaseConnection,
    name: &str,
) -> Result<Option<menu_item::Model>> {
    MenuItem::find()
        .filter(menu_item::Column::Name.eq(name))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Lists menu items grouped by category, then by name.
pub async fn list_items(db: &DatabaseConnection, filter: ItemFilter) -> Result<Vec<menu_item::Model>> {
    let mut query = MenuItem::find()
        .order_by_asc(menu_item::Column::CategoryId)
        .order_by_asc(menu_item::Column::Name);
    if let Some(category_id) = filter.category_id {
        query = query.filter(menu_item::Column::CategoryId.eq(category_id));
    }
    if let Some(available) = filter.available {
        query = query.filter(menu_item::Column::Available.eq(available));
    }
    query.all(db).await.map_err(Into::into)
}

/// Items that order forms may offer.
pub async fn available_items(db: &DatabaseConnection) -> Result<Vec<menu_item::Model>> {
    list_items(
        db,
        ItemFilter {
            available: Some(true),
            ..Default::default()
        },
    )
    .await
}

/// Removes an item from the menu together with every order line that used it.
/// Totals of the affected orders are recalculated.
pub async fn delete_item(db: &DatabaseConnection, item_id: i64) -> Result<()> {
    let txn = db.begin().await?;
    let existing = MenuItem::find_by_id(item_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("menu item", item_id))?;

    let affected: Vec<i64> = OrderLine::find()
        .select_only()
        .column(order_line::Column::OrderId)
        .filter(order_line::Column::MenuItemId.eq(item_id))
        .distinct()
        .into_tuple()
        .all(&txn)
        .await?;

    OrderLine::delete_many()
        .filter(order_line::Column::MenuItemId.eq(item_id))
        .exec(&txn)
        .await?;
    existing.delete(&txn).await?;

    for order_id in &affected {
        order::recalculate_total(&txn, *order_id).await?;
    }
    txn.commit().await?;
    debug!("Recalculated {} order(s) after item removal", affected.len());
    info!("Deleted menu item {item_id}");
    Ok(())
}
