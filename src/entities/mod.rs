//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod category;
pub mod customer;
pub mod dining_table;
pub mod menu_item;
pub mod order;
pub mod order_line;
pub mod reservation;

// Re-export specific types to avoid conflicts
pub use category::{Entity as Category, Model as CategoryModel, Station};
pub use customer::{Column as CustomerColumn, Entity as Customer, Model as CustomerModel};
pub use dining_table::{
    Column as DiningTableColumn, Entity as DiningTable, Location, Model as DiningTableModel,
    TableStatus,
};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use order::{
    Column as OrderColumn, Entity as Order, Model as OrderModel, OrderKind, OrderStatus,
};
pub use order_line::{Column as OrderLineColumn, Entity as OrderLine, Model as OrderLineModel};
pub use reservation::{
    Column as ReservationColumn, Entity as Reservation, Model as ReservationModel,
    ReservationStatus,
};
