/// Table status derivation shared by every lifecycle
pub mod coordinator;

/// Customer registry
pub mod customer;

/// Menu categories and items
pub mod menu;

/// Orders, order lines and totals
pub mod order;

/// Reservation booking and status transitions
pub mod reservation;

/// Table registry, walk-in seating and release
pub mod table;

/// Booking checks: capacity, schedule, table status and conflicts
pub mod validation;
