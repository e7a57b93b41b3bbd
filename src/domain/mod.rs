//! Cafeteria domain: value objects, aggregates, events and access control.
pub mod access;
pub mod aggregates;
pub mod events;
pub mod value_objects;
