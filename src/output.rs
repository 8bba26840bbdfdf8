//! Terminal output for command tables and boundary errors

pub mod human;

pub use human::HumanFormatter;
