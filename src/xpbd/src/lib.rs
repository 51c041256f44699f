pub mod coloring;
pub mod config;
pub mod constraint;
pub mod constraint_store;
pub mod controller_message;
pub mod dispatch;
pub mod error;
pub mod integrator;
pub mod object;
pub mod object_store;
pub mod physical_model;
pub mod pworld;
pub mod reconcile;
pub mod relax;
pub mod time_manager;

pub use protocol::V3;
