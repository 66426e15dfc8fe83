pub mod controller;
pub mod facade;
pub mod state;

pub use controller::ReconciliationEngine;
pub use facade::{ConnectionHealth, EngineHandle, EngineSnapshot};
pub use state::EngineState;
