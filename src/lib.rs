pub mod engine;
pub mod limits;
pub mod model;
pub mod observability;

pub use engine::{Engine, EngineError};
