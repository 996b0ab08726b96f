pub mod advice;
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod metadata;
pub mod model;
pub mod persistence;
pub mod render;
pub mod store;
pub mod view;

pub use advice::{AdviceClient, AdviceConfig, AdviceRequest};
pub use error::{ServiceError, ServiceResult};
pub use model::{DayEntry, Mood, Planner, PlannerPatch};
pub use persistence::{FileStore, KeyValueStore, MemoryStore, Persistence};
pub use store::{PlannerStore, StoreError};
