pub mod attachment;
pub mod campaign;
pub mod controller;

pub use crate::domain::model::{BatchReport, RunSummary};
pub use crate::utils::error::Result;
pub use controller::BatchController;
