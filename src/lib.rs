pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::CliConfig;

pub use adapters::{LocalCertificateStore, SmtpMailer, TokioPacer};
pub use config::{BatchConfig, Settings};
pub use crate::core::BatchController;
pub use domain::model::{Category, Recipient, RecipientGroup, RunSummary};
pub use render::HtmlRenderer;
pub use utils::error::{CampaignError, Result};
