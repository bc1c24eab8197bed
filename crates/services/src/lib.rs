#![forbid(unsafe_code)]

pub mod app_services;
pub mod auth_gate;
pub mod catalog;
pub mod config;
pub mod content_repository;
pub mod error;
pub mod progress_service;
pub mod style_asset;
pub mod user_session;

pub use app_services::AppServices;
pub use auth_gate::AuthGate;
pub use catalog::SharedCatalog;
pub use config::{AppConfig, CatalogMode};
pub use content_repository::ContentRepository;
pub use error::{AuthError, ConfigError, ContentError, ProgressError};
pub use progress_service::ProgressService;
pub use style_asset::Stylesheet;
pub use user_session::UserSession;
