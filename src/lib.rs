//! Lending CRUD: table-driven REST backend over PostgreSQL.

pub mod config;
pub mod error;
pub mod handlers;
pub mod import;
pub mod middleware;
pub mod migration;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;
pub mod telemetry;

pub use config::{builtin_model, load_model, resolve, ModelConfig, ResolvedEntity, ResolvedModel};
pub use error::{AppError, ConfigError};
pub use import::{import_csv, ImportError};
pub use migration::apply_schema;
pub use routes::{build_router, common_routes, entity_routes};
pub use service::CrudService;
pub use settings::{LogFormat, Settings};
pub use state::AppState;
pub use store::{connect, ensure_database_exists};
pub use telemetry::init_tracing;
