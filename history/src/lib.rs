//! Form field history: storage, ranked restore suggestions and the restore
//! menu that follows the active page.

pub mod browse;
pub mod config;
pub mod context;
pub mod dates;
pub mod error;
pub mod factory;
pub mod menu;
pub mod rank;
pub mod resolve;
pub mod sanitize;
pub mod service;
pub mod store;
pub mod sync;
pub mod types;

pub use config::HistoryConfig;
pub use error::HistoryError;
pub use error::Result;
pub use rank::rank_for_host;
pub use resolve::resolve;
pub use service::ClickAction;
pub use service::RestoreMenuService;
pub use store::EntryStore;
pub use sync::Synchronizer;
