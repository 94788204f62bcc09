pub mod app;
pub mod clock;
pub mod config;
pub mod dates;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod state;
pub mod storage;
pub mod store;
pub mod ui;
pub mod view;

pub use app::router;
pub use config::Config;
pub use state::AppState;
pub use storage::TimeRepository;
pub use store::{FileStore, KeyValueStore, MemoryStore};
pub use view::WeekView;
