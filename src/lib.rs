//! Siteboard: construction-site progress tracking core.
//!
//! The engine behind a site-supervision dashboard, with the UI stripped
//! away: a pure progress aggregator and an asynchronous store coordinator
//! that keeps a client-side task collection consistent with a remote
//! REST/JSON backend.
//!
//! | Module     | Responsibility                                           |
//! |------------|----------------------------------------------------------|
//! | `models`   | Tasks, subtasks, usage records, comments, summaries      |
//! | `progress` | Percentage / status derivation and dashboard rollups     |
//! | `api`      | `TaskApi` trait + reqwest client for the REST contract   |
//! | `store`    | `TaskStore` coordinator: CRUD, refetches, selection      |
//! | `events`   | Broadcast feed of fulfilled/rejected mutations           |
//! | `search`   | Debounced search-driven list refresh                     |
//! | `config`   | Base URL, timeouts, debounce window                      |
//! | `error`    | `ApiError` / `StoreError` taxonomies                     |

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod models;
pub mod progress;
pub mod search;
pub mod store;

pub use api::{HttpTaskApi, TaskApi};
pub use config::Config;
pub use error::{ApiError, StoreError};
pub use events::StoreEvent;
pub use store::TaskStore;
