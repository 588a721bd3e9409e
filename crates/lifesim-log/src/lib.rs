//! The durable side of the Lifesim notification flow.
//!
//! Events leave the notification pipeline on `addToLog`; this crate is where
//! they land and how they survive a restart.
//!
//! # Modules
//!
//! - [`log_store`] -- Append-only [`LogStore`] fed by `addToLog`
//! - [`viewer`] -- [`LogViewer`] turning icon clicks into `logOpened`
//! - [`save_store`] -- Load/save/clear of serialized blobs under a key
//! - [`error`] -- [`LogError`]
//!
//! [`LogStore`]: log_store::LogStore
//! [`LogViewer`]: viewer::LogViewer
//! [`LogError`]: error::LogError

pub mod error;
pub mod log_store;
pub mod save_store;
pub mod viewer;

pub use error::LogError;
pub use log_store::{LogEntry, LogStore, SavedLog};
pub use save_store::{FileSaveStore, MemorySaveStore, SaveStore};
pub use viewer::LogViewer;
