pub mod state_file;

pub use state_file::{CallStore, JsonStateFile, PersistedCall, StateFile, StoreError};
