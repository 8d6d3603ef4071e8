pub mod call;
pub mod validate;

pub use call::{
    CallField, CallParams, CallResult, CallType, Contract, HistoryEntry, LogEntry,
    DEFAULT_GAS_LIMIT,
};
pub use validate::{validate_call, validate_field, CallRequest, InputParamError};
