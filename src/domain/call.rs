//! Call parameters, results, and history records

use std::fmt;

use alloy_primitives::{Address, Bytes, B256};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of EVM message call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CallType {
    #[default]
    Call,
    StaticCall,
    Create,
    Create2,
    DelegateCall,
}

impl CallType {
    pub const ALL: [CallType; 5] = [
        CallType::Call,
        CallType::StaticCall,
        CallType::Create,
        CallType::Create2,
        CallType::DelegateCall,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CallType::Call => "CALL",
            CallType::StaticCall => "STATICCALL",
            CallType::Create => "CREATE",
            CallType::Create2 => "CREATE2",
            CallType::DelegateCall => "DELEGATECALL",
        }
    }

    /// Unknown names fall back to `CALL`.
    pub fn parse(value: &str) -> CallType {
        let value = value.trim();
        CallType::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(value))
            .unwrap_or(CallType::Call)
    }

    pub fn index(&self) -> usize {
        CallType::ALL
            .iter()
            .position(|kind| kind == self)
            .unwrap_or(0)
    }

    pub fn from_index(index: usize) -> CallType {
        CallType::ALL.get(index).copied().unwrap_or_default()
    }

    pub fn is_create(&self) -> bool {
        matches!(self, CallType::Create | CallType::Create2)
    }
}

impl fmt::Display for CallType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<String> for CallType {
    fn from(value: String) -> Self {
        CallType::parse(&value)
    }
}

impl From<CallType> for String {
    fn from(value: CallType) -> Self {
        value.as_str().to_string()
    }
}

/// Editable parameter fields, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallField {
    CallType,
    Caller,
    Target,
    Value,
    InputData,
    GasLimit,
    Salt,
}

impl CallField {
    pub const ALL: [CallField; 7] = [
        CallField::CallType,
        CallField::Caller,
        CallField::Target,
        CallField::Value,
        CallField::InputData,
        CallField::GasLimit,
        CallField::Salt,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CallField::CallType => "Call Type",
            CallField::Caller => "Caller",
            CallField::Target => "Target",
            CallField::Value => "Value",
            CallField::InputData => "Input Data",
            CallField::GasLimit => "Gas Limit",
            CallField::Salt => "Salt",
        }
    }

    pub fn from_index(index: usize) -> Option<CallField> {
        CallField::ALL.get(index).copied()
    }
}

pub const DEFAULT_CALLER: &str = "0x0000000000000000000000000000000000000001";
pub const DEFAULT_TARGET: &str = "0x0000000000000000000000000000000000000002";
pub const DEFAULT_GAS_LIMIT: &str = "30000000";
pub const DEFAULT_SALT: &str =
    "0x0000000000000000000000000000000000000000000000000000000000000000";

/// Raw call parameters as edited in the UI. Every field always holds a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CallParams {
    pub call_type: CallType,
    pub caller: String,
    pub target: String,
    pub value: String,
    pub input_data: String,
    pub gas_limit: String,
    pub salt: String,
}

impl Default for CallParams {
    fn default() -> Self {
        Self {
            call_type: CallType::Call,
            caller: DEFAULT_CALLER.to_string(),
            target: DEFAULT_TARGET.to_string(),
            value: "0".to_string(),
            input_data: "0x".to_string(),
            gas_limit: DEFAULT_GAS_LIMIT.to_string(),
            salt: DEFAULT_SALT.to_string(),
        }
    }
}

impl CallParams {
    pub fn get(&self, field: CallField) -> &str {
        match field {
            CallField::CallType => self.call_type.as_str(),
            CallField::Caller => &self.caller,
            CallField::Target => &self.target,
            CallField::Value => &self.value,
            CallField::InputData => &self.input_data,
            CallField::GasLimit => &self.gas_limit,
            CallField::Salt => &self.salt,
        }
    }

    pub fn set(&mut self, field: CallField, value: impl Into<String>) {
        let value = value.into();
        match field {
            CallField::CallType => self.call_type = CallType::parse(&value),
            CallField::Caller => self.caller = value,
            CallField::Target => self.target = value,
            CallField::Value => self.value = value,
            CallField::InputData => self.input_data = value,
            CallField::GasLimit => self.gas_limit = value,
            CallField::Salt => self.salt = value,
        }
    }

    /// Copy one field from `defaults`.
    pub fn reset_field(&mut self, field: CallField, defaults: &CallParams) {
        self.set(field, defaults.get(field).to_string());
    }
}

/// One event emitted by executed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Outcome of an execution. Failures are values, not errors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallResult {
    pub success: bool,
    pub return_data: Bytes,
    pub gas_used: u64,
    pub gas_left: u64,
    pub error: Option<String>,
    pub logs: Vec<LogEntry>,
    pub deployed_address: Option<Address>,
}

impl CallResult {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn status_label(&self) -> &'static str {
        if self.success {
            "success"
        } else {
            "failed"
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub id: u64,
    pub params: CallParams,
    pub result: CallResult,
    pub timestamp: DateTime<Utc>,
}

/// Code deployed by a successful CREATE or CREATE2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contract {
    pub address: Address,
    pub code: Bytes,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_call_type_is_call() {
        assert_eq!(CallType::parse("create2"), CallType::Create2);
        assert_eq!(CallType::parse("SELFDESTRUCT"), CallType::Call);
        assert_eq!(CallType::from_index(99), CallType::Call);
    }

    #[test]
    fn test_reset_field_uses_defaults() {
        let defaults = CallParams::default();
        let mut params = CallParams::default();
        params.set(CallField::GasLimit, "");
        params.set(CallField::CallType, "CREATE");
        params.reset_field(CallField::GasLimit, &defaults);
        params.reset_field(CallField::CallType, &defaults);
        assert_eq!(params, defaults);
    }

    #[test]
    fn test_params_deserialize_unknown_call_type() {
        let params: CallParams =
            serde_json::from_str(r#"{"callType":"BOGUS","caller":"0x01"}"#).unwrap();
        assert_eq!(params.call_type, CallType::Call);
        assert_eq!(params.caller, "0x01");
        assert_eq!(params.gas_limit, DEFAULT_GAS_LIMIT);
    }
}
