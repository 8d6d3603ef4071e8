//! Per-field and whole-call validation of raw parameters

use alloy_primitives::{Address, Bytes, B256, U256};
use thiserror::Error;

use super::call::{CallField, CallParams, CallType};

/// A user-correctable input problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", details_suffix(.details))]
pub struct InputParamError {
    pub field: CallField,
    pub message: String,
    pub details: Option<String>,
}

impl InputParamError {
    pub fn new(field: CallField, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Short message shown next to the field.
    pub fn ui_message(&self) -> &str {
        &self.message
    }
}

/// Maps a parser failure to the field's error, keeping the parser text as details.
fn invalid(field: CallField) -> impl Fn(String) -> InputParamError {
    move |details| {
        let message = match field {
            CallField::CallType => "Invalid call type",
            CallField::Caller => "Invalid caller address",
            CallField::Target => "Invalid target address",
            CallField::Value => "Invalid value",
            CallField::InputData => "Invalid input data",
            CallField::GasLimit => "Invalid gas limit",
            CallField::Salt => "Invalid salt",
        };
        InputParamError::new(field, message).with_details(details)
    }
}

fn details_suffix(details: &Option<String>) -> String {
    match details {
        Some(details) if !details.is_empty() => format!(": {details}"),
        _ => String::new(),
    }
}

/// Typed call request produced by successful validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub kind: CallType,
    pub caller: Address,
    pub target: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: u64,
    pub salt: B256,
}

impl TryFrom<&CallParams> for CallRequest {
    type Error = InputParamError;

    fn try_from(params: &CallParams) -> Result<Self, Self::Error> {
        validate_call(params)
    }
}

/// Validate one raw field value, as done on save in the editor.
pub fn validate_field(field: CallField, raw: &str) -> Result<(), InputParamError> {
    let optional = matches!(field, CallField::Target | CallField::Salt);
    if optional && raw.trim().is_empty() {
        return Ok(());
    }
    match field {
        CallField::CallType => Ok(()),
        CallField::Caller | CallField::Target => parse_address(raw).map(|_| ()),
        CallField::Value => parse_u256(raw).map(|_| ()),
        CallField::InputData => parse_hex_bytes(raw).map(|_| ()),
        CallField::GasLimit => parse_gas(raw).map(|_| ()),
        CallField::Salt => parse_salt(raw).map(|_| ()),
    }
    .map_err(invalid(field))
}

/// Validate every field plus the cross-field rules of the selected call type.
pub fn validate_call(params: &CallParams) -> Result<CallRequest, InputParamError> {
    for field in CallField::ALL {
        validate_field(field, params.get(field))?;
    }

    let kind = params.call_type;
    let caller = parse_address(&params.caller).map_err(invalid(CallField::Caller))?;
    let value = parse_u256(&params.value).map_err(invalid(CallField::Value))?;
    let input = parse_hex_bytes(&params.input_data).map_err(invalid(CallField::InputData))?;
    let gas_limit = parse_gas(&params.gas_limit).map_err(invalid(CallField::GasLimit))?;

    let target = if kind.is_create() || params.target.trim().is_empty() {
        None
    } else {
        Some(parse_address(&params.target).map_err(invalid(CallField::Target))?)
    };
    if !kind.is_create() && target.is_none() {
        return Err(InputParamError::new(
            CallField::Target,
            format!("Target address is required for {kind}"),
        ));
    }

    let salt = if params.salt.trim().is_empty() {
        if kind == CallType::Create2 {
            return Err(InputParamError::new(CallField::Salt, "Salt is required for CREATE2"));
        }
        B256::ZERO
    } else {
        parse_salt(&params.salt).map_err(invalid(CallField::Salt))?
    };

    if matches!(kind, CallType::StaticCall | CallType::DelegateCall) && !value.is_zero() {
        return Err(InputParamError::new(
            CallField::Value,
            format!("Value must be zero for {kind}"),
        ));
    }

    Ok(CallRequest {
        kind,
        caller,
        target,
        value,
        input,
        gas_limit,
        salt,
    })
}

pub fn parse_address(raw: &str) -> Result<Address, String> {
    let raw = raw.trim();
    let Some(body) = strip_hex_prefix(raw) else {
        return Err("must start with 0x".to_string());
    };
    if body.len() != 40 {
        return Err(format!("expected 40 hex characters, got {}", body.len()));
    }
    raw.parse::<Address>().map_err(|err| err.to_string())
}

/// Decimal or `0x`-prefixed hex.
pub fn parse_u256(raw: &str) -> Result<U256, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("value is empty".to_string());
    }
    match strip_hex_prefix(raw) {
        Some("") => Err("no digits after 0x".to_string()),
        Some(body) => U256::from_str_radix(body, 16).map_err(|err| err.to_string()),
        None => U256::from_str_radix(raw, 10).map_err(|err| err.to_string()),
    }
}

/// Even-length hex with optional `0x`. Empty means no data.
pub fn parse_hex_bytes(raw: &str) -> Result<Bytes, String> {
    let raw = raw.trim();
    let body = strip_hex_prefix(raw).unwrap_or(raw);
    hex::decode(body)
        .map(Bytes::from)
        .map_err(|err| err.to_string())
}

pub fn parse_gas(raw: &str) -> Result<u64, String> {
    let gas = raw
        .trim()
        .replace('_', "")
        .parse::<u64>()
        .map_err(|err| err.to_string())?;
    if gas == 0 {
        return Err("must be greater than zero".to_string());
    }
    Ok(gas)
}

/// Up to 32 bytes of hex, left-padded.
pub fn parse_salt(raw: &str) -> Result<B256, String> {
    let bytes = parse_hex_bytes(raw)?;
    if bytes.len() > 32 {
        return Err(format!("salt is {} bytes, maximum is 32", bytes.len()));
    }
    Ok(B256::left_padding_from(&bytes))
}

fn strip_hex_prefix(raw: &str) -> Option<&str> {
    raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_messages() {
        let err = validate_field(CallField::Caller, "0x1234").unwrap_err();
        assert_eq!(err.ui_message(), "Invalid caller address");
        assert!(err.to_string().starts_with("Invalid caller address: "));

        assert!(validate_field(CallField::Value, "1000").is_ok());
        assert!(validate_field(CallField::Value, "0xff").is_ok());
        assert!(validate_field(CallField::Value, "-1").is_err());
        assert!(validate_field(CallField::InputData, "0xabc").is_err());
        assert!(validate_field(CallField::InputData, "").is_ok());
        assert!(validate_field(CallField::GasLimit, "0").is_err());
        assert!(validate_field(CallField::Target, "").is_ok());
    }

    #[test]
    fn test_display_omits_empty_details() {
        let bare = InputParamError::new(CallField::Salt, "Salt required");
        assert_eq!(bare.to_string(), "Salt required");
        assert_eq!(bare.clone().with_details("").to_string(), "Salt required");
        assert_eq!(
            bare.with_details("odd length").to_string(),
            "Salt required: odd length"
        );
    }

    #[test]
    fn test_default_params_validate() {
        let request = validate_call(&CallParams::default()).unwrap();
        assert_eq!(request.kind, CallType::Call);
        assert_eq!(request.gas_limit, 30_000_000);
        assert!(request.target.is_some());
    }

    #[test]
    fn test_cross_field_rules() {
        let mut params = CallParams::default();
        params.target.clear();
        let err = validate_call(&params).unwrap_err();
        assert_eq!(err.field, CallField::Target);

        params.call_type = CallType::Create;
        assert!(validate_call(&params).unwrap().target.is_none());

        params.call_type = CallType::Create2;
        params.salt.clear();
        assert_eq!(validate_call(&params).unwrap_err().field, CallField::Salt);

        let mut params = CallParams::default();
        params.call_type = CallType::StaticCall;
        params.value = "1".into();
        assert_eq!(validate_call(&params).unwrap_err().field, CallField::Value);
    }

    #[test]
    fn test_short_salt_is_left_padded() {
        let salt = parse_salt("0x01").unwrap();
        assert_eq!(salt.0[31], 1);
        assert!(parse_salt(&format!("0x{}", "00".repeat(33))).is_err());
    }
}
