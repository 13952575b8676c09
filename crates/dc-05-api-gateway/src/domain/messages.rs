//! Dataspace protocol message validation.
//!
//! Each inbound message must carry the fixed `@context`, the `@type` the route
//! expects, and its required fields as strings. [`Message`] checks the
//! envelope; the `read` constructors below pull out the typed content.

use serde_json::Value;
use shared_types::{fields, CONTEXT_KEY, DSP_CONTEXT, TYPE_KEY};

/// A message body whose envelope has been checked.
pub struct Message<'a> {
    body: &'a Value,
}

impl<'a> Message<'a> {
    pub fn open(body: &'a Value, expected_type: &str) -> Result<Self, String> {
        if !body.is_object() {
            return Err("message must be a JSON object".into());
        }
        let message = Self { body };
        if message.optional(CONTEXT_KEY)?.as_deref() != Some(DSP_CONTEXT) {
            return Err(format!("{} must be '{}'", CONTEXT_KEY, DSP_CONTEXT));
        }
        if message.optional(TYPE_KEY)?.as_deref() != Some(expected_type) {
            return Err(format!("{} must be '{}'", TYPE_KEY, expected_type));
        }
        Ok(message)
    }

    /// A string field that must be present.
    pub fn required(&self, field: &str) -> Result<String, String> {
        self.optional(field)?
            .ok_or_else(|| format!("{} is required", field))
    }

    /// A string field that may be absent, but must be a string when present.
    pub fn optional(&self, field: &str) -> Result<Option<String>, String> {
        match self.body.get(field) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(format!("{} must be a string", field)),
        }
    }

    /// A field of any type that must be present.
    pub fn present(&self, field: &str) -> Result<&'a Value, String> {
        match self.body.get(field) {
            None | Some(Value::Null) => Err(format!("{} is required", field)),
            Some(value) => Ok(value),
        }
    }

    /// A field of any type that may be absent.
    pub fn any(&self, field: &str) -> Option<&'a Value> {
        self.body.get(field).filter(|v| !v.is_null())
    }

    /// An array field that may be absent.
    pub fn optional_array(&self, field: &str) -> Result<Vec<Value>, String> {
        match self.body.get(field) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(items)) => Ok(items.clone()),
            Some(_) => Err(format!("{} must be an array", field)),
        }
    }
}

/// `ContractRequestMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractRequest {
    pub provider_pid: Option<String>,
    pub consumer_pid: String,
    pub callback_address: String,
}

impl ContractRequest {
    pub fn read(m: &Message) -> Result<Self, String> {
        m.present(fields::OFFER)?;
        Ok(Self {
            provider_pid: m.optional(fields::PROVIDER_PID)?,
            consumer_pid: m.required(fields::CONSUMER_PID)?,
            callback_address: m.required(fields::CALLBACK_ADDRESS)?,
        })
    }
}

/// `ContractOfferMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractOffer {
    pub provider_pid: String,
    pub consumer_pid: Option<String>,
    pub callback_address: String,
}

impl ContractOffer {
    pub fn read(m: &Message) -> Result<Self, String> {
        m.present(fields::OFFER)?;
        Ok(Self {
            provider_pid: m.required(fields::PROVIDER_PID)?,
            consumer_pid: m.optional(fields::CONSUMER_PID)?,
            callback_address: m.required(fields::CALLBACK_ADDRESS)?,
        })
    }
}

/// Both pids, as carried by most in-process messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PidPair {
    pub provider_pid: String,
    pub consumer_pid: String,
}

impl PidPair {
    pub fn read(m: &Message) -> Result<Self, String> {
        Ok(Self {
            provider_pid: m.required(fields::PROVIDER_PID)?,
            consumer_pid: m.required(fields::CONSUMER_PID)?,
        })
    }
}

/// `ContractAgreementMessage`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAgreement {
    pub pids: PidPair,
    pub callback_address: String,
}

impl ContractAgreement {
    pub fn read(m: &Message) -> Result<Self, String> {
        m.present(fields::AGREEMENT)?;
        Ok(Self {
            pids: PidPair::read(m)?,
            callback_address: m.required(fields::CALLBACK_ADDRESS)?,
        })
    }
}

/// `ContractNegotiationEventMessage` restricted to one event type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegotiationEventMessage {
    pub pids: PidPair,
    pub event_type: String,
}

impl NegotiationEventMessage {
    pub fn read(m: &Message, allowed: &str) -> Result<Self, String> {
        let pids = PidPair::read(m)?;
        let event_type = m.required(fields::EVENT_TYPE)?;
        if event_type != allowed {
            return Err(format!("{} must be '{}'", fields::EVENT_TYPE, allowed));
        }
        Ok(Self { pids, event_type })
    }
}

/// Termination (and transfer suspension) with optional code and reasons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Termination {
    pub pids: PidPair,
    pub code: Option<String>,
    pub reasons: Vec<Value>,
}

impl Termination {
    pub fn read(m: &Message) -> Result<Self, String> {
        Ok(Self {
            pids: PidPair::read(m)?,
            code: m.optional(fields::CODE)?,
            reasons: m.optional_array(fields::REASON)?,
        })
    }
}

/// `TransferRequestMessage`.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequestMessage {
    pub provider_pid: Option<String>,
    pub consumer_pid: String,
    pub agreement_id: String,
    pub format: String,
    pub data_address: Option<Value>,
    pub callback_address: String,
}

impl TransferRequestMessage {
    pub fn read(m: &Message) -> Result<Self, String> {
        Ok(Self {
            provider_pid: m.optional(fields::PROVIDER_PID)?,
            consumer_pid: m.required(fields::CONSUMER_PID)?,
            agreement_id: m.required(fields::AGREEMENT_ID)?,
            format: m.required(fields::FORMAT)?,
            data_address: m.any(fields::DATA_ADDRESS).cloned(),
            callback_address: m.required(fields::CALLBACK_ADDRESS)?,
        })
    }
}
