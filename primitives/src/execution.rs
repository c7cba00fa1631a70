//! Call boundary types: frames, outcomes, receipts, events, and logs.
//!
//! Every outbound invocation an account makes is described by a
//! [`CallFrame`] and answered with a [`CallOutcome`]. The calling convention
//! stays behind the host; accounts only see success plus opaque return data.

use crate::gas::GasMeter;
use crate::types::{Address, Amount, Gas};

/// Identity and budget of the party invoking an account entry point.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// The immediate caller (driver, owner, or anyone).
    pub caller: Address,
    /// Budget for this entry point; drivers read `consumed()` afterwards.
    pub meter: GasMeter,
}

impl CallContext {
    pub fn new(caller: Address, gas: Gas) -> Self {
        Self {
            caller,
            meter: GasMeter::new(gas),
        }
    }

    /// Unlimited budget (for testing only).
    pub fn unlimited(caller: Address) -> Self {
        Self {
            caller,
            meter: GasMeter::unlimited(),
        }
    }
}

/// One outbound invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallFrame {
    /// Identity the callee observes as its caller.
    pub caller: Address,
    /// Call target.
    pub target: Address,
    /// Native funds moved with the call.
    pub value: Amount,
    /// Opaque calldata.
    pub data: Vec<u8>,
    /// Gas forwarded to the callee.
    pub gas: Gas,
    /// Set on the privileged system-call path.
    pub is_system: bool,
}

impl CallFrame {
    /// A plain call carrying calldata.
    pub fn call(caller: Address, target: Address, value: Amount, data: Vec<u8>, gas: Gas) -> Self {
        Self {
            caller,
            target,
            value,
            data,
            gas,
            is_system: false,
        }
    }

    /// A plain value transfer with empty calldata.
    pub fn transfer(caller: Address, target: Address, value: Amount, gas: Gas) -> Self {
        Self {
            caller,
            target,
            value,
            data: Vec::new(),
            gas,
            is_system: false,
        }
    }

    /// Mark this frame as a system call.
    pub fn system(mut self) -> Self {
        self.is_system = true;
        self
    }
}

/// Structured result of an outbound invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CallOutcome {
    /// Whether the callee completed without reverting.
    pub success: bool,
    /// Raw return data (revert data on failure).
    pub return_data: Vec<u8>,
    /// Gas the callee consumed, never more than it was forwarded.
    pub gas_used: Gas,
}

impl CallOutcome {
    pub fn success(return_data: Vec<u8>, gas_used: Gas) -> Self {
        Self {
            success: true,
            return_data,
            gas_used,
        }
    }

    pub fn failure(return_data: Vec<u8>, gas_used: Gas) -> Self {
        Self {
            success: false,
            return_data,
            gas_used,
        }
    }

    /// A failure carrying a UTF-8 reason as revert data.
    pub fn revert(reason: &str, gas_used: Gas) -> Self {
        Self::failure(reason.as_bytes().to_vec(), gas_used)
    }
}

/// Per-intent receipt produced by a driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// Whether the intent was authorized and dispatched successfully.
    pub success: bool,
    /// Gas consumed across all phases.
    pub gas_used: Gas,
    /// `ErrorCode` of the failure, `0` on success.
    pub result_code: u32,
    /// Return data from the dispatch (or the failed dispatch).
    pub return_data: Vec<u8>,
}

/// Emitted event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    /// Address that emitted the event.
    pub emitter: Address,
    /// Event type identifier.
    pub event_type: String,
    /// Key-value attributes.
    pub attributes: Vec<EventAttribute>,
}

impl Event {
    pub fn new(emitter: Address, event_type: &str) -> Self {
        Self {
            emitter,
            event_type: event_type.to_string(),
            attributes: Vec::new(),
        }
    }

    /// Builder-style attribute append.
    pub fn with(mut self, key: &str, value: impl Into<Vec<u8>>) -> Self {
        self.attributes.push(EventAttribute {
            key: key.to_string(),
            value: value.into(),
        });
        self
    }

    /// Look up an attribute value by key.
    pub fn attribute(&self, key: &str) -> Option<&[u8]> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_slice())
    }
}

/// A single key-value attribute within an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventAttribute {
    /// Attribute key (UTF-8).
    pub key: String,
    /// Attribute value (arbitrary bytes).
    pub value: Vec<u8>,
}

/// Debug log line recorded through the host.
///
/// Logs are diagnostics only. Accounts never branch on them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    /// Log level (0=trace, 1=debug, 2=info, 3=warn, 4=error).
    pub level: u32,
    /// Log message.
    pub message: String,
}

pub const LOG_DEBUG: u32 = 1;
pub const LOG_INFO: u32 = 2;
pub const LOG_WARN: u32 = 3;
