use num_enum::{IntoPrimitive, TryFromPrimitive};

use crate::data::string_size;
use crate::Typed;

pub const SPOE_ACT_T_SET_VAR: u8 = 1;
pub const SPOE_ACT_T_UNSET_VAR: u8 = 2;

pub const SPOE_SCOPE_PROC: u8 = 0;
pub const SPOE_SCOPE_SESS: u8 = 1;
pub const SPOE_SCOPE_TXN: u8 = 2;
pub const SPOE_SCOPE_REQ: u8 = 3;
pub const SPOE_SCOPE_RES: u8 = 4;

/// The action type, as carried on the wire in front of the argument count.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum Type {
    SetVar = SPOE_ACT_T_SET_VAR,
    UnsetVar = SPOE_ACT_T_UNSET_VAR,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
pub enum Scope {
    Process = SPOE_SCOPE_PROC,
    Session = SPOE_SCOPE_SESS,
    Transaction = SPOE_SCOPE_TXN,
    Request = SPOE_SCOPE_REQ,
    Response = SPOE_SCOPE_RES,
}

/// An action carried in an AGENT-ACK frame, applied by HAProxy to the stream's variables.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    SetVar {
        scope: Scope,
        name: String,
        value: Typed,
    },
    UnsetVar {
        scope: Scope,
        name: String,
    },
}

impl Action {
    pub fn set_var<S: Into<String>, V: Into<Typed>>(scope: Scope, name: S, value: V) -> Self {
        Action::SetVar {
            scope,
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn unset_var<S: Into<String>>(scope: Scope, name: S) -> Self {
        Action::UnsetVar {
            scope,
            name: name.into(),
        }
    }

    /// Returns the size in bytes of this action once encoded.
    pub fn size(&self) -> usize {
        // action type byte + argc byte + scope byte
        const HEADER_SIZE: usize = 3;

        match self {
            Action::SetVar { name, value, .. } => {
                HEADER_SIZE + string_size(name) + value.size()
            }
            Action::UnsetVar { name, .. } => HEADER_SIZE + string_size(name),
        }
    }
}
