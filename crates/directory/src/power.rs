//! IPSO Power Control payloads.
//!
//! Power switches expose object type `3312` with a boolean `OnOff` resource.
//! [`PowerState`] converts between that resource and [`InstanceData`].

use serde_json::{json, Value};

use crate::{DirectoryError, InstanceData, ObjectTypeId};

/// IPSO object id of Power Control.
pub const POWER_CONTROL_OBJECT_TYPE: &str = "3312";

/// Name of the on/off resource inside a Power Control instance.
const ON_OFF: &str = "OnOff";

/// Returns the [`ObjectTypeId`] of Power Control.
pub fn power_control_object_type() -> ObjectTypeId {
    ObjectTypeId(POWER_CONTROL_OBJECT_TYPE.to_string())
}

/// Switch position of a Power Control instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PowerState {
    /// `true` when the switch is on.
    pub on: bool,
}

impl PowerState {
    /// Switch on.
    pub const ON: Self = Self { on: true };
    /// Switch off.
    pub const OFF: Self = Self { on: false };

    /// Encodes the state as an instance payload.
    pub fn to_instance_data(self) -> InstanceData {
        InstanceData::from_json(&json!({ ON_OFF: self.on }))
    }

    /// Reads the state from an instance payload.
    pub fn from_instance_data(data: &InstanceData) -> Result<Self, DirectoryError> {
        match data.to_json()?.get(ON_OFF) {
            Some(Value::Bool(on)) => Ok(Self { on: *on }),
            Some(other) => Err(DirectoryError::protocol(format!(
                "`{ON_OFF}` is {other}, expected a boolean"
            ))),
            None => Err(DirectoryError::protocol(format!(
                "power control payload has no `{ON_OFF}` resource"
            ))),
        }
    }
}
