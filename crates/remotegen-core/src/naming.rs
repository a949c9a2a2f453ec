// Identifier derivation for generated artifacts. Everything keyed by
// device id goes through here so paths, component names and manifest
// entries agree.

use heck::{ToShoutySnakeCase, ToUpperCamelCase};

use crate::error::CoreError;

/// Device ids become file names; reject anything that could escape the
/// generation root or produce an empty identifier.
pub fn check_device_id(device_id: &str) -> Result<(), CoreError> {
    let invalid = |why: &str| CoreError::InvalidDeviceConfig {
        device_id: device_id.to_owned(),
        message: why.to_owned(),
    };
    if device_id.trim().is_empty() {
        return Err(invalid("empty device id"));
    }
    if device_id.contains(['/', '\\']) || device_id.starts_with('.') {
        return Err(invalid("device id must not contain path separators"));
    }
    if device_id.contains(char::is_control) {
        return Err(invalid("device id must not contain control characters"));
    }
    if !device_id.chars().any(char::is_alphanumeric) {
        return Err(invalid("device id has no alphanumeric characters"));
    }
    Ok(())
}

fn pascal(device_id: &str) -> Result<String, CoreError> {
    let name = device_id.to_upper_camel_case();
    if name.is_empty() {
        return Err(CoreError::Template {
            message: format!("cannot derive an identifier from device id {device_id:?}"),
        });
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        Ok(format!("Device{name}"))
    } else {
        Ok(name)
    }
}

/// `living_room_tv` → `LivingRoomTvPage`
pub fn component_name(device_id: &str) -> Result<String, CoreError> {
    Ok(format!("{}Page", pascal(device_id)?))
}

/// `living_room_tv` → `useLivingRoomTvState`
pub fn hook_name(device_id: &str) -> Result<String, CoreError> {
    Ok(format!("use{}State", pascal(device_id)?))
}

/// `living_room_tv` → `LivingRoomTvState`
pub fn state_interface_name(device_id: &str) -> Result<String, CoreError> {
    Ok(format!("{}State", pascal(device_id)?))
}

/// `LgTvState` → `LG_TV_STATE_DEFAULTS`
pub fn defaults_const_name(interface_name: &str) -> String {
    format!("{}_DEFAULTS", interface_name.to_shouty_snake_case())
}

/// Free text made safe for a `//` line comment: runs of control characters
/// (newlines included) become a single space.
pub fn comment_text(text: &str) -> String {
    text.split(char::is_control)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Route a device page is mounted at.
pub fn route(device_id: &str) -> String {
    format!("/devices/{device_id}")
}
