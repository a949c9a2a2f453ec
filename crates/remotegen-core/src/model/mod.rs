// ── Domain model ──
//
// Canonical types shared by every stage of the pipeline: the command
// description going in, the zone/structure intermediate form, and the
// manifest and outcome records coming out.

pub mod action;
pub mod command;
pub mod group;
pub mod manifest;
pub mod result;
pub mod structure;
pub mod zone;

// ── Re-exports ──────────────────────────────────────────────────────
// Flat access: `use remotegen_core::model::*` gives you everything.

pub use action::{
    ActionIcon, ControlKind, LOW_ICON_CONFIDENCE, ProcessedAction, ProcessedParameter, UiHints,
};
pub use command::{CommandParameter, DEFAULT_GROUP, DeviceCommand, DeviceConfig, ParameterType};
pub use group::{DeviceGroup, DeviceGroups, GroupAction};
pub use manifest::{DevicePageEntry, MANIFEST_API_VERSION, RouterManifest};
pub use result::{BatchResult, GenerationResult, success_rate};
pub use structure::{
    ActionHandler, FieldType, RemoteDeviceStructure, SpecialCase, StateDefinition, StateField,
};
pub use zone::{
    NavigationCluster, PointerPad, PowerButton, RemoteZone, SliderSpec, VolumeControl,
    ZoneContent, ZoneControl, ZoneId, ZoneLayout, ZoneType,
};
