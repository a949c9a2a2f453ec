// remotegen-core: Device configuration to remote-control UI source pipeline.

pub mod batch;
pub mod classify;
pub mod config;
pub mod convert;
pub mod docs;
pub mod error;
pub mod family;
pub mod generator;
pub mod groups;
pub mod icons;
pub mod manifest;
pub mod model;
pub mod naming;
pub mod recovery;
pub mod schema;
pub mod source;
pub mod template;
pub mod validate;

mod fsutil;

// ── Primary re-exports ──────────────────────────────────────────────
pub use batch::{BatchOptions, BatchOrchestrator};
pub use config::{GeneratorConfig, IntrospectorConfig, ValidatorConfig};
pub use error::CoreError;
pub use family::{DeviceFamily, FamilyRegistry, StateSource};
pub use generator::{DeviceGenerator, GeneratedDevice, OutputLayout};
pub use manifest::ManifestIntegrator;
pub use recovery::{ErrorHandler, ErrorType, RecoveryAction, RecoveryPolicy, RetryLedger};
pub use schema::{Introspector, SchemaIntrospector, SchemaRef, SchemaStore};
pub use source::{ConfigSource, LocalSource, RemoteSource};
pub use template::TemplateGenerator;
pub use validate::{ComponentValidator, SourceValidator, ValidationReport};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    BatchResult, DeviceCommand, DeviceConfig, DeviceGroups, DevicePageEntry, GenerationResult,
    RemoteDeviceStructure, RouterManifest, ZoneId,
};
