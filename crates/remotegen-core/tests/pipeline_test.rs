#![allow(clippy::unwrap_used)]

// End-to-end runs of the generation pipeline against an in-memory
// configuration source.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use remotegen_core::groups::derive_groups;
use remotegen_core::model::{FieldType, StateDefinition, StateField};
use remotegen_core::{
    BatchOptions, BatchOrchestrator, ConfigSource, CoreError, DeviceCommand, DeviceConfig,
    DeviceGenerator, DeviceGroups, ErrorType, GeneratorConfig, Introspector, RecoveryAction,
    RecoveryPolicy, SchemaIntrospector, SchemaRef,
};

// ── Fixtures ────────────────────────────────────────────────────────

#[derive(Default)]
struct MemorySource {
    configs: BTreeMap<String, DeviceConfig>,
    unreachable: HashSet<String>,
    /// Connection failures still to report before a device answers.
    flaky: Mutex<HashMap<String, u32>>,
}

impl MemorySource {
    fn with(mut self, config: DeviceConfig) -> Self {
        self.configs.insert(config.device_id.clone(), config);
        self
    }

    fn unreachable(mut self, device_id: &str) -> Self {
        self.unreachable.insert(device_id.to_owned());
        self
    }

    fn flaky(self, device_id: &str, failures: u32) -> Self {
        self.flaky.lock().unwrap().insert(device_id.to_owned(), failures);
        self
    }
}

#[async_trait]
impl ConfigSource for MemorySource {
    fn describe(&self) -> String {
        "memory".into()
    }

    async fn list_device_ids(&self) -> Result<Vec<String>, CoreError> {
        Ok(self.configs.keys().cloned().collect())
    }

    async fn fetch_device_config(&self, device_id: &str) -> Result<DeviceConfig, CoreError> {
        let flaking = match self.flaky.lock().unwrap().get_mut(device_id) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            }
            _ => false,
        };
        if flaking || self.unreachable.contains(device_id) {
            return Err(CoreError::ConnectionFailed {
                source_name: "memory".into(),
                reason: "connection refused".into(),
            });
        }
        self.configs
            .get(device_id)
            .cloned()
            .ok_or_else(|| CoreError::DeviceNotFound {
                device_id: device_id.into(),
            })
    }

    async fn fetch_device_groups(&self, device_id: &str) -> Result<DeviceGroups, CoreError> {
        let config = self.fetch_device_config(device_id).await?;
        Ok(derive_groups(&config))
    }

    async fn check_reachable(&self) -> Result<(), CoreError> {
        Ok(())
    }
}

/// Introspector that always answers with a fixed two-field shape.
struct FixedSchema;

#[async_trait]
impl SchemaIntrospector for FixedSchema {
    async fn introspect(&self, schema: &SchemaRef) -> Result<StateDefinition, CoreError> {
        let field = |name: &str, field_type: FieldType| StateField {
            name: name.into(),
            field_type,
            optional: false,
            description: String::new(),
            default_value: None,
        };
        Ok(StateDefinition {
            interface_name: schema.type_name.clone(),
            fields: vec![field("power", FieldType::Text), field("volume", FieldType::Number)],
            imports: Vec::new(),
            extends: None,
        })
    }
}

fn command(action: &str, group: Option<&str>) -> DeviceCommand {
    DeviceCommand {
        action: action.into(),
        location: "den".into(),
        description: String::new(),
        group: group.map(str::to_owned),
        params: None,
    }
}

fn device(id: &str, class: &str, actions: &[&str]) -> DeviceConfig {
    DeviceConfig {
        device_id: id.into(),
        device_name: id.to_uppercase(),
        device_class: class.into(),
        commands: actions
            .iter()
            .map(|a| ((*a).to_owned(), command(a, None)))
            .collect(),
        state_schema: None,
    }
}

fn generator(source: MemorySource, root: &std::path::Path) -> Arc<DeviceGenerator> {
    let config = GeneratorConfig {
        output_dir: root.to_path_buf(),
        ..GeneratorConfig::default()
    };
    let introspector = Introspector::new(Arc::new(FixedSchema), Duration::from_secs(5));
    Arc::new(DeviceGenerator::new(Arc::new(source), &config, introspector).with_manifest())
}

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_owned()).collect()
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn single_volume_command_generates_one_page() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::default().with(device("den_ir", "ir_remote", &["volume_up"]));
    let generator = generator(source, dir.path());

    let summary = BatchOrchestrator::new(generator.clone(), BatchOptions::default())
        .process_many(&ids(&["den_ir"]))
        .await;

    assert_eq!(summary.total_processed, 1);
    assert_eq!(summary.successful, 1);
    assert!((summary.success_rate - 100.0).abs() < f64::EPSILON);

    let page = std::fs::read_to_string(generator.layout().page("den_ir")).unwrap();
    assert!(page.contains(r#"<RemoteZone id="volume""#));
    assert!(page.contains(r#""volume_up""#));
    assert!(generator.layout().hook("den_ir").unwrap().is_file());

    let manifest = generator.manifest().unwrap().load().await.unwrap().unwrap();
    assert_eq!(manifest.total_devices, 1);
    assert_eq!(manifest.devices[0].route, "/devices/den_ir");
    assert_eq!(manifest.devices[0].file_path, "pages/den_ir.tsx");
}

#[tokio::test(start_paused = true)]
async fn connection_failure_stops_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::default()
        .with(device("d1", "ir_remote", &["power_on"]))
        .with(device("d3", "ir_remote", &["power_on"]))
        .unreachable("d2");
    let generator = generator(source, dir.path());
    let options = BatchOptions {
        max_concurrency: 1,
        continue_on_error: false,
        ..BatchOptions::default()
    };

    let summary = BatchOrchestrator::new(generator.clone(), options)
        .process_many(&ids(&["d1", "d2", "d3"]))
        .await;

    assert_eq!(summary.total_processed, 2);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 0);
    assert!(summary.aborted);
    assert_eq!(summary.failed_devices, vec!["d2".to_owned()]);
    assert!(summary.results.iter().all(|r| r.device_id != "d3"));
    assert!(!generator.layout().page("d3").exists());

    // Three retries at 1s, 2s and 4s, then the abort.
    assert_eq!(summary.handled_errors.len(), 4);
    assert!(summary.processing_time >= Duration::from_secs(7));
}

#[tokio::test]
async fn unsupported_family_is_skipped_not_failed() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::default()
        .with(device("toaster", "toaster_oven", &["power_on"]))
        .with(device("den_ir", "ir_remote", &["power_on"]));
    let options = BatchOptions {
        continue_on_error: false,
        batch_delay: Duration::ZERO,
        max_concurrency: 1,
        ..BatchOptions::default()
    };

    let summary = BatchOrchestrator::new(generator(source, dir.path()), options)
        .process_many(&ids(&["toaster", "den_ir"]))
        .await;

    assert_eq!(summary.total_processed, 2);
    assert_eq!(summary.successful, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failed, 0);
    assert!(summary.failed_devices.is_empty());
    assert!((summary.success_rate - 50.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn shared_schema_is_written_once() {
    let dir = tempfile::tempdir().unwrap();
    let tv = |id: &str| DeviceConfig {
        state_schema: Some("home.models:TvState".into()),
        ..device(id, "network_display", &["power_on", "mute"])
    };
    let generator = generator(
        MemorySource::default().with(tv("den_tv")).with(tv("bedroom_tv")),
        dir.path(),
    );
    let orchestrator = BatchOrchestrator::new(generator.clone(), BatchOptions::default());

    let summary = orchestrator.process_many(&ids(&["den_tv", "bedroom_tv"])).await;
    assert_eq!(summary.successful, 2);

    let schema_path = dir.path().join("schemas").join("home_models__TvState.ts");
    let creators = summary
        .results
        .iter()
        .filter(|r| r.extra_files.contains(&schema_path))
        .count();
    assert_eq!(creators, 1);

    let hook = std::fs::read_to_string(generator.layout().hook("den_tv").unwrap()).unwrap();
    assert!(hook.contains(r#"from "../schemas/home_models__TvState""#));

    std::fs::write(&schema_path, "// edited by hand\n").unwrap();
    let again = orchestrator.process_many(&ids(&["den_tv"])).await;
    assert_eq!(again.successful, 1);
    assert_eq!(
        std::fs::read_to_string(&schema_path).unwrap(),
        "// edited by hand\n"
    );
}

#[tokio::test]
async fn rebuild_manifest_recovers_generated_pages() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::default()
        .with(device("a_ir", "ir_remote", &["power_on"]))
        .with(device("b_ir", "ir_remote", &["mute"]));
    let generator = generator(source, dir.path());
    BatchOrchestrator::new(generator.clone(), BatchOptions::default())
        .process_many(&ids(&["a_ir", "b_ir"]))
        .await;

    std::fs::remove_file(generator.layout().manifest()).unwrap();
    let manifest = generator.rebuild_manifest().await.unwrap();
    let ids: Vec<_> = manifest.devices.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["a_ir", "b_ir"]);
    assert_eq!(manifest.device_classes, vec!["ir_remote".to_owned()]);
}

#[tokio::test]
async fn transient_failure_is_retried_to_success() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::default()
        .with(device("den_ir", "ir_remote", &["power_on"]))
        .flaky("den_ir", 1);
    let generator = generator(source, dir.path());
    let options = BatchOptions {
        recovery: RecoveryPolicy {
            base_delay: Duration::from_millis(10),
            ..RecoveryPolicy::default()
        },
        ..BatchOptions::default()
    };

    let summary = BatchOrchestrator::new(generator.clone(), options)
        .process_many(&ids(&["den_ir"]))
        .await;

    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed, 0);
    assert!(!summary.aborted);
    assert_eq!(summary.handled_errors.len(), 1);
    let handled = &summary.handled_errors[0];
    assert_eq!(handled.device_id.as_deref(), Some("den_ir"));
    assert_eq!(handled.error_type, ErrorType::ApiConnection);
    assert_eq!(handled.action, RecoveryAction::Retry);
    assert!(generator.layout().page("den_ir").is_file());
}

#[tokio::test]
async fn ids_with_the_same_component_name_are_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let source = MemorySource::default()
        .with(device("living_room_tv", "ir_remote", &["power_on"]))
        .with(device("living-room-tv", "ir_remote", &["mute"]));
    let generator = generator(source, dir.path());

    let summary = BatchOrchestrator::new(generator.clone(), BatchOptions::default())
        .process_many(&ids(&["living_room_tv", "living-room-tv"]))
        .await;

    assert_eq!(summary.successful, 1);
    assert_eq!(summary.failed_devices, vec!["living-room-tv".to_owned()]);
    let rejected = summary
        .results
        .iter()
        .find(|r| r.device_id == "living-room-tv")
        .unwrap();
    assert!(rejected.error.as_deref().unwrap().contains("LivingRoomTvPage"));
    assert_eq!(summary.handled_errors[0].error_type, ErrorType::ValidationError);

    assert!(generator.layout().page("living_room_tv").is_file());
    assert!(!generator.layout().page("living-room-tv").exists());
    let manifest = generator.manifest().unwrap().load().await.unwrap().unwrap();
    assert_eq!(manifest.total_devices, 1);
}
