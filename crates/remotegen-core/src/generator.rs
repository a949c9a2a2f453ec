// ── Per-device generation pipeline ──
//
// fetch → resolve family → resolve state → analyze → render → write →
// validate (advisory) → manifest entry. One `DeviceGenerator` serves a
// whole run; it is shared by reference across concurrent devices.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::GeneratorConfig;
use crate::docs;
use crate::error::CoreError;
use crate::family::{DeviceFamily, FamilyRegistry, StateSource};
use crate::fsutil;
use crate::manifest::{self, ManifestIntegrator};
use crate::model::{
    DeviceConfig, DeviceGroups, DevicePageEntry, GenerationResult, RemoteDeviceStructure,
    RouterManifest, StateDefinition,
};
use crate::naming;
use crate::schema::{Introspector, SchemaRef, SchemaStore, SchemaWrite};
use crate::source::ConfigSource;
use crate::template::TemplateGenerator;
use crate::validate::{ComponentValidator, SourceValidator, ValidationIssue, ValidationReport};

// ── Output layout ───────────────────────────────────────────────────

/// Where each artifact lives under a generation root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn pages_dir(&self) -> PathBuf {
        self.root.join("pages")
    }

    /// `pages/<device_id>.tsx`
    pub fn page(&self, device_id: &str) -> PathBuf {
        self.pages_dir().join(format!("{device_id}.tsx"))
    }

    /// `hooks/use<Device>State.ts`
    pub fn hook(&self, device_id: &str) -> Result<PathBuf, CoreError> {
        Ok(self
            .root
            .join("hooks")
            .join(format!("{}.ts", naming::hook_name(device_id)?)))
    }

    pub fn schemas_dir(&self) -> PathBuf {
        self.root.join("schemas")
    }

    pub fn manifest(&self) -> PathBuf {
        self.root.join("router").join("deviceManifest.ts")
    }

    pub fn doc(&self, device_id: &str) -> PathBuf {
        self.root.join("docs").join(format!("{device_id}.md"))
    }

    /// Root-relative path with forward slashes, as recorded in the manifest.
    pub fn relative(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Manifest entries for every generated page under the root, sorted by
    /// path. Files without a generated header are left out.
    pub async fn scan_pages(&self) -> Result<Vec<DevicePageEntry>, CoreError> {
        let pages_dir = self.pages_dir();
        let mut paths = Vec::new();
        match tokio::fs::read_dir(&pages_dir).await {
            Ok(mut dir) => {
                while let Some(entry) = dir
                    .next_entry()
                    .await
                    .map_err(|e| CoreError::Internal(format!("cannot list {}: {e}", pages_dir.display())))?
                {
                    let path = entry.path();
                    if path.extension().is_some_and(|e| e == "tsx") {
                        paths.push(path);
                    }
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(CoreError::Internal(format!(
                    "cannot list {}: {e}",
                    pages_dir.display()
                )));
            }
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| CoreError::Internal(format!("cannot read {}: {e}", path.display())))?;
            let modified = tokio::fs::metadata(&path)
                .await
                .and_then(|m| m.modified())
                .map_or_else(|_| Utc::now(), DateTime::<Utc>::from);
            match manifest::entry_from_page(&self.relative(&path), &contents, modified) {
                Some(entry) => entries.push(entry),
                None => warn!(path = %path.display(), "not a generated page, leaving out of manifest"),
            }
        }

        Ok(entries)
    }
}

// ── Generated artifacts ─────────────────────────────────────────────

/// Everything produced for one device.
#[derive(Debug, Clone)]
pub struct GeneratedDevice {
    pub structure: RemoteDeviceStructure,
    pub page_path: PathBuf,
    /// Hook, newly created shared schema and documentation files.
    pub extra_files: Vec<PathBuf>,
    pub entry: DevicePageEntry,
    /// `None` when validation is disabled.
    pub validation: Option<ValidationReport>,
}

impl GeneratedDevice {
    pub fn to_result(&self) -> GenerationResult {
        let mut result = GenerationResult::succeeded(
            &self.structure.device_id,
            &self.structure.device_class,
            self.page_path.clone(),
            self.extra_files.clone(),
        );
        result.validated = self.validation.as_ref().map(|r| r.success);
        result
    }
}

/// State shape for a device, and the shared schema it came from when
/// introspection succeeded.
struct ResolvedState {
    definition: StateDefinition,
    shared: Option<SchemaRef>,
}

// ── Generator ───────────────────────────────────────────────────────

pub struct DeviceGenerator {
    source: Arc<dyn ConfigSource>,
    registry: FamilyRegistry,
    introspector: Introspector,
    template: TemplateGenerator,
    layout: OutputLayout,
    schemas: SchemaStore,
    state_hooks: bool,
    docs: bool,
    source_validator: Option<SourceValidator>,
    component_validator: Option<ComponentValidator>,
    manifest: Option<Arc<ManifestIntegrator>>,
}

impl DeviceGenerator {
    pub fn new(
        source: Arc<dyn ConfigSource>,
        config: &GeneratorConfig,
        introspector: Introspector,
    ) -> Self {
        let layout = OutputLayout::new(&config.output_dir);
        Self {
            source,
            registry: FamilyRegistry::builtin(),
            introspector,
            template: TemplateGenerator::from_config(config),
            schemas: SchemaStore::new(layout.schemas_dir()),
            layout,
            state_hooks: config.state_hooks,
            docs: config.docs,
            source_validator: None,
            component_validator: None,
            manifest: None,
        }
    }

    /// Run the compiler-backed validator after each device.
    #[must_use]
    pub fn with_source_validator(mut self, validator: SourceValidator) -> Self {
        self.source_validator = Some(validator);
        self
    }

    /// Run the structural component checks after each device.
    #[must_use]
    pub fn with_component_validator(mut self, validator: ComponentValidator) -> Self {
        self.component_validator = Some(validator);
        self
    }

    /// Merge each generated page into the router manifest as it lands.
    #[must_use]
    pub fn with_manifest(mut self) -> Self {
        self.manifest = Some(Arc::new(
            ManifestIntegrator::new(self.layout.manifest()).with_page_recovery(self.layout.clone()),
        ));
        self
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    pub fn source(&self) -> &Arc<dyn ConfigSource> {
        &self.source
    }

    pub fn manifest(&self) -> Option<&ManifestIntegrator> {
        self.manifest.as_deref()
    }

    /// Analyze a device without writing anything.
    pub async fn analyze(&self, device_id: &str) -> Result<RemoteDeviceStructure, CoreError> {
        let (family, config, groups) = self.load(device_id).await?;
        let state = self.resolve_state(family, &config).await?;
        family.analyze_structure(&config, &groups, state.definition)
    }

    /// Generate, write, validate and register one device page.
    pub async fn generate(&self, device_id: &str) -> Result<GeneratedDevice, CoreError> {
        let (family, config, groups) = self.load(device_id).await?;
        let state = self.resolve_state(family, &config).await?;
        let structure = family.analyze_structure(&config, &groups, state.definition)?;

        let mut extra_files = Vec::new();
        if let Some(schema) = &state.shared {
            match self
                .schemas
                .ensure(schema, &structure.state_interface, &self.template)
                .await?
            {
                SchemaWrite::Created(path) => extra_files.push(path),
                SchemaWrite::Existing(path) => {
                    debug!(device_id, path = %path.display(), "reusing shared schema");
                }
            }
        }

        let page = self.template.generate_component(&structure)?;
        let page_path = self.layout.page(device_id);
        fsutil::write_atomic(&page_path, &page).await?;

        if self.state_hooks {
            let hook = self.template.generate_state_hook(
                &structure.state_interface,
                device_id,
                state.shared.as_ref(),
            )?;
            let hook_path = self.layout.hook(device_id)?;
            fsutil::write_atomic(&hook_path, &hook).await?;
            extra_files.push(hook_path);
        }

        if self.docs {
            let doc = docs::render_device_doc(&structure)?;
            let doc_path = self.layout.doc(device_id);
            fsutil::write_atomic(&doc_path, &doc).await?;
            extra_files.push(doc_path);
        }

        let validation = self.validate(&page_path).await;

        let entry = manifest::create_entry(
            &structure,
            &self.layout.relative(&page_path),
            &page,
            Utc::now(),
        )?;
        if let Some(integrator) = &self.manifest {
            integrator.integrate(vec![entry.clone()]).await?;
        }

        info!(
            device_id,
            family = %family,
            path = %page_path.display(),
            extra = extra_files.len(),
            "generated device page"
        );
        Ok(GeneratedDevice {
            structure,
            page_path,
            extra_files,
            entry,
            validation,
        })
    }

    /// Rebuild the manifest from the pages currently under the root,
    /// recomputing every checksum from file contents.
    pub async fn rebuild_manifest(&self) -> Result<RouterManifest, CoreError> {
        let entries = self.layout.scan_pages().await?;
        match &self.manifest {
            Some(integrator) => integrator.rebuild(entries).await,
            None => ManifestIntegrator::new(self.layout.manifest()).rebuild(entries).await,
        }
    }

    async fn load(
        &self,
        device_id: &str,
    ) -> Result<(DeviceFamily, DeviceConfig, DeviceGroups), CoreError> {
        naming::check_device_id(device_id)?;
        let config = self.source.fetch_device_config(device_id).await?;
        let family = self.registry.resolve(&config.device_class)?;
        let groups = self.source.fetch_device_groups(device_id).await?;
        debug!(device_id, family = %family, commands = config.commands.len(), "loaded device");
        Ok((family, config, groups))
    }

    async fn resolve_state(
        &self,
        family: DeviceFamily,
        config: &DeviceConfig,
    ) -> Result<ResolvedState, CoreError> {
        match family.state_source(config)? {
            StateSource::Static(definition) => Ok(ResolvedState {
                definition,
                shared: None,
            }),
            StateSource::Schema(schema) => {
                let outcome = self.introspector.introspect(&schema).await;
                Ok(ResolvedState {
                    definition: outcome.definition,
                    shared: outcome.success.then_some(schema),
                })
            }
        }
    }

    /// Advisory checks. Failures are logged and reported, never rolled back.
    async fn validate(&self, page_path: &Path) -> Option<ValidationReport> {
        if self.source_validator.is_none() && self.component_validator.is_none() {
            return None;
        }
        let mut report: Option<ValidationReport> = None;
        if let Some(validator) = &self.component_validator {
            report = Some(outcome(validator.validate(page_path).await, page_path));
        }
        if let Some(validator) = &self.source_validator {
            let compiled = outcome(validator.validate(page_path).await, page_path);
            report = Some(match report {
                Some(r) => r.merge(compiled),
                None => compiled,
            });
        }
        if let Some(r) = &report {
            if !r.success {
                warn!(
                    path = %page_path.display(),
                    errors = r.errors.len(),
                    "generated page failed validation"
                );
            }
        }
        report
    }
}

/// A validator that could not run is itself a validation failure.
fn outcome(result: Result<ValidationReport, CoreError>, path: &Path) -> ValidationReport {
    result.unwrap_or_else(|e| ValidationReport {
        success: false,
        errors: vec![ValidationIssue {
            file: path.to_path_buf(),
            line: None,
            column: None,
            code: None,
            message: e.to_string(),
        }],
        warnings: Vec::new(),
        files_checked: 1,
    })
}
