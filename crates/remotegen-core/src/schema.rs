// ── State schema introspection ──
//
// Externally owned state schemas are described by a `module:Type`
// reference. Their shape is extracted by a short-lived subprocess that
// prints a JSON field list; any failure (spawn, timeout, exit status,
// malformed output) degrades to a one-field fallback definition instead
// of failing the device.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::IntrospectorConfig;
use crate::error::CoreError;
use crate::model::{FieldType, StateDefinition, StateField};
use crate::template::{SOURCE_SCHEMA_PREFIX, TemplateGenerator};

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

// ── Schema reference ────────────────────────────────────────────────

/// `module.path:TypeName` (a trailing `.TypeName` is accepted too).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaRef {
    pub module: String,
    pub type_name: String,
}

impl SchemaRef {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        let split = raw.rsplit_once(':').or_else(|| raw.rsplit_once('.'));
        let invalid = |why: &str| CoreError::Schema {
            schema_ref: raw.to_owned(),
            message: why.to_owned(),
        };

        let (module, type_name) = split.ok_or_else(|| invalid("expected `module:Type`"))?;
        if module.is_empty() {
            return Err(invalid("empty module path"));
        }
        let mut chars = type_name.chars();
        let valid_ident = chars
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_ident {
            return Err(invalid("type name is not an identifier"));
        }

        Ok(Self {
            module: module.to_owned(),
            type_name: type_name.to_owned(),
        })
    }

    /// File stem of the shared module: `backend.lg:State` -> `backend_lg__State`.
    ///
    /// Carries the module path so types that share a name in different
    /// modules never land on the same file.
    pub fn file_stem(&self) -> String {
        let module: String = self
            .module
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
            .collect();
        format!("{module}__{}", self.type_name)
    }
}

impl fmt::Display for SchemaRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.type_name)
    }
}

// ── External type mapping ───────────────────────────────────────────

/// Map an external (Python-style) type annotation onto the closed field
/// type vocabulary. Unknown types degrade to `Any`.
pub fn map_external_type(raw: &str) -> FieldType {
    let ty = raw.trim();

    // `X | None` / `None | X`
    let union: Vec<&str> = split_top_level(ty, '|');
    if union.len() > 1 {
        let rest: Vec<&str> = union
            .iter()
            .copied()
            .filter(|t| !matches!(*t, "None" | "NoneType" | "null"))
            .collect();
        let inner = match rest.as_slice() {
            [single] => map_external_type(single),
            _ => FieldType::Any,
        };
        return if rest.len() < union.len() {
            FieldType::Nullable(Box::new(inner))
        } else {
            inner
        };
    }

    let (head, args) = match ty.split_once('[') {
        Some((head, rest)) => (head.trim(), rest.strip_suffix(']').map(|a| split_top_level(a, ','))),
        None => (ty, None),
    };
    let head = head.rsplit('.').next().unwrap_or(head);
    let arg = |i: usize| {
        args.as_ref()
            .and_then(|a| a.get(i))
            .map_or(FieldType::Any, |t| map_external_type(t))
    };

    match head {
        "str" | "string" | "String" | "datetime" | "date" | "UUID" => FieldType::Text,
        "int" | "float" | "number" | "integer" | "Decimal" => FieldType::Number,
        "bool" | "boolean" => FieldType::Boolean,
        "Optional" => FieldType::Nullable(Box::new(arg(0))),
        "list" | "List" | "Sequence" | "set" | "Set" | "tuple" | "Tuple" => {
            FieldType::List(Box::new(arg(0)))
        }
        "dict" | "Dict" | "Mapping" => FieldType::Map(Box::new(arg(1))),
        _ => FieldType::Any,
    }
}

/// Split on `sep` outside of brackets.
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0_i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + c.len_utf8();
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

// ── Introspection backends ──────────────────────────────────────────

/// Raw subprocess output.
#[derive(Debug, Deserialize)]
struct IntrospectedSchema {
    name: String,
    #[serde(default)]
    fields: Vec<IntrospectedField>,
}

#[derive(Debug, Deserialize)]
struct IntrospectedField {
    name: String,
    #[serde(rename = "type", default)]
    type_name: String,
    #[serde(default)]
    optional: bool,
    #[serde(default)]
    default: Option<serde_json::Value>,
    #[serde(default)]
    description: String,
}

impl IntrospectedSchema {
    fn into_definition(self) -> StateDefinition {
        let fields = self
            .fields
            .into_iter()
            .map(|f| StateField {
                field_type: map_external_type(&f.type_name),
                name: f.name,
                optional: f.optional,
                description: f.description,
                default_value: f.default,
            })
            .collect();
        StateDefinition {
            interface_name: self.name,
            fields,
            imports: Vec::new(),
            extends: None,
        }
    }
}

/// Pluggable mechanism that extracts a schema's shape.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    async fn introspect(&self, schema: &SchemaRef) -> Result<StateDefinition, CoreError>;
}

/// Runs the configured command with the schema reference as last argument
/// and reads a JSON description from stdout.
pub struct SubprocessIntrospector {
    config: IntrospectorConfig,
}

impl SubprocessIntrospector {
    pub fn new(config: IntrospectorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl SchemaIntrospector for SubprocessIntrospector {
    async fn introspect(&self, schema: &SchemaRef) -> Result<StateDefinition, CoreError> {
        let failed = |message: String| CoreError::Schema {
            schema_ref: schema.to_string(),
            message,
        };

        debug!(command = %self.config.command, schema = %schema, "spawning schema introspection");
        let output = Command::new(&self.config.command)
            .args(&self.config.args)
            .arg(schema.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| failed(format!("cannot run {}: {e}", self.config.command)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(failed(format!(
                "introspection exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let parsed: IntrospectedSchema = serde_json::from_slice(&output.stdout)
            .map_err(|e| failed(format!("malformed introspection output: {e}")))?;
        if parsed.fields.is_empty() {
            return Err(failed("schema has no fields".into()));
        }
        Ok(parsed.into_definition())
    }
}

// ── Timeout + fallback wrapper ──────────────────────────────────────

/// Result of introspection. `definition` always has at least one field;
/// `success == false` means it is the fallback and `failure` says why.
#[derive(Debug, Clone)]
pub struct IntrospectionOutcome {
    pub definition: StateDefinition,
    pub success: bool,
    pub failure: Option<String>,
}

/// Bounds an introspector with a hard timeout and converts every failure
/// into the fallback definition.
#[derive(Clone)]
pub struct Introspector {
    backend: Arc<dyn SchemaIntrospector>,
    timeout: Duration,
}

impl Introspector {
    pub fn new(backend: Arc<dyn SchemaIntrospector>, timeout: Duration) -> Self {
        Self { backend, timeout }
    }

    pub fn subprocess(config: IntrospectorConfig) -> Self {
        let timeout = config.timeout;
        Self::new(Arc::new(SubprocessIntrospector::new(config)), timeout)
    }

    pub async fn introspect(&self, schema: &SchemaRef) -> IntrospectionOutcome {
        let result = tokio::time::timeout(self.timeout, self.backend.introspect(schema)).await;
        let failure = match result {
            Ok(Ok(mut definition)) if !definition.fields.is_empty() => {
                definition.interface_name.clone_from(&schema.type_name);
                return IntrospectionOutcome {
                    definition,
                    success: true,
                    failure: None,
                };
            }
            Ok(Ok(_)) => "schema has no fields".to_owned(),
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("introspection timed out after {}s", self.timeout.as_secs()),
        };

        warn!(schema = %schema, reason = %failure, "schema introspection failed, using fallback state");
        IntrospectionOutcome {
            definition: StateDefinition::fallback(&schema.type_name),
            success: false,
            failure: Some(failure),
        }
    }
}

// ── Shared schema files ─────────────────────────────────────────────

/// Whether `SchemaStore::ensure` created the file or found it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaWrite {
    Created(PathBuf),
    Existing(PathBuf),
}

impl SchemaWrite {
    pub fn path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Existing(p) => p,
        }
    }
}

/// Write-once store of shared schema modules, one file per schema type.
///
/// The first device referencing a schema writes it; later devices (in the
/// same run or later runs) never overwrite it.
pub struct SchemaStore {
    dir: PathBuf,
}

impl SchemaStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, schema: &SchemaRef) -> PathBuf {
        self.dir.join(format!("{}.ts", schema.file_stem()))
    }

    pub async fn ensure(
        &self,
        schema: &SchemaRef,
        definition: &StateDefinition,
        template: &TemplateGenerator,
    ) -> Result<SchemaWrite, CoreError> {
        let path = self.path_for(schema);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| CoreError::file_write(&self.dir, e))?;

        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return existing_module(schema, path).await;
        }

        // The module is written in full to a private sibling, then linked
        // into place. `hard_link` refuses to replace an existing file, so
        // concurrent devices cannot both win and a failed write never
        // leaves a partial module behind.
        let tmp = self.dir.join(format!(
            ".{}.{}.{}.tmp",
            schema.file_stem(),
            std::process::id(),
            TMP_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        let contents = template.generate_schema_module(schema, definition);
        if let Err(e) = tokio::fs::write(&tmp, contents).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(CoreError::file_write(&tmp, e));
        }
        let linked = tokio::fs::hard_link(&tmp, &path).await;
        let _ = tokio::fs::remove_file(&tmp).await;
        match linked {
            Ok(()) => {
                debug!(path = %path.display(), "wrote shared schema");
                Ok(SchemaWrite::Created(path))
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                existing_module(schema, path).await
            }
            Err(e) => Err(CoreError::file_write(&path, e)),
        }
    }
}

/// An existing module is reused unless its source line names another ref.
async fn existing_module(schema: &SchemaRef, path: PathBuf) -> Result<SchemaWrite, CoreError> {
    let contents = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| CoreError::file_write(&path, e))?;
    let recorded = contents
        .lines()
        .find_map(|line| line.strip_prefix(SOURCE_SCHEMA_PREFIX))
        .map(str::trim);
    let expected = schema.to_string();
    match recorded {
        Some(other) if other != expected => Err(CoreError::Schema {
            schema_ref: expected,
            message: format!("{} already holds schema {other}", path.display()),
        }),
        _ => {
            debug!(path = %path.display(), "shared schema already present");
            Ok(SchemaWrite::Existing(path))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    struct Fixed(Result<StateDefinition, String>);

    #[async_trait]
    impl SchemaIntrospector for Fixed {
        async fn introspect(&self, schema: &SchemaRef) -> Result<StateDefinition, CoreError> {
            self.0.clone().map_err(|message| CoreError::Schema {
                schema_ref: schema.to_string(),
                message,
            })
        }
    }

    struct Hangs;

    #[async_trait]
    impl SchemaIntrospector for Hangs {
        async fn introspect(&self, _schema: &SchemaRef) -> Result<StateDefinition, CoreError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(CoreError::Internal("unreachable".into()))
        }
    }

    fn schema() -> SchemaRef {
        SchemaRef::parse("devices.lg_tv.state:LgTvState").unwrap()
    }

    #[test]
    fn parses_colon_and_dotted_forms() {
        let a = SchemaRef::parse("pkg.state:TvState").unwrap();
        let b = SchemaRef::parse("pkg.state.TvState").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "pkg.state:TvState");
        assert!(SchemaRef::parse("NoModule").is_err());
        assert!(SchemaRef::parse("pkg:1Bad").is_err());
    }

    #[test]
    fn maps_external_types() {
        assert_eq!(map_external_type("str"), FieldType::Text);
        assert_eq!(map_external_type("float"), FieldType::Number);
        assert_eq!(map_external_type("bool"), FieldType::Boolean);
        assert_eq!(
            map_external_type("Optional[int]"),
            FieldType::Nullable(Box::new(FieldType::Number))
        );
        assert_eq!(
            map_external_type("str | None"),
            FieldType::Nullable(Box::new(FieldType::Text))
        );
        assert_eq!(
            map_external_type("List[Optional[str]]"),
            FieldType::List(Box::new(FieldType::Nullable(Box::new(FieldType::Text))))
        );
        assert_eq!(
            map_external_type("Dict[str, float]"),
            FieldType::Map(Box::new(FieldType::Number))
        );
        assert_eq!(map_external_type("dict"), FieldType::Map(Box::new(FieldType::Any)));
        assert_eq!(map_external_type("typing.List[int]"), FieldType::List(Box::new(FieldType::Number)));
        assert_eq!(map_external_type("SomeModel"), FieldType::Any);
    }

    #[tokio::test]
    async fn backend_failure_yields_fallback() {
        let introspector =
            Introspector::new(Arc::new(Fixed(Err("boom".into()))), Duration::from_secs(5));
        let outcome = introspector.introspect(&schema()).await;
        assert!(!outcome.success);
        assert!(!outcome.definition.fields.is_empty());
        assert_eq!(outcome.definition.interface_name, "LgTvState");
        assert!(outcome.failure.unwrap().contains("boom"));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_yields_fallback() {
        let introspector = Introspector::new(Arc::new(Hangs), Duration::from_secs(10));
        let outcome = introspector.introspect(&schema()).await;
        assert!(!outcome.success);
        assert!(outcome.failure.unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn empty_definition_yields_fallback() {
        let empty = StateDefinition {
            interface_name: "X".into(),
            fields: Vec::new(),
            imports: Vec::new(),
            extends: None,
        };
        let introspector = Introspector::new(Arc::new(Fixed(Ok(empty))), Duration::from_secs(5));
        let outcome = introspector.introspect(&schema()).await;
        assert!(!outcome.success);
        assert_eq!(outcome.definition.fields.len(), 1);
    }

    #[tokio::test]
    async fn success_takes_schema_type_name() {
        let def = StateDefinition {
            interface_name: "Whatever".into(),
            ..StateDefinition::fallback("x")
        };
        let introspector = Introspector::new(Arc::new(Fixed(Ok(def))), Duration::from_secs(5));
        let outcome = introspector.introspect(&schema()).await;
        assert!(outcome.success);
        assert_eq!(outcome.definition.interface_name, "LgTvState");
    }

    #[test]
    fn subprocess_output_maps_fields() {
        let raw = r#"{"name":"LgTvState","fields":[
            {"name":"power","type":"str","default":"off"},
            {"name":"volume","type":"Optional[int]","optional":true}
        ]}"#;
        let parsed: IntrospectedSchema = serde_json::from_str(raw).unwrap();
        let def = parsed.into_definition();
        assert_eq!(def.fields.len(), 2);
        assert_eq!(def.fields[0].field_type, FieldType::Text);
        assert!(def.fields[1].field_type.is_nullable());
    }

    #[tokio::test]
    async fn store_writes_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path().join("schemas"));
        let template = TemplateGenerator::default();
        let first = StateDefinition::fallback("LgTvState");

        let written = store.ensure(&schema(), &first, &template).await.unwrap();
        assert!(matches!(written, SchemaWrite::Created(_)));
        let before = std::fs::read_to_string(written.path()).unwrap();

        let mut second = first.clone();
        second.fields[0].name = "changed".into();
        let again = store.ensure(&schema(), &second, &template).await.unwrap();
        assert!(matches!(again, SchemaWrite::Existing(_)));
        assert_eq!(std::fs::read_to_string(again.path()).unwrap(), before);
    }

    #[tokio::test]
    async fn same_type_name_in_different_modules_gets_separate_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path().join("schemas"));
        let template = TemplateGenerator::default();
        let lg = SchemaRef::parse("backend.lg:State").unwrap();
        let emotiva = SchemaRef::parse("backend.emotiva:State").unwrap();

        let mut emotiva_def = StateDefinition::fallback("State");
        emotiva_def.fields[0].name = "zone2_power".into();

        let a = store
            .ensure(&lg, &StateDefinition::fallback("State"), &template)
            .await
            .unwrap();
        let b = store.ensure(&emotiva, &emotiva_def, &template).await.unwrap();

        assert!(matches!(a, SchemaWrite::Created(_)));
        assert!(matches!(b, SchemaWrite::Created(_)));
        assert!(a.path().ends_with("backend_lg__State.ts"));
        assert!(b.path().ends_with("backend_emotiva__State.ts"));
        let written = std::fs::read_to_string(b.path()).unwrap();
        assert!(written.contains("// Source schema: backend.emotiva:State"));
        assert!(written.contains("zone2_power"));
    }

    #[tokio::test]
    async fn module_recorded_for_another_ref_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path().join("schemas"));
        let path = store.path_for(&schema());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "// Source schema: devices.other:LgTvState\n").unwrap();

        let err = store
            .ensure(&schema(), &StateDefinition::fallback("LgTvState"), &TemplateGenerator::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Schema { .. }));
        assert!(err.to_string().contains("devices.other:LgTvState"));
    }

    #[tokio::test]
    async fn store_leaves_no_temporary_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = SchemaStore::new(dir.path().join("schemas"));
        let template = TemplateGenerator::default();
        let def = StateDefinition::fallback("LgTvState");
        store.ensure(&schema(), &def, &template).await.unwrap();
        store.ensure(&schema(), &def, &template).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(dir.path().join("schemas"))
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["devices_lg_tv_state__LgTvState.ts".to_owned()]);
    }

    #[test]
    fn file_stem_keeps_the_module_path() {
        assert_eq!(schema().file_stem(), "devices_lg_tv_state__LgTvState");
    }
}
