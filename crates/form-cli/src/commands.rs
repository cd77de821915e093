use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;
use form_model::Value;
use form_serialize::{StepSnapshot, load_snapshot, save_snapshot, serialize_with_diagnostics};
use form_validate::field_errors;
use tracing::{Instrument, info, info_span, warn};

use form_cli::replay::{ReplayOptions, ReplayResult, replay};
use form_cli::schema::Schema;
use form_cli::script::load_script;

use crate::cli::{InspectArgs, ReplayArgs, SchemaArgs};
use crate::summary::apply_table_style;

fn load_document(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read document {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parse document {}", path.display()))?;
    Ok(Value::from(json))
}

pub fn run_replay(args: &ReplayArgs) -> Result<ReplayResult> {
    let schema = Schema::load(&args.schema)?;
    let registry = Arc::new(schema.registry().context("build field registry")?);
    let document = load_document(&args.document)?;
    let steps = load_script(&args.script)?;
    let options = ReplayOptions {
        seed: args.seed.clone(),
        deferred: args.deferred,
        submit: args.submit,
    };

    let runtime = tokio::runtime::Runtime::new().context("start async runtime")?;
    let span = info_span!("replay", script = %args.script.display(), steps = steps.len());
    let result = runtime.block_on(replay(registry, &document, steps, &options).instrument(span))?;

    if let Some(path) = &args.snapshot {
        let (serialized, diagnostics) = serialize_with_diagnostics(&result.state);
        for diagnostic in &diagnostics {
            warn!("{diagnostic}");
        }
        let mut snapshot = StepSnapshot::new(args.step.clone(), serialized);
        save_snapshot(&mut snapshot, path).context("save step snapshot")?;
        info!(path = %path.display(), "Snapshot written");
    }
    Ok(result)
}

pub struct Inspection {
    pub snapshot: StepSnapshot,
    /// Present when a schema was given.
    pub errors: Option<Vec<(form_model::Path, String)>>,
}

pub fn run_inspect(args: &InspectArgs) -> Result<Inspection> {
    let snapshot = load_snapshot(&args.snapshot)
        .with_context(|| format!("load snapshot {}", args.snapshot.display()))?;
    let errors = match &args.schema {
        Some(path) => {
            let registry = Arc::new(Schema::load(path)?.registry()?);
            let state = snapshot.restore(registry).context("rehydrate snapshot")?;
            Some(field_errors(&state))
        }
        None => None,
    };
    Ok(Inspection { snapshot, errors })
}

pub fn run_schema(args: &SchemaArgs) -> Result<()> {
    let schema = Schema::load(&args.schema)?;
    schema.registry().context("build field registry")?;

    let mut table = Table::new();
    table.set_header(vec!["Shape", "Type", "Kind", "Default", "Rules", "Visible when"]);
    apply_table_style(&mut table);
    for field in &schema.fields {
        let default = field
            .default
            .as_ref()
            .map_or_else(|| "-".to_string(), ToString::to_string);
        let rules = field.rules();
        let rules = if rules.is_empty() {
            "-".to_string()
        } else {
            rules.join(", ")
        };
        let visible_when = field
            .visible_when
            .as_ref()
            .map_or_else(|| "-".to_string(), |when| format!("{} = {}", when.field, when.equals));
        table.add_row(vec![
            field.path.clone(),
            field.field_type.clone(),
            field.kind().label().to_string(),
            default,
            rules,
            visible_when,
        ]);
    }
    println!("{table}");
    Ok(())
}
