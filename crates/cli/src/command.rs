use anyhow::{Context, Result};
use domloom_capture::{validate, Capture, NodePath};
use domloom_engine::{
    apply, collect_existing_map, convert, diff, existing_fingerprints, ConvertOptions,
    ConvertOutcome, MemoryBuilder, NodeBuilder, Phase, ProgressReporter,
};
use domloom_fingerprint::build_fingerprint_map;
use serde_json::{json, Value};
use std::path::Path;

fn load_capture(path: &Path) -> Result<Capture> {
    let capture = Capture::from_json_file(path)
        .with_context(|| format!("Failed to load capture file {}", path.display()))?;
    log::debug!(
        "Loaded capture {} ({} nodes) from {}",
        capture.metadata.source_id,
        domloom_capture::count_nodes(&capture.root),
        path.display()
    );
    Ok(capture)
}

/// Convert one capture into a document tree
pub async fn run_convert(
    input: &Path,
    options: &ConvertOptions,
    progress: &mut ProgressReporter,
) -> Result<Value> {
    let capture = load_capture(input)?;
    let mut builder = MemoryBuilder::new();
    let outcome = convert(&capture, &mut builder, options, progress).await?;
    Ok(json!({
        "sourceId": capture.metadata.source_id,
        "document": builder.to_json(outcome.root),
        "stats": outcome.stats,
    }))
}

/// List component patterns detected in a capture
pub async fn run_components(input: &Path) -> Result<Value> {
    let capture = load_capture(input)?;
    validate(&capture)?;
    let components: Vec<Value> = domloom_detect::detect(&capture.root)
        .iter()
        .map(|c| {
            json!({
                "name": c.name,
                "structuralHash": c.structural_hash,
                "instances": c.instances.len(),
            })
        })
        .collect();
    Ok(json!({ "components": components }))
}

/// Diff a new capture against the document produced from an older one
pub async fn run_diff(
    old_input: &Path,
    new_input: &Path,
    options: &ConvertOptions,
    progress: &mut ProgressReporter,
) -> Result<Value> {
    let new_capture = load_capture(new_input)?;
    validate(&new_capture)?;

    let (builder, outcome) = materialize(old_input, options, progress).await?;

    progress.phase(Phase::Diffing);
    let new_map = build_fingerprint_map(&new_capture.root, NodePath::root());
    let existing = collect_existing_map(&builder, outcome.root).await;
    let (changes, summary) = diff(&new_map, &existing_fingerprints(&existing));
    progress.finish();

    Ok(json!({ "changes": changes, "summary": summary }))
}

/// Diff and apply: bring the document produced from the old capture up to
/// date with the new one
pub async fn run_sync(
    old_input: &Path,
    new_input: &Path,
    options: &ConvertOptions,
    select: Option<&[String]>,
    progress: &mut ProgressReporter,
) -> Result<Value> {
    let new_capture = load_capture(new_input)?;
    validate(&new_capture)?;

    let (mut builder, outcome) = materialize(old_input, options, progress).await?;
    let root = builder
        .locate_existing_tree(&new_capture.metadata.source_id)
        .await
        .unwrap_or(outcome.root);

    progress.phase(Phase::Diffing);
    let new_map = build_fingerprint_map(&new_capture.root, NodePath::root());
    let existing = collect_existing_map(&builder, root).await;
    let (mut changes, summary) = diff(&new_map, &existing_fingerprints(&existing));

    if let Some(paths) = select {
        for change in &mut changes {
            change.selected = paths.iter().any(|p| p == change.path.as_str());
        }
    }

    progress.phase(Phase::ApplyingDiff);
    let applied = apply(&changes, &new_map, &existing, root, &mut builder).await?;
    progress.finish();

    Ok(json!({
        "document": builder.to_json(root),
        "summary": summary,
        "applied": applied,
    }))
}

/// Convert the old capture and register its document for lookup by source id
async fn materialize(
    old_input: &Path,
    options: &ConvertOptions,
    progress: &mut ProgressReporter,
) -> Result<(MemoryBuilder, ConvertOutcome)> {
    let old_capture = load_capture(old_input)?;
    let mut builder = MemoryBuilder::new();
    let outcome = convert(&old_capture, &mut builder, options, progress).await?;
    builder.register_tree(&old_capture.metadata.source_id, outcome.root);
    Ok((builder, outcome))
}
