//! Subcommand implementations
//!
//! Each command returns the report printed on success.

use anyhow::{bail, Context, Result};
use std::fmt::Write as _;
use std::path::Path;
use vstore::{
    AnyValue, JsonSchemaContract, LoadOptions, SaveOptions, Schema, StoreConfig, Value,
    VersionEnvelope,
};

/// Decode `path` with the format matching its extension, without interpretation
async fn read_document(path: &Path) -> Result<(Value, String)> {
    let store = vstore::open(StoreConfig::new(AnyValue), path)?;
    let value = store.load(path, LoadOptions::strict()).await?;
    Ok((value, store.format_name().to_string()))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) async fn inspect(file: &Path, version_key: &str) -> Result<String> {
    let (value, format) = read_document(file).await?;
    let envelope = VersionEnvelope::new(version_key);

    let version = match envelope.peek(&value) {
        Ok(version) => version.to_string(),
        Err(fault) if fault.is_missing() => "none".to_string(),
        Err(fault) => format!("invalid ({fault})"),
    };
    let fields = match &value {
        Value::Object(map) => map.keys().filter(|k| *k != version_key).count().to_string(),
        other => format!("n/a ({})", describe(other)),
    };

    let mut report = String::new();
    writeln!(report, "file:    {}", file.display())?;
    writeln!(report, "format:  {format}")?;
    writeln!(report, "version: {version}")?;
    write!(report, "fields:  {fields}")?;
    Ok(report)
}

pub(crate) async fn check(
    file: &Path,
    schema: &Path,
    current_version: Option<u32>,
    version_key: &str,
) -> Result<String> {
    let (document, _) = read_document(schema)
        .await
        .with_context(|| format!("reading schema {}", schema.display()))?;
    let contract = JsonSchemaContract::compile(document)?;

    let (value, _) = read_document(file).await?;
    let payload = match current_version {
        Some(current) => {
            let (payload, found) = VersionEnvelope::new(version_key)
                .unwrap(value, true)
                .with_context(|| format!("{}: invalid version tag", file.display()))?;
            if found != Some(current) {
                bail!(
                    "{} is at version {}, expected {current}",
                    file.display(),
                    found.map_or_else(|| "none".to_string(), |v| v.to_string())
                );
            }
            payload
        }
        None => value,
    };

    if let Err(err) = contract.validate(&payload) {
        let mut report = format!("{} does not match {}:", file.display(), schema.display());
        for issue in err.issues() {
            let at: &str = if issue.path.is_empty() { "/" } else { &issue.path };
            write!(report, "\n  {at}: {}", issue.message)?;
        }
        bail!(report);
    }

    tracing::debug!("{} validated against {}", file.display(), schema.display());
    Ok(format!("{}: ok", file.display()))
}

pub(crate) async fn convert(input: &Path, output: &Path, compact: bool) -> Result<String> {
    let (value, from) = read_document(input).await?;

    let target = vstore::open(StoreConfig::new(AnyValue), output)?;
    target
        .save(&value, output, SaveOptions { compact })
        .await?;

    Ok(format!(
        "{} ({from}) -> {} ({})",
        input.display(),
        output.display(),
        target.format_name()
    ))
}
