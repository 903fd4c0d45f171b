pub mod context;
pub mod device;
pub mod location;
pub mod login;
pub mod report;

use std::future::Future;
use std::io::Write;

use anyhow::Result;
use serde_json::Value;

use nms_client::ApiError;
use nms_form::{FormAction, FormController, FormPhase};

/// Run one mutation through a form controller, echoing each status change.
///
/// Errors surface as the same message the status line showed.
pub async fn submit<F, Fut>(action: FormAction, op: F) -> Result<Value>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Value, ApiError>>,
{
    let form = FormController::new(action);
    form.subscribe(|status| {
        if status.phase != FormPhase::Idle {
            eprintln!("[{}] {}", status.phase.as_str(), status.message);
        }
    });

    match form.submit(op).await {
        Some(Ok(value)) => Ok(value),
        Some(Err(e)) => {
            tracing::debug!(kind = e.kind(), status = ?e.status(), error = %e, "mutation failed");
            anyhow::bail!("{}", form.status().message)
        }
        None => anyhow::bail!("{} already in progress", action.verb.progressive()),
    }
}

/// Ask for a y/N confirmation on stderr.
pub fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N]: ", prompt);
    std::io::stderr().flush()?;
    let mut s = String::new();
    std::io::stdin().read_line(&mut s)?;
    Ok(s.trim().eq_ignore_ascii_case("y"))
}

/// JSON body from `--json` or `-f <file>`.
pub fn read_body(json: Option<String>, file: Option<String>) -> Result<String> {
    if let Some(path) = file {
        Ok(std::fs::read_to_string(&path)?)
    } else if let Some(json) = json {
        Ok(json)
    } else {
        anyhow::bail!("Provide --json or -f <file>.");
    }
}

/// Edit values are JSON when they parse as JSON, plain strings otherwise.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Print a mutation or read result. `null` (e.g. a 204) prints nothing.
pub fn print_value(value: &Value, json_output: bool) -> Result<()> {
    if !value.is_null() {
        println!("{}", render_value(value, json_output)?);
    }
    Ok(())
}

/// Table mode lists a top-level object as `KEY  VALUE` rows; nested values
/// stay compact JSON. Anything else is pretty JSON in both modes.
fn render_value(value: &Value, json_output: bool) -> Result<String> {
    let obj = match value {
        Value::Object(obj) if !json_output => obj,
        _ => return Ok(serde_json::to_string_pretty(value)?),
    };
    let width = obj.keys().map(|k| k.len()).max().unwrap_or(0);
    let rows: Vec<String> = obj
        .iter()
        .map(|(k, v)| {
            let cell = match v {
                Value::String(s) => s.clone(),
                Value::Null => "-".to_string(),
                other => other.to_string(),
            };
            format!("{:width$}  {}", k.to_uppercase(), cell, width = width)
        })
        .collect();
    Ok(rows.join("\n"))
}
