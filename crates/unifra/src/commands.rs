//! Command dispatch: bridges CLI args to `Provider` calls and prints JSON.

use std::path::Path;

use serde_json::{Value, json};
use strum::IntoEnumIterator;
use tracing::debug;

use unifra_core::{ControllerPlatform, Provider, RestResource};

use crate::cli::{BodyArgs, Command, GlobalOpts};
use crate::config;
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    // `kinds` needs no controller.
    if matches!(cmd, Command::Kinds) {
        return print_json(&kinds());
    }

    let controller_config = config::build_controller_config(global)?;
    let provider = Provider::connect(controller_config).await?;
    debug!(command = ?cmd, "dispatching command");

    let result = run_command(&provider, cmd).await;
    provider.disconnect().await;
    print_json(&result?)
}

async fn run_command(provider: &Provider, cmd: Command) -> Result<Value, CliError> {
    let value = match cmd {
        Command::Check => {
            let sysinfo = provider.sysinfo().await?;
            json!({
                "platform": platform_name(provider.platform()),
                "site": provider.site(),
                "sysinfo": sysinfo,
            })
        }
        Command::Sites => {
            let sites = provider.sites().await?;
            json!(sites)
        }
        Command::Health => {
            let health = provider.health().await?;
            json!(health)
        }
        Command::List { kind } => Value::Array(provider.list(kind).await?),
        Command::Get { kind, id } => {
            provider
                .read(kind, &id)
                .await?
                .ok_or_else(|| CliError::NotFound {
                    identifier: format!("{kind} '{id}'"),
                })?
        }
        Command::Create { kind, body } => provider.create(kind, &read_body(&body)?).await?,
        Command::Update { kind, id, body } => {
            provider.update(kind, &id, &read_body(&body)?).await?
        }
        Command::Delete { kind, id } => {
            provider.delete(kind, &id).await?;
            json!({ "deleted": id, "kind": kind.to_string() })
        }
        Command::Kinds => kinds(),
    };
    Ok(value)
}

fn kinds() -> Value {
    RestResource::iter().map(|k| Value::String(k.to_string())).collect()
}

fn platform_name(platform: ControllerPlatform) -> &'static str {
    match platform {
        ControllerPlatform::UnifiOs => "unifi-os",
        ControllerPlatform::ClassicController => "classic",
    }
}

fn read_body(body: &BodyArgs) -> Result<Value, CliError> {
    match (&body.data, &body.from_file) {
        (Some(data), _) => parse_json("data", data),
        (None, Some(path)) => read_json_file(path),
        (None, None) => Err(CliError::Validation {
            field: "data".into(),
            reason: "a JSON body is required".into(),
        }),
    }
}

/// Read and parse a JSON file for `--from-file`.
fn read_json_file(path: &Path) -> Result<Value, CliError> {
    let contents = std::fs::read_to_string(path)?;
    parse_json("from-file", &contents)
}

fn parse_json(field: &str, text: &str) -> Result<Value, CliError> {
    serde_json::from_str(text).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: format!("invalid JSON: {e}"),
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::Api {
        message: format!("could not render output: {e}"),
    })?;
    println!("{text}");
    Ok(())
}
