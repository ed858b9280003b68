use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{ClientError, ClientResult};

/// What every command hands back to the UI on success.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

/// A blocking failure: a format error, a refused restore, or a store problem.
/// Row-level problems never arrive here; they travel inside a success payload.
#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub version: String,
    pub error: ErrorContract,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorContract {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
}

pub fn success<T>(command: &str, data: T) -> ClientResult<SuccessEnvelope>
where
    T: Serialize,
{
    let json_data = serde_json::to_value(data)
        .map_err(|err| ClientError::internal_serialization(&err.to_string()))?;
    Ok(SuccessEnvelope {
        ok: true,
        command: command.to_string(),
        version: API_VERSION.to_string(),
        data: json_data,
    })
}

pub fn failure_from_error(error: &ClientError) -> FailureEnvelope {
    FailureEnvelope {
        ok: false,
        command: None,
        version: API_VERSION.to_string(),
        error: ErrorContract {
            code: error.code.clone(),
            message: error.message.clone(),
            recovery_steps: error.recovery_steps.clone(),
        },
        data: error.data.clone(),
    }
}

pub fn failure_for_command(command: &str, error: &ClientError) -> FailureEnvelope {
    FailureEnvelope {
        command: Some(command.to_string()),
        ..failure_from_error(error)
    }
}

/// Collapses a command result into the JSON value the UI layer consumes.
pub fn into_json(command: &str, result: ClientResult<SuccessEnvelope>) -> Value {
    let rendered = match result {
        Ok(envelope) => serde_json::to_value(envelope),
        Err(error) => serde_json::to_value(failure_for_command(command, &error)),
    };
    rendered.unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::into_json;
    use crate::ClientError;

    #[test]
    fn failure_json_carries_code_and_command() {
        let value = into_json(
            "backup restore",
            Err(ClientError::restore_error("Backup is missing `expenses`.")),
        );
        assert_eq!(value["ok"], false);
        assert_eq!(value["command"], "backup restore");
        assert_eq!(value["error"]["code"], "restore_error");
        assert_eq!(value["data"]["help_section_title"], "Backup & Restore");
    }
}
