//! Idempotent invoke grants on the backing function's resource policy.

use crate::deploy::DeployContext;
use crate::error::DeployError;
use crate::remote::{InvokeGrant, PolicyStatement};
use chrono::Utc;

const INVOKE_ACTION: &str = "lambda:InvokeFunction";

/// Ensure `principal` may invoke the function for requests matching
/// `source_arn`. A missing policy counts as empty (first deploy); an
/// equivalent existing statement makes this a no-op, so repeated deploys
/// never pile up duplicate grants. Statement ids are never reused: a new
/// grant gets a fresh time-stamped id and superseded statements stay behind.
pub(crate) async fn allow_invocation(
    ctx: &DeployContext<'_>,
    function_name: &str,
    qualifier: Option<&str>,
    principal: &str,
    source_arn: &str,
    statement_prefix: &str,
) -> Result<(), DeployError> {
    let statements = match ctx
        .call("getPolicy", || {
            ctx.functions.get_policy(function_name, qualifier)
        })
        .await
    {
        Ok(statements) => statements,
        Err(failure) if failure.is_not_found() => Vec::new(),
        Err(failure) => return Err(failure),
    };

    if statements
        .iter()
        .any(|statement| grants_invocation(statement, principal, source_arn))
    {
        tracing::debug!(function = %function_name, source_arn = %source_arn, "invoke grant already present");
        return Ok(());
    }

    let grant = InvokeGrant {
        function_name: function_name.to_string(),
        qualifier: qualifier.map(str::to_string),
        principal: principal.to_string(),
        source_arn: source_arn.to_string(),
        statement_id: format!("{}-{}", statement_prefix, Utc::now().timestamp_millis()),
    };
    tracing::debug!(function = %function_name, statement_id = %grant.statement_id, "adding invoke grant");
    ctx.call("addPermission", || ctx.functions.add_permission(&grant))
        .await
}

/// Whether an existing statement already grants exactly this invocation.
fn grants_invocation(statement: &PolicyStatement, principal: &str, source_arn: &str) -> bool {
    statement.effect == "Allow"
        && value_contains(&statement.action, INVOKE_ACTION)
        && value_contains(&statement.principal["Service"], principal)
        && statement.condition["ArnLike"]["AWS:SourceArn"].as_str() == Some(source_arn)
}

/// String-or-array membership check for loosely typed policy fields.
fn value_contains(value: &serde_json::Value, expected: &str) -> bool {
    match value {
        serde_json::Value::String(s) => s == expected,
        serde_json::Value::Array(items) => items.iter().any(|item| item.as_str() == Some(expected)),
        _ => false,
    }
}
