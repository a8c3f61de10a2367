//! Authorizer synchronization: full replacement of the API's authorizer set.

use crate::arn::{invocation_uri, FunctionArn};
use crate::config::{AuthorizerConfig, AuthorizerVersion, FunctionRef};
use crate::deploy::permissions::allow_invocation;
use crate::deploy::DeployContext;
use crate::error::DeployError;
use crate::remote::{AuthorizerSpec, AuthorizerType};
use indexmap::IndexMap;

pub(crate) const GATEWAY_PRINCIPAL: &str = "apigateway.amazonaws.com";

/// Replace every authorizer on the API with the declared set and return the
/// name -> id map for method wiring.
///
/// No incremental diff: existing authorizers are deleted unconditionally and
/// the declared ones recreated one at a time, in declaration order. The
/// sequential walk bounds throttling and keeps resulting ids deterministic
/// with respect to the config.
pub(crate) async fn register(
    ctx: &DeployContext<'_>,
    authorizers: &IndexMap<String, AuthorizerConfig>,
    api_id: &str,
    identity: &FunctionArn,
) -> Result<IndexMap<String, String>, DeployError> {
    let existing = ctx
        .call("getAuthorizers", || ctx.gateway.get_authorizers(api_id))
        .await?;
    for authorizer in &existing {
        ctx.call("deleteAuthorizer", || {
            ctx.gateway.delete_authorizer(api_id, &authorizer.id)
        })
        .await?;
    }

    let mut ids = IndexMap::new();
    for (name, config) in authorizers {
        let id = create_one(ctx, api_id, identity, name, config).await?;
        tracing::debug!(authorizer = %name, id = %id, "registered authorizer");
        ids.insert(name.clone(), id);
    }
    Ok(ids)
}

async fn create_one(
    ctx: &DeployContext<'_>,
    api_id: &str,
    identity: &FunctionArn,
    name: &str,
    config: &AuthorizerConfig,
) -> Result<String, DeployError> {
    let spec = if let Some(provider_arns) = &config.provider_arns {
        AuthorizerSpec {
            name: name.to_string(),
            authorizer_type: AuthorizerType::CognitoUserPools,
            authorizer_uri: None,
            provider_arns: provider_arns.clone(),
            identity_source: identity_source(config),
            validation_expression: config.validation_expression.clone(),
            credentials: config.credentials.clone(),
            result_ttl_seconds: config.result_ttl,
        }
    } else {
        let function_arn = resolve_function_arn(ctx, api_id, identity, config).await?;
        AuthorizerSpec {
            name: name.to_string(),
            authorizer_type: AuthorizerType::Token,
            authorizer_uri: Some(invocation_uri(
                &identity.partition,
                &identity.region,
                &function_arn,
            )),
            provider_arns: Vec::new(),
            identity_source: identity_source(config),
            validation_expression: config.validation_expression.clone(),
            credentials: config.credentials.clone(),
            result_ttl_seconds: config.result_ttl,
        }
    };
    ctx.call("createAuthorizer", || {
        ctx.gateway.create_authorizer(api_id, &spec)
    })
    .await
}

/// Function ARN for a token authorizer, with its qualifier suffix. By-name
/// functions are looked up in the registry and also granted gateway invoke
/// permission at the authorizer-invocation path; raw-ARN authorizers are
/// assumed to be permission-managed by the caller.
async fn resolve_function_arn(
    ctx: &DeployContext<'_>,
    api_id: &str,
    identity: &FunctionArn,
    config: &AuthorizerConfig,
) -> Result<String, DeployError> {
    match config.function_ref()? {
        FunctionRef::ByArn(arn) => Ok(arn),
        FunctionRef::ByName(function_name) => {
            let base = ctx
                .call("getFunctionArn", || {
                    ctx.functions.get_arn(&function_name, None)
                })
                .await?;
            allow_invocation(
                ctx,
                &function_name,
                None,
                GATEWAY_PRINCIPAL,
                &identity.authorizer_invocation_pattern(api_id),
                &format!("{}-authorizers", api_id),
            )
            .await?;
            Ok(match &config.lambda_version {
                None => base,
                Some(AuthorizerVersion::Fixed(qualifier)) => format!("{}:{}", base, qualifier),
                Some(AuthorizerVersion::Stage) => {
                    format!("{}:${{stageVariables.lambdaVersion}}", base)
                }
            })
        }
    }
}

fn identity_source(config: &AuthorizerConfig) -> String {
    if let Some(source) = &config.identity_source {
        return source.clone();
    }
    let header = config.header_name.as_deref().unwrap_or("Authorization");
    format!("method.request.header.{}", header)
}
