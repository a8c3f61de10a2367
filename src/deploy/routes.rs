//! Route reconciliation: tear down the live method/resource tree, then
//! recreate it from the declared routes.

use crate::arn::{invocation_uri, FunctionArn};
use crate::config::{CorsMode, InvokeCredentials, MethodOptions, ResponseConfig, RouteConfig};
use crate::deploy::resources::ResourceTreeBuilder;
use crate::deploy::DeployContext;
use crate::error::DeployError;
use crate::paths::path_request_parameters;
use crate::remote::{
    GatewayResponseSpec, IntegrationResponseSpec, IntegrationSpec, IntegrationType, MethodSpec,
};
use indexmap::IndexMap;
use std::collections::HashMap;

/// Headers allowed on preflight responses unless the config overrides them.
const DEFAULT_CORS_HEADERS: &str =
    "Content-Type,X-Amz-Date,Authorization,X-Api-Key,X-Amz-Security-Token";

pub(crate) struct RouteReconciler;

/// Per-run wiring shared by every method the reconciler creates.
pub(crate) struct RouteTargets<'a> {
    pub api_id: &'a str,
    pub identity: &'a FunctionArn,
    /// Unqualified function ARN; integrations append the
    /// `${stageVariables.lambdaVersion}` qualifier so one API definition can
    /// serve any deployed version through the stage variable alone.
    pub function_arn: &'a str,
    pub authorizer_ids: &'a IndexMap<String, String>,
}

impl RouteReconciler {
    /// Full teardown + rebuild. Returns after every declared path, method,
    /// and synthesized CORS handler exists on the remote side.
    pub async fn run(
        ctx: &DeployContext<'_>,
        targets: &RouteTargets<'_>,
        config: &RouteConfig,
    ) -> Result<(), DeployError> {
        let root_id = Self::teardown(ctx, targets.api_id).await?;
        let mut tree = ResourceTreeBuilder::new(root_id);

        for (path, methods) in &config.routes {
            let resource_id = tree.resolve(ctx, targets.api_id, path).await?;
            for (verb, options) in methods {
                Self::deploy_method(ctx, targets, &resource_id, path, verb, options).await?;
            }
            if !methods.contains_key("OPTIONS") {
                Self::deploy_cors(ctx, targets, &resource_id, config, methods).await?;
            }
        }
        Ok(())
    }

    /// Delete every non-root resource (parents cascade over children, so a
    /// child may already be gone by the time we reach it), strip the root's
    /// methods (the root itself cannot be removed), and drop every custom
    /// gateway response.
    async fn teardown(ctx: &DeployContext<'_>, api_id: &str) -> Result<String, DeployError> {
        let resources = ctx
            .call("getResources", || ctx.gateway.get_resources(api_id))
            .await?;
        let root = resources
            .iter()
            .find(|resource| resource.path == "/")
            .ok_or_else(|| DeployError::remote("getResources", "api has no root resource"))?
            .clone();

        for resource in resources.iter().filter(|resource| resource.id != root.id) {
            let outcome = ctx
                .call("deleteResource", || {
                    ctx.gateway.delete_resource(api_id, &resource.id)
                })
                .await;
            match outcome {
                Ok(()) => {}
                Err(failure) if failure.is_not_found() => {}
                Err(failure) => return Err(failure),
            }
        }

        for verb in &root.methods {
            ctx.call("deleteMethod", || {
                ctx.gateway.delete_method(api_id, &root.id, verb)
            })
            .await?;
        }

        let responses = ctx
            .call("getGatewayResponses", || {
                ctx.gateway.get_gateway_responses(api_id)
            })
            .await?;
        for response in responses.iter().filter(|response| !response.is_default) {
            ctx.call("deleteGatewayResponse", || {
                ctx.gateway
                    .delete_gateway_response(api_id, &response.response_type)
            })
            .await?;
        }

        Ok(root.id)
    }

    async fn deploy_method(
        ctx: &DeployContext<'_>,
        targets: &RouteTargets<'_>,
        resource_id: &str,
        path: &str,
        verb: &str,
        options: &MethodOptions,
    ) -> Result<(), DeployError> {
        let (authorization_type, authorizer_id) =
            effective_authorization(options, targets.authorizer_ids);
        let method = MethodSpec {
            authorization_type,
            authorizer_id,
            api_key_required: options.api_key_required,
            request_parameters: flatten_request_parameters(options, path),
        };
        ctx.call("putMethod", || {
            ctx.gateway
                .put_method(targets.api_id, resource_id, verb, &method)
        })
        .await?;

        let integration = IntegrationSpec {
            integration_type: IntegrationType::AwsProxy,
            uri: Some(stage_bound_uri(targets)),
            credentials: integration_credentials(options, &targets.identity.partition),
            request_templates: HashMap::new(),
            content_handling: options.request_content_handling.clone(),
        };
        ctx.call("putIntegration", || {
            ctx.gateway
                .put_integration(targets.api_id, resource_id, verb, &integration)
        })
        .await?;

        let empty_response_parameters = HashMap::new();
        ctx.call("putMethodResponse", || {
            ctx.gateway.put_method_response(
                targets.api_id,
                resource_id,
                verb,
                "200",
                &empty_response_parameters,
            )
        })
        .await?;
        let success = IntegrationResponseSpec {
            content_handling: options
                .success
                .as_ref()
                .and_then(|success| success.content_handling.clone()),
            ..IntegrationResponseSpec::default()
        };
        ctx.call("putIntegrationResponse", || {
            ctx.gateway.put_integration_response(
                targets.api_id,
                resource_id,
                verb,
                "200",
                &success,
            )
        })
        .await?;
        tracing::debug!(path = %path, verb = %verb, "deployed method");
        Ok(())
    }

    /// Synthesize the OPTIONS handler for a path that declares none.
    async fn deploy_cors(
        ctx: &DeployContext<'_>,
        targets: &RouteTargets<'_>,
        resource_id: &str,
        config: &RouteConfig,
        methods: &IndexMap<String, MethodOptions>,
    ) -> Result<(), DeployError> {
        match &config.cors_handlers {
            Some(CorsMode::Disabled) => Ok(()),
            Some(CorsMode::Handled) => {
                // Full custom control: the function answers preflight itself.
                let method = MethodSpec {
                    authorization_type: "NONE".into(),
                    ..MethodSpec::default()
                };
                ctx.call("putMethod", || {
                    ctx.gateway
                        .put_method(targets.api_id, resource_id, "OPTIONS", &method)
                })
                .await?;
                let integration = IntegrationSpec {
                    integration_type: IntegrationType::AwsProxy,
                    uri: Some(stage_bound_uri(targets)),
                    credentials: None,
                    request_templates: HashMap::new(),
                    content_handling: None,
                };
                ctx.call("putIntegration", || {
                    ctx.gateway
                        .put_integration(targets.api_id, resource_id, "OPTIONS", &integration)
                })
                .await
            }
            mode => {
                let origin = match mode {
                    Some(CorsMode::Origin(origin)) => Some(origin.as_str()),
                    _ => None,
                };
                Self::deploy_mock_cors(ctx, targets, resource_id, config, methods, origin).await
            }
        }
    }

    /// Static (mock) OPTIONS returning the configured CORS headers without
    /// touching the function.
    async fn deploy_mock_cors(
        ctx: &DeployContext<'_>,
        targets: &RouteTargets<'_>,
        resource_id: &str,
        config: &RouteConfig,
        methods: &IndexMap<String, MethodOptions>,
        origin: Option<&str>,
    ) -> Result<(), DeployError> {
        let method = MethodSpec {
            authorization_type: "NONE".into(),
            ..MethodSpec::default()
        };
        ctx.call("putMethod", || {
            ctx.gateway
                .put_method(targets.api_id, resource_id, "OPTIONS", &method)
        })
        .await?;

        let mut request_templates = HashMap::new();
        request_templates.insert(
            "application/json".to_string(),
            "{\"statusCode\": 200}".to_string(),
        );
        let integration = IntegrationSpec {
            integration_type: IntegrationType::Mock,
            uri: None,
            credentials: None,
            request_templates,
            content_handling: None,
        };
        ctx.call("putIntegration", || {
            ctx.gateway
                .put_integration(targets.api_id, resource_id, "OPTIONS", &integration)
        })
        .await?;

        let headers = cors_response_headers(config, methods, origin);
        let method_parameters: HashMap<String, bool> =
            headers.keys().map(|key| (key.clone(), true)).collect();
        ctx.call("putMethodResponse", || {
            ctx.gateway.put_method_response(
                targets.api_id,
                resource_id,
                "OPTIONS",
                "200",
                &method_parameters,
            )
        })
        .await?;

        let response = IntegrationResponseSpec {
            response_parameters: headers.into_iter().collect(),
            ..IntegrationResponseSpec::default()
        };
        ctx.call("putIntegrationResponse", || {
            ctx.gateway.put_integration_response(
                targets.api_id,
                resource_id,
                "OPTIONS",
                "200",
                &response,
            )
        })
        .await
    }

    /// Write the configured custom gateway responses (teardown already
    /// removed the previous custom set).
    pub async fn apply_custom_responses(
        ctx: &DeployContext<'_>,
        api_id: &str,
        responses: &IndexMap<String, ResponseConfig>,
    ) -> Result<(), DeployError> {
        for (response_type, config) in responses {
            let spec = gateway_response_spec(config);
            ctx.call("putGatewayResponse", || {
                ctx.gateway
                    .put_gateway_response(api_id, response_type, &spec)
            })
            .await?;
        }
        Ok(())
    }
}

fn stage_bound_uri(targets: &RouteTargets<'_>) -> String {
    invocation_uri(
        &targets.identity.partition,
        &targets.identity.region,
        &format!("{}:${{stageVariables.lambdaVersion}}", targets.function_arn),
    )
}

/// Effective authorization, by priority: explicit type, then custom
/// authorizer, then Cognito authorizer, then IAM credentials, then NONE.
/// The authorizer id rides along whenever a declared authorizer is named.
fn effective_authorization(
    options: &MethodOptions,
    authorizer_ids: &IndexMap<String, String>,
) -> (String, Option<String>) {
    let authorizer_id = options
        .custom_authorizer
        .as_ref()
        .or(options.cognito_authorizer.as_ref())
        .and_then(|name| authorizer_ids.get(name).cloned());

    let authorization_type = if let Some(explicit) = &options.authorization_type {
        explicit.clone()
    } else if options.custom_authorizer.is_some() {
        "CUSTOM".into()
    } else if options.cognito_authorizer.is_some() {
        "COGNITO_USER_POOLS".into()
    } else if options.invoke_with_credentials.is_some() {
        "AWS_IAM".into()
    } else {
        "NONE".into()
    };
    (authorization_type, authorizer_id)
}

/// Explicit header/querystring parameters flattened to `method.request.*`
/// keys, merged with parameters auto-extracted from `{name}` path segments.
/// Static paths with no explicit parameters yield an empty map.
fn flatten_request_parameters(options: &MethodOptions, path: &str) -> HashMap<String, bool> {
    let mut flattened: HashMap<String, bool> = path_request_parameters(path)
        .into_iter()
        .collect();
    if let Some(parameters) = &options.request_parameters {
        for (name, required) in &parameters.header {
            flattened.insert(format!("method.request.header.{}", name), *required);
        }
        for (name, required) in &parameters.querystring {
            flattened.insert(format!("method.request.querystring.{}", name), *required);
        }
        for (key, required) in &parameters.verbatim {
            flattened.insert(key.clone(), *required);
        }
    }
    flattened
}

fn integration_credentials(options: &MethodOptions, partition: &str) -> Option<String> {
    match &options.invoke_with_credentials {
        Some(InvokeCredentials::Caller) => Some(format!("arn:{}:iam::*:user/*", partition)),
        Some(InvokeCredentials::Role(arn)) => Some(arn.clone()),
        None => None,
    }
}

/// CORS headers for the mock OPTIONS integration response, keyed by
/// `method.response.header.*` and single-quoted as static values.
fn cors_response_headers(
    config: &RouteConfig,
    methods: &IndexMap<String, MethodOptions>,
    origin: Option<&str>,
) -> IndexMap<String, String> {
    let mut verbs: Vec<&str> = methods.keys().map(String::as_str).collect();
    verbs.push("OPTIONS");
    verbs.sort_unstable();

    let allowed_headers = config.cors_headers.as_deref().unwrap_or(DEFAULT_CORS_HEADERS);

    let mut headers = IndexMap::new();
    headers.insert(
        "method.response.header.Access-Control-Allow-Methods".to_string(),
        format!("'{}'", verbs.join(",")),
    );
    headers.insert(
        "method.response.header.Access-Control-Allow-Headers".to_string(),
        format!("'{}'", allowed_headers),
    );
    headers.insert(
        "method.response.header.Access-Control-Allow-Origin".to_string(),
        format!("'{}'", origin.unwrap_or("*")),
    );
    if origin.is_some() {
        headers.insert(
            "method.response.header.Access-Control-Allow-Credentials".to_string(),
            "'true'".to_string(),
        );
    }
    if let Some(max_age) = &config.cors_max_age {
        headers.insert(
            "method.response.header.Access-Control-Max-Age".to_string(),
            format!("'{}'", max_age),
        );
    }
    headers
}

fn gateway_response_spec(config: &ResponseConfig) -> GatewayResponseSpec {
    let mut response_parameters: HashMap<String, String> = config
        .response_parameters
        .iter()
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();
    for (header, value) in &config.headers {
        response_parameters.insert(
            format!("gatewayresponse.header.{}", header),
            format!("'{}'", value),
        );
    }
    GatewayResponseSpec {
        status_code: config.status_code.map(|code| code.to_string()),
        response_parameters,
        response_templates: config
            .response_templates
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect(),
    }
}
