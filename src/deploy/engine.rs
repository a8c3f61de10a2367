//! Top-level deployment engine: cache check, full rebuild, stage deployment.

use crate::arn::FunctionArn;
use crate::config::{validate, RouteConfig};
use crate::deploy::authorizers::{self, GATEWAY_PRINCIPAL};
use crate::deploy::binary::binary_media_type_ops;
use crate::deploy::permissions::allow_invocation;
use crate::deploy::routes::{RouteReconciler, RouteTargets};
use crate::deploy::DeployContext;
use crate::error::DeployError;
use crate::hash::hash_config;
use crate::remote::{FunctionRegistry, GatewayApi};
use crate::retry::{OnRetry, RetryPolicy};
use std::collections::HashMap;

/// Stage variable carrying the function qualifier every proxy integration
/// resolves at invocation time.
pub const VERSION_STAGE_VAR: &str = "lambdaVersion";

/// One deployment: bind `api_id`'s stage `stage_name` to `version` of the
/// function at `function_arn`, reconciling the API to `config` first.
#[derive(Clone, Debug)]
pub struct DeployRequest {
    pub api_id: String,
    pub stage_name: String,
    /// Unqualified ARN of the backing function; the deploy identity
    /// (partition, region, account) is derived from it.
    pub function_arn: String,
    /// Qualifier (alias or numeric version) the stage binds to.
    pub version: String,
    pub config: RouteConfig,
    /// Stage-variable name under which the config hash is cached. `None`
    /// disables the cache and always rebuilds.
    pub cache_stage_var: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DeployOutcome {
    /// The stored hash matched the config; no mutating call was made.
    CacheHit,
    Deployed {
        stage_name: String,
        version: String,
        config_hash: String,
    },
}

/// Reconciliation orchestrator over the two collaborator seams. One
/// `Deployer` may serve many deploys, but runs against the same API id must
/// be serialized by the caller; the remote side has no write token.
pub struct Deployer<'a> {
    gateway: &'a dyn GatewayApi,
    functions: &'a dyn FunctionRegistry,
    retry: RetryPolicy,
    on_retry: Option<Box<OnRetry>>,
}

impl<'a> Deployer<'a> {
    pub fn new(gateway: &'a dyn GatewayApi, functions: &'a dyn FunctionRegistry) -> Self {
        Deployer {
            gateway,
            functions,
            retry: RetryPolicy::default(),
            on_retry: None,
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Observability hook invoked between throttle retries.
    pub fn with_on_retry(mut self, hook: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_retry = Some(Box::new(hook));
        self
    }

    /// Reconcile and deploy. Validation runs first (no remote call can fail
    /// a malformed config); a matching cached hash short-circuits the whole
    /// rebuild; otherwise the API is torn down and rebuilt, then the stage
    /// deployed. A remote failure aborts from whatever step it occurred in:
    /// there is no rollback, and the next run starts from teardown anyway.
    pub async fn deploy(&self, request: &DeployRequest) -> Result<DeployOutcome, DeployError> {
        validate(&request.config)?;
        let identity = FunctionArn::parse(&request.function_arn)?;
        let config_hash = hash_config(&request.config)?;
        let ctx = DeployContext {
            gateway: self.gateway,
            functions: self.functions,
            retry: &self.retry,
            on_retry: self.on_retry.as_deref(),
        };

        if self
            .cached_hash_matches(&ctx, request, &config_hash)
            .await?
        {
            tracing::info!(api_id = %request.api_id, "configuration unchanged, skipping rebuild");
            return Ok(DeployOutcome::CacheHit);
        }

        tracing::info!(api_id = %request.api_id, stage = %request.stage_name, "rebuilding api");
        self.rebuild(&ctx, request, &identity).await?;

        let mut variables = HashMap::new();
        variables.insert(VERSION_STAGE_VAR.to_string(), request.version.clone());
        if let Some(cache_var) = &request.cache_stage_var {
            variables.insert(cache_var.clone(), config_hash.clone());
        }
        ctx.call("createDeployment", || {
            self.gateway
                .create_deployment(&request.api_id, &request.stage_name, &variables)
        })
        .await?;
        tracing::info!(api_id = %request.api_id, stage = %request.stage_name, version = %request.version, "deployed");

        Ok(DeployOutcome::Deployed {
            stage_name: request.stage_name.clone(),
            version: request.version.clone(),
            config_hash,
        })
    }

    /// `true` when caching is enabled, the stage already exists, and its
    /// stored hash equals the current config hash. A missing stage is the
    /// first-deploy case, not an error.
    async fn cached_hash_matches(
        &self,
        ctx: &DeployContext<'_>,
        request: &DeployRequest,
        config_hash: &str,
    ) -> Result<bool, DeployError> {
        let Some(cache_var) = &request.cache_stage_var else {
            return Ok(false);
        };
        let stage = ctx
            .call("getStage", || {
                self.gateway.get_stage(&request.api_id, &request.stage_name)
            })
            .await;
        match stage {
            Ok(stage) => Ok(stage.variables.get(cache_var).map(String::as_str) == Some(config_hash)),
            Err(failure) if failure.is_not_found() => Ok(false),
            Err(failure) => Err(failure),
        }
    }

    async fn rebuild(
        &self,
        ctx: &DeployContext<'_>,
        request: &DeployRequest,
        identity: &FunctionArn,
    ) -> Result<(), DeployError> {
        let existing_types = ctx
            .call("getRestApi", || {
                self.gateway.get_binary_media_types(&request.api_id)
            })
            .await?;
        let ops = binary_media_type_ops(
            Some(existing_types.as_slice()),
            request.config.binary_media_types.as_deref(),
        );
        if !ops.is_empty() {
            ctx.call("updateRestApi", || {
                self.gateway.update_rest_api(&request.api_id, &ops)
            })
            .await?;
        }

        let authorizer_ids = authorizers::register(
            ctx,
            &request.config.authorizers,
            &request.api_id,
            identity,
        )
        .await?;

        allow_invocation(
            ctx,
            &identity.name,
            Some(&request.version),
            GATEWAY_PRINCIPAL,
            &identity.execute_api_pattern(&request.api_id),
            &format!("{}-access", request.api_id),
        )
        .await?;

        let targets = RouteTargets {
            api_id: &request.api_id,
            identity,
            function_arn: &request.function_arn,
            authorizer_ids: &authorizer_ids,
        };
        RouteReconciler::run(ctx, &targets, &request.config).await?;

        RouteReconciler::apply_custom_responses(
            ctx,
            &request.api_id,
            &request.config.custom_responses,
        )
        .await
    }
}
