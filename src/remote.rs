//! Collaborator seams: the gateway control plane and the function registry.
//!
//! The deploy engine only ever talks to these two traits. The AWS-backed
//! implementations live in `crate::aws`; tests drive the engine against
//! in-memory fakes.

use crate::error::DeployError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;

/// One node of the live resource tree. The root has path `/` and no parent.
#[derive(Clone, Debug)]
pub struct ResourceSummary {
    pub id: String,
    pub path: String,
    pub parent_id: Option<String>,
    /// Verbs with a method currently attached.
    pub methods: Vec<String>,
}

#[derive(Clone, Debug, Default)]
pub struct MethodSpec {
    /// `NONE`, `AWS_IAM`, `CUSTOM`, `COGNITO_USER_POOLS` or an explicit
    /// caller-supplied type.
    pub authorization_type: String,
    pub authorizer_id: Option<String>,
    pub api_key_required: bool,
    pub request_parameters: HashMap<String, bool>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IntegrationType {
    /// Lambda proxy pass-through.
    AwsProxy,
    /// Static gateway-side response (CORS preflight).
    Mock,
}

#[derive(Clone, Debug)]
pub struct IntegrationSpec {
    pub integration_type: IntegrationType,
    /// Invocation URI for proxy integrations; `None` for mock.
    pub uri: Option<String>,
    pub credentials: Option<String>,
    pub request_templates: HashMap<String, String>,
    pub content_handling: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct IntegrationResponseSpec {
    pub response_parameters: HashMap<String, String>,
    pub response_templates: HashMap<String, String>,
    pub content_handling: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AuthorizerType {
    Token,
    CognitoUserPools,
}

#[derive(Clone, Debug)]
pub struct AuthorizerSpec {
    pub name: String,
    pub authorizer_type: AuthorizerType,
    /// Invocation URI for token authorizers; empty for pool-based ones.
    pub authorizer_uri: Option<String>,
    pub provider_arns: Vec<String>,
    pub identity_source: String,
    pub validation_expression: Option<String>,
    pub credentials: Option<String>,
    pub result_ttl_seconds: Option<i32>,
}

#[derive(Clone, Debug)]
pub struct AuthorizerSummary {
    pub id: String,
    pub name: String,
}

#[derive(Clone, Debug)]
pub struct GatewayResponseSummary {
    pub response_type: String,
    /// Default (gateway-generated) responses survive teardown; only custom
    /// ones are deleted.
    pub is_default: bool,
}

#[derive(Clone, Debug, Default)]
pub struct GatewayResponseSpec {
    pub status_code: Option<String>,
    pub response_parameters: HashMap<String, String>,
    pub response_templates: HashMap<String, String>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PatchOpKind {
    Add,
    Remove,
}

/// A JSON-Patch style operation against the REST API itself
/// (binary media types use paths like `/binaryMediaTypes/image~1png`).
#[derive(Clone, Debug, PartialEq)]
pub struct PatchOp {
    pub op: PatchOpKind,
    pub path: String,
}

#[derive(Clone, Debug, Default)]
pub struct StageInfo {
    pub variables: HashMap<String, String>,
}

/// One statement of a function's resource policy, loosely typed: `Action`
/// and `Principal` may be strings or arrays/objects depending on origin.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct PolicyStatement {
    #[serde(default, rename = "Sid")]
    pub sid: Option<String>,
    #[serde(default, rename = "Effect")]
    pub effect: String,
    #[serde(default, rename = "Action")]
    pub action: serde_json::Value,
    #[serde(default, rename = "Principal")]
    pub principal: serde_json::Value,
    #[serde(default, rename = "Condition")]
    pub condition: serde_json::Value,
}

/// A permission grant request: allow `principal` to invoke the function for
/// requests matching `source_arn`.
#[derive(Clone, Debug)]
pub struct InvokeGrant {
    pub function_name: String,
    pub qualifier: Option<String>,
    pub principal: String,
    pub source_arn: String,
    pub statement_id: String,
}

/// CRUD surface of the REST API control plane.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    async fn get_resources(&self, api_id: &str) -> Result<Vec<ResourceSummary>, DeployError>;
    async fn create_resource(
        &self,
        api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String, DeployError>;
    async fn delete_resource(&self, api_id: &str, resource_id: &str) -> Result<(), DeployError>;

    async fn delete_method(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
    ) -> Result<(), DeployError>;
    async fn put_method(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        spec: &MethodSpec,
    ) -> Result<(), DeployError>;
    async fn put_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        spec: &IntegrationSpec,
    ) -> Result<(), DeployError>;
    async fn put_method_response(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        status_code: &str,
        response_parameters: &HashMap<String, bool>,
    ) -> Result<(), DeployError>;
    async fn put_integration_response(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        status_code: &str,
        spec: &IntegrationResponseSpec,
    ) -> Result<(), DeployError>;

    async fn get_authorizers(&self, api_id: &str) -> Result<Vec<AuthorizerSummary>, DeployError>;
    async fn create_authorizer(
        &self,
        api_id: &str,
        spec: &AuthorizerSpec,
    ) -> Result<String, DeployError>;
    async fn delete_authorizer(
        &self,
        api_id: &str,
        authorizer_id: &str,
    ) -> Result<(), DeployError>;

    async fn get_gateway_responses(
        &self,
        api_id: &str,
    ) -> Result<Vec<GatewayResponseSummary>, DeployError>;
    async fn put_gateway_response(
        &self,
        api_id: &str,
        response_type: &str,
        spec: &GatewayResponseSpec,
    ) -> Result<(), DeployError>;
    async fn delete_gateway_response(
        &self,
        api_id: &str,
        response_type: &str,
    ) -> Result<(), DeployError>;

    async fn get_binary_media_types(&self, api_id: &str) -> Result<Vec<String>, DeployError>;
    async fn update_rest_api(&self, api_id: &str, ops: &[PatchOp]) -> Result<(), DeployError>;

    async fn create_deployment(
        &self,
        api_id: &str,
        stage_name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), DeployError>;
    async fn get_stage(&self, api_id: &str, stage_name: &str) -> Result<StageInfo, DeployError>;
}

/// Lookup and permission surface of the function control plane.
#[async_trait]
pub trait FunctionRegistry: Send + Sync {
    async fn get_arn(&self, name: &str, qualifier: Option<&str>) -> Result<String, DeployError>;
    async fn get_policy(
        &self,
        name: &str,
        qualifier: Option<&str>,
    ) -> Result<Vec<PolicyStatement>, DeployError>;
    async fn add_permission(&self, grant: &InvokeGrant) -> Result<(), DeployError>;
}
