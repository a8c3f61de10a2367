//! Raw route config types matching the JSON schema (routes + authorizers + CORS + custom responses).

use indexmap::IndexMap;
use serde::ser::Serializer;
use serde::{Deserialize, Deserializer, Serialize};

/// Declarative description of one REST API: path -> verb -> method options,
/// plus API-wide authorizers, CORS behavior, binary media types and custom
/// gateway responses. Immutable per deploy call.
///
/// Map fields are insertion-ordered (`IndexMap`): the config hash is computed
/// over the JSON text as constructed, and authorizers are created in
/// declaration order.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteConfig {
    pub version: u32,
    #[serde(default)]
    pub routes: IndexMap<String, IndexMap<String, MethodOptions>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_cors_mode"
    )]
    pub cors_handlers: Option<CorsMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors_headers: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_max_age"
    )]
    pub cors_max_age: Option<String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub authorizers: IndexMap<String, AuthorizerConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binary_media_types: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub custom_responses: IndexMap<String, ResponseConfig>,
}

/// CORS behavior for paths without an explicit OPTIONS method.
/// Config value is `true` | `false` | an origin string; absent means the
/// default mock mode (wildcard origin).
#[derive(Clone, Debug, PartialEq)]
pub enum CorsMode {
    /// `true`: the backing function handles OPTIONS itself (full custom control).
    Handled,
    /// `false`: no OPTIONS synthesis; the gateway rejects preflight outright.
    Disabled,
    /// Origin string: mock OPTIONS echoing this origin instead of `*`.
    Origin(String),
}

fn deserialize_cors_mode<'de, D>(deserializer: D) -> Result<Option<CorsMode>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Bool(true) => Ok(Some(CorsMode::Handled)),
        serde_json::Value::Bool(false) => Ok(Some(CorsMode::Disabled)),
        serde_json::Value::String(origin) => Ok(Some(CorsMode::Origin(origin))),
        serde_json::Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "corsHandlers must be a boolean or an origin string; got {}",
            other
        ))),
    }
}

/// Callers pass the preflight max-age as a string or a bare number.
fn deserialize_max_age<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::String(seconds) => Ok(Some(seconds)),
        serde_json::Value::Number(seconds) => Ok(Some(seconds.to_string())),
        serde_json::Value::Null => Ok(None),
        other => Err(serde::de::Error::custom(format!(
            "corsMaxAge must be a number of seconds; got {}",
            other
        ))),
    }
}

impl Serialize for CorsMode {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CorsMode::Handled => serializer.serialize_bool(true),
            CorsMode::Disabled => serializer.serialize_bool(false),
            CorsMode::Origin(origin) => serializer.serialize_str(origin),
        }
    }
}

/// Per-method options. All fields optional; an empty object is a plain
/// unauthenticated proxy method.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodOptions {
    /// Explicit authorization type; overrides everything else when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization_type: Option<String>,
    /// Name of a declared custom (token) authorizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_authorizer: Option<String>,
    /// Name of a declared Cognito user-pool authorizer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cognito_authorizer: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_invoke_credentials"
    )]
    pub invoke_with_credentials: Option<InvokeCredentials>,
    #[serde(default)]
    pub api_key_required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_parameters: Option<RequestParameters>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_content_handling: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<SuccessOptions>,
}

/// IAM credentials for the integration. `true` in config means "pass the
/// caller's credentials through"; a string is a specific role ARN.
#[derive(Clone, Debug, PartialEq)]
pub enum InvokeCredentials {
    Caller,
    Role(String),
}

fn deserialize_invoke_credentials<'de, D>(
    deserializer: D,
) -> Result<Option<InvokeCredentials>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Bool(true) => Ok(Some(InvokeCredentials::Caller)),
        serde_json::Value::Bool(false) | serde_json::Value::Null => Ok(None),
        serde_json::Value::String(arn) => Ok(Some(InvokeCredentials::Role(arn))),
        other => Err(serde::de::Error::custom(format!(
            "invokeWithCredentials must be a boolean or a role ARN; got {}",
            other
        ))),
    }
}

impl Serialize for InvokeCredentials {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            InvokeCredentials::Caller => serializer.serialize_bool(true),
            InvokeCredentials::Role(arn) => serializer.serialize_str(arn),
        }
    }
}

/// Explicit request parameters. `header`/`querystring` sub-maps are rewritten
/// to `method.request.header.X` / `method.request.querystring.X`; any other
/// key is taken verbatim (callers use full `method.request.*` keys).
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RequestParameters {
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub header: IndexMap<String, bool>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub querystring: IndexMap<String, bool>,
    #[serde(flatten)]
    pub verbatim: IndexMap<String, bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuccessOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_handling: Option<String>,
}

/// A declared authorizer. Exactly one of `lambda_arn` / `lambda_name` must be
/// set (enforced by the validator); `provider_arns` switches the authorizer
/// from token-based to Cognito-user-pool-based.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorizerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lambda_name: Option<String>,
    /// Header carrying the token; identity source defaults to
    /// `method.request.header.Authorization` when neither this nor
    /// `identity_source` is given.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub header_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_expression: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credentials: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result_ttl: Option<i32>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_authorizer_version"
    )]
    pub lambda_version: Option<AuthorizerVersion>,
    #[serde(
        default,
        rename = "providerARNs",
        skip_serializing_if = "Option::is_none"
    )]
    pub provider_arns: Option<Vec<String>>,
}

/// Qualifier binding for a by-name authorizer function. `true` in config
/// binds to the stage's own deployed version through the `lambdaVersion`
/// stage variable; a string pins a fixed qualifier.
#[derive(Clone, Debug, PartialEq)]
pub enum AuthorizerVersion {
    Stage,
    Fixed(String),
}

fn deserialize_authorizer_version<'de, D>(
    deserializer: D,
) -> Result<Option<AuthorizerVersion>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = serde_json::Value::deserialize(deserializer)?;
    match v {
        serde_json::Value::Bool(true) => Ok(Some(AuthorizerVersion::Stage)),
        serde_json::Value::Bool(false) | serde_json::Value::Null => Ok(None),
        serde_json::Value::String(qualifier) => Ok(Some(AuthorizerVersion::Fixed(qualifier))),
        other => Err(serde::de::Error::custom(format!(
            "lambdaVersion must be a boolean or a qualifier string; got {}",
            other
        ))),
    }
}

impl Serialize for AuthorizerVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AuthorizerVersion::Stage => serializer.serialize_bool(true),
            AuthorizerVersion::Fixed(qualifier) => serializer.serialize_str(qualifier),
        }
    }
}

/// Tagged function reference: a full ARN, or a name to resolve through the
/// function registry.
#[derive(Clone, Debug, PartialEq)]
pub enum FunctionRef {
    ByArn(String),
    ByName(String),
}

impl AuthorizerConfig {
    /// The function this authorizer invokes. Call after `validate`; returns
    /// the validator's error for an ambiguous or empty target.
    pub fn function_ref(&self) -> Result<FunctionRef, crate::error::ConfigError> {
        match (&self.lambda_arn, &self.lambda_name) {
            (Some(arn), None) => Ok(FunctionRef::ByArn(arn.clone())),
            (None, Some(name)) => Ok(FunctionRef::ByName(name.clone())),
            _ => Err(crate::error::ConfigError::AmbiguousAuthorizerTarget(
                "<unnamed>".into(),
            )),
        }
    }
}

/// Custom gateway response for one response type (e.g. `UNAUTHORIZED`).
/// `headers` entries become `gatewayresponse.header.X` parameters.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub response_parameters: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub response_templates: IndexMap<String, String>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub headers: IndexMap<String, String>,
}
