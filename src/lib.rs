//! Gatewright SDK: configuration-driven AWS API Gateway provisioning library.

pub mod arn;
pub mod aws;
pub mod config;
pub mod deploy;
pub mod error;
pub mod hash;
pub mod paths;
pub mod remote;
pub mod retry;

pub use arn::{invocation_uri, FunctionArn};
pub use aws::{AwsFunctionRegistry, AwsGatewayApi};
pub use config::{validate, AuthorizerConfig, CorsMode, MethodOptions, RouteConfig};
pub use deploy::engine::VERSION_STAGE_VAR;
pub use deploy::{DeployOutcome, DeployRequest, Deployer};
pub use error::{ConfigError, DeployError};
pub use hash::{hash_config, hash_str};
pub use paths::{path_request_parameters, split_path, SplitPath};
pub use remote::{FunctionRegistry, GatewayApi};
pub use retry::{with_retries, RetryPolicy};
