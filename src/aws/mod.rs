//! AWS-backed implementations of the collaborator seams.
//!
//! All SDK failures are classified here into the crate's taxonomy: throttle
//! codes become `Throttled` (and get retried by the engine), not-found codes
//! become `NotFound` (absorbed at the call sites that expect a first
//! deploy), everything else is `Remote` and aborts the run.

pub mod gateway;
pub mod lambda;

pub use gateway::AwsGatewayApi;
pub use lambda::AwsFunctionRegistry;

use crate::error::DeployError;
use aws_sdk_apigateway::error::ProvideErrorMetadata;

const THROTTLE_CODES: &[&str] = &["TooManyRequestsException", "ThrottlingException", "Throttling"];
const NOT_FOUND_CODES: &[&str] = &["NotFoundException", "ResourceNotFoundException"];

pub(crate) fn classify<E>(operation: &str, failure: E) -> DeployError
where
    E: ProvideErrorMetadata + std::fmt::Debug,
{
    let message = failure
        .message()
        .map(str::to_string)
        .unwrap_or_else(|| format!("{:?}", failure));
    match failure.code() {
        Some(code) if THROTTLE_CODES.contains(&code) => DeployError::throttled(operation, message),
        Some(code) if NOT_FOUND_CODES.contains(&code) => {
            DeployError::NotFound(format!("{}: {}", operation, message))
        }
        _ => DeployError::remote(operation, message),
    }
}
