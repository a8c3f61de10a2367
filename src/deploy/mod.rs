pub mod authorizers;
pub mod binary;
pub mod engine;
pub mod permissions;
pub mod resources;
pub mod routes;

pub use engine::{DeployOutcome, DeployRequest, Deployer};

use crate::error::DeployError;
use crate::remote::{FunctionRegistry, GatewayApi};
use crate::retry::{with_retries, OnRetry, RetryPolicy};
use std::future::Future;

/// Shared per-run context: the two collaborators plus the retry policy.
/// Every remote call any component makes goes through [`DeployContext::call`].
pub(crate) struct DeployContext<'a> {
    pub gateway: &'a dyn GatewayApi,
    pub functions: &'a dyn FunctionRegistry,
    pub retry: &'a RetryPolicy,
    pub on_retry: Option<&'a OnRetry>,
}

impl DeployContext<'_> {
    pub async fn call<T, Op, Fut>(&self, operation: &str, op: Op) -> Result<T, DeployError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, DeployError>>,
    {
        with_retries(self.retry, operation, op, self.on_retry).await
    }
}
