//! Lambda ARN parsing. The deploy identity (partition, region, account) is
//! taken from the target function's ARN rather than a separate identity call.

use crate::error::ConfigError;

/// Parsed components of a Lambda function ARN,
/// e.g. `arn:aws:lambda:us-east-1:123456789012:function:echo`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionArn {
    pub partition: String,
    pub region: String,
    pub account: String,
    pub name: String,
}

impl FunctionArn {
    pub fn parse(arn: &str) -> Result<FunctionArn, ConfigError> {
        let parts: Vec<&str> = arn.split(':').collect();
        if parts.len() < 7 || parts[0] != "arn" || parts[2] != "lambda" || parts[5] != "function" {
            return Err(ConfigError::InvalidArn(arn.to_string()));
        }
        Ok(FunctionArn {
            partition: parts[1].to_string(),
            region: parts[3].to_string(),
            account: parts[4].to_string(),
            name: parts[6].to_string(),
        })
    }

    /// Source ARN matching every method invocation on the API:
    /// `arn:{partition}:execute-api:{region}:{account}:{api_id}/*/*/*`.
    pub fn execute_api_pattern(&self, api_id: &str) -> String {
        format!(
            "arn:{}:execute-api:{}:{}:{}/*/*/*",
            self.partition, self.region, self.account, api_id
        )
    }

    /// Source ARN matching authorizer invocations on the API:
    /// `arn:{partition}:execute-api:{region}:{account}:{api_id}/authorizers/*`.
    pub fn authorizer_invocation_pattern(&self, api_id: &str) -> String {
        format!(
            "arn:{}:execute-api:{}:{}:{}/authorizers/*",
            self.partition, self.region, self.account, api_id
        )
    }
}

/// Gateway-side invocation URI for a function integration or token
/// authorizer. `function_arn` may carry a qualifier suffix, including the
/// `${stageVariables.lambdaVersion}` placeholder.
pub fn invocation_uri(partition: &str, region: &str, function_arn: &str) -> String {
    format!(
        "arn:{}:apigateway:{}:lambda:path/2015-03-31/functions/{}/invocations",
        partition, region, function_arn
    )
}
