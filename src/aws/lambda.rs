//! Lambda control-plane adapter: ARN lookup and invoke permissions.

use crate::aws::classify;
use crate::error::DeployError;
use crate::remote::{FunctionRegistry, InvokeGrant, PolicyStatement};
use async_trait::async_trait;
use serde::Deserialize;

const INVOKE_ACTION: &str = "lambda:InvokeFunction";

/// The policy document comes back as a JSON string; only the statement list
/// matters here.
#[derive(Debug, Default, Deserialize)]
struct PolicyDocument {
    #[serde(default, rename = "Statement")]
    statement: Vec<PolicyStatement>,
}

pub struct AwsFunctionRegistry {
    client: aws_sdk_lambda::Client,
}

impl AwsFunctionRegistry {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        AwsFunctionRegistry {
            client: aws_sdk_lambda::Client::new(config),
        }
    }
}

#[async_trait]
impl FunctionRegistry for AwsFunctionRegistry {
    async fn get_arn(&self, name: &str, qualifier: Option<&str>) -> Result<String, DeployError> {
        let configuration = self
            .client
            .get_function_configuration()
            .function_name(name)
            .set_qualifier(qualifier.map(str::to_string))
            .send()
            .await
            .map_err(|failure| classify("getFunctionConfiguration", failure))?;
        configuration
            .function_arn()
            .map(str::to_string)
            .ok_or_else(|| {
                DeployError::remote("getFunctionConfiguration", "response carried no arn")
            })
    }

    async fn get_policy(
        &self,
        name: &str,
        qualifier: Option<&str>,
    ) -> Result<Vec<PolicyStatement>, DeployError> {
        let response = self
            .client
            .get_policy()
            .function_name(name)
            .set_qualifier(qualifier.map(str::to_string))
            .send()
            .await
            .map_err(|failure| classify("getPolicy", failure))?;
        let document: PolicyDocument = match response.policy() {
            Some(text) => serde_json::from_str(text)?,
            None => PolicyDocument::default(),
        };
        Ok(document.statement)
    }

    async fn add_permission(&self, grant: &InvokeGrant) -> Result<(), DeployError> {
        self.client
            .add_permission()
            .function_name(&grant.function_name)
            .set_qualifier(grant.qualifier.clone())
            .action(INVOKE_ACTION)
            .principal(&grant.principal)
            .source_arn(&grant.source_arn)
            .statement_id(&grant.statement_id)
            .send()
            .await
            .map_err(|failure| classify("addPermission", failure))?;
        Ok(())
    }
}
