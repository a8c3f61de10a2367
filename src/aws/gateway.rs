//! API Gateway control-plane adapter.

use crate::aws::classify;
use crate::error::DeployError;
use crate::remote::{
    AuthorizerSpec, AuthorizerSummary, AuthorizerType, GatewayApi, GatewayResponseSpec,
    GatewayResponseSummary, IntegrationResponseSpec, IntegrationSpec, IntegrationType, MethodSpec,
    PatchOp, PatchOpKind, ResourceSummary, StageInfo,
};
use async_trait::async_trait;
use aws_sdk_apigateway::types::{
    AuthorizerType as SdkAuthorizerType, ContentHandlingStrategy, GatewayResponseType,
    IntegrationType as SdkIntegrationType, Op, PatchOperation,
};
use std::collections::HashMap;

const RESOURCE_PAGE_SIZE: i32 = 500;

pub struct AwsGatewayApi {
    client: aws_sdk_apigateway::Client,
}

impl AwsGatewayApi {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        AwsGatewayApi {
            client: aws_sdk_apigateway::Client::new(config),
        }
    }
}

#[async_trait]
impl GatewayApi for AwsGatewayApi {
    async fn get_resources(&self, api_id: &str) -> Result<Vec<ResourceSummary>, DeployError> {
        let mut resources = Vec::new();
        let mut position: Option<String> = None;
        loop {
            let page = self
                .client
                .get_resources()
                .rest_api_id(api_id)
                .limit(RESOURCE_PAGE_SIZE)
                .set_position(position.clone())
                .send()
                .await
                .map_err(|failure| classify("getResources", failure))?;
            for resource in page.items() {
                resources.push(ResourceSummary {
                    id: resource.id().unwrap_or_default().to_string(),
                    path: resource.path().unwrap_or_default().to_string(),
                    parent_id: resource.parent_id().map(str::to_string),
                    methods: resource
                        .resource_methods()
                        .map(|methods| methods.keys().cloned().collect())
                        .unwrap_or_default(),
                });
            }
            position = page.position().map(str::to_string);
            if position.is_none() {
                break;
            }
        }
        Ok(resources)
    }

    async fn create_resource(
        &self,
        api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String, DeployError> {
        let created = self
            .client
            .create_resource()
            .rest_api_id(api_id)
            .parent_id(parent_id)
            .path_part(path_part)
            .send()
            .await
            .map_err(|failure| classify("createResource", failure))?;
        created
            .id()
            .map(str::to_string)
            .ok_or_else(|| DeployError::remote("createResource", "response carried no resource id"))
    }

    async fn delete_resource(&self, api_id: &str, resource_id: &str) -> Result<(), DeployError> {
        self.client
            .delete_resource()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .send()
            .await
            .map_err(|failure| classify("deleteResource", failure))?;
        Ok(())
    }

    async fn delete_method(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
    ) -> Result<(), DeployError> {
        self.client
            .delete_method()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(verb)
            .send()
            .await
            .map_err(|failure| classify("deleteMethod", failure))?;
        Ok(())
    }

    async fn put_method(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        spec: &MethodSpec,
    ) -> Result<(), DeployError> {
        let request_parameters = if spec.request_parameters.is_empty() {
            None
        } else {
            Some(spec.request_parameters.clone())
        };
        self.client
            .put_method()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(verb)
            .authorization_type(&spec.authorization_type)
            .set_authorizer_id(spec.authorizer_id.clone())
            .api_key_required(spec.api_key_required)
            .set_request_parameters(request_parameters)
            .send()
            .await
            .map_err(|failure| classify("putMethod", failure))?;
        Ok(())
    }

    async fn put_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        spec: &IntegrationSpec,
    ) -> Result<(), DeployError> {
        let request_templates = if spec.request_templates.is_empty() {
            None
        } else {
            Some(spec.request_templates.clone())
        };
        let mut request = self
            .client
            .put_integration()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(verb)
            .set_uri(spec.uri.clone())
            .set_credentials(spec.credentials.clone())
            .set_request_templates(request_templates)
            .set_content_handling(
                spec.content_handling
                    .as_deref()
                    .map(ContentHandlingStrategy::from),
            );
        request = match spec.integration_type {
            IntegrationType::AwsProxy => request
                .r#type(SdkIntegrationType::AwsProxy)
                // The function control plane is always invoked with POST,
                // whatever the client-facing verb is.
                .integration_http_method("POST"),
            IntegrationType::Mock => request.r#type(SdkIntegrationType::Mock),
        };
        request
            .send()
            .await
            .map_err(|failure| classify("putIntegration", failure))?;
        Ok(())
    }

    async fn put_method_response(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        status_code: &str,
        response_parameters: &HashMap<String, bool>,
    ) -> Result<(), DeployError> {
        let parameters = if response_parameters.is_empty() {
            None
        } else {
            Some(response_parameters.clone())
        };
        self.client
            .put_method_response()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(verb)
            .status_code(status_code)
            .set_response_parameters(parameters)
            .send()
            .await
            .map_err(|failure| classify("putMethodResponse", failure))?;
        Ok(())
    }

    async fn put_integration_response(
        &self,
        api_id: &str,
        resource_id: &str,
        verb: &str,
        status_code: &str,
        spec: &IntegrationResponseSpec,
    ) -> Result<(), DeployError> {
        let parameters = if spec.response_parameters.is_empty() {
            None
        } else {
            Some(spec.response_parameters.clone())
        };
        let templates = if spec.response_templates.is_empty() {
            None
        } else {
            Some(spec.response_templates.clone())
        };
        self.client
            .put_integration_response()
            .rest_api_id(api_id)
            .resource_id(resource_id)
            .http_method(verb)
            .status_code(status_code)
            .set_response_parameters(parameters)
            .set_response_templates(templates)
            .set_content_handling(
                spec.content_handling
                    .as_deref()
                    .map(ContentHandlingStrategy::from),
            )
            .send()
            .await
            .map_err(|failure| classify("putIntegrationResponse", failure))?;
        Ok(())
    }

    async fn get_authorizers(&self, api_id: &str) -> Result<Vec<AuthorizerSummary>, DeployError> {
        let listing = self
            .client
            .get_authorizers()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|failure| classify("getAuthorizers", failure))?;
        Ok(listing
            .items()
            .iter()
            .map(|authorizer| AuthorizerSummary {
                id: authorizer.id().unwrap_or_default().to_string(),
                name: authorizer.name().unwrap_or_default().to_string(),
            })
            .collect())
    }

    async fn create_authorizer(
        &self,
        api_id: &str,
        spec: &AuthorizerSpec,
    ) -> Result<String, DeployError> {
        let provider_arns = if spec.provider_arns.is_empty() {
            None
        } else {
            Some(spec.provider_arns.clone())
        };
        let created = self
            .client
            .create_authorizer()
            .rest_api_id(api_id)
            .name(&spec.name)
            .r#type(match spec.authorizer_type {
                AuthorizerType::Token => SdkAuthorizerType::Token,
                AuthorizerType::CognitoUserPools => SdkAuthorizerType::CognitoUserPools,
            })
            .set_authorizer_uri(spec.authorizer_uri.clone())
            .set_provider_arns(provider_arns)
            .identity_source(&spec.identity_source)
            .set_identity_validation_expression(spec.validation_expression.clone())
            .set_authorizer_credentials(spec.credentials.clone())
            .set_authorizer_result_ttl_in_seconds(spec.result_ttl_seconds)
            .send()
            .await
            .map_err(|failure| classify("createAuthorizer", failure))?;
        created
            .id()
            .map(str::to_string)
            .ok_or_else(|| DeployError::remote("createAuthorizer", "response carried no id"))
    }

    async fn delete_authorizer(
        &self,
        api_id: &str,
        authorizer_id: &str,
    ) -> Result<(), DeployError> {
        self.client
            .delete_authorizer()
            .rest_api_id(api_id)
            .authorizer_id(authorizer_id)
            .send()
            .await
            .map_err(|failure| classify("deleteAuthorizer", failure))?;
        Ok(())
    }

    async fn get_gateway_responses(
        &self,
        api_id: &str,
    ) -> Result<Vec<GatewayResponseSummary>, DeployError> {
        let listing = self
            .client
            .get_gateway_responses()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|failure| classify("getGatewayResponses", failure))?;
        Ok(listing
            .items()
            .iter()
            .map(|response| GatewayResponseSummary {
                response_type: response
                    .response_type()
                    .map(|kind| kind.as_str().to_string())
                    .unwrap_or_default(),
                is_default: response.default_response(),
            })
            .collect())
    }

    async fn put_gateway_response(
        &self,
        api_id: &str,
        response_type: &str,
        spec: &GatewayResponseSpec,
    ) -> Result<(), DeployError> {
        let parameters = if spec.response_parameters.is_empty() {
            None
        } else {
            Some(spec.response_parameters.clone())
        };
        let templates = if spec.response_templates.is_empty() {
            None
        } else {
            Some(spec.response_templates.clone())
        };
        self.client
            .put_gateway_response()
            .rest_api_id(api_id)
            .response_type(GatewayResponseType::from(response_type))
            .set_status_code(spec.status_code.clone())
            .set_response_parameters(parameters)
            .set_response_templates(templates)
            .send()
            .await
            .map_err(|failure| classify("putGatewayResponse", failure))?;
        Ok(())
    }

    async fn delete_gateway_response(
        &self,
        api_id: &str,
        response_type: &str,
    ) -> Result<(), DeployError> {
        self.client
            .delete_gateway_response()
            .rest_api_id(api_id)
            .response_type(GatewayResponseType::from(response_type))
            .send()
            .await
            .map_err(|failure| classify("deleteGatewayResponse", failure))?;
        Ok(())
    }

    async fn get_binary_media_types(&self, api_id: &str) -> Result<Vec<String>, DeployError> {
        let api = self
            .client
            .get_rest_api()
            .rest_api_id(api_id)
            .send()
            .await
            .map_err(|failure| classify("getRestApi", failure))?;
        Ok(api.binary_media_types().to_vec())
    }

    async fn update_rest_api(&self, api_id: &str, ops: &[PatchOp]) -> Result<(), DeployError> {
        let mut request = self.client.update_rest_api().rest_api_id(api_id);
        for op in ops {
            request = request.patch_operations(
                PatchOperation::builder()
                    .op(match op.op {
                        PatchOpKind::Add => Op::Add,
                        PatchOpKind::Remove => Op::Remove,
                    })
                    .path(&op.path)
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|failure| classify("updateRestApi", failure))?;
        Ok(())
    }

    async fn create_deployment(
        &self,
        api_id: &str,
        stage_name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), DeployError> {
        self.client
            .create_deployment()
            .rest_api_id(api_id)
            .stage_name(stage_name)
            .set_variables(Some(variables.clone()))
            .send()
            .await
            .map_err(|failure| classify("createDeployment", failure))?;
        Ok(())
    }

    async fn get_stage(&self, api_id: &str, stage_name: &str) -> Result<StageInfo, DeployError> {
        let stage = self
            .client
            .get_stage()
            .rest_api_id(api_id)
            .stage_name(stage_name)
            .send()
            .await
            .map_err(|failure| classify("getStage", failure))?;
        Ok(StageInfo {
            variables: stage.variables().cloned().unwrap_or_default(),
        })
    }
}
