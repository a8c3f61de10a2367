//! In-memory collaborators for engine-level tests: a resource tree, an
//! authorizer set, stages and function policies, plus a mutating-call
//! counter for the cache-hit property.

#![allow(dead_code)]

use async_trait::async_trait;
use gatewright_sdk::error::DeployError;
use gatewright_sdk::remote::{
    AuthorizerSpec, AuthorizerSummary, FunctionRegistry, GatewayApi, GatewayResponseSpec,
    GatewayResponseSummary, IntegrationResponseSpec, IntegrationSpec, InvokeGrant, MethodSpec,
    PatchOp, PatchOpKind, PolicyStatement, ResourceSummary, StageInfo,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug)]
pub struct ResourceRecord {
    pub id: String,
    pub path: String,
    pub parent_id: Option<String>,
}

#[derive(Default)]
pub struct MockState {
    next_id: u32,
    pub resources: Vec<ResourceRecord>,
    pub methods: HashMap<(String, String), MethodSpec>,
    pub integrations: HashMap<(String, String), IntegrationSpec>,
    pub method_responses: HashMap<(String, String, String), HashMap<String, bool>>,
    pub integration_responses: HashMap<(String, String, String), IntegrationResponseSpec>,
    pub authorizers: Vec<(String, AuthorizerSpec)>,
    /// (response_type, spec, is_default)
    pub gateway_responses: Vec<(String, GatewayResponseSpec, bool)>,
    pub binary_media_types: Vec<String>,
    pub stages: HashMap<String, HashMap<String, String>>,
    pub functions: HashMap<String, String>,
    pub policies: HashMap<String, Vec<PolicyStatement>>,
    pub mutating_calls: u32,
}

impl MockState {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }
}

/// Build the shared state with a root resource and one registered function.
pub fn seeded_state() -> Arc<Mutex<MockState>> {
    let mut state = MockState::default();
    state.resources.push(ResourceRecord {
        id: "root".into(),
        path: "/".into(),
        parent_id: None,
    });
    state.functions.insert(
        "echo".into(),
        "arn:aws:lambda:us-east-1:123456789012:function:echo".into(),
    );
    state.functions.insert(
        "auth-one".into(),
        "arn:aws:lambda:us-east-1:123456789012:function:auth-one".into(),
    );
    state.functions.insert(
        "auth-two".into(),
        "arn:aws:lambda:us-east-1:123456789012:function:auth-two".into(),
    );
    Arc::new(Mutex::new(state))
}

pub struct MockGateway {
    pub state: Arc<Mutex<MockState>>,
}

pub struct MockFunctions {
    pub state: Arc<Mutex<MockState>>,
}

pub fn mutating_calls(state: &Arc<Mutex<MockState>>) -> u32 {
    state.lock().unwrap().mutating_calls
}

fn missing(what: &str) -> DeployError {
    DeployError::NotFound(what.to_string())
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn get_resources(&self, _api_id: &str) -> Result<Vec<ResourceSummary>, DeployError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .resources
            .iter()
            .map(|resource| ResourceSummary {
                id: resource.id.clone(),
                path: resource.path.clone(),
                parent_id: resource.parent_id.clone(),
                methods: state
                    .methods
                    .keys()
                    .filter(|(resource_id, _)| *resource_id == resource.id)
                    .map(|(_, verb)| verb.clone())
                    .collect(),
            })
            .collect())
    }

    async fn create_resource(
        &self,
        _api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String, DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        let parent_path = state
            .resources
            .iter()
            .find(|resource| resource.id == parent_id)
            .map(|resource| resource.path.clone())
            .ok_or_else(|| missing(parent_id))?;
        let path = if parent_path == "/" {
            format!("/{}", path_part)
        } else {
            format!("{}/{}", parent_path, path_part)
        };
        let id = state.fresh_id("res");
        state.resources.push(ResourceRecord {
            id: id.clone(),
            path,
            parent_id: Some(parent_id.to_string()),
        });
        Ok(id)
    }

    async fn delete_resource(&self, _api_id: &str, resource_id: &str) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        let target = state
            .resources
            .iter()
            .find(|resource| resource.id == resource_id)
            .cloned()
            .ok_or_else(|| missing(resource_id))?;
        // Parents cascade over children, like the real control plane.
        let subtree_prefix = format!("{}/", target.path);
        let removed: Vec<String> = state
            .resources
            .iter()
            .filter(|resource| {
                resource.path == target.path || resource.path.starts_with(&subtree_prefix)
            })
            .map(|resource| resource.id.clone())
            .collect();
        state
            .resources
            .retain(|resource| !removed.contains(&resource.id));
        state
            .methods
            .retain(|(resource_id, _), _| !removed.contains(resource_id));
        state
            .integrations
            .retain(|(resource_id, _), _| !removed.contains(resource_id));
        Ok(())
    }

    async fn delete_method(
        &self,
        _api_id: &str,
        resource_id: &str,
        verb: &str,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state
            .methods
            .remove(&(resource_id.to_string(), verb.to_string()))
            .ok_or_else(|| missing(verb))?;
        state
            .integrations
            .remove(&(resource_id.to_string(), verb.to_string()));
        Ok(())
    }

    async fn put_method(
        &self,
        _api_id: &str,
        resource_id: &str,
        verb: &str,
        spec: &MethodSpec,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state
            .methods
            .insert((resource_id.to_string(), verb.to_string()), spec.clone());
        Ok(())
    }

    async fn put_integration(
        &self,
        _api_id: &str,
        resource_id: &str,
        verb: &str,
        spec: &IntegrationSpec,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state
            .integrations
            .insert((resource_id.to_string(), verb.to_string()), spec.clone());
        Ok(())
    }

    async fn put_method_response(
        &self,
        _api_id: &str,
        resource_id: &str,
        verb: &str,
        status_code: &str,
        response_parameters: &HashMap<String, bool>,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state.method_responses.insert(
            (
                resource_id.to_string(),
                verb.to_string(),
                status_code.to_string(),
            ),
            response_parameters.clone(),
        );
        Ok(())
    }

    async fn put_integration_response(
        &self,
        _api_id: &str,
        resource_id: &str,
        verb: &str,
        status_code: &str,
        spec: &IntegrationResponseSpec,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state.integration_responses.insert(
            (
                resource_id.to_string(),
                verb.to_string(),
                status_code.to_string(),
            ),
            spec.clone(),
        );
        Ok(())
    }

    async fn get_authorizers(&self, _api_id: &str) -> Result<Vec<AuthorizerSummary>, DeployError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .authorizers
            .iter()
            .map(|(id, spec)| AuthorizerSummary {
                id: id.clone(),
                name: spec.name.clone(),
            })
            .collect())
    }

    async fn create_authorizer(
        &self,
        _api_id: &str,
        spec: &AuthorizerSpec,
    ) -> Result<String, DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        let id = state.fresh_id("auth");
        state.authorizers.push((id.clone(), spec.clone()));
        Ok(id)
    }

    async fn delete_authorizer(
        &self,
        _api_id: &str,
        authorizer_id: &str,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        let before = state.authorizers.len();
        state.authorizers.retain(|(id, _)| id != authorizer_id);
        if state.authorizers.len() == before {
            return Err(missing(authorizer_id));
        }
        Ok(())
    }

    async fn get_gateway_responses(
        &self,
        _api_id: &str,
    ) -> Result<Vec<GatewayResponseSummary>, DeployError> {
        let state = self.state.lock().unwrap();
        Ok(state
            .gateway_responses
            .iter()
            .map(|(response_type, _, is_default)| GatewayResponseSummary {
                response_type: response_type.clone(),
                is_default: *is_default,
            })
            .collect())
    }

    async fn put_gateway_response(
        &self,
        _api_id: &str,
        response_type: &str,
        spec: &GatewayResponseSpec,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state
            .gateway_responses
            .retain(|(existing, _, _)| existing != response_type);
        state
            .gateway_responses
            .push((response_type.to_string(), spec.clone(), false));
        Ok(())
    }

    async fn delete_gateway_response(
        &self,
        _api_id: &str,
        response_type: &str,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        let before = state.gateway_responses.len();
        state
            .gateway_responses
            .retain(|(existing, _, _)| existing != response_type);
        if state.gateway_responses.len() == before {
            return Err(missing(response_type));
        }
        Ok(())
    }

    async fn get_binary_media_types(&self, _api_id: &str) -> Result<Vec<String>, DeployError> {
        Ok(self.state.lock().unwrap().binary_media_types.clone())
    }

    async fn update_rest_api(&self, _api_id: &str, ops: &[PatchOp]) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        for op in ops {
            let escaped = op
                .path
                .strip_prefix("/binaryMediaTypes/")
                .ok_or_else(|| DeployError::remote("updateRestApi", "unsupported patch path"))?;
            let media_type = escaped.replace("~1", "/");
            match op.op {
                PatchOpKind::Add => state.binary_media_types.push(media_type),
                PatchOpKind::Remove => {
                    state.binary_media_types.retain(|existing| existing != &media_type)
                }
            }
        }
        Ok(())
    }

    async fn create_deployment(
        &self,
        _api_id: &str,
        stage_name: &str,
        variables: &HashMap<String, String>,
    ) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        state
            .stages
            .insert(stage_name.to_string(), variables.clone());
        Ok(())
    }

    async fn get_stage(&self, _api_id: &str, stage_name: &str) -> Result<StageInfo, DeployError> {
        let state = self.state.lock().unwrap();
        state
            .stages
            .get(stage_name)
            .map(|variables| StageInfo {
                variables: variables.clone(),
            })
            .ok_or_else(|| missing(stage_name))
    }
}

#[async_trait]
impl FunctionRegistry for MockFunctions {
    async fn get_arn(&self, name: &str, _qualifier: Option<&str>) -> Result<String, DeployError> {
        let state = self.state.lock().unwrap();
        state.functions.get(name).cloned().ok_or_else(|| missing(name))
    }

    async fn get_policy(
        &self,
        name: &str,
        _qualifier: Option<&str>,
    ) -> Result<Vec<PolicyStatement>, DeployError> {
        let state = self.state.lock().unwrap();
        state.policies.get(name).cloned().ok_or_else(|| missing(name))
    }

    async fn add_permission(&self, grant: &InvokeGrant) -> Result<(), DeployError> {
        let mut state = self.state.lock().unwrap();
        state.mutating_calls += 1;
        let statement: PolicyStatement = serde_json::from_value(serde_json::json!({
            "Sid": grant.statement_id,
            "Effect": "Allow",
            "Action": "lambda:InvokeFunction",
            "Principal": {"Service": grant.principal},
            "Condition": {"ArnLike": {"AWS:SourceArn": grant.source_arn}}
        }))
        .unwrap();
        state
            .policies
            .entry(grant.function_name.clone())
            .or_default()
            .push(statement);
        Ok(())
    }
}
