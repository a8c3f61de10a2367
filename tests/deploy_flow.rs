//! End-to-end engine tests over the in-memory collaborators.

mod common;

use common::{mutating_calls, seeded_state, MockFunctions, MockGateway};
use gatewright_sdk::remote::IntegrationType;
use gatewright_sdk::{DeployOutcome, DeployRequest, Deployer};

fn request(config: serde_json::Value, cache_var: Option<&str>) -> DeployRequest {
    DeployRequest {
        api_id: "api123".into(),
        stage_name: "latest".into(),
        function_arn: "arn:aws:lambda:us-east-1:123456789012:function:echo".into(),
        version: "42".into(),
        config: serde_json::from_value(config).unwrap(),
        cache_stage_var: cache_var.map(str::to_string),
    }
}

fn basic_routes() -> serde_json::Value {
    serde_json::json!({
        "version": 4,
        "routes": {
            "": {"ANY": {}},
            "echo": {"GET": {}},
            "users": {"GET": {}},
            "users/{id}": {"GET": {}, "PUT": {}}
        }
    })
}

#[tokio::test]
async fn full_deploy_builds_declared_tree() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let outcome = deployer.deploy(&request(basic_routes(), None)).await.unwrap();
    assert!(matches!(outcome, DeployOutcome::Deployed { .. }));

    let state = state.lock().unwrap();
    let mut paths: Vec<&str> = state
        .resources
        .iter()
        .map(|resource| resource.path.as_str())
        .collect();
    paths.sort_unstable();
    assert_eq!(paths, vec!["/", "/echo", "/users", "/users/{id}"]);

    let echo_id = state
        .resources
        .iter()
        .find(|resource| resource.path == "/echo")
        .unwrap()
        .id
        .clone();
    let integration = state
        .integrations
        .get(&(echo_id.clone(), "GET".to_string()))
        .unwrap();
    let uri = integration.uri.as_deref().unwrap();
    assert!(uri.contains("${stageVariables.lambdaVersion}"));
    assert!(uri.ends_with("/invocations"));

    // Default CORS mode synthesizes OPTIONS on every path without one.
    assert!(state
        .methods
        .contains_key(&(echo_id.clone(), "OPTIONS".to_string())));
    assert_eq!(
        state
            .integrations
            .get(&(echo_id, "OPTIONS".to_string()))
            .unwrap()
            .integration_type,
        IntegrationType::Mock
    );

    let users_id = state
        .resources
        .iter()
        .find(|resource| resource.path == "/users/{id}")
        .unwrap()
        .id
        .clone();
    let method = state.methods.get(&(users_id, "GET".to_string())).unwrap();
    assert_eq!(
        method.request_parameters.get("method.request.path.id"),
        Some(&true)
    );

    let stage = state.stages.get("latest").unwrap();
    assert_eq!(stage.get("lambdaVersion").map(String::as_str), Some("42"));
}

#[tokio::test]
async fn second_identical_deploy_is_a_cache_hit_with_zero_mutations() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let first = deployer
        .deploy(&request(basic_routes(), Some("configHash")))
        .await
        .unwrap();
    let DeployOutcome::Deployed { config_hash, .. } = first else {
        panic!("first deploy must rebuild");
    };
    assert_eq!(
        state
            .lock()
            .unwrap()
            .stages
            .get("latest")
            .unwrap()
            .get("configHash"),
        Some(&config_hash)
    );

    let calls_after_first = mutating_calls(&state);
    let second = deployer
        .deploy(&request(basic_routes(), Some("configHash")))
        .await
        .unwrap();
    assert_eq!(second, DeployOutcome::CacheHit);
    assert_eq!(mutating_calls(&state), calls_after_first);
}

#[tokio::test]
async fn changed_config_invalidates_cache_and_drops_stale_paths() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let before = serde_json::json!({
        "version": 4,
        "routes": {"old": {"GET": {}}}
    });
    let after = serde_json::json!({
        "version": 4,
        "routes": {"new": {"GET": {}}}
    });
    deployer
        .deploy(&request(before, Some("configHash")))
        .await
        .unwrap();
    let outcome = deployer
        .deploy(&request(after, Some("configHash")))
        .await
        .unwrap();
    assert!(matches!(outcome, DeployOutcome::Deployed { .. }));

    let state = state.lock().unwrap();
    assert!(state.resources.iter().any(|resource| resource.path == "/new"));
    assert!(!state.resources.iter().any(|resource| resource.path == "/old"));
}

#[tokio::test]
async fn disabled_cors_synthesizes_no_options_method() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let config = serde_json::json!({
        "version": 4,
        "routes": {"echo": {"GET": {}}},
        "corsHandlers": false
    });
    deployer.deploy(&request(config, None)).await.unwrap();

    let state = state.lock().unwrap();
    assert!(!state.methods.keys().any(|(_, verb)| verb == "OPTIONS"));
}

#[tokio::test]
async fn handled_cors_proxies_options_to_the_function() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let config = serde_json::json!({
        "version": 4,
        "routes": {"echo": {"GET": {}}},
        "corsHandlers": true
    });
    deployer.deploy(&request(config, None)).await.unwrap();

    let state = state.lock().unwrap();
    let echo_id = state
        .resources
        .iter()
        .find(|resource| resource.path == "/echo")
        .unwrap()
        .id
        .clone();
    let options = state
        .integrations
        .get(&(echo_id, "OPTIONS".to_string()))
        .unwrap();
    assert_eq!(options.integration_type, IntegrationType::AwsProxy);
    assert!(options.uri.is_some());
}

#[tokio::test]
async fn custom_responses_replace_previous_custom_set_but_not_defaults() {
    let state = seeded_state();
    {
        let mut seeded = state.lock().unwrap();
        seeded.gateway_responses.push((
            "DEFAULT_4XX".into(),
            gatewright_sdk::remote::GatewayResponseSpec::default(),
            true,
        ));
        seeded.gateway_responses.push((
            "UNAUTHORIZED".into(),
            gatewright_sdk::remote::GatewayResponseSpec::default(),
            false,
        ));
    }
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let config = serde_json::json!({
        "version": 4,
        "routes": {"echo": {"GET": {}}},
        "customResponses": {
            "ACCESS_DENIED": {"statusCode": 403, "headers": {"X-Reason": "denied"}}
        }
    });
    deployer.deploy(&request(config, None)).await.unwrap();

    let state = state.lock().unwrap();
    let types: Vec<&str> = state
        .gateway_responses
        .iter()
        .map(|(response_type, _, _)| response_type.as_str())
        .collect();
    assert!(types.contains(&"DEFAULT_4XX"));
    assert!(!types.contains(&"UNAUTHORIZED"));
    let (_, access_denied, _) = state
        .gateway_responses
        .iter()
        .find(|(response_type, _, _)| response_type == "ACCESS_DENIED")
        .unwrap();
    assert_eq!(access_denied.status_code.as_deref(), Some("403"));
    assert_eq!(
        access_denied
            .response_parameters
            .get("gatewayresponse.header.X-Reason")
            .map(String::as_str),
        Some("'denied'")
    );
}

#[tokio::test]
async fn repeated_deploys_do_not_duplicate_the_invoke_grant() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    deployer.deploy(&request(basic_routes(), None)).await.unwrap();
    deployer.deploy(&request(basic_routes(), None)).await.unwrap();

    let state = state.lock().unwrap();
    let grants = state.policies.get("echo").unwrap();
    let source = "arn:aws:execute-api:us-east-1:123456789012:api123/*/*/*";
    let matching = grants
        .iter()
        .filter(|statement| {
            statement.condition["ArnLike"]["AWS:SourceArn"].as_str() == Some(source)
        })
        .count();
    assert_eq!(matching, 1);
}

#[tokio::test]
async fn binary_media_types_are_patched_to_match_the_config() {
    let state = seeded_state();
    let gateway = MockGateway { state: state.clone() };
    let functions = MockFunctions { state: state.clone() };
    let deployer = Deployer::new(&gateway, &functions);

    let with_both = serde_json::json!({
        "version": 4,
        "routes": {"echo": {"GET": {}}},
        "binaryMediaTypes": ["image/png", "image/jpg"]
    });
    deployer.deploy(&request(with_both, None)).await.unwrap();
    assert_eq!(
        state.lock().unwrap().binary_media_types,
        vec!["image/png".to_string(), "image/jpg".to_string()]
    );

    let png_only = serde_json::json!({
        "version": 4,
        "routes": {"echo": {"GET": {}}},
        "binaryMediaTypes": ["image/png"]
    });
    deployer.deploy(&request(png_only, None)).await.unwrap();
    assert_eq!(
        state.lock().unwrap().binary_media_types,
        vec!["image/png".to_string()]
    );
}
