//! Example consumer: reconcile and deploy a route configuration against an
//! existing REST API.
//!
//! Run from repo root: `cargo run -p example-consumer -- routes.json`
//! Required env: `GATEWAY_API_ID`, `LAMBDA_ARN`; optional: `GATEWAY_STAGE`
//! (default `latest`), `LAMBDA_VERSION` (default `$LATEST`).

use gatewright_sdk::{AwsFunctionRegistry, AwsGatewayApi, DeployOutcome, DeployRequest, Deployer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gatewright_sdk=info")),
        )
        .init();

    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "routes.json".into());
    let config = serde_json::from_str(&std::fs::read_to_string(&config_path)?)?;

    let api_id = std::env::var("GATEWAY_API_ID")?;
    let stage_name = std::env::var("GATEWAY_STAGE").unwrap_or_else(|_| "latest".into());
    let function_arn = std::env::var("LAMBDA_ARN")?;
    let version = std::env::var("LAMBDA_VERSION").unwrap_or_else(|_| "$LATEST".into());

    let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
    let gateway = AwsGatewayApi::new(&aws_config);
    let functions = AwsFunctionRegistry::new(&aws_config);
    let deployer = Deployer::new(&gateway, &functions)
        .with_on_retry(|| tracing::info!("rate limited, waiting before retry"));

    let request = DeployRequest {
        api_id,
        stage_name,
        function_arn,
        version,
        config,
        cache_stage_var: Some("gatewrightConfigHash".into()),
    };
    match deployer.deploy(&request).await? {
        DeployOutcome::CacheHit => {
            tracing::info!("configuration unchanged, nothing to deploy");
        }
        DeployOutcome::Deployed {
            stage_name,
            version,
            ..
        } => {
            tracing::info!(stage = %stage_name, version = %version, "deployed");
        }
    }
    Ok(())
}
