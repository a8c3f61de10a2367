//! Config validation: verb and authorizer-reference integrity.
//!
//! Everything here runs before the first remote call; a config that passes
//! `validate` never fails with `ConfigError` mid-deploy.

use crate::config::{AuthorizerConfig, RouteConfig};
use crate::error::ConfigError;

const VERBS: &[&str] = &[
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "ANY",
];

pub fn validate(config: &RouteConfig) -> Result<(), ConfigError> {
    if config.routes.is_empty() {
        return Err(ConfigError::Validation("at least one route required".into()));
    }

    for (name, authorizer) in &config.authorizers {
        validate_authorizer_target(name, authorizer)?;
    }

    for (path, methods) in &config.routes {
        for (verb, options) in methods {
            if !VERBS.contains(&verb.as_str()) {
                return Err(ConfigError::InvalidMethod {
                    verb: verb.clone(),
                    path: path.clone(),
                });
            }
            for reference in [&options.custom_authorizer, &options.cognito_authorizer] {
                if let Some(name) = reference {
                    if !config.authorizers.contains_key(name) {
                        return Err(ConfigError::MissingAuthorizer {
                            name: name.clone(),
                            verb: verb.clone(),
                            path: path.clone(),
                        });
                    }
                }
            }
        }
    }

    Ok(())
}

fn validate_authorizer_target(name: &str, authorizer: &AuthorizerConfig) -> Result<(), ConfigError> {
    match (&authorizer.lambda_arn, &authorizer.lambda_name) {
        (Some(_), None) | (None, Some(_)) => Ok(()),
        // Pool-based authorizers authenticate against the provider pools and
        // need no function at all.
        (None, None) if authorizer.provider_arns.is_some() => Ok(()),
        _ => Err(ConfigError::AmbiguousAuthorizerTarget(name.to_string())),
    }
}
