//! Path-segment resource resolution, memoized per reconciliation run.

use crate::deploy::DeployContext;
use crate::error::DeployError;
use crate::paths::split_path;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

/// Resolves route paths to live resource ids, creating missing segments
/// parent-first. The memo is scoped to one reconciliation pass and is
/// pre-seeded with the root resource at key `""`, so each shared path prefix
/// is created at most once per run regardless of sibling processing order.
pub(crate) struct ResourceTreeBuilder {
    known_ids: HashMap<String, String>,
}

impl ResourceTreeBuilder {
    pub fn new(root_resource_id: String) -> Self {
        let mut known_ids = HashMap::new();
        known_ids.insert(String::new(), root_resource_id);
        ResourceTreeBuilder { known_ids }
    }

    /// Resource id for `path`, creating it (and any missing ancestors) on
    /// first sight.
    pub fn resolve<'a>(
        &'a mut self,
        ctx: &'a DeployContext<'a>,
        api_id: &'a str,
        path: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String, DeployError>> + Send + 'a>> {
        Box::pin(async move {
            let key = normalize(path);
            if let Some(id) = self.known_ids.get(&key) {
                return Ok(id.clone());
            }
            let split = split_path(&key);
            let parent_id = self.resolve(ctx, api_id, &split.parent_path).await?;
            let id = ctx
                .call("createResource", || {
                    ctx.gateway
                        .create_resource(api_id, &parent_id, &split.path_part)
                })
                .await?;
            tracing::debug!(path = %key, resource_id = %id, "created resource");
            self.known_ids.insert(key, id.clone());
            Ok(id)
        })
    }
}

fn normalize(path: &str) -> String {
    path.trim_matches('/').to_string()
}
