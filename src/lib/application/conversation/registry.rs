use crate::application::tooling::{ToolInvokeError, ToolSession};
use crate::types::ToolDescriptor;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// Routing table from tool name to the session serving it, plus the flat
/// schema list offered to the model. Built once, read-only afterwards.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    routes: HashMap<String, Arc<dyn ToolSession>>,
    descriptors: Vec<ToolDescriptor>,
}

impl ToolRegistry {
    /// Ask every session for its tools, in order. A later session claiming an
    /// already registered name takes the route over; both schemas stay listed.
    pub async fn connect(sessions: &[Arc<dyn ToolSession>]) -> Result<Self, ToolInvokeError> {
        let mut registry = Self::default();
        for session in sessions {
            let tools = session.list_tools().await?;
            info!(
                server = session.name(),
                tools = tools.len(),
                "registered tools from provider"
            );
            for descriptor in tools {
                if let Some(previous) = registry
                    .routes
                    .insert(descriptor.name.clone(), Arc::clone(session))
                {
                    warn!(
                        tool = descriptor.name.as_str(),
                        previous = previous.name(),
                        current = session.name(),
                        "tool name registered twice, routing to the later provider"
                    );
                }
                registry.descriptors.push(descriptor);
            }
        }
        Ok(registry)
    }

    pub fn resolve(&self, name: &str) -> Option<&Arc<dyn ToolSession>> {
        self.routes.get(name)
    }

    pub fn descriptors(&self) -> &[ToolDescriptor] {
        &self.descriptors
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
