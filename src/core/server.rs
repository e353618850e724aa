//! The aggregator: one namespace for every activated integration

use crate::core::integration::{Integration, Product};
use crate::core::protocol::{Implementation, ResourceDefinition, ToolDefinition};
use crate::core::registrar::{RegisteredResource, RegisteredTool, Registrar};
use crate::core::service::AggregateService;
use crate::utils::errors::{McpError, McpResult};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Tool and resource tables shared between the builder, its handles and the
/// sealed service.
#[derive(Default)]
struct CapabilityRegistry {
    products: Vec<Product>,
    tools: Vec<RegisteredTool>,
    tool_index: HashMap<String, usize>,
    resources: Vec<RegisteredResource>,
    resource_index: HashMap<String, usize>,
}

impl CapabilityRegistry {
    /// Merge one product's staged registrations, all or nothing.
    fn merge(
        &mut self,
        product: Product,
        tools: Vec<RegisteredTool>,
        resources: Vec<RegisteredResource>,
    ) -> McpResult<()> {
        let mut staged_tools: HashMap<&str, Product> = HashMap::new();
        for tool in &tools {
            let existing = self
                .tool_index
                .get(tool.name())
                .map(|&i| self.tools[i].product)
                .or_else(|| staged_tools.get(tool.name()).copied());
            if let Some(existing) = existing {
                return Err(McpError::RegistrationConflict {
                    tool: tool.name().to_string(),
                    existing,
                    incoming: product,
                });
            }
            staged_tools.insert(tool.name(), product);
        }

        let mut staged_resources: HashMap<&str, Product> = HashMap::new();
        for resource in &resources {
            let existing = self
                .resource_index
                .get(resource.uri())
                .map(|&i| self.resources[i].product)
                .or_else(|| staged_resources.get(resource.uri()).copied());
            if let Some(existing) = existing {
                return Err(McpError::ResourceConflict {
                    uri: resource.uri().to_string(),
                    existing,
                    incoming: product,
                });
            }
            staged_resources.insert(resource.uri(), product);
        }

        for tool in tools {
            self.tool_index.insert(tool.name().to_string(), self.tools.len());
            self.tools.push(tool);
        }
        for resource in resources {
            self.resource_index
                .insert(resource.uri().to_string(), self.resources.len());
            self.resources.push(resource);
        }
        self.products.push(product);
        Ok(())
    }
}

struct ServerShared {
    info: Implementation,
    registry: RwLock<CapabilityRegistry>,
}

/// Summary of one aggregated tool, as seen through a [`ServerHandle`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub product: Product,
}

/// Stable, read-only view of the aggregate.
///
/// Handed out before the set of integrations is final, so an integration can
/// expose resources describing the whole gateway. Everything read through it
/// reflects the registrations at the time of the call.
#[derive(Clone)]
pub struct ServerHandle {
    shared: Arc<ServerShared>,
}

impl ServerHandle {
    pub fn server_info(&self) -> &Implementation {
        &self.shared.info
    }

    pub fn products(&self) -> Vec<Product> {
        self.shared.registry.read().products.clone()
    }

    pub fn tool_names(&self) -> Vec<String> {
        let registry = self.shared.registry.read();
        registry.tools.iter().map(|t| t.name().to_string()).collect()
    }

    pub fn tool_definitions(&self) -> Vec<ToolDefinition> {
        let registry = self.shared.registry.read();
        registry.tools.iter().map(|t| t.definition.clone()).collect()
    }

    pub fn tool_summaries(&self) -> Vec<ToolSummary> {
        let registry = self.shared.registry.read();
        registry
            .tools
            .iter()
            .map(|t| ToolSummary {
                name: t.definition.name.clone(),
                description: t.definition.description.clone(),
                product: t.product,
            })
            .collect()
    }

    pub fn tool_owner(&self, name: &str) -> Option<Product> {
        self.find_tool(name).map(|t| t.product)
    }

    pub fn resource_definitions(&self) -> Vec<ResourceDefinition> {
        let registry = self.shared.registry.read();
        registry
            .resources
            .iter()
            .map(|r| r.definition.clone())
            .collect()
    }

    pub(crate) fn find_tool(&self, name: &str) -> Option<RegisteredTool> {
        let registry = self.shared.registry.read();
        registry
            .tool_index
            .get(name)
            .map(|&i| registry.tools[i].clone())
    }

    pub(crate) fn find_resource(&self, uri: &str) -> Option<RegisteredResource> {
        let registry = self.shared.registry.read();
        registry
            .resource_index
            .get(uri)
            .map(|&i| registry.resources[i].clone())
    }

    /// A non-owning handle, for resources registered into the aggregate they
    /// describe.
    pub fn downgrade(&self) -> WeakServerHandle {
        WeakServerHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }
}

#[derive(Clone)]
pub struct WeakServerHandle {
    shared: Weak<ServerShared>,
}

impl WeakServerHandle {
    pub fn upgrade(&self) -> Option<ServerHandle> {
        self.shared.upgrade().map(|shared| ServerHandle { shared })
    }
}

/// Builder half of the aggregate. Collects integrations until sealed.
pub struct AggregatorServer {
    handle: ServerHandle,
    integrations: Vec<Box<dyn Integration>>,
}

impl AggregatorServer {
    pub fn new(info: Implementation) -> Self {
        Self {
            handle: ServerHandle {
                shared: Arc::new(ServerShared {
                    info,
                    registry: RwLock::new(CapabilityRegistry::default()),
                }),
            },
            integrations: Vec::new(),
        }
    }

    pub fn handle(&self) -> ServerHandle {
        self.handle.clone()
    }

    /// Register one integration's tools and resources.
    ///
    /// Fails without side effects when any of its tool names or resource URIs
    /// is already taken.
    pub fn add_client(&mut self, integration: Box<dyn Integration>) -> McpResult<()> {
        let product = integration.product();
        let mut registrar = Registrar::new(product);
        integration.register(&mut registrar)?;
        let (tools, resources) = registrar.into_parts();
        let tool_names: Vec<String> = tools.iter().map(|t| t.name().to_string()).collect();
        let resource_count = resources.len();

        self.handle
            .shared
            .registry
            .write()
            .merge(product, tools, resources)?;

        debug!(product = %product, tools = ?tool_names, "Registered tools");
        info!(
            product = %product,
            tools = tool_names.len(),
            resources = resource_count,
            "Integration registered"
        );
        self.integrations.push(integration);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.integrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.integrations.is_empty()
    }

    pub fn products(&self) -> Vec<Product> {
        self.integrations.iter().map(|i| i.product()).collect()
    }

    /// Freeze the aggregate and turn it into a request-serving service.
    pub fn seal(self) -> McpResult<Arc<AggregateService>> {
        if self.integrations.is_empty() {
            return Err(McpError::NoIntegrations);
        }
        Ok(Arc::new(AggregateService::new(
            self.handle,
            self.integrations,
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registrar::NoArguments;
    use serde_json::json;

    struct Fixed {
        product: Product,
        tools: Vec<&'static str>,
    }

    impl Integration for Fixed {
        fn product(&self) -> Product {
            self.product
        }

        fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
            for name in &self.tools {
                registrar.tool(*name, "fixed", |_: NoArguments| async { Ok(json!(null)) });
            }
            Ok(())
        }
    }

    fn fixed(product: Product, tools: &[&'static str]) -> Box<dyn Integration> {
        Box::new(Fixed {
            product,
            tools: tools.to_vec(),
        })
    }

    #[test]
    fn test_duplicate_within_one_integration_is_rejected() {
        let mut server = AggregatorServer::new(Implementation::gateway());
        let err = server
            .add_client(fixed(Product::Reflect, &["a", "a"]))
            .unwrap_err();
        assert!(matches!(err, McpError::RegistrationConflict { .. }));
        assert!(server.is_empty());
        assert!(server.handle().tool_names().is_empty());
    }

    #[test]
    fn test_registration_order_is_preserved() {
        let mut server = AggregatorServer::new(Implementation::gateway());
        server.add_client(fixed(Product::Reflect, &["b", "a"])).unwrap();
        server.add_client(fixed(Product::Zephyr, &["c"])).unwrap();
        assert_eq!(server.handle().tool_names(), vec!["b", "a", "c"]);
        assert_eq!(server.products(), vec![Product::Reflect, Product::Zephyr]);
        assert_eq!(server.handle().tool_owner("c"), Some(Product::Zephyr));
    }

    #[test]
    fn test_seal_empty_server_fails() {
        let server = AggregatorServer::new(Implementation::gateway());
        assert!(matches!(server.seal(), Err(McpError::NoIntegrations)));
    }
}
