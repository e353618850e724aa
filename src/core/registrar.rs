//! Tool and resource registration for integrations

use crate::core::integration::Product;
use crate::core::protocol::{ResourceDefinition, ToolDefinition};
use crate::utils::errors::{McpError, McpResult};
use futures::future::BoxFuture;
use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;

pub type ToolFuture = BoxFuture<'static, McpResult<Value>>;
pub type ToolHandler = Arc<dyn Fn(Value) -> ToolFuture + Send + Sync>;
pub type ResourceFuture = BoxFuture<'static, McpResult<String>>;
pub type ResourceReader = Arc<dyn Fn() -> ResourceFuture + Send + Sync>;

/// Argument type for tools that take no input.
#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct NoArguments {}

/// A tool owned by one product, callable through the aggregate.
#[derive(Clone)]
pub struct RegisteredTool {
    pub product: Product,
    pub definition: ToolDefinition,
    handler: ToolHandler,
}

impl RegisteredTool {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    pub async fn call(&self, arguments: Value) -> McpResult<Value> {
        (self.handler)(arguments).await
    }
}

impl std::fmt::Debug for RegisteredTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredTool")
            .field("product", &self.product)
            .field("name", &self.definition.name)
            .finish()
    }
}

/// A readable resource owned by one product.
#[derive(Clone)]
pub struct RegisteredResource {
    pub product: Product,
    pub definition: ResourceDefinition,
    reader: ResourceReader,
}

impl RegisteredResource {
    pub fn uri(&self) -> &str {
        &self.definition.uri
    }

    pub async fn read(&self) -> McpResult<String> {
        (self.reader)().await
    }
}

impl std::fmt::Debug for RegisteredResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredResource")
            .field("product", &self.product)
            .field("uri", &self.definition.uri)
            .finish()
    }
}

/// Staging area handed to `Integration::register`.
///
/// Nothing staged here is visible to the aggregate until the whole
/// registration has been accepted.
pub struct Registrar {
    product: Product,
    tools: Vec<RegisteredTool>,
    resources: Vec<RegisteredResource>,
}

impl Registrar {
    pub fn new(product: Product) -> Self {
        Self {
            product,
            tools: Vec::new(),
            resources: Vec::new(),
        }
    }

    pub fn product(&self) -> Product {
        self.product
    }

    /// Register a tool whose arguments deserialize into `A`.
    ///
    /// The input schema advertised to the agent is generated from `A`.
    pub fn tool<A, F, Fut>(
        &mut self,
        name: impl Into<String>,
        description: impl Into<String>,
        handler: F,
    ) -> &mut Self
    where
        A: DeserializeOwned + JsonSchema + Send + 'static,
        F: Fn(A) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<Value>> + Send + 'static,
    {
        let handler = Arc::new(handler);
        let erased: ToolHandler = Arc::new(move |arguments: Value| -> ToolFuture {
            let handler = handler.clone();
            Box::pin(async move {
                let arguments: A = serde_json::from_value(arguments)
                    .map_err(|e| McpError::InvalidParams(e.to_string()))?;
                handler(arguments).await
            })
        });

        self.tools.push(RegisteredTool {
            product: self.product,
            definition: ToolDefinition {
                name: name.into(),
                description: description.into(),
                input_schema: input_schema_for::<A>(),
            },
            handler: erased,
        });
        self
    }

    pub fn resource<F, Fut>(&mut self, definition: ResourceDefinition, read: F) -> &mut Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = McpResult<String>> + Send + 'static,
    {
        let reader: ResourceReader = Arc::new(move || -> ResourceFuture { Box::pin(read()) });
        self.resources.push(RegisteredResource {
            product: self.product,
            definition,
            reader,
        });
        self
    }

    pub fn into_parts(self) -> (Vec<RegisteredTool>, Vec<RegisteredResource>) {
        (self.tools, self.resources)
    }
}

fn input_schema_for<A: JsonSchema>() -> Value {
    let schema = schema_for!(A);
    let mut value = serde_json::to_value(&schema).unwrap_or_else(|_| json!({ "type": "object" }));
    if let Some(object) = value.as_object_mut() {
        object.remove("$schema");
    }
    value
}
