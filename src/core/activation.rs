//! Integration activation
//!
//! Which products exist, in which order they activate, and whether they need
//! an awaited setup step is all declared in one table. Activation walks the
//! enabled entries sequentially and hands each integration to the aggregator.

use crate::config::credentials::ResolvedCredentials;
use crate::core::integration::{Integration, Product, Readiness};
use crate::core::protocol::Implementation;
use crate::core::server::{AggregatorServer, ServerHandle};
use crate::core::service::AggregateService;
use crate::integrations::{
    ApiHubIntegration, BugsnagIntegration, CollaboratorIntegration, PactIntegration,
    QmetryIntegration, ReflectIntegration, ZephyrIntegration,
};
use crate::utils::errors::{McpError, McpResult};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds one integration. Receives the aggregate's handle, which only some
/// integrations keep.
pub type Constructor = Box<dyn FnOnce(&ServerHandle) -> McpResult<Box<dyn Integration>> + Send>;

/// One enabled product, ready to be constructed.
pub struct IntegrationEntry {
    pub product: Product,
    pub readiness: Readiness,
    constructor: Constructor,
}

impl IntegrationEntry {
    pub fn new<F>(product: Product, readiness: Readiness, constructor: F) -> Self
    where
        F: FnOnce(&ServerHandle) -> McpResult<Box<dyn Integration>> + Send + 'static,
    {
        Self {
            product,
            readiness,
            constructor: Box::new(constructor),
        }
    }
}

impl fmt::Debug for IntegrationEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntegrationEntry")
            .field("product", &self.product)
            .field("readiness", &self.readiness)
            .finish_non_exhaustive()
    }
}

struct Descriptor {
    product: Product,
    readiness: Readiness,
    select: fn(&ResolvedCredentials) -> Option<Constructor>,
}

const DESCRIPTORS: [Descriptor; 7] = [
    Descriptor {
        product: Product::Reflect,
        readiness: Readiness::Immediate,
        select: reflect,
    },
    Descriptor {
        product: Product::Bugsnag,
        readiness: Readiness::AwaitInit,
        select: bugsnag,
    },
    Descriptor {
        product: Product::ApiHub,
        readiness: Readiness::Immediate,
        select: api_hub,
    },
    Descriptor {
        product: Product::Pact,
        readiness: Readiness::Immediate,
        select: pact,
    },
    Descriptor {
        product: Product::Qmetry,
        readiness: Readiness::Immediate,
        select: qmetry,
    },
    Descriptor {
        product: Product::Zephyr,
        readiness: Readiness::Immediate,
        select: zephyr,
    },
    Descriptor {
        product: Product::Collaborator,
        readiness: Readiness::Immediate,
        select: collaborator,
    },
];

fn boxed<I: Integration + 'static>(integration: McpResult<I>) -> McpResult<Box<dyn Integration>> {
    Ok(Box::new(integration?))
}

fn reflect(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.reflect.clone()?;
    Some(Box::new(move |_: &ServerHandle| {
        boxed(ReflectIntegration::new(&credentials))
    }))
}

fn bugsnag(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.bugsnag.clone()?;
    Some(Box::new(move |_: &ServerHandle| {
        boxed(BugsnagIntegration::new(&credentials))
    }))
}

fn api_hub(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.api_hub.clone()?;
    Some(Box::new(move |_: &ServerHandle| {
        boxed(ApiHubIntegration::new(&credentials))
    }))
}

fn pact(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.pact.clone()?;
    Some(Box::new(move |server: &ServerHandle| {
        boxed(PactIntegration::new(&credentials, server))
    }))
}

fn qmetry(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.qmetry.clone()?;
    Some(Box::new(move |_: &ServerHandle| {
        boxed(QmetryIntegration::new(&credentials))
    }))
}

fn zephyr(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.zephyr.clone()?;
    Some(Box::new(move |_: &ServerHandle| {
        boxed(ZephyrIntegration::new(&credentials))
    }))
}

fn collaborator(credentials: &ResolvedCredentials) -> Option<Constructor> {
    let credentials = credentials.collaborator.clone()?;
    Some(Box::new(move |_: &ServerHandle| {
        boxed(CollaboratorIntegration::new(&credentials))
    }))
}

/// The entries for every product whose credentials resolved, in activation
/// order.
pub fn plan(credentials: &ResolvedCredentials) -> Vec<IntegrationEntry> {
    DESCRIPTORS
        .iter()
        .filter_map(|descriptor| {
            (descriptor.select)(credentials).map(|constructor| IntegrationEntry {
                product: descriptor.product,
                readiness: descriptor.readiness,
                constructor,
            })
        })
        .collect()
}

/// Products that activated, in activation order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    pub activated: Vec<Product>,
}

/// Construct, initialize and register each entry in order.
///
/// The first failure aborts activation. An empty entry list is
/// `McpError::NoIntegrations`.
pub async fn activate(
    server: &mut AggregatorServer,
    entries: Vec<IntegrationEntry>,
) -> McpResult<ActivationReport> {
    let mut report = ActivationReport::default();

    for IntegrationEntry {
        product,
        readiness,
        constructor,
    } in entries
    {
        let initialization_failed = |e: McpError| {
            warn!(product = %product, error = %e, "Integration failed to start");
            McpError::Initialization {
                product,
                message: e.to_string(),
            }
        };

        let mut integration = constructor(&server.handle()).map_err(initialization_failed)?;
        if readiness == Readiness::AwaitInit {
            info!(product = %product, "Waiting for integration to initialize");
            integration
                .initialize()
                .await
                .map_err(initialization_failed)?;
        }

        server.add_client(integration)?;
        report.activated.push(product);
    }

    if report.activated.is_empty() {
        return Err(McpError::NoIntegrations);
    }
    Ok(report)
}

/// Resolve, activate and seal: everything between reading the environment
/// and connecting a transport.
pub async fn bootstrap(credentials: &ResolvedCredentials) -> McpResult<Arc<AggregateService>> {
    let mut server = AggregatorServer::new(Implementation::gateway());
    let report = activate(&mut server, plan(credentials)).await?;

    let names: Vec<&str> = report.activated.iter().map(|p| p.display_name()).collect();
    info!(
        products = %names.join(", "),
        tools = server.handle().tool_names().len(),
        "Gateway ready"
    );
    server.seal()
}
