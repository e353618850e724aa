pub mod activation;
pub mod integration;
pub mod protocol;
pub mod registrar;
pub mod server;
pub mod service;

pub use activation::{activate, bootstrap, plan, ActivationReport, IntegrationEntry};
pub use integration::{Integration, Product, Readiness};
pub use registrar::{NoArguments, Registrar};
pub use server::{AggregatorServer, ServerHandle, ToolSummary, WeakServerHandle};
pub use service::AggregateService;
