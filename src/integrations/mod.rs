//! Product adapters
//!
//! Each adapter turns one credential group into an [`Integration`](crate::core::Integration)
//! that registers tools backed by the product's REST or JSON-RPC API.

pub mod api_hub;
pub mod bugsnag;
pub mod collaborator;
pub mod http;
pub mod pact;
pub mod qmetry;
pub mod reflect;
pub mod zephyr;

pub use api_hub::ApiHubIntegration;
pub use bugsnag::BugsnagIntegration;
pub use collaborator::CollaboratorIntegration;
pub use http::{ApiClient, AuthScheme};
pub use pact::PactIntegration;
pub use qmetry::QmetryIntegration;
pub use reflect::ReflectIntegration;
pub use zephyr::ZephyrIntegration;
