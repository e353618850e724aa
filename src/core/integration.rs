//! Product integrations as seen by the aggregator

use crate::core::registrar::Registrar;
use crate::utils::errors::McpResult;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

/// The fixed set of products the gateway knows how to activate.
///
/// Declaration order is the activation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Product {
    Reflect,
    Bugsnag,
    ApiHub,
    Pact,
    Qmetry,
    Zephyr,
    Collaborator,
}

impl Product {
    pub const ALL: [Product; 7] = [
        Product::Reflect,
        Product::Bugsnag,
        Product::ApiHub,
        Product::Pact,
        Product::Qmetry,
        Product::Zephyr,
        Product::Collaborator,
    ];

    /// Stable lowercase key used in logs and JSON output.
    pub fn key(&self) -> &'static str {
        match self {
            Product::Reflect => "reflect",
            Product::Bugsnag => "bugsnag",
            Product::ApiHub => "api_hub",
            Product::Pact => "pact",
            Product::Qmetry => "qmetry",
            Product::Zephyr => "zephyr",
            Product::Collaborator => "collaborator",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Product::Reflect => "Reflect",
            Product::Bugsnag => "Bugsnag",
            Product::ApiHub => "API Hub",
            Product::Pact => "PactFlow",
            Product::Qmetry => "QMetry",
            Product::Zephyr => "Zephyr",
            Product::Collaborator => "Collaborator",
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Whether an integration can register right after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    Immediate,
    /// `Integration::initialize` must complete before registration.
    AwaitInit,
}

/// One product adapter.
///
/// The aggregator owns each integration for the lifetime of the process and
/// calls `register` exactly once. Tools and resources registered here are the
/// only way the calling agent reaches the product.
#[async_trait]
pub trait Integration: Send + Sync {
    fn product(&self) -> Product;

    /// Asynchronous setup, awaited before `register` for integrations whose
    /// activation entry is `Readiness::AwaitInit`.
    async fn initialize(&mut self) -> McpResult<()> {
        Ok(())
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_order_is_declaration_order() {
        let mut sorted = Product::ALL;
        sorted.sort();
        assert_eq!(sorted, Product::ALL);
    }

    #[test]
    fn test_product_keys_are_unique() {
        let keys: std::collections::HashSet<_> = Product::ALL.iter().map(|p| p.key()).collect();
        assert_eq!(keys.len(), Product::ALL.len());
    }
}
