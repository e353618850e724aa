//! Credential resolution tests

use smartbear_mcp::config::credentials::{vars, PactAuth, PactClientType};
use smartbear_mcp::config::ResolvedCredentials;
use smartbear_mcp::core::Product;
use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// The minimal complete group for each product.
fn complete_group(product: Product) -> Vec<(&'static str, &'static str)> {
    match product {
        Product::Reflect => vec![(vars::REFLECT_API_TOKEN, "reflect-token")],
        Product::Bugsnag => vec![(vars::BUGSNAG_AUTH_TOKEN, "bugsnag-token")],
        Product::ApiHub => vec![(vars::API_HUB_API_KEY, "hub-key")],
        Product::Pact => vec![
            (vars::PACT_BROKER_BASE_URL, "https://broker.example.com"),
            (vars::PACT_BROKER_TOKEN, "pact-token"),
        ],
        Product::Qmetry => vec![(vars::QMETRY_API_KEY, "qmetry-key")],
        Product::Zephyr => vec![(vars::ZEPHYR_API_TOKEN, "zephyr-token")],
        Product::Collaborator => vec![
            (vars::COLLAB_BASE_URL, "https://collab.example.com"),
            (vars::COLLAB_USERNAME, "reviewer"),
            (vars::COLLAB_LOGIN_TICKET, "collab-ticket-value"),
        ],
    }
}

#[test]
fn test_empty_environment_enables_nothing() {
    let resolved = ResolvedCredentials::resolve(&HashMap::new());
    assert!(resolved.enabled().is_empty());
    assert!(resolved.diagnostics.is_empty());
}

#[test]
fn test_every_subset_of_groups_enables_exactly_that_subset() {
    for mask in 0u32..(1 << Product::ALL.len()) {
        let chosen: Vec<Product> = Product::ALL
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, p)| *p)
            .collect();

        let pairs: Vec<(&str, &str)> = chosen.iter().flat_map(|p| complete_group(*p)).collect();
        let resolved = ResolvedCredentials::resolve(&env(&pairs));

        assert_eq!(resolved.enabled(), chosen, "mask {:07b}", mask);
        assert!(resolved.diagnostics.is_empty(), "mask {:07b}", mask);
    }
}

#[test]
fn test_empty_values_count_as_absent() {
    let resolved = ResolvedCredentials::resolve(&env(&[
        (vars::REFLECT_API_TOKEN, ""),
        (vars::ZEPHYR_API_TOKEN, "zephyr-token"),
    ]));
    assert_eq!(resolved.enabled(), vec![Product::Zephyr]);
}

#[test]
fn test_optional_only_variables_are_silent() {
    let resolved = ResolvedCredentials::resolve(&env(&[
        (vars::QMETRY_BASE_URL, "https://qmetry.example.com"),
        (vars::BUGSNAG_PROJECT_API_KEY, "project-key"),
    ]));
    assert!(resolved.enabled().is_empty());
    assert!(resolved.diagnostics.is_empty());
}

#[test]
fn test_optional_variables_are_carried() {
    let resolved = ResolvedCredentials::resolve(&env(&[
        (vars::BUGSNAG_AUTH_TOKEN, "token"),
        (vars::BUGSNAG_PROJECT_API_KEY, "project-key"),
        (vars::BUGSNAG_ENDPOINT, "https://bugsnag.internal"),
    ]));
    let bugsnag = resolved.bugsnag.unwrap();
    assert_eq!(bugsnag.project_api_key.as_deref(), Some("project-key"));
    assert_eq!(bugsnag.endpoint.as_deref(), Some("https://bugsnag.internal"));
}

#[test]
fn test_pact_token_wins_over_basic() {
    let resolved = ResolvedCredentials::resolve(&env(&[
        (vars::PACT_BROKER_BASE_URL, "https://broker.example.com"),
        (vars::PACT_BROKER_TOKEN, "pact-token"),
        (vars::PACT_BROKER_USERNAME, "user"),
        (vars::PACT_BROKER_PASSWORD, "pass"),
    ]));
    let pact = resolved.pact.unwrap();
    assert!(matches!(pact.auth, PactAuth::Token(_)));
    assert_eq!(pact.client_type(), PactClientType::Pactflow);
    assert!(resolved.diagnostics.is_empty());
}

#[test]
fn test_pact_basic_auth() {
    let resolved = ResolvedCredentials::resolve(&env(&[
        (vars::PACT_BROKER_BASE_URL, "https://broker.example.com"),
        (vars::PACT_BROKER_USERNAME, "user"),
        (vars::PACT_BROKER_PASSWORD, "pass"),
    ]));
    let pact = resolved.pact.unwrap();
    assert_eq!(pact.client_type(), PactClientType::PactBroker);
    match pact.auth {
        PactAuth::Basic { username, password } => {
            assert_eq!(username, "user");
            assert_eq!(password.expose(), "pass");
        }
        other => panic!("expected basic auth, got {:?}", other),
    }
}

#[test]
fn test_pact_without_base_url_is_silently_disabled() {
    let resolved = ResolvedCredentials::resolve(&env(&[
        (vars::PACT_BROKER_TOKEN, "pact-token"),
        (vars::PACT_BROKER_USERNAME, "user"),
        (vars::PACT_BROKER_PASSWORD, "pass"),
    ]));
    assert!(resolved.pact.is_none());
    assert!(resolved.diagnostics.is_empty());
}

#[test]
fn test_pact_half_basic_pair_is_diagnosed() {
    for half in [vars::PACT_BROKER_USERNAME, vars::PACT_BROKER_PASSWORD] {
        let resolved = ResolvedCredentials::resolve(&env(&[
            (vars::PACT_BROKER_BASE_URL, "https://broker.example.com"),
            (half, "only-one"),
            (vars::REFLECT_API_TOKEN, "reflect-token"),
        ]));
        assert!(resolved.pact.is_none());
        assert_eq!(resolved.enabled(), vec![Product::Reflect]);
        assert_eq!(resolved.diagnostics.len(), 1);
        assert_eq!(resolved.diagnostics[0].product, Product::Pact);
        assert!(resolved.diagnostics[0].message.contains(vars::PACT_BROKER_TOKEN));
    }
}

#[test]
fn test_pact_base_url_alone_is_diagnosed() {
    let resolved = ResolvedCredentials::resolve(&env(&[(
        vars::PACT_BROKER_BASE_URL,
        "https://broker.example.com",
    )]));
    assert!(resolved.pact.is_none());
    assert_eq!(resolved.diagnostics.len(), 1);
}

#[test]
fn test_partial_collaborator_group_names_missing_variables() {
    let resolved = ResolvedCredentials::resolve(&env(&[(
        vars::COLLAB_BASE_URL,
        "https://collab.example.com",
    )]));
    assert!(resolved.collaborator.is_none());
    assert_eq!(resolved.diagnostics.len(), 1);
    let message = &resolved.diagnostics[0].message;
    assert!(message.contains(vars::COLLAB_USERNAME));
    assert!(message.contains(vars::COLLAB_LOGIN_TICKET));
    assert!(!message.contains(vars::COLLAB_BASE_URL));
}

#[test]
fn test_secrets_never_appear_in_debug_output() {
    let pairs: Vec<(&str, &str)> = Product::ALL
        .iter()
        .flat_map(|p| complete_group(*p))
        .collect();
    let resolved = ResolvedCredentials::resolve(&env(&pairs));
    let debug = format!("{:?}", resolved);

    for secret in [
        "reflect-token",
        "bugsnag-token",
        "hub-key",
        "pact-token",
        "qmetry-key",
        "zephyr-token",
        "collab-ticket-value",
    ] {
        assert!(!debug.contains(secret), "{} leaked", secret);
    }
    assert!(debug.contains("https://broker.example.com"));
}
