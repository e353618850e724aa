//! Aggregator and sealed service tests

use serde::Deserialize;
use serde_json::{json, Value};
use smartbear_mcp::core::protocol::{error_codes, Implementation, JsonRpcRequest, RequestId, ResourceDefinition};
use smartbear_mcp::core::{AggregatorServer, Integration, NoArguments, Product, Registrar};
use smartbear_mcp::utils::{McpError, McpResult};
use schemars::JsonSchema;

struct StatusIntegration {
    product: Product,
    tools: &'static [&'static str],
}

impl Integration for StatusIntegration {
    fn product(&self) -> Product {
        self.product
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let product = self.product;
        for name in self.tools {
            registrar.tool(*name, "Report status", move |_: NoArguments| async move {
                Ok(json!({ "product": product.key() }))
            });
        }
        Ok(())
    }
}

#[derive(Deserialize, JsonSchema)]
struct AddArgs {
    a: i64,
    b: i64,
}

struct Calculator;

impl Integration for Calculator {
    fn product(&self) -> Product {
        Product::Qmetry
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        registrar.tool("add", "Add two numbers", |args: AddArgs| async move {
            Ok(json!(args.a + args.b))
        });
        registrar.tool("fail", "Always fails", |_: NoArguments| async {
            Err::<Value, _>(McpError::Upstream {
                status: 503,
                message: "backend down".to_string(),
            })
        });
        registrar.resource(
            ResourceDefinition {
                uri: "qmetry://calculator/info".to_string(),
                name: "Calculator".to_string(),
                description: None,
                mime_type: Some("text/plain".to_string()),
            },
            || async { Ok("adds numbers".to_string()) },
        );
        Ok(())
    }
}

fn status(product: Product, tools: &'static [&'static str]) -> Box<dyn Integration> {
    Box::new(StatusIntegration { product, tools })
}

fn request(id: i64, method: &str, params: Option<Value>) -> JsonRpcRequest {
    JsonRpcRequest::with_id(method, params, RequestId::Number(id))
}

#[test]
fn test_handle_exists_before_any_integration() {
    let server = AggregatorServer::new(Implementation::gateway());
    let handle = server.handle();
    assert_eq!(handle.server_info(), &Implementation::gateway());
    assert!(handle.tool_names().is_empty());
    assert!(server.is_empty());
}

#[test]
fn test_handle_sees_later_registrations() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    let handle = server.handle();
    server
        .add_client(status(Product::Reflect, &["reflect_status"]))
        .unwrap();
    assert_eq!(handle.tool_names(), vec!["reflect_status"]);
    assert_eq!(handle.products(), vec![Product::Reflect]);
}

#[test]
fn test_tool_name_conflict_is_rejected_atomically() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server
        .add_client(status(Product::Reflect, &["status"]))
        .unwrap();

    let err = server
        .add_client(status(Product::Zephyr, &["zephyr_cycles", "status"]))
        .unwrap_err();

    match err {
        McpError::RegistrationConflict {
            tool,
            existing,
            incoming,
        } => {
            assert_eq!(tool, "status");
            assert_eq!(existing, Product::Reflect);
            assert_eq!(incoming, Product::Zephyr);
        }
        other => panic!("expected a registration conflict, got {:?}", other),
    }

    assert_eq!(server.len(), 1);
    assert_eq!(server.handle().tool_names(), vec!["status"]);
    assert_eq!(server.handle().tool_owner("status"), Some(Product::Reflect));
}

#[tokio::test]
async fn test_tools_list_is_the_union_in_registration_order() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server
        .add_client(status(Product::Reflect, &["r2", "r1"]))
        .unwrap();
    server.add_client(Box::new(Calculator)).unwrap();
    let service = server.seal().unwrap();

    let response = service
        .handle_request(request(1, "tools/list", None))
        .await
        .unwrap();
    let names: Vec<String> = response.result.unwrap()["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, vec!["r2", "r1", "add", "fail"]);
}

#[tokio::test]
async fn test_tools_call_dispatches_to_owner() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server.add_client(Box::new(Calculator)).unwrap();
    let service = server.seal().unwrap();

    let response = service
        .handle_request(request(
            7,
            "tools/call",
            Some(json!({ "name": "add", "arguments": { "a": 2, "b": 40 } })),
        ))
        .await
        .unwrap();

    assert_eq!(response.id, Some(RequestId::Number(7)));
    let result = response.result.unwrap();
    assert_eq!(result["isError"], false);
    assert_eq!(result["content"][0]["type"], "text");
    assert_eq!(result["content"][0]["text"], "42");
}

#[tokio::test]
async fn test_tool_failure_is_an_error_result() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server.add_client(Box::new(Calculator)).unwrap();
    let service = server.seal().unwrap();

    let response = service
        .handle_request(request(1, "tools/call", Some(json!({ "name": "fail" }))))
        .await
        .unwrap();
    let result = response.result.unwrap();
    assert_eq!(result["isError"], true);
    assert!(result["content"][0]["text"]
        .as_str()
        .unwrap()
        .contains("backend down"));
}

#[tokio::test]
async fn test_unknown_tool_and_bad_arguments_are_invalid_params() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server.add_client(Box::new(Calculator)).unwrap();
    let service = server.seal().unwrap();

    let unknown = service
        .handle_request(request(1, "tools/call", Some(json!({ "name": "nope" }))))
        .await
        .unwrap();
    assert_eq!(unknown.error.unwrap().code, error_codes::INVALID_PARAMS);

    let bad_args = service
        .handle_request(request(
            2,
            "tools/call",
            Some(json!({ "name": "add", "arguments": { "a": "two" } })),
        ))
        .await
        .unwrap();
    assert_eq!(bad_args.error.unwrap().code, error_codes::INVALID_PARAMS);
}

#[tokio::test]
async fn test_initialize_and_protocol_basics() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server
        .add_client(status(Product::Bugsnag, &["bugsnag_status"]))
        .unwrap();
    let service = server.seal().unwrap();

    let init = service
        .handle_request(request(1, "initialize", Some(json!({}))))
        .await
        .unwrap()
        .result
        .unwrap();
    assert_eq!(init["serverInfo"]["name"], "smartbear-mcp");
    assert!(init["capabilities"]["tools"].is_object());
    assert!(init["instructions"].as_str().unwrap().contains("Bugsnag"));

    let ping = service.handle_request(request(2, "ping", None)).await.unwrap();
    assert_eq!(ping.result, Some(json!({})));

    let unknown = service
        .handle_request(request(3, "sampling/createMessage", None))
        .await
        .unwrap();
    assert_eq!(unknown.error.unwrap().code, error_codes::METHOD_NOT_FOUND);

    let notification = JsonRpcRequest::notification("notifications/initialized", None);
    assert!(service.handle_request(notification).await.is_none());
}

#[tokio::test]
async fn test_malformed_message_is_a_parse_error() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server.add_client(Box::new(Calculator)).unwrap();
    let service = server.seal().unwrap();

    let response = service.handle_message("{not json").await.unwrap();
    assert_eq!(response.id, None);
    assert_eq!(response.error.unwrap().code, error_codes::PARSE_ERROR);
}

#[tokio::test]
async fn test_resources_list_and_read() {
    let mut server = AggregatorServer::new(Implementation::gateway());
    server.add_client(Box::new(Calculator)).unwrap();
    let service = server.seal().unwrap();

    let list = service
        .handle_request(request(1, "resources/list", None))
        .await
        .unwrap()
        .result
        .unwrap();
    assert_eq!(list["resources"][0]["uri"], "qmetry://calculator/info");
    assert_eq!(list["resources"][0]["mimeType"], "text/plain");

    let read = service
        .handle_request(request(
            2,
            "resources/read",
            Some(json!({ "uri": "qmetry://calculator/info" })),
        ))
        .await
        .unwrap()
        .result
        .unwrap();
    assert_eq!(read["contents"][0]["text"], "adds numbers");

    let missing = service
        .handle_request(request(
            3,
            "resources/read",
            Some(json!({ "uri": "qmetry://nothing" })),
        ))
        .await
        .unwrap();
    assert_eq!(missing.error.unwrap().code, error_codes::INVALID_PARAMS);
}
