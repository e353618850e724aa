//! Collaborator code review
//!
//! Collaborator speaks a batched JSON-RPC dialect: every call is a list of
//! commands, the first of which authenticates the batch with the user's
//! login ticket.

use crate::config::credentials::{CollaboratorCredentials, Secret};
use crate::core::{Integration, Product, Registrar};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::{McpError, McpResult};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};

const SERVICE_PATH: [&str; 3] = ["services", "json", "v1"];

#[derive(Debug, Deserialize, JsonSchema)]
pub struct FindReviewArgs {
    /// Numeric review ID
    pub review_id: u64,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateReviewArgs {
    pub title: String,
    /// Review template name. The server default is used when omitted.
    #[serde(default)]
    pub template_name: Option<String>,
}

#[derive(Clone)]
struct CommandClient {
    client: ApiClient,
    username: String,
    login_ticket: Secret,
}

impl CommandClient {
    /// Run one authenticated command and return its result.
    async fn execute(&self, command: &str, args: Value) -> McpResult<Value> {
        let batch = json!([
            {
                "command": "SessionService.authenticate",
                "args": { "login": self.username, "ticket": self.login_ticket.expose() },
            },
            { "command": command, "args": args },
        ]);
        let response = self.client.post(&SERVICE_PATH, &batch).await?;
        command_result(command, response)
    }
}

/// Pull the last command's result out of a batch response, failing on the
/// first command that reported errors.
fn command_result(command: &str, response: Value) -> McpResult<Value> {
    let Value::Array(results) = response else {
        return Err(McpError::Upstream {
            status: 200,
            message: format!("unexpected response to {}", command),
        });
    };

    for result in &results {
        if let Some(errors) = result.get("errors").and_then(Value::as_array) {
            let message = errors
                .iter()
                .filter_map(|e| e["message"].as_str())
                .collect::<Vec<_>>()
                .join("; ");
            return Err(McpError::Upstream {
                status: 200,
                message: format!("{} failed: {}", command, message),
            });
        }
    }

    Ok(results
        .last()
        .and_then(|r| r.get("result"))
        .cloned()
        .unwrap_or(Value::Null))
}

pub struct CollaboratorIntegration {
    commands: CommandClient,
}

impl CollaboratorIntegration {
    pub fn new(credentials: &CollaboratorCredentials) -> McpResult<Self> {
        Ok(Self {
            commands: CommandClient {
                client: ApiClient::new(&credentials.base_url, AuthScheme::None)?,
                username: credentials.username.clone(),
                login_ticket: credentials.login_ticket.clone(),
            },
        })
    }
}

impl Integration for CollaboratorIntegration {
    fn product(&self) -> Product {
        Product::Collaborator
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let commands = self.commands.clone();
        registrar.tool(
            "collaborator_find_review",
            "Find a Collaborator review by ID",
            move |args: FindReviewArgs| {
                let commands = commands.clone();
                async move {
                    commands
                        .execute(
                            "ReviewService.findReviewById",
                            json!({ "reviewId": args.review_id }),
                        )
                        .await
                }
            },
        );

        let commands = self.commands.clone();
        registrar.tool(
            "collaborator_create_review",
            "Create a Collaborator review owned by the configured user",
            move |args: CreateReviewArgs| {
                let commands = commands.clone();
                async move {
                    let mut review = json!({
                        "creator": commands.username,
                        "title": args.title,
                    });
                    if let Some(template_name) = args.template_name {
                        review["templateName"] = json!(template_name);
                    }
                    commands
                        .execute("ReviewService.createReview", review)
                        .await
                }
            },
        );

        Ok(())
    }
}
