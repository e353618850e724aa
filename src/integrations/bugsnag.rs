//! Bugsnag: error monitoring
//!
//! The only integration that must talk to its backend before registering:
//! the organization and, when a project API key is configured, the matching
//! project are looked up once in `initialize` and used as tool defaults.

use crate::config::credentials::BugsnagCredentials;
use crate::core::protocol::ResourceDefinition;
use crate::core::{Integration, NoArguments, Product, Registrar};
use crate::integrations::http::{ApiClient, AuthScheme};
use crate::utils::errors::{McpError, McpResult};
use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

pub const DEFAULT_ENDPOINT: &str = "https://api.bugsnag.com";
pub const CURRENT_PROJECT_URI: &str = "bugsnag://project/current";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ProjectsArgs {
    /// Organization ID. Defaults to the first organization of the token's user.
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ErrorsArgs {
    /// Project ID. Defaults to the configured project.
    #[serde(default)]
    pub project_id: Option<String>,
    /// Only return errors with this status (open, fixed, snoozed, ignored)
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ErrorArgs {
    /// Project ID. Defaults to the configured project.
    #[serde(default)]
    pub project_id: Option<String>,
    pub error_id: String,
}

/// What `initialize` learned about the account.
#[derive(Debug, Clone, Default)]
struct AccountContext {
    organization_id: Option<String>,
    project: Option<Value>,
}

impl AccountContext {
    fn project_id(&self) -> Option<String> {
        self.project
            .as_ref()
            .and_then(|p| p["id"].as_str())
            .map(str::to_string)
    }
}

pub struct BugsnagIntegration {
    client: ApiClient,
    project_api_key: Option<String>,
    context: AccountContext,
}

impl BugsnagIntegration {
    pub fn new(credentials: &BugsnagCredentials) -> McpResult<Self> {
        let endpoint = credentials.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        let client = ApiClient::new(endpoint, AuthScheme::Token(credentials.auth_token.clone()))?
            .with_header("X-Version", "2");
        Ok(Self {
            client,
            project_api_key: credentials.project_api_key.clone(),
            context: AccountContext::default(),
        })
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.context.organization_id.as_deref()
    }

    pub fn project_id(&self) -> Option<String> {
        self.context.project_id()
    }
}

#[async_trait]
impl Integration for BugsnagIntegration {
    fn product(&self) -> Product {
        Product::Bugsnag
    }

    async fn initialize(&mut self) -> McpResult<()> {
        let organizations = self.client.get(&["user", "organizations"], &[]).await?;
        let organization_id = organizations
            .as_array()
            .and_then(|orgs| orgs.first())
            .and_then(|org| org["id"].as_str())
            .ok_or_else(|| {
                McpError::ConfigError("the Bugsnag auth token has no organizations".to_string())
            })?
            .to_string();

        if let Some(api_key) = &self.project_api_key {
            let projects = self
                .client
                .get(&["organizations", &organization_id, "projects"], &[])
                .await?;
            let project = projects
                .as_array()
                .and_then(|projects| {
                    projects
                        .iter()
                        .find(|p| p["api_key"].as_str() == Some(api_key.as_str()))
                })
                .cloned()
                .ok_or_else(|| {
                    McpError::ConfigError(
                        "no Bugsnag project matches BUGSNAG_PROJECT_API_KEY".to_string(),
                    )
                })?;
            info!(project = %project["name"], "Resolved Bugsnag project");
            self.context.project = Some(project);
        }

        self.context.organization_id = Some(organization_id);
        Ok(())
    }

    fn register(&self, registrar: &mut Registrar) -> McpResult<()> {
        let client = self.client.clone();
        registrar.tool(
            "list_bugsnag_organizations",
            "List the Bugsnag organizations the user belongs to",
            move |_: NoArguments| {
                let client = client.clone();
                async move { client.get(&["user", "organizations"], &[]).await }
            },
        );

        let client = self.client.clone();
        let default_org = self.context.organization_id.clone();
        registrar.tool(
            "list_bugsnag_projects",
            "List the projects of a Bugsnag organization",
            move |args: ProjectsArgs| {
                let client = client.clone();
                let organization_id = args.organization_id.or_else(|| default_org.clone());
                async move {
                    let organization_id = required(organization_id, "organization_id")?;
                    client
                        .get(&["organizations", &organization_id, "projects"], &[])
                        .await
                }
            },
        );

        let client = self.client.clone();
        let default_project = self.context.project_id();
        registrar.tool(
            "list_bugsnag_errors",
            "List the errors of a Bugsnag project",
            move |args: ErrorsArgs| {
                let client = client.clone();
                let project_id = args.project_id.or_else(|| default_project.clone());
                async move {
                    let project_id = required(project_id, "project_id")?;
                    let mut query = Vec::new();
                    if let Some(status) = args.status {
                        query.push(("filters[error.status][][type]", "eq".to_string()));
                        query.push(("filters[error.status][][value]", status));
                    }
                    client
                        .get(&["projects", &project_id, "errors"], &query)
                        .await
                }
            },
        );

        let client = self.client.clone();
        let default_project = self.context.project_id();
        registrar.tool(
            "get_bugsnag_error",
            "Get one error of a Bugsnag project",
            move |args: ErrorArgs| {
                let client = client.clone();
                let project_id = args.project_id.or_else(|| default_project.clone());
                async move {
                    let project_id = required(project_id, "project_id")?;
                    client
                        .get(&["projects", &project_id, "errors", &args.error_id], &[])
                        .await
                }
            },
        );

        if let Some(project) = self.context.project.clone() {
            registrar.resource(
                ResourceDefinition {
                    uri: CURRENT_PROJECT_URI.to_string(),
                    name: "Current Bugsnag project".to_string(),
                    description: Some(
                        "The project selected by BUGSNAG_PROJECT_API_KEY".to_string(),
                    ),
                    mime_type: Some("application/json".to_string()),
                },
                move || {
                    let project = project.clone();
                    async move {
                        Ok(serde_json::to_string_pretty(&json!({
                            "id": project["id"],
                            "name": project["name"],
                            "slug": project["slug"],
                            "html_url": project["html_url"],
                        }))?)
                    }
                },
            );
        }

        Ok(())
    }
}

fn required(value: Option<String>, name: &str) -> McpResult<String> {
    value.ok_or_else(|| McpError::InvalidParams(format!("'{}' is required", name)))
}
