//! MCP server implementation using pmcp.
//!
//! Serves the catalog tool registry over stdio or streamable HTTP.

use crate::mcp::tools::ToolRegistry;
use crate::tools::CatalogTools;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::StreamableHttpServer, Error, RequestHandlerExtra, Server,
    ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Name the server announces to MCP clients
pub const SERVER_NAME: &str = "harvard-library-mcp";

/// The MCP server for the Harvard Library catalog
#[derive(Debug, Clone)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
}

impl McpServer {
    /// Create a new MCP server exposing the given tools
    pub fn new(tools: CatalogTools) -> Result<Self, pmcp::Error> {
        let registry = ToolRegistry::from_tools(tools);
        let server = Self::build_server_impl(registry)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
        })
    }

    fn build_server_impl(tools: ToolRegistry) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name(SERVER_NAME)
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                handler: tool.handler.clone(),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");

        // run_stdio() takes ownership; no other handle may be alive here
        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("Cannot unwrap Arc - multiple references exist"))?
            .into_inner();

        server.run_stdio().await
    }

    /// Run the server over streamable HTTP
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in HTTP mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        let http_server = StreamableHttpServer::new(socket_addr, self.server.clone());
        http_server.start().await
    }
}

/// Adapts a registry tool to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn crate::mcp::tools::ToolHandler>,
}

impl ToolWrapper {
    /// Run the tool, folding failures into an error envelope
    async fn call(&self, args: Value) -> Value {
        tracing::info!("Calling tool: {} with arguments: {}", self.name, args);

        match self.handler.execute(args).await {
            Ok(result) => {
                tracing::info!("Tool {} completed", self.name);
                result
            }
            Err(e) => {
                let message = format!("Error calling tool {}: {}", self.name, e);
                tracing::error!("{}", message);
                json!({"success": false, "error": message})
            }
        }
    }
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        Ok(self.call(args).await)
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::CatalogClient;
    use crate::config::Config;

    fn tools() -> CatalogTools {
        let client = CatalogClient::new(&Config::default()).unwrap();
        CatalogTools::new(Arc::new(client))
    }

    #[test]
    fn test_server_builds() {
        assert!(McpServer::new(tools()).is_ok());
    }

    #[tokio::test]
    async fn test_wrapper_turns_errors_into_envelopes() {
        let registry = ToolRegistry::from_tools(tools());
        let tool = registry.get("get_record_details").unwrap();
        let wrapper = ToolWrapper {
            name: tool.name.clone(),
            description: None,
            input_schema: tool.input_schema.clone(),
            handler: tool.handler.clone(),
        };

        let result = wrapper.call(json!({})).await;
        assert_eq!(result["success"], false);
        let error = result["error"].as_str().unwrap();
        assert!(
            error.starts_with("Error calling tool get_record_details: "),
            "{}",
            error
        );
    }

    #[test]
    fn test_wrapper_metadata() {
        let registry = ToolRegistry::from_tools(tools());
        let tool = registry.get("parse_permalink").unwrap();
        let wrapper = ToolWrapper {
            name: tool.name.clone(),
            description: Some(tool.description.clone()),
            input_schema: tool.input_schema.clone(),
            handler: tool.handler.clone(),
        };
        assert!(wrapper.metadata().is_some());
    }
}
