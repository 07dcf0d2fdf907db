//! Geocode tool implementation
//!
//! Live provider results only; failures are reported, not hidden.

use super::format::format_places;
use super::{ToolContext, TOOL_TIMEOUT};
use crate::cli::GeocodeArgs;
use crate::error::{validate_query, AppError};
use crate::geocoding::GeocodeError;
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use serde_json::Value;
use tokio::time::timeout;
use tracing::info;

/// Handle geocode tool call
pub async fn handle_geocode(id: Option<Value>, args: Value, ctx: &ToolContext) -> McpResponse {
    match timeout(TOOL_TIMEOUT, handle_geocode_impl(args, ctx)).await {
        Ok(Ok(content)) => McpResponse::from_result(id, &content),
        Ok(Err(e)) => McpResponse::error(id, e.error_code(), &e.message()),
        Err(_) => McpResponse::error(
            id,
            "timeout",
            &format!("Geocode request exceeded {} second timeout", TOOL_TIMEOUT.as_secs()),
        ),
    }
}

async fn handle_geocode_impl(args: Value, ctx: &ToolContext) -> Result<ToolResult, AppError> {
    let geocode_args: GeocodeArgs = serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("Invalid arguments: {}", e)))?;

    execute_geocode(geocode_args, ctx).await
}

/// Execute geocode tool (shared implementation for the stdio server and CLI)
pub async fn execute_geocode(args: GeocodeArgs, ctx: &ToolContext) -> Result<ToolResult, AppError> {
    let query = validate_query(&args.query)?;
    let router = ctx.router()?;
    let provider = router.provider();

    // The router skips keyed providers silently; a direct lookup should say why.
    if let Some(credential) = provider.required_credential() {
        if ctx.config.credential_for(provider).is_none() {
            return Err(GeocodeError::Configuration { provider, credential }.into());
        }
    }

    info!("Geocode request via {} for {:?}", provider, query);
    let places = router.try_search(query).await?;
    info!("Geocode request completed: {} results", places.len());

    if args.json {
        return Ok(ToolResult::text(serde_json::to_string_pretty(&places)?));
    }

    let markdown = format_places(provider, query, &places, router.requires_attribution());
    let metadata = serde_json::to_value(&places)?;
    Ok(ToolResult::from_items(vec![ContentItem::with_metadata(markdown, metadata)]))
}
