//! Suggest tool implementation
//!
//! One reconciliation round for a query: live results when the provider has
//! any, saved addresses otherwise. Geocoding failures never fail the call.

use super::format::format_view;
use super::{ToolContext, TOOL_TIMEOUT};
use crate::cli::SuggestArgs;
use crate::error::{validate_query, AppError};
use crate::mcp::{ContentItem, McpResponse, ToolResult};
use crate::reconcile::{FallbackList, Reconciler, SuggestionView};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

/// Handle suggest tool call
pub async fn handle_suggest(id: Option<Value>, args: Value, ctx: &ToolContext) -> McpResponse {
    match timeout(TOOL_TIMEOUT, handle_suggest_impl(args, ctx)).await {
        Ok(Ok(content)) => McpResponse::from_result(id, &content),
        Ok(Err(e)) => McpResponse::error(id, e.error_code(), &e.message()),
        Err(_) => McpResponse::error(
            id,
            "timeout",
            &format!("Suggest request exceeded {} second timeout", TOOL_TIMEOUT.as_secs()),
        ),
    }
}

async fn handle_suggest_impl(args: Value, ctx: &ToolContext) -> Result<ToolResult, AppError> {
    let suggest_args: SuggestArgs = serde_json::from_value(args)
        .map_err(|e| AppError::InvalidInput(format!("Invalid arguments: {}", e)))?;

    execute_suggest(suggest_args, ctx).await
}

/// Execute suggest tool (shared implementation for the stdio server and CLI)
pub async fn execute_suggest(args: SuggestArgs, ctx: &ToolContext) -> Result<ToolResult, AppError> {
    if !args.query.trim().is_empty() {
        validate_query(&args.query)?;
    }

    let view = suggest(&args.query, ctx).await?;

    if args.json {
        return Ok(ToolResult::text(serde_json::to_string_pretty(&view)?));
    }

    let metadata = serde_json::to_value(&view)?;
    Ok(ToolResult::from_items(vec![ContentItem::with_metadata(format_view(&view), metadata)]))
}

async fn suggest(text: &str, ctx: &ToolContext) -> Result<SuggestionView, AppError> {
    let router = ctx.router()?;
    let fallback = FallbackList::new(ctx.config.fallback_addresses.iter().cloned());
    let mut reconciler = Reconciler::new(router.provider(), fallback);

    if let Some(query) = reconciler.begin(text) {
        let outcome = router.search(&query).await;
        let resolution = reconciler.resolve(&query, outcome);
        debug!("Suggest {:?}: {:?} -> {:?}", query, resolution, reconciler.phase());
    }

    Ok(reconciler.view())
}
