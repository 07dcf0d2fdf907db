//! Interactive session
//!
//! Drives one [`AutocompleteController`] from line-based input. Every line
//! replaces the field's text as if it had been typed; a few `:` commands
//! stand in for the other gestures a screen would offer.

use super::format::format_view;
use super::ToolContext;
use crate::cli::SessionArgs;
use crate::controller::{AutocompleteController, AutocompleteListener, ControllerProps};
use crate::error::AppError;
use crate::geocoding::ProviderRouter;
use crate::reconcile::SuggestionView;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::debug;

const HELP: &str = "Type an address to search. Commands:\n  \
    :select N   pick suggestion N\n  \
    :set TEXT   replace the value without searching\n  \
    :help       show this message\n  \
    :quit       leave the session";

#[derive(Debug, Clone, PartialEq)]
enum SessionCommand {
    Input(String),
    Select(usize),
    Set(String),
    Help,
    Quit,
}

fn parse_command(line: &str) -> Result<SessionCommand, String> {
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(SessionCommand::Input(line.to_string()));
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest.trim(), ""),
    };

    match name {
        "select" | "s" => arg
            .parse::<usize>()
            .ok()
            .filter(|n| *n >= 1)
            .map(|n| SessionCommand::Select(n - 1))
            .ok_or_else(|| format!("Expected a suggestion number, got {:?}", arg)),
        "set" => Ok(SessionCommand::Set(arg.to_string())),
        "help" | "h" => Ok(SessionCommand::Help),
        "quit" | "q" => Ok(SessionCommand::Quit),
        other => Err(format!("Unknown command :{} (try :help)", other)),
    }
}

/// Prints every list update to stdout
struct PrintingListener;

impl AutocompleteListener for PrintingListener {
    fn on_change(&self, text: &str) {
        debug!("on_change {:?}", text);
    }

    fn on_select(&self, label: &str) {
        println!("on_select: {}", label);
    }

    fn on_suggestions(&self, view: &SuggestionView) {
        print!("{}", format_view(view));
    }
}

/// Run an interactive session on stdin; returns the final value
pub async fn run_session(args: SessionArgs, ctx: &ToolContext) -> Result<String, AppError> {
    let router = ctx.router()?;
    let reader = BufReader::new(tokio::io::stdin());
    run_session_with(reader, router, ctx, args, Arc::new(PrintingListener)).await
}

async fn run_session_with<R>(
    reader: R,
    router: ProviderRouter,
    ctx: &ToolContext,
    args: SessionArgs,
    listener: Arc<dyn AutocompleteListener>,
) -> Result<String, AppError>
where
    R: AsyncBufRead + Unpin,
{
    let props = ControllerProps {
        value: args.value.unwrap_or_default(),
        placeholder: args.placeholder,
    };
    let mut controller = AutocompleteController::new(router, &ctx.config, props, listener);
    let settle_limit = ctx.config.debounce_window() + ctx.config.request_timeout() + Duration::from_secs(1);

    eprintln!(
        "[{}] provider: {} (:help for commands)",
        controller.placeholder(),
        controller.provider()
    );

    let mut lines = reader.lines();
    loop {
        let Some(line) = lines.next_line().await? else {
            // End of input: let the last edit's search land before tearing down.
            if !controller.settle(settle_limit).await {
                debug!("Session input ended before suggestions settled");
            }
            break;
        };
        match parse_command(&line) {
            Ok(SessionCommand::Input(text)) => controller.input(&text),
            Ok(SessionCommand::Select(index)) => {
                if controller.select(index).is_none() {
                    eprintln!("No suggestion #{}", index + 1);
                }
            }
            Ok(SessionCommand::Set(value)) => controller.set_value(&value),
            Ok(SessionCommand::Help) => eprintln!("{}", HELP),
            Ok(SessionCommand::Quit) => break,
            Err(msg) => eprintln!("{}", msg),
        }
    }

    controller.unmount();
    Ok(controller.value().to_string())
}
