//! Telegram command definitions and their handlers.
//!
//! `handle_command` turns a parsed command into a reply without touching the
//! Telegram API, so the whole command surface can be driven from tests;
//! `run` wires it to teloxide's dispatcher.

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use crate::{
    AppState,
    models::{AlertInterval, AlertKey, Destination, HolderId},
    services::{
        market_data::ProviderError,
        notifier::{NotifyError, SendOptions},
        portfolio_service::PortfolioError,
    },
    templates,
};

/// Bot commands.
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,
    #[command(description = "Show help")]
    Help,
    #[command(description = "Token information. Usage: /x <token>")]
    X(String),
    #[command(description = "Ethereum gas prices")]
    Gas,
    #[command(description = "Recurring token updates. Usage: /alert <token> <30s|1m|5m|30m|1h>")]
    Alert(String),
    #[command(description = "List active alerts in this chat")]
    Alerts,
    #[command(description = "Stop alerts. Usage: /stop <token> [token...]")]
    Stop(String),
    #[command(description = "Stop every alert in every chat")]
    Stopall,
    #[command(description = "Add tokens to your portfolio. Usage: /add <token> <quantity>")]
    Add(String),
    #[command(description = "Remove tokens from your portfolio. Usage: /remove <token> <quantity>")]
    Remove(String),
    #[command(description = "Show your portfolio value")]
    Portfolio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub text: String,
    pub options: SendOptions,
}

impl Reply {
    fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: SendOptions::plain(),
        }
    }

    fn report(text: String) -> Self {
        Self {
            text,
            options: SendOptions::html_report(),
        }
    }
}

const WELCOME: &str = "Hello there! Welcome to the CryptoVerseBot.\n\
    /x <token> - Get token information\n\
    /gas - Ethereum gas prices\n\
    /alert <token> <interval> - Recurring token updates\n\
    /stop <token> - Stop an alert\n\
    /stopall - Stop every alert in every chat\n\
    /add <token> <quantity> - Track a holding\n\
    /portfolio - Value your holdings";

const FETCH_FAILED: &str = "An error occurred while fetching token information.";

fn alert_usage() -> String {
    format!(
        "Usage: /alert <token> <interval>\nSupported intervals: {}",
        AlertInterval::literals()
    )
}

pub async fn handle_command(
    state: &AppState,
    chat: Destination,
    holder: HolderId,
    cmd: Command,
) -> Reply {
    match cmd {
        Command::Start => Reply::plain(WELCOME),

        Command::Help => Reply::plain(Command::descriptions().to_string()),

        Command::X(args) => token_info(state, &args).await,

        Command::Gas => gas(state).await,

        Command::Alert(args) => create_alert(state, chat, &args),

        Command::Alerts => {
            let alerts = state.alerts.list(chat);
            if alerts.is_empty() {
                return Reply::plain("You have no active alerts.");
            }
            let lines: Vec<String> = alerts
                .iter()
                .map(|(token, interval)| format!("• {token} every {interval}"))
                .collect();
            Reply::plain(format!("Active alerts:\n{}", lines.join("\n")))
        }

        Command::Stop(args) => {
            let tokens: Vec<&str> = args.split_whitespace().collect();
            if tokens.is_empty() {
                return Reply::plain("Usage: /stop <token> [token...]");
            }

            let lines: Vec<String> = tokens
                .into_iter()
                .map(|token| {
                    if state.alerts.cancel_one(&AlertKey::new(chat, token)) {
                        format!("✅ Stopped alerts for {token}")
                    } else {
                        format!("⚠️ No active alert for {token}")
                    }
                })
                .collect();
            Reply::plain(lines.join("\n"))
        }

        Command::Stopall => {
            let count = state.alerts.cancel_all();
            Reply::plain(format!("🛑 All alerts stopped ({count} cancelled)."))
        }

        Command::Add(args) => {
            let Some((token, quantity)) = token_and_quantity(&args) else {
                return Reply::plain("Usage: /add <token> <quantity>");
            };
            match state.portfolios.add(holder, token, quantity) {
                Ok(total) => Reply::plain(format!(
                    "Added {} {token}. You now hold {} {token}.",
                    templates::format_quantity(quantity),
                    templates::format_quantity(total)
                )),
                Err(e) => Reply::plain(portfolio_error(&e)),
            }
        }

        Command::Remove(args) => {
            let Some((token, quantity)) = token_and_quantity(&args) else {
                return Reply::plain("Usage: /remove <token> <quantity>");
            };
            match state.portfolios.remove(holder, token, quantity) {
                Ok(remaining) if remaining == 0.0 => {
                    Reply::plain(format!("Removed all {token} from your portfolio."))
                }
                Ok(remaining) => Reply::plain(format!(
                    "Removed {} {token}. You now hold {} {token}.",
                    templates::format_quantity(quantity),
                    templates::format_quantity(remaining)
                )),
                Err(e) => Reply::plain(portfolio_error(&e)),
            }
        }

        Command::Portfolio => {
            let valuation = state.portfolios.valuate(holder, state.market.as_ref()).await;
            if valuation.is_empty() {
                return Reply::plain("Your portfolio is empty. Use /add <token> <quantity> to track a holding.");
            }
            match templates::render_portfolio(&state.hbs, &valuation) {
                Ok(text) => Reply::report(text),
                Err(e) => {
                    error!(error = %e, "portfolio render failed");
                    Reply::plain("An error occurred while valuing your portfolio.")
                }
            }
        }
    }
}

async fn token_info(state: &AppState, args: &str) -> Reply {
    let Some(token) = args.split_whitespace().next() else {
        return Reply::plain("Please provide a token symbol. Usage: /x <token>");
    };

    match state.market.fetch(token).await {
        Ok(snapshot) => match templates::render_token_report(&state.hbs, &snapshot) {
            Ok(text) => Reply::report(text),
            Err(e) => {
                error!(token, error = %e, "token report render failed");
                Reply::plain(FETCH_FAILED)
            }
        },
        Err(ProviderError::NotFound(_)) => Reply::plain("Token not found."),
        Err(e) => {
            warn!(token, error = %e, "token lookup failed");
            Reply::plain(FETCH_FAILED)
        }
    }
}

async fn gas(state: &AppState) -> Reply {
    let rendered = match state.gas.fetch().await {
        Ok(oracle) => templates::render_gas_report(&state.hbs, &oracle).map_err(|e| e.to_string()),
        Err(e) => Err(e.to_string()),
    };

    match rendered {
        Ok(text) => Reply::report(text),
        Err(e) => {
            warn!(error = %e, "gas lookup failed");
            Reply::plain("An error occurred while fetching gas prices.")
        }
    }
}

fn create_alert(state: &AppState, chat: Destination, args: &str) -> Reply {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [token, interval] = parts.as_slice() else {
        return Reply::plain(alert_usage());
    };

    let interval: AlertInterval = match interval.parse() {
        Ok(i) => i,
        Err(e) => return Reply::plain(format!("Invalid interval: {}\n{}", e.0, alert_usage())),
    };

    let job = state.alerts.create(AlertKey::new(chat, *token), interval);
    match job.replaced {
        Some(old) => Reply::plain(format!(
            "🔁 Alert for {token} updated: every {old} → every {interval}."
        )),
        None => Reply::plain(format!(
            "🔔 Alert set for {token}: you'll get an update every {interval}."
        )),
    }
}

fn token_and_quantity(args: &str) -> Option<(&str, f64)> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [token, quantity] = parts.as_slice() else {
        return None;
    };
    let quantity = quantity.parse::<f64>().ok()?;
    Some((*token, quantity))
}

fn portfolio_error(e: &PortfolioError) -> String {
    match e {
        PortfolioError::InvalidQuantity(_) => "Quantity must be a positive number.".to_string(),
        PortfolioError::NotHeld(token) => format!("You don't hold any {token}."),
        PortfolioError::Insufficient { token, held, .. } => format!(
            "You only hold {} {token}.",
            templates::format_quantity(*held)
        ),
    }
}

/// Holder for messages without a sender, such as channel posts.
fn chat_holder(chat: Destination) -> HolderId {
    // group and channel ids are negative
    HolderId(chat.0.unsigned_abs())
}

async fn answer(state: &AppState, msg: &Message, cmd: Command) -> Result<(), NotifyError> {
    let chat = Destination(msg.chat.id.0);
    let holder = msg
        .from
        .as_ref()
        .map(|u| HolderId(u.id.0))
        .unwrap_or_else(|| chat_holder(chat));

    info!(chat_id = %chat, command = ?cmd, "command received");
    let reply = handle_command(state, chat, holder, cmd).await;

    if let Err(e) = state.notifier.send(chat, &reply.text, reply.options).await {
        error!(chat_id = %chat, error = %e, "failed to send reply");
        return Err(e);
    }
    Ok(())
}

/// Run the bot command handler until Ctrl-C.
pub async fn run(bot: Bot, state: AppState) {
    let handler = Update::filter_message().filter_command::<Command>().endpoint(
        move |msg: Message, cmd: Command| {
            let state = state.clone();
            async move { answer(&state, &msg, cmd).await }
        },
    );

    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_raw_arguments() {
        assert_eq!(
            Command::parse("/alert ETH 1m", "cryptoversebot").unwrap(),
            Command::Alert("ETH 1m".to_string())
        );
        assert_eq!(
            Command::parse("/stop ETH PEPE", "cryptoversebot").unwrap(),
            Command::Stop("ETH PEPE".to_string())
        );
        assert_eq!(Command::parse("/stopall", "cryptoversebot").unwrap(), Command::Stopall);
        assert_eq!(Command::parse("/alerts", "cryptoversebot").unwrap(), Command::Alerts);
        assert_eq!(
            Command::parse("/x PEPE", "cryptoversebot").unwrap(),
            Command::X("PEPE".to_string())
        );
    }

    #[test]
    fn chat_holder_keeps_negative_chat_ids_small() {
        assert_eq!(chat_holder(Destination(42)), HolderId(42));
        assert_eq!(chat_holder(Destination(-1001234567890)), HolderId(1001234567890));
    }

    #[test]
    fn token_and_quantity_requires_two_arguments() {
        assert_eq!(token_and_quantity("BTC 0.5"), Some(("BTC", 0.5)));
        assert_eq!(token_and_quantity("BTC"), None);
        assert_eq!(token_and_quantity("BTC 1 2"), None);
        assert_eq!(token_and_quantity("BTC lots"), None);
    }
}
