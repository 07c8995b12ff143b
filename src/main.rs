use std::{net::SocketAddr, sync::Arc};

use teloxide::Bot;

use cryptoverse::{
    AppState, config,
    controllers::bot_controller,
    routes,
    services::{dexscreener::DexScreenerClient, etherscan::EtherscanGasTracker, notifier::TelegramNotifier},
    templates,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let settings = match config::load() {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };

    let bot = Bot::new(&settings.bot_token);
    let state = AppState::new(
        settings.clone(),
        templates::build_handlebars()?,
        Arc::new(DexScreenerClient::new()?),
        Arc::new(EtherscanGasTracker::new(settings.etherscan_api_key.clone())?),
        Arc::new(TelegramNotifier::new(bot.clone())),
    );

    let addr = SocketAddr::new(settings.host.parse()?, settings.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on http://{}", addr);

    let app = routes::app(state.clone());
    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "http server stopped");
        }
    });

    tracing::info!("bot started");
    bot_controller::run(bot, state.clone()).await;

    let cancelled = state.alerts.cancel_all();
    tracing::info!(cancelled, "shutting down");
    Ok(())
}
