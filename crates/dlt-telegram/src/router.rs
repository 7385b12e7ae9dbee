use std::{convert::Infallible, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, error_handlers::LoggingErrorHandler, prelude::*};

use dlt_core::{
    config::Config, domain::UserId, messaging::port::MessagingPort, pipeline::MessagePipeline,
    ports::TranslationBackend,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    pub pipeline: Arc<MessagePipeline>,
    pub messenger: Arc<dyn MessagingPort>,
}

pub async fn run_polling(
    cfg: Arc<Config>,
    backend: Arc<dyn TranslationBackend>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    let me = bot.get_me().await?;
    let bot_user_id = UserId(me.id.0 as i64);

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let pipeline = Arc::new(MessagePipeline::from_config(
        &cfg,
        Some(bot_user_id),
        backend,
        messenger.clone(),
    ));

    log_startup(&cfg, me.username());

    let state = Arc::new(AppState {
        cfg,
        pipeline,
        messenger,
    });

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .distribution_function(no_per_chat_queue)
        .default_handler(|_| async {})
        .error_handler(LoggingErrorHandler::with_custom_text(
            "unhandled error while processing update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

/// Updates are never queued behind earlier ones from the same chat; each message
/// runs its own pipeline concurrently and per-chat state is guarded inside the core.
fn no_per_chat_queue(_: &Update) -> Option<Infallible> {
    None
}

fn log_startup(cfg: &Config, username: &str) {
    tracing::info!(bot = %format!("@{username}"), "dual-language translation bot started");
    tracing::info!(
        "current translation pair: {}({}) <-> {}({})",
        cfg.lang_a.name,
        cfg.lang_a.code,
        cfg.lang_b.name,
        cfg.lang_b.code
    );
    if !cfg.allowed_chat_ids.is_empty() {
        tracing::info!(chats = ?cfg.allowed_chat_ids, "group whitelist enabled");
    }
    if !cfg.allowed_admin_usernames.is_empty() {
        let admins = cfg
            .allowed_admin_usernames
            .iter()
            .map(|u| format!("@{u}"))
            .collect::<Vec<_>>();
        tracing::info!(admins = ?admins, "admin usernames");
    }
    if cfg.allowed_chat_ids.is_empty() && cfg.allowed_admin_usernames.is_empty() {
        tracing::warn!("no whitelist configured, every chat is allowed");
    }
    tracing::info!("use /stats to view today's statistics (admin only)");
}
