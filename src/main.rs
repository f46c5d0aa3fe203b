// Entry point of the developer briefs bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (folder paths, search, client metrics, briefs)
// - `infra/` = Implementations of core traits (Google Drive, Docs, Sheets)
// - `discord/` = Discord-specific adapters (the `/briefs` commands)
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Set up the Discord framework and register commands

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use std::sync::Arc;

use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use tracing_subscriber::EnvFilter;

use crate::core::briefs::BriefService;
use crate::core::clients::ClientMetricsService;
use crate::core::folders::{FolderService, SubtreeEnumerator};
use crate::core::search::SearchService;
use crate::core::workspace::WorkspaceConfig;
use crate::discord::commands::presence;
use crate::discord::{Data, Error};
use crate::infra::google::GoogleWorkspaceClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists) before the
    // log filter reads RUST_LOG.
    dotenv::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,drive_briefs_bot=debug"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;
    let config = WorkspaceConfig::from_env().context("Invalid briefs configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // One Google client is shared by every service.

    let workspace = Arc::new(
        GoogleWorkspaceClient::from_env()
            .await
            .context("Failed to load the Google service account")?,
    );

    let subtrees = Arc::new(SubtreeEnumerator::new(
        Arc::clone(&workspace),
        config.subtree_cache_ttl,
        config.subtree_cache_max_entries,
    ));
    let folders = Arc::new(FolderService::new(
        Arc::clone(&workspace),
        config.root_folder_id.clone(),
    ));
    let search = Arc::new(SearchService::new(
        Arc::clone(&workspace),
        Arc::clone(&subtrees),
        config.root_folder_id.clone(),
        config.search_result_limit,
        config.parent_batch_size,
    ));
    let clients = Arc::new(ClientMetricsService::new(
        Arc::clone(&workspace),
        config.spreadsheet_id.clone(),
        config.client_range(),
    ));
    let briefs = Arc::new(BriefService::new(Arc::clone(&workspace)));

    tracing::info!(
        service_account = %workspace.service_account(),
        root_folder_id = %config.root_folder_id,
        client_range = %config.client_range(),
        result_limit = config.search_result_limit,
        cache_ttl = ?config.subtree_cache_ttl,
        "Briefs services ready"
    );

    let data = Data {
        folders,
        search,
        subtrees,
        clients,
        briefs,
        default_template_id: config.default_template_id.clone(),
    };

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILDS;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![discord::commands::briefs::briefs()],
            on_error: |error| {
                Box::pin(async move {
                    match error {
                        poise::FrameworkError::Command { error, ctx, .. } => {
                            tracing::error!(
                                command = %ctx.command().qualified_name,
                                error = %error,
                                "Command failed"
                            );
                            let _ = ctx
                                .say(format!("Something went wrong talking to Google: {}", error))
                                .await;
                        }
                        other => {
                            if let Err(e) = poise::builtins::on_error(other).await {
                                tracing::error!("Error while handling error: {}", e);
                            }
                        }
                    }
                })
            },
            ..Default::default()
        })
        .setup(|ctx, _ready, framework| {
            Box::pin(async move {
                tracing::info!("Bot is starting up...");

                // Register slash commands globally (can take up to an hour to propagate)
                poise::builtins::register_globally(ctx, &framework.options().commands).await?;

                tracing::info!("Commands registered");
                presence::on_ready(ctx);

                Ok::<Data, Error>(data)
            })
        })
        .build();

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;
    Ok(())
}
