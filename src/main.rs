// O Mago - Rust Edition
// A Discord bot for tabletop RPG communities: onboarding, private player channels and dice

mod commands;
mod features;
mod models;
mod utils;

use std::env;
use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::features::gateway::handle_member_join;
use crate::features::guild_config::{ConfigStore, JsonFileBackend};
use crate::features::keep_alive;
use crate::utils::config::Settings;

/// User data shared across all commands
#[derive(Debug)]
pub struct Data {
    pub configs: Arc<ConfigStore>,
}

type Error = Box<dyn std::error::Error + Send + Sync>;
type Context<'a> = poise::Context<'a, Data, Error>;

/// Register all prefix commands
fn get_commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        commands::ping::ping(),
        commands::roll::roll(),
        commands::config::set_canal_intro(),
        commands::config::set_cargo_jogador(),
        commands::config::set_categoria_privada(),
        commands::config::config(),
        commands::help::help(),
    ]
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::MissingUserPermissions { ctx, .. } => {
            let _ = ctx.say("🚫 Apenas administradores podem usar este comando.").await;
        }
        poise::FrameworkError::ArgumentParse { ctx, .. } => {
            let _ = ctx
                .say(format!(
                    "❓ Faltou um argumento. Use `{}help {}` para ver como usar.",
                    ctx.prefix(),
                    ctx.command().name
                ))
                .await;
        }
        poise::FrameworkError::GuildOnly { ctx, .. } => {
            let _ = ctx.say("Este comando só pode ser usado em um servidor.").await;
        }
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!("Command error in {}: {:?}", ctx.command().name, error);
            let _ = ctx
                .say(format!("Ocorreu um erro arcano ao tentar ler sua magia: {}", error))
                .await;
        }
        err => {
            if let Err(e) = poise::builtins::on_error(err).await {
                error!("Error while handling error: {:?}", e);
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    if let serenity::FullEvent::GuildMemberAddition { new_member } = event {
        // One task per join so a session waiting on a reply never blocks other events
        tokio::spawn(handle_member_join(
            ctx.clone(),
            Arc::clone(&data.configs),
            new_member.clone(),
        ));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "mago_rs=info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::from_env()?;

    info!("Starting O Mago (Rust Edition)...");

    let configs = Arc::new(ConfigStore::load(JsonFileBackend::new(&settings.config_file)).await);

    let shutdown_configs = Arc::clone(&configs);

    tokio::spawn(keep_alive::serve(settings.keep_alive_port));

    // Setup framework
    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: get_commands(),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(settings.command_prefix.clone()),
                ..Default::default()
            },
            on_error: |error| Box::pin(on_error(error)),
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |_ctx, ready, _framework| {
            Box::pin(async move {
                info!("O Mago \"{}\" está online e pronto para a aventura!", ready.user.name);
                info!("Configurações carregadas para {} servidor(es).", configs.len().await);

                Ok(Data { configs })
            })
        })
        .build();

    // MESSAGE_CONTENT and GUILD_MEMBERS are privileged, enable them in the Discord Dev Portal
    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::ClientBuilder::new(&settings.discord_token, intents)
        .framework(framework)
        .await?;

    // Run with graceful shutdown
    let shard_manager = client.shard_manager.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to register Ctrl+C handler: {:?}", e);
            return;
        }
        info!("Shutting down...");
        shard_manager.shutdown_all().await;
    });

    client.start().await?;

    if let Err(e) = shutdown_configs.save().await {
        error!("Failed to flush guild configs on shutdown: {}", e);
    }

    info!("Goodbye!");
    Ok(())
}
