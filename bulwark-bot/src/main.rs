mod events;
mod tasks;

use std::env;
use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;
use sqlx::postgres::PgPoolOptions;

use bulwark_antinuke::{AntiNuke, CounterStore, InMemoryCounterStore, RedisCounterStore, SystemClock};
use bulwark_core::{Data, Error};
use bulwark_database::{CacheService, Database, MIGRATOR};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    // Store Discord Bot Token
    let token = env::var("DISCORD_TOKEN")?;
    let database_url = env::var("DATABASE_URL")?;
    let guild_id = env::var("DISCORD_GUILD_ID")?.parse::<u64>()?;

    let db_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    info!("PostgreSQL connection established.");

    let redis_enabled = env_bool("REDIS_ENABLED", false);
    let redis_key_prefix =
        env::var("REDIS_KEY_PREFIX").unwrap_or_else(|_| "bulwark:prod".to_string());

    let cache = if redis_enabled {
        match env::var("REDIS_URL") {
            Ok(redis_url) => match CacheService::redis(&redis_url, redis_key_prefix.clone()) {
                Ok(cache) => {
                    info!(key_prefix = %redis_key_prefix, "Redis cache enabled.");
                    cache
                }
                Err(err) => {
                    warn!(?err, key_prefix = %redis_key_prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                    CacheService::disabled(redis_key_prefix.clone())
                }
            },
            Err(_) => {
                warn!(key_prefix = %redis_key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
                CacheService::disabled(redis_key_prefix.clone())
            }
        }
    } else {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        CacheService::disabled(redis_key_prefix.clone())
    };

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    let counter_sweep_every = Duration::from_secs(env_u64("COUNTER_SWEEP_INTERVAL_SECS", 30));
    let clock = Arc::new(SystemClock);
    let (counter_store, memory_counters): (Arc<dyn CounterStore>, Option<Arc<InMemoryCounterStore>>) =
        if cache.is_redis_enabled() {
            info!("Anti-nuke counters shared through Redis.");
            (Arc::new(RedisCounterStore::new(cache.clone())?), None)
        } else {
            info!("Anti-nuke counters kept in memory.");
            let store = Arc::new(InMemoryCounterStore::new(clock.clone()));
            (store.clone(), Some(store))
        };

    let db = Database::with_cache(db_pool, cache);

    let restore_pacing = Duration::from_millis(env_u64("RESTORE_PACING_MS", 500));
    let snapshot_refresh_every =
        Duration::from_secs(env_u64("SNAPSHOT_REFRESH_INTERVAL_SECS", 21_600));
    let antinuke = AntiNuke::new(Arc::new(db.clone()), counter_store, clock)
        .with_pacing(restore_pacing);
    info!(
        restore_pacing_ms = u64::try_from(restore_pacing.as_millis()).unwrap_or(u64::MAX),
        snapshot_refresh_secs = snapshot_refresh_every.as_secs(),
        "Anti-nuke engine configured."
    );

    let auto_run_migrations = env_bool("AUTO_RUN_MIGRATIONS", true);
    if auto_run_migrations {
        MIGRATOR.run(db.pool()).await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MODERATION
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: bulwark_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(bulwark_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, _ready, framework| {
            let db = db.clone();
            let antinuke = antinuke.clone();
            let memory_counters = memory_counters.clone();
            Box::pin(async move {
                info!("Bulwark has awoken!");

                poise::builtins::register_in_guild(
                    ctx,
                    &framework.options().commands,
                    serenity::GuildId::new(guild_id),
                )
                .await?;

                tasks::spawn_snapshot_refresh(
                    ctx.http.clone(),
                    db.clone(),
                    antinuke.clone(),
                    snapshot_refresh_every,
                );
                if let Some(store) = memory_counters {
                    tasks::spawn_counter_sweep(store, counter_sweep_every);
                }

                Ok(Data { db, antinuke })
            })
        })
        .build();

    info!("Bulwark is connecting...");

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            error!(?error, "command error");

            let embed = serenity::CreateEmbed::new()
                .title("Command Error")
                .description("Something went wrong while running this command.")
                .color(bulwark_utils::embed::DEFAULT_EMBED_COLOR);

            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = format!("Usage: `!{}`", ctx.command().qualified_name);
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\n{}", input, usage)
            } else {
                format!("Missing required argument.\n{}", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::ChannelDelete { channel, .. } => {
            events::antinuke::handle_channel_delete(ctx, data, channel).await;
        }
        serenity::FullEvent::GuildRoleDelete { guild_id, .. } => {
            events::antinuke::handle_role_delete(ctx, data, *guild_id).await;
        }
        _ => {}
    }

    Ok(())
}
