use crate::{Context, Error};

/// Check the bot's latency
#[poise::command(prefix_command)]
pub async fn ping(ctx: Context<'_>) -> Result<(), Error> {
    let latency_ms = ctx.ping().await.as_millis();
    ctx.say(format!(
        "🏓 Pong! A minha velocidade de resposta é de `{}ms`.",
        latency_ms
    ))
    .await?;
    Ok(())
}
