use poise::serenity_prelude as serenity;

use crate::models::guild::ConfigField;
use crate::utils::config::colors;
use crate::{Context, Error};

/// Set the intro channel name for this server
#[poise::command(
    prefix_command,
    rename = "setcanalintro",
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn set_canal_intro(
    ctx: Context<'_>,
    #[description = "Nome do canal de introdução"]
    #[rest]
    nome_canal: String,
) -> Result<(), Error> {
    update_field(ctx, ConfigField::IntroChannel, nome_canal).await
}

/// Set the player role name for this server
#[poise::command(
    prefix_command,
    rename = "setcargojogador",
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn set_cargo_jogador(
    ctx: Context<'_>,
    #[description = "Nome do cargo de jogador"]
    #[rest]
    nome_cargo: String,
) -> Result<(), Error> {
    update_field(ctx, ConfigField::PlayerRole, nome_cargo).await
}

/// Set the private channel category name for this server
#[poise::command(
    prefix_command,
    rename = "setcategoriaprivada",
    guild_only,
    required_permissions = "ADMINISTRATOR"
)]
pub async fn set_categoria_privada(
    ctx: Context<'_>,
    #[description = "Nome da categoria dos canais privados"]
    #[rest]
    nome_categoria: String,
) -> Result<(), Error> {
    update_field(ctx, ConfigField::PrivateCategory, nome_categoria).await
}

async fn update_field(ctx: Context<'_>, field: ConfigField, value: String) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("Este comando só pode ser usado em um servidor.").await?;
        return Ok(());
    };

    let value = value.trim().to_string();
    ctx.data().configs.set(guild_id, field, value.clone()).await?;

    let verb = match field {
        ConfigField::PrivateCategory => "definida",
        _ => "definido",
    };
    ctx.say(format!(
        "✅ {} deste servidor foi {} para `{}`.",
        field.label(),
        verb,
        value
    ))
    .await?;

    Ok(())
}

/// Show this server's current configuration
#[poise::command(prefix_command, guild_only, required_permissions = "ADMINISTRATOR")]
pub async fn config(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say("Este comando só pode ser usado em um servidor.").await?;
        return Ok(());
    };

    let config = ctx.data().configs.get_or_create(guild_id).await;

    let embed = serenity::CreateEmbed::new()
        .title("Configuração do Servidor")
        .field("Canal de introdução", format!("`{}`", config.intro_channel), false)
        .field("Cargo de jogador", format!("`{}`", config.player_role), false)
        .field("Categoria privada", format!("`{}`", config.private_category), false)
        .color(colors::INFO);

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}
