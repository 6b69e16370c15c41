// Help command - show usage guide

use poise::serenity_prelude as serenity;
use crate::{Context, Error};
use crate::utils::config::colors;

/// Show help and usage guide
#[poise::command(prefix_command)]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Comando específico"] comando: Option<String>,
) -> Result<(), Error> {
    let p = ctx.prefix();

    if let Some(comando) = comando {
        let text = match usage(p, comando.trim_start_matches(p)) {
            Some(text) => text,
            None => format!("Não conheço o comando `{}`. Use `{}help` para ver a lista.", comando, p),
        };
        ctx.say(text).await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title("🧙 O Mago - Ajuda")
        .description("O guardião deste servidor de RPG")
        .color(colors::PURPLE)
        .field(
            "🎲 Utilidades",
            format!(
                "`{p}ping` - Verifica a latência do bot\n\
                `{p}roll XdY + Z` - Rola dados. Ex: `{p}roll 2d6 + 1d10 + 5`"
            ),
            false,
        )
        .field(
            "⚙️ Configuração (administradores)",
            format!(
                "`{p}setcanalintro <nome>` - Canal onde novos membros se apresentam\n\
                `{p}setcargojogador <nome>` - Cargo concedido aos jogadores\n\
                `{p}setcategoriaprivada <nome>` - Categoria dos canais privados\n\
                `{p}config` - Mostra a configuração atual"
            ),
            false,
        )
        .footer(serenity::CreateEmbedFooter::new(format!(
            "Use {p}help <comando> para mais detalhes"
        )));

    ctx.send(poise::CreateReply::default().embed(embed)).await?;

    Ok(())
}

fn usage(p: &str, command: &str) -> Option<String> {
    let text = match command {
        "ping" => format!("`{p}ping` - Verifica a latência do bot."),
        "roll" => format!(
            "`{p}roll XdY + Z` - Rola dados. Até 100 dados de até 1000 lados por termo. \
            Ex: `{p}roll 3d6 + 1d4 + 5`"
        ),
        "setcanalintro" => format!("`{p}setcanalintro <nome do canal>` - Define o canal de introdução deste servidor."),
        "setcargojogador" => format!("`{p}setcargojogador <nome do cargo>` - Define o cargo dos jogadores deste servidor."),
        "setcategoriaprivada" => format!(
            "`{p}setcategoriaprivada <nome da categoria>` - Define a categoria dos canais privados deste servidor."
        ),
        "config" => format!("`{p}config` - Mostra a configuração atual deste servidor."),
        "help" => format!("`{p}help [comando]` - Mostra esta ajuda."),
        _ => return None,
    };
    Some(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_known_commands() {
        for command in ["ping", "roll", "setcanalintro", "setcargojogador", "setcategoriaprivada", "config", "help"] {
            let text = usage("!", command).unwrap();
            assert!(text.starts_with(&format!("`!{}", command)), "{}", text);
        }
    }

    #[test]
    fn test_usage_unknown_command() {
        assert_eq!(usage("!", "xkcd"), None);
    }
}
