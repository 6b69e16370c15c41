// Roll command - dice rolling for tabletop sessions

use poise::serenity_prelude as serenity;

use crate::utils::config::{colors, MAX_EMBED_FIELD_LEN};
use crate::utils::dice::{self, DiceError, RollOutcome};
use crate::utils::formatters::truncate;
use crate::{Context, Error};

/// Rola dados. Ex: !roll 2d6 + 1d10 + 5
#[poise::command(prefix_command)]
pub async fn roll(
    ctx: Context<'_>,
    #[description = "Fórmula no formato XdY + Z"]
    #[rest]
    formula: String,
) -> Result<(), Error> {
    // ThreadRng is not Send; keep it out of any await
    let result = dice::roll(&formula, &mut rand::rng());

    match result {
        Ok(outcome) => {
            let embed = roll_embed(&formula, &outcome, ctx.author().display_name());
            ctx.send(poise::CreateReply::default().embed(embed)).await?;
        }
        Err(e) => {
            ctx.say(error_message(&formula, &e)).await?;
        }
    }

    Ok(())
}

fn roll_embed(formula: &str, outcome: &RollOutcome, roller: &str) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("🎲 Rolagem de Dados")
        .description(format!("**Fórmula:** `{}`", formula))
        .color(colors::DARK_RED)
        .field("Detalhes", breakdown(outcome), false)
        .field("Resultado Final", format!("**{}**", outcome.total), false)
        .footer(serenity::CreateEmbedFooter::new(format!("Rolado por {}", roller)))
}

fn breakdown(outcome: &RollOutcome) -> String {
    let details = outcome
        .terms
        .iter()
        .map(|term| term.describe())
        .collect::<Vec<_>>()
        .join("\n");
    truncate(&details, MAX_EMBED_FIELD_LEN)
}

fn error_message(formula: &str, error: &DiceError) -> String {
    match error {
        DiceError::OutOfRange(_) => {
            "Valores de dados inválidos. Use entre 1-100 dados e 1-1000 lados.".to_string()
        }
        DiceError::InvalidTerm(_) | DiceError::Overflow => format!(
            "Não entendi a fórmula `{}`. Por favor, use o formato `!roll XdY + Z`.",
            formula
        ),
    }
}
