// Serenity implementation of the onboarding gateway, plus the member-join entry point

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::{error, info, warn};

use crate::features::guild_config::ConfigStore;
use crate::features::onboarding::{
    run_onboarding, GuildGateway, Newcomer, OnboardingOutcome, PrivateChannelRequest, Reply,
};
use crate::utils::config::{colors, ONBOARDING_TIMEOUT};

/// A guild as seen through the serenity client
pub struct SerenityGuild {
    ctx: serenity::Context,
    guild_id: serenity::GuildId,
}

impl SerenityGuild {
    pub fn new(ctx: serenity::Context, guild_id: serenity::GuildId) -> Self {
        Self { ctx, guild_id }
    }

    async fn find_channel(
        &self,
        name: &str,
        kind: serenity::ChannelType,
    ) -> Result<Option<serenity::ChannelId>> {
        let channels = self.guild_id.channels(&self.ctx.http).await?;
        Ok(channels
            .values()
            .find(|c| c.kind == kind && c.name == name)
            .map(|c| c.id))
    }
}

/// Hide the channel from @everyone, open it to its owner, keep it readable by the bot
fn private_overwrites(
    guild_id: serenity::GuildId,
    owner: serenity::UserId,
    bot: serenity::UserId,
) -> Vec<serenity::PermissionOverwrite> {
    vec![
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::empty(),
            deny: serenity::Permissions::VIEW_CHANNEL,
            // @everyone shares the guild's id
            kind: serenity::PermissionOverwriteType::Role(serenity::RoleId::new(guild_id.get())),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL | serenity::Permissions::SEND_MESSAGES,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(owner),
        },
        serenity::PermissionOverwrite {
            allow: serenity::Permissions::VIEW_CHANNEL,
            deny: serenity::Permissions::empty(),
            kind: serenity::PermissionOverwriteType::Member(bot),
        },
    ]
}

#[async_trait]
impl GuildGateway for SerenityGuild {
    async fn find_text_channel(&self, name: &str) -> Result<Option<serenity::ChannelId>> {
        self.find_channel(name, serenity::ChannelType::Text).await
    }

    async fn find_role(&self, name: &str) -> Result<Option<serenity::RoleId>> {
        let roles = self.guild_id.roles(&self.ctx.http).await?;
        Ok(roles.values().find(|r| r.name == name).map(|r| r.id))
    }

    async fn find_category(&self, name: &str) -> Result<Option<serenity::ChannelId>> {
        self.find_channel(name, serenity::ChannelType::Category).await
    }

    async fn create_category(&self, name: &str) -> Result<serenity::ChannelId> {
        let builder = serenity::CreateChannel::new(name).kind(serenity::ChannelType::Category);
        let category = self.guild_id.create_channel(&self.ctx.http, builder).await?;
        Ok(category.id)
    }

    async fn create_private_channel(
        &self,
        request: &PrivateChannelRequest,
    ) -> Result<serenity::ChannelId> {
        let permission_overwrites = private_overwrites(
            self.guild_id,
            request.owner,
            self.ctx.cache.current_user().id,
        );

        let builder = serenity::CreateChannel::new(&request.name)
            .kind(serenity::ChannelType::Text)
            .category(request.category)
            .topic(&request.topic)
            .permissions(permission_overwrites);

        let channel = self.guild_id.create_channel(&self.ctx.http, builder).await?;
        Ok(channel.id)
    }

    async fn send_welcome(&self, channel: serenity::ChannelId, newcomer: &Newcomer) -> Result<()> {
        let embed = serenity::CreateEmbed::new()
            .title(format!("Bem-vindo(a) à aventura, {}!", newcomer.name))
            .description(
                "Eu sou O Mago, o guardião deste servidor de RPG. Para começarmos, por favor, \
                responda a esta mensagem enviando **apenas o nome do seu personagem**.\n\n\
                *Você tem 5 minutos para responder.*",
            )
            .color(colors::PURPLE)
            .thumbnail(&newcomer.avatar_url)
            .footer(serenity::CreateEmbedFooter::new(
                "A sua jornada está prestes a começar...",
            ));

        channel
            .send_message(&self.ctx.http, serenity::CreateMessage::new().embed(embed))
            .await?;
        Ok(())
    }

    async fn send_message(&self, channel: serenity::ChannelId, content: &str) -> Result<()> {
        channel.say(&self.ctx.http, content).await?;
        Ok(())
    }

    async fn wait_for_reply(
        &self,
        channel: serenity::ChannelId,
        author: serenity::UserId,
        timeout: Duration,
    ) -> Result<Option<Reply>> {
        let message = channel
            .await_reply(&self.ctx)
            .author_id(author)
            .timeout(timeout)
            .next()
            .await;

        Ok(message.map(|msg| Reply {
            message_id: msg.id,
            content: msg.content,
        }))
    }

    async fn delete_message(
        &self,
        channel: serenity::ChannelId,
        message: serenity::MessageId,
    ) -> Result<()> {
        channel.delete_message(&self.ctx.http, message).await?;
        Ok(())
    }

    async fn grant_role(&self, member: serenity::UserId, role: serenity::RoleId) -> Result<()> {
        self.ctx
            .http
            .add_member_role(self.guild_id, member, role, Some("Onboarding concluído"))
            .await?;
        Ok(())
    }
}

/// Handle a "member joined" event. Meant to run on its own task.
pub async fn handle_member_join(
    ctx: serenity::Context,
    configs: Arc<ConfigStore>,
    member: serenity::Member,
) {
    if member.user.bot {
        return;
    }

    let guild_id = member.guild_id;
    info!("New member joined: {} in guild {}", member.user.name, guild_id);

    let config = configs.get_or_create(guild_id).await;
    let newcomer = Newcomer {
        id: member.user.id,
        name: member.user.name.clone(),
        avatar_url: member.face(),
    };
    let gateway = SerenityGuild::new(ctx, guild_id);

    match run_onboarding(&gateway, &config, &newcomer, ONBOARDING_TIMEOUT).await {
        Ok(OnboardingOutcome::Provisioned { channel, player_name }) => {
            info!(
                "Onboarded {} as '{}' with private channel {}",
                newcomer.name, player_name, channel
            );
        }
        Ok(OnboardingOutcome::TimedOut) => {
            info!("Onboarding of {} timed out", newcomer.name);
        }
        Ok(OnboardingOutcome::Aborted(reason)) => {
            warn!("Onboarding of {} in guild {} aborted: {}", newcomer.name, guild_id, reason);
        }
        Err(e) => {
            error!("Onboarding of {} in guild {} failed: {:?}", newcomer.name, guild_id, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GUILD: serenity::GuildId = serenity::GuildId::new(900);
    const OWNER: serenity::UserId = serenity::UserId::new(17);
    const BOT: serenity::UserId = serenity::UserId::new(99);

    #[test]
    fn test_private_overwrites_hide_channel_from_everyone() {
        let overwrites = private_overwrites(GUILD, OWNER, BOT);
        let everyone = overwrites
            .iter()
            .find(|o| o.kind == serenity::PermissionOverwriteType::Role(serenity::RoleId::new(900)))
            .unwrap();

        assert_eq!(everyone.deny, serenity::Permissions::VIEW_CHANNEL);
        assert!(everyone.allow.is_empty());
    }

    #[test]
    fn test_private_overwrites_open_to_owner_and_bot() {
        let overwrites = private_overwrites(GUILD, OWNER, BOT);
        assert_eq!(overwrites.len(), 3);

        let owner = overwrites
            .iter()
            .find(|o| o.kind == serenity::PermissionOverwriteType::Member(OWNER))
            .unwrap();
        assert_eq!(
            owner.allow,
            serenity::Permissions::VIEW_CHANNEL | serenity::Permissions::SEND_MESSAGES
        );
        assert!(owner.deny.is_empty());

        let bot = overwrites
            .iter()
            .find(|o| o.kind == serenity::PermissionOverwriteType::Member(BOT))
            .unwrap();
        assert_eq!(bot.allow, serenity::Permissions::VIEW_CHANNEL);
        assert!(bot.deny.is_empty());
    }
}
