// Onboarding flow - greets a new member, waits for their character name,
// then grants the player role and opens a private channel for them.

use std::fmt;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use tracing::{debug, error, info};

use crate::models::guild::GuildConfig;
use crate::utils::formatters::private_channel_name;

/// The member being onboarded
#[derive(Debug, Clone)]
pub struct Newcomer {
    pub id: serenity::UserId,
    pub name: String,
    pub avatar_url: String,
}

/// A message received while waiting for the newcomer
#[derive(Debug, Clone)]
pub struct Reply {
    pub message_id: serenity::MessageId,
    pub content: String,
}

/// Everything needed to open a player's private channel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrivateChannelRequest {
    pub name: String,
    pub topic: String,
    pub category: serenity::ChannelId,
    /// The only regular member allowed to see the channel
    pub owner: serenity::UserId,
}

/// Chat platform operations the flow needs, scoped to one guild
#[async_trait]
pub trait GuildGateway: Send + Sync {
    async fn find_text_channel(&self, name: &str) -> Result<Option<serenity::ChannelId>>;
    async fn find_role(&self, name: &str) -> Result<Option<serenity::RoleId>>;
    async fn find_category(&self, name: &str) -> Result<Option<serenity::ChannelId>>;
    async fn create_category(&self, name: &str) -> Result<serenity::ChannelId>;
    /// Create a text channel hidden from @everyone, open to the owner and readable by the bot
    async fn create_private_channel(
        &self,
        request: &PrivateChannelRequest,
    ) -> Result<serenity::ChannelId>;
    async fn send_welcome(&self, channel: serenity::ChannelId, newcomer: &Newcomer) -> Result<()>;
    async fn send_message(&self, channel: serenity::ChannelId, content: &str) -> Result<()>;
    /// First message by `author` in `channel`, or `None` once `timeout` elapses
    async fn wait_for_reply(
        &self,
        channel: serenity::ChannelId,
        author: serenity::UserId,
        timeout: Duration,
    ) -> Result<Option<Reply>>;
    async fn delete_message(
        &self,
        channel: serenity::ChannelId,
        message: serenity::MessageId,
    ) -> Result<()>;
    async fn grant_role(&self, member: serenity::UserId, role: serenity::RoleId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Started,
    AwaitingReply,
    Provisioning,
    Provisioned,
    TimedOut,
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AbortReason {
    IntroChannelMissing(String),
    PlayerRoleMissing(String),
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbortReason::IntroChannelMissing(name) => write!(f, "intro channel `{}` not found", name),
            AbortReason::PlayerRoleMissing(name) => write!(f, "player role `{}` not found", name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OnboardingOutcome {
    Provisioned {
        channel: serenity::ChannelId,
        player_name: String,
    },
    TimedOut,
    Aborted(AbortReason),
}

struct Session<'a> {
    newcomer: &'a Newcomer,
    state: SessionState,
}

impl Session<'_> {
    fn advance(&mut self, next: SessionState) {
        debug!(
            "Onboarding {} ({}): {:?} -> {:?}",
            self.newcomer.name, self.newcomer.id, self.state, next
        );
        self.state = next;
    }
}

pub fn timeout_notice(member: serenity::UserId) -> String {
    format!(
        "<@{}>, parece que você se perdeu na floresta... \n Você demorou demais para responder. Entre em contato com o Mestre",
        member
    )
}

pub fn confirmation(member: serenity::UserId, channel: serenity::ChannelId) -> String {
    format!(
        "Perfeito, <@{}>! Seu cargo foi concedido e o canal <#{}> foi criado. Boa sorte!",
        member, channel
    )
}

pub fn private_welcome(player_name: &str) -> String {
    format!("Olá, {}! Este é o seu canal privado.", player_name)
}

/// Run one onboarding session to completion.
///
/// Platform errors propagate; steps already taken are not rolled back.
pub async fn run_onboarding<G: GuildGateway + ?Sized>(
    gateway: &G,
    config: &GuildConfig,
    newcomer: &Newcomer,
    timeout: Duration,
) -> Result<OnboardingOutcome> {
    let mut session = Session {
        newcomer,
        state: SessionState::Started,
    };

    let Some(intro_channel) = gateway.find_text_channel(&config.intro_channel).await? else {
        error!("Intro channel '{}' not found", config.intro_channel);
        session.advance(SessionState::Aborted);
        return Ok(OnboardingOutcome::Aborted(AbortReason::IntroChannelMissing(
            config.intro_channel.clone(),
        )));
    };

    gateway.send_welcome(intro_channel, newcomer).await?;
    session.advance(SessionState::AwaitingReply);

    let reply = gateway
        .wait_for_reply(intro_channel, newcomer.id, timeout)
        .await?;
    let Some(reply) = reply else {
        gateway
            .send_message(intro_channel, &timeout_notice(newcomer.id))
            .await?;
        session.advance(SessionState::TimedOut);
        return Ok(OnboardingOutcome::TimedOut);
    };

    let player_name = reply.content.trim().to_string();
    gateway.delete_message(intro_channel, reply.message_id).await?;
    session.advance(SessionState::Provisioning);

    // Role first: no channel is created for a member who could not get the role
    let Some(role) = gateway.find_role(&config.player_role).await? else {
        error!("Player role '{}' not found", config.player_role);
        session.advance(SessionState::Aborted);
        return Ok(OnboardingOutcome::Aborted(AbortReason::PlayerRoleMissing(
            config.player_role.clone(),
        )));
    };
    gateway.grant_role(newcomer.id, role).await?;

    let category = match gateway.find_category(&config.private_category).await? {
        Some(category) => category,
        None => {
            info!("Creating missing category '{}'", config.private_category);
            gateway.create_category(&config.private_category).await?
        }
    };

    let request = PrivateChannelRequest {
        name: private_channel_name(&player_name),
        topic: format!("Diário de Bordo de {}.", player_name),
        category,
        owner: newcomer.id,
    };
    let private_channel = gateway.create_private_channel(&request).await?;

    gateway
        .send_message(intro_channel, &confirmation(newcomer.id, private_channel))
        .await?;
    gateway
        .send_message(private_channel, &private_welcome(&player_name))
        .await?;
    session.advance(SessionState::Provisioned);

    Ok(OnboardingOutcome::Provisioned {
        channel: private_channel,
        player_name,
    })
}
