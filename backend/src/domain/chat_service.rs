//! Quota-gated chat with the advisory model.
//!
//! A prompt is reserved before the model is called and refunded when the call
//! or the chat record write fails, so the free-tier counter only reflects
//! answered prompts that were stored.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::domain::ports::{
    AdvisoryModel, AdvisoryRequest, ChatRepository, PromptReservation, UserRepository,
};
use crate::domain::{
    ChatPrompt, ChatRecord, ChatSessionSummary, Error, FREE_PROMPT_LIMIT, Language, SessionId,
    SubscriptionTier, UserId,
};

/// Reply returned to the client after a successful exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// Model answer text.
    pub reply: String,
    /// Prompt counter after this exchange.
    pub prompts_used: u32,
    pub subscription_tier: SubscriptionTier,
    #[schema(value_type = String)]
    pub language: Language,
}

/// Quota-gated AI chat.
///
/// Reserves a prompt before calling the model and gives it back when the
/// exchange cannot be completed.
#[derive(Clone)]
pub struct ChatService {
    users: Arc<dyn UserRepository>,
    chats: Arc<dyn ChatRepository>,
    model: Arc<dyn AdvisoryModel>,
}

impl ChatService {
    /// Wire the service to its user store, chat log and advisory model.
    pub fn new(
        users: Arc<dyn UserRepository>,
        chats: Arc<dyn ChatRepository>,
        model: Arc<dyn AdvisoryModel>,
    ) -> Self {
        Self {
            users,
            chats,
            model,
        }
    }

    /// Answer a prompt, enforcing the free-tier language and quota rules.
    pub async fn send(&self, prompt: ChatPrompt) -> Result<ChatReply, Error> {
        let user = self
            .users
            .find_by_id(&prompt.user_id)
            .await?
            .ok_or_else(|| Error::not_found("User not found"))?;

        if user.tier == SubscriptionTier::Free && !prompt.language.is_english() {
            return Err(Error::forbidden(
                "Multi-language support requires a premium subscription",
            )
            .requiring_upgrade());
        }

        let (prompts_used, tier) = match self
            .users
            .reserve_prompt(&prompt.user_id, FREE_PROMPT_LIMIT)
            .await?
        {
            PromptReservation::Reserved { prompts_used, tier } => (prompts_used, tier),
            PromptReservation::LimitReached { prompts_used } => {
                info!(user_id = %prompt.user_id, prompts_used, "free prompt limit reached");
                return Err(Error::forbidden(
                    "Free tier limit reached. Upgrade to continue chatting.",
                )
                .requiring_upgrade());
            }
            PromptReservation::UnknownUser => return Err(Error::not_found("User not found")),
        };

        let request = AdvisoryRequest::new(prompt.message.clone(), prompt.language.clone());
        let reply = match self.model.generate(&request).await {
            Ok(reply) => reply,
            Err(err) => {
                warn!(user_id = %prompt.user_id, error = %err, "advisory model failed; refunding prompt");
                self.refund(&prompt.user_id).await;
                return Err(err.into());
            }
        };

        let record = ChatRecord {
            user_id: prompt.user_id,
            session_id: prompt.session_id,
            message: prompt.message,
            response: reply.clone(),
            language: prompt.language.clone(),
            created_at: Utc::now(),
        };
        if let Err(err) = self.chats.append(&record).await {
            warn!(user_id = %record.user_id, error = %err, "chat record not stored; refunding prompt");
            self.refund(&record.user_id).await;
            return Err(err.into());
        }

        Ok(ChatReply {
            reply,
            prompts_used,
            subscription_tier: tier,
            language: prompt.language,
        })
    }

    async fn refund(&self, user_id: &UserId) {
        if let Err(err) = self.users.release_prompt(user_id).await {
            warn!(user_id = %user_id, error = %err, "prompt refund failed");
        }
    }

    /// Messages of one session in chronological order.
    pub async fn history(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<ChatRecord>, Error> {
        Ok(self.chats.session_history(user_id, session_id).await?)
    }

    /// Session summaries, most recent first.
    pub async fn sessions(&self, user_id: &UserId) -> Result<Vec<ChatSessionSummary>, Error> {
        Ok(self.chats.sessions(user_id).await?)
    }
}

#[cfg(test)]
#[path = "chat_service_tests.rs"]
mod tests;
