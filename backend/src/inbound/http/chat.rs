//! Chat API handlers.
//!
//! ```text
//! POST /api/chat/message {"userId":"…","message":"…","sessionId":"s1","language":"english"}
//! GET  /api/chat/history/{userId}/{sessionId}
//! GET  /api/chat/sessions/{userId}
//! ```

use actix_web::{get, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    ChatPrompt, ChatRecord, ChatReply, ChatSessionSummary, ChatValidationError, Error, Language,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, USER_ID, invalid_field, parse_session_id, parse_user_id,
};

/// Body for `POST /api/chat/message`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessageRequest {
    pub user_id: String,
    pub message: String,
    pub session_id: String,
    /// Defaults to English. Other languages need a paid tier.
    #[serde(default)]
    pub language: Option<String>,
}

impl TryFrom<ChatMessageRequest> for ChatPrompt {
    type Error = Error;

    fn try_from(value: ChatMessageRequest) -> Result<Self, Self::Error> {
        let user_id = parse_user_id(&value.user_id, USER_ID)?;
        let session_id = parse_session_id(&value.session_id)?;
        let language = value.language.map(Language::new).unwrap_or_default();
        ChatPrompt::try_new(user_id, session_id, &value.message, language).map_err(|err| {
            let field = match err {
                ChatValidationError::LanguageTooLong { .. } => "language",
                _ => "message",
            };
            invalid_field(FieldName::new(field), err)
        })
    }
}

/// Send a prompt to the farming assistant.
///
/// Free accounts get five English prompts; the refusal carries
/// `upgradeRequired: true`.
#[utoipa::path(
    post,
    path = "/api/chat/message",
    request_body = ChatMessageRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatReply),
        (status = 400, description = "Invalid request", body = Error),
        (status = 403, description = "Quota reached or language requires upgrade", body = Error),
        (status = 404, description = "Unknown user", body = Error),
        (status = 500, description = "AI model failure", body = Error)
    ),
    tags = ["chat"],
    operation_id = "sendChatMessage"
)]
#[post("/message")]
pub async fn send_message(
    state: web::Data<HttpState>,
    payload: web::Json<ChatMessageRequest>,
) -> ApiResult<web::Json<ChatReply>> {
    let prompt = ChatPrompt::try_from(payload.into_inner())?;
    let reply = state.chat.send(prompt).await?;
    Ok(web::Json(reply))
}

/// Messages of one session, oldest first.
#[utoipa::path(
    get,
    path = "/api/chat/history/{user_id}/{session_id}",
    params(
        ("user_id" = String, Path, description = "User UUID"),
        ("session_id" = String, Path, description = "Client session key")
    ),
    responses(
        (status = 200, description = "Session messages", body = [ChatRecord]),
        (status = 400, description = "Invalid identifiers", body = Error)
    ),
    tags = ["chat"],
    operation_id = "chatHistory"
)]
#[get("/history/{user_id}/{session_id}")]
pub async fn history(
    state: web::Data<HttpState>,
    path: web::Path<(String, String)>,
) -> ApiResult<web::Json<Vec<ChatRecord>>> {
    let (user_id, session_id) = path.into_inner();
    let user_id = parse_user_id(&user_id, USER_ID)?;
    let session_id = parse_session_id(&session_id)?;
    Ok(web::Json(state.chat.history(&user_id, &session_id).await?))
}

/// Session summaries, most recent activity first.
#[utoipa::path(
    get,
    path = "/api/chat/sessions/{user_id}",
    params(("user_id" = String, Path, description = "User UUID")),
    responses(
        (status = 200, description = "Session summaries", body = [ChatSessionSummary]),
        (status = 400, description = "Invalid identifier", body = Error)
    ),
    tags = ["chat"],
    operation_id = "chatSessions"
)]
#[get("/sessions/{user_id}")]
pub async fn sessions(
    state: web::Data<HttpState>,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ChatSessionSummary>>> {
    let user_id = parse_user_id(&path.into_inner(), USER_ID)?;
    Ok(web::Json(state.chat.sessions(&user_id).await?))
}
