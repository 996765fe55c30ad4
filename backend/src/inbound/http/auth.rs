//! Account API handlers.
//!
//! ```text
//! POST /api/auth/register {"email":"ada@example.com","password":"secret1"}
//! POST /api/auth/login {"email":"ada@example.com","password":"secret1"}
//! ```

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{
    CredentialsValidationError, Error, Language, LoginCredentials, Registration,
    SubscriptionTier, UserAccount, UserProfile, UserType,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, invalid_field};

/// Registration body for `POST /api/auth/register`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    /// `farmer`, `consumer` or `both`; defaults to `farmer`.
    #[serde(default)]
    pub user_type: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub preferred_language: Option<String>,
}

/// Login body for `POST /api/auth/login`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of an account. Never carries the password hash.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub subscription_tier: SubscriptionTier,
    pub prompts_used: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
}

impl From<UserAccount> for AccountResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email.into(),
            subscription_tier: account.tier,
            prompts_used: account.prompts_used,
            name: account.profile.name,
            user_type: account.profile.user_type,
            region: account.profile.region,
        }
    }
}

/// Confirmation returned after sign-up.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub message: String,
    pub user: AccountResponse,
}

/// Minimal account view returned with a token.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    pub subscription_tier: SubscriptionTier,
    pub prompts_used: u32,
}

/// Bearer token and session view.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub user: SessionUser,
}

fn map_credentials_error(err: CredentialsValidationError) -> Error {
    let field = match err {
        CredentialsValidationError::Email(_) => FieldName::new("email"),
        CredentialsValidationError::EmptyPassword
        | CredentialsValidationError::PasswordTooShort { .. } => FieldName::new("password"),
        CredentialsValidationError::ProfileFieldTooLong { field, .. } => FieldName::new(field),
    };
    invalid_field(field, err)
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

impl TryFrom<RegisterRequest> for Registration {
    type Error = Error;

    fn try_from(value: RegisterRequest) -> Result<Self, Self::Error> {
        let user_type = match blank_to_none(value.user_type) {
            Some(raw) => raw
                .parse::<UserType>()
                .map_err(|err| invalid_field(FieldName::new("userType"), err))?,
            None => UserType::default(),
        };
        let profile = UserProfile {
            name: blank_to_none(value.name),
            user_type,
            region: blank_to_none(value.region),
            preferred_language: value
                .preferred_language
                .map(Language::new)
                .unwrap_or_default(),
        };
        Registration::try_new(&value.email, &value.password, profile)
            .map_err(map_credentials_error)
    }
}

/// Create a free-tier account.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = RegisterResponse),
        (status = 400, description = "Invalid request or email already registered", body = Error),
        (status = 503, description = "Database unavailable", body = Error)
    ),
    tags = ["auth"],
    operation_id = "register"
)]
#[post("/register")]
pub async fn register(
    state: web::Data<HttpState>,
    payload: web::Json<RegisterRequest>,
) -> ApiResult<HttpResponse> {
    let registration = Registration::try_from(payload.into_inner())?;
    let account = state.accounts.register(&registration).await?;
    Ok(HttpResponse::Created().json(RegisterResponse {
        message: "User created successfully".to_owned(),
        user: account.into(),
    }))
}

/// Exchange credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = LoginResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error)
    ),
    tags = ["auth"],
    operation_id = "login"
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<LoginResponse>> {
    let LoginRequest { email, password } = payload.into_inner();
    let credentials =
        LoginCredentials::try_from_parts(&email, &password).map_err(map_credentials_error)?;
    let session = state.accounts.login(&credentials).await?;
    Ok(web::Json(LoginResponse {
        token: session.token.into(),
        user: SessionUser {
            id: session.user.id.to_string(),
            email: session.user.email.into(),
            subscription_tier: session.user.tier,
            prompts_used: session.user.prompts_used,
        },
    }))
}
