//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed domain entities used by the API and
//! persistence layers, plus the services that drive them through ports.
//! Keep types transport agnostic and document invariants and serialisation
//! contracts (serde) in each type's Rustdoc.

pub mod account_service;
pub mod auth;
pub mod chat;
pub mod chat_service;
pub mod consumer;
pub mod consumer_service;
pub mod error;
pub mod farm;
pub mod farmer_service;
pub mod impact;
pub mod ports;
pub mod premium;
pub mod sdg_calculator;
pub mod subscription;
pub mod subscription_service;
pub mod trace_id;
pub mod user;

pub use self::account_service::{AccountService, LoginSession};
pub use self::auth::{AccessToken, CredentialsValidationError, LoginCredentials, Registration};
pub use self::chat::{
    ChatPrompt, ChatRecord, ChatSessionSummary, ChatValidationError, FREE_PROMPT_LIMIT, Language,
    SessionId,
};
pub use self::chat_service::{ChatReply, ChatService};
pub use self::consumer::{
    CarbonFootprintInput, CarbonFootprintRecord, ConsumerData, ConsumerProfile,
    ConsumerValidationError, FoodWasteEntry,
};
pub use self::consumer_service::ConsumerService;
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::farm::{
    CropEntry, CropRotation, FarmData, FarmProfile, FarmValidationError, IrrigationPlan,
    IrrigationRequest, PestAnalysisRequest, PestReport,
};
pub use self::farmer_service::FarmerService;
pub use self::impact::{CSV_HEADER, ImpactCounts, PlatformStats, SdgImpact, SdgSnapshot};
pub use self::premium::{DuplicateAwardPolicy, PremiumFeatures};
pub use self::sdg_calculator::SdgCalculator;
pub use self::subscription::{
    CheckoutRequest, CheckoutSession, PaymentOutcome, PaymentReference, PaymentStatus,
    PaymentVerification, SubscriptionPlan, SubscriptionStatus, WebhookEvent,
};
pub use self::subscription_service::{PlanPricing, SubscriptionService, SubscriptionUrls};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Achievement, Email, NewUserAccount, SubscriptionTier, UserAccount, UserId, UserProfile,
    UserType, UserValidationError,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use farmwise::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
