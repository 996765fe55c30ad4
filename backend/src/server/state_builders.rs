//! Builders wiring the production adapters into [`HttpState`].

use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};

use farmwise::domain::ports::{
    AdvisoryModel, ChatRepository, ConsumerDataRepository, FarmDataRepository, PaymentGateway,
    SdgMetricsRepository, UserRepository,
};
use farmwise::domain::{
    AccountService, ChatService, ConsumerService, FarmerService, PremiumFeatures, SdgCalculator,
    SubscriptionService, SubscriptionUrls,
};
use farmwise::inbound::http::state::HttpState;
use farmwise::outbound::gemini::{GeminiConfig, GeminiHttpModel};
use farmwise::outbound::paystack::{PaystackConfig, PaystackHttpGateway};
use farmwise::outbound::persistence::{
    DbPool, DieselChatRepository, DieselConsumerDataRepository, DieselFarmDataRepository,
    DieselSdgMetricsRepository, DieselUserRepository,
};
use farmwise::outbound::security::{BcryptPasswordHasher, JwtTokenIssuer};
use farmwise::settings::{FarmwiseSettings, RuntimeSecrets};

/// Repository ports sharing one pool.
pub(crate) struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub chats: Arc<dyn ChatRepository>,
    pub farms: Arc<dyn FarmDataRepository>,
    pub consumers: Arc<dyn ConsumerDataRepository>,
    pub metrics: Arc<dyn SdgMetricsRepository>,
}

impl Repositories {
    pub(crate) fn diesel(pool: &DbPool) -> Self {
        Self {
            users: Arc::new(DieselUserRepository::new(pool.clone())),
            chats: Arc::new(DieselChatRepository::new(pool.clone())),
            farms: Arc::new(DieselFarmDataRepository::new(pool.clone())),
            consumers: Arc::new(DieselConsumerDataRepository::new(pool.clone())),
            metrics: Arc::new(DieselSdgMetricsRepository::new(pool.clone())),
        }
    }
}

fn advisory_model(
    settings: &FarmwiseSettings,
    secrets: &RuntimeSecrets,
) -> Result<Arc<dyn AdvisoryModel>> {
    let model = GeminiHttpModel::new(GeminiConfig {
        base_url: settings.gemini_base_url()?,
        model: settings.gemini_model().to_owned(),
        api_key: secrets.gemini_api_key.clone(),
        timeout: settings.http_timeout(),
    })
    .wrap_err("building Gemini client")?;
    Ok(Arc::new(model))
}

fn payment_gateway(
    settings: &FarmwiseSettings,
    secrets: &RuntimeSecrets,
) -> Result<Arc<dyn PaymentGateway>> {
    let gateway = PaystackHttpGateway::new(PaystackConfig {
        base_url: settings.paystack_base_url()?,
        secret_key: secrets.paystack_secret_key.clone(),
        timeout: settings.http_timeout(),
    })
    .wrap_err("building Paystack client")?;
    Ok(Arc::new(gateway))
}

/// Assemble the domain services over `repos` and the external clients.
pub(crate) fn build_http_state(
    settings: &FarmwiseSettings,
    secrets: &RuntimeSecrets,
    repos: Repositories,
) -> Result<HttpState> {
    let model = advisory_model(settings, secrets)?;
    let gateway = payment_gateway(settings, secrets)?;
    let Repositories {
        users,
        chats,
        farms,
        consumers,
        metrics,
    } = repos;

    Ok(HttpState {
        accounts: AccountService::new(
            users.clone(),
            Arc::new(BcryptPasswordHasher::default()),
            Arc::new(JwtTokenIssuer::new(
                secrets.jwt_secret.as_bytes(),
                settings.jwt_ttl(),
            )),
        ),
        chat: ChatService::new(users.clone(), chats.clone(), model.clone()),
        farmers: FarmerService::new(users.clone(), farms.clone(), model),
        consumers: ConsumerService::new(users.clone(), consumers),
        premium: PremiumFeatures::new(
            users.clone(),
            chats.clone(),
            farms.clone(),
            settings.award_policy()?,
        ),
        sdg: SdgCalculator::new(users.clone(), chats, farms, metrics),
        subscriptions: SubscriptionService::new(
            users,
            gateway,
            settings.pricing(),
            SubscriptionUrls {
                callback_url: settings.callback_url(),
                frontend_url: settings.frontend_url().to_owned(),
            },
        ),
    })
}
