//! In-memory port implementations for tests.
//!
//! Shared by unit tests (in `src/`) and the HTTP flow tests (in `tests/`,
//! through the `test-support` feature). Each adapter honours the same
//! contract as its Diesel or HTTP counterpart: conditional counters, once-per
//! reference payments and append-only logs.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::ports::{
    AdvisoryModel, AdvisoryModelError, AdvisoryRequest, AwardOutcome, ChatPersistenceError,
    ChatRepository, ConsumerDataPersistenceError, ConsumerDataRepository,
    FarmDataPersistenceError, FarmDataRepository, PasswordHashError, PasswordHasher,
    PaymentGateway, PaymentGatewayError, PromptReservation, SdgMetricsPersistenceError,
    SdgMetricsRepository, SubscriptionChange, TokenIssueError, TokenIssuer,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    AccessToken, AccountService, Achievement, CarbonFootprintRecord, ChatRecord,
    ChatService, ChatSessionSummary, CheckoutRequest, CheckoutSession, ConsumerData,
    ConsumerProfile, ConsumerService, DuplicateAwardPolicy, Email, FarmData, FarmProfile,
    FarmerService, FoodWasteEntry, IrrigationPlan, NewUserAccount, PaymentReference,
    PaymentStatus, PaymentVerification, PestReport, PlanPricing, PremiumFeatures, SdgCalculator,
    SdgSnapshot, SessionId, SubscriptionService, SubscriptionTier, SubscriptionUrls, UserAccount,
    UserId, UserProfile, WebhookEvent,
};
use crate::inbound::http::state::HttpState;
use crate::outbound::paystack::{parse_webhook_payload, signature};

/// Webhook secret used by [`StubPaymentGateway`].
pub const WEBHOOK_SECRET: &[u8] = b"sk_test_farmwise";

/// Frontend base URL wired into [`TestPorts::http_state`].
pub const FRONTEND_URL: &str = "https://app.farmwise.test";

fn guard<'a, T, E>(
    mutex: &'a Mutex<T>,
    on_poison: fn(&'static str) -> E,
) -> Result<MutexGuard<'a, T>, E> {
    mutex.lock().map_err(|_| on_poison("in-memory store poisoned"))
}

#[derive(Default)]
struct UserStore {
    accounts: HashMap<Uuid, UserAccount>,
    achievements: HashMap<Uuid, Vec<Achievement>>,
    payments: HashSet<String>,
}

/// `UserRepository` over a mutex-guarded map.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: Mutex<UserStore>,
}

impl InMemoryUserRepository {
    fn lock(&self) -> Result<MutexGuard<'_, UserStore>, UserPersistenceError> {
        guard(&self.store, UserPersistenceError::query)
    }

    /// Insert or replace an account directly, bypassing registration.
    pub fn insert(&self, account: UserAccount) -> Result<(), UserPersistenceError> {
        self.lock()?.accounts.insert(*account.id.as_uuid(), account);
        Ok(())
    }

    /// Current stored state of an account.
    pub fn get(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self.lock()?.accounts.get(id.as_uuid()).cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, account: &NewUserAccount) -> Result<UserAccount, UserPersistenceError> {
        let mut store = self.lock()?;
        if store
            .accounts
            .values()
            .any(|existing| existing.email == account.email)
        {
            return Err(UserPersistenceError::duplicate_email(account.email.as_ref()));
        }
        let created = account.clone().into_account(Utc::now());
        store.accounts.insert(*created.id.as_uuid(), created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserPersistenceError> {
        self.get(id)
    }

    async fn find_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<UserAccount>, UserPersistenceError> {
        Ok(self
            .lock()?
            .accounts
            .values()
            .find(|account| &account.email == email)
            .cloned())
    }

    async fn reserve_prompt(
        &self,
        id: &UserId,
        free_limit: u32,
    ) -> Result<PromptReservation, UserPersistenceError> {
        let mut store = self.lock()?;
        let Some(account) = store.accounts.get_mut(id.as_uuid()) else {
            return Ok(PromptReservation::UnknownUser);
        };
        if account.tier == SubscriptionTier::Free && account.prompts_used >= free_limit {
            return Ok(PromptReservation::LimitReached {
                prompts_used: account.prompts_used,
            });
        }
        account.prompts_used = account.prompts_used.saturating_add(1);
        Ok(PromptReservation::Reserved {
            prompts_used: account.prompts_used,
            tier: account.tier,
        })
    }

    async fn release_prompt(&self, id: &UserId) -> Result<(), UserPersistenceError> {
        if let Some(account) = self.lock()?.accounts.get_mut(id.as_uuid()) {
            account.prompts_used = account.prompts_used.saturating_sub(1);
        }
        Ok(())
    }

    async fn apply_subscription(
        &self,
        id: &UserId,
        tier: SubscriptionTier,
        reference: &str,
    ) -> Result<SubscriptionChange, UserPersistenceError> {
        let mut store = self.lock()?;
        if !store.accounts.contains_key(id.as_uuid()) {
            return Ok(SubscriptionChange::UnknownUser);
        }
        if !store.payments.insert(reference.to_owned()) {
            return Ok(SubscriptionChange::AlreadyApplied);
        }
        if let Some(account) = store.accounts.get_mut(id.as_uuid()) {
            account.tier = tier;
            account.prompts_used = 0;
            account.subscription_reference = Some(reference.to_owned());
        }
        Ok(SubscriptionChange::Applied)
    }

    async fn update_sustainability_score(
        &self,
        id: &UserId,
        score: u8,
    ) -> Result<(), UserPersistenceError> {
        if let Some(account) = self.lock()?.accounts.get_mut(id.as_uuid()) {
            account.sustainability_score = score.min(100);
        }
        Ok(())
    }

    async fn award_achievement(
        &self,
        id: &UserId,
        achievement: &Achievement,
        policy: DuplicateAwardPolicy,
    ) -> Result<AwardOutcome, UserPersistenceError> {
        let mut store = self.lock()?;
        let UserStore {
            accounts,
            achievements,
            ..
        } = &mut *store;
        let Some(account) = accounts.get_mut(id.as_uuid()) else {
            return Ok(AwardOutcome::UnknownUser);
        };
        let held = achievements.entry(*id.as_uuid()).or_default();
        if policy == DuplicateAwardPolicy::OncePerBadge
            && held.iter().any(|existing| existing.badge == achievement.badge)
        {
            return Ok(AwardOutcome::AlreadyHeld {
                total_points: account.total_points,
            });
        }
        held.push(achievement.clone());
        account.total_points = account.total_points.saturating_add(achievement.points);
        Ok(AwardOutcome::Awarded {
            total_points: account.total_points,
        })
    }

    async fn achievements(&self, id: &UserId) -> Result<Vec<Achievement>, UserPersistenceError> {
        Ok(self
            .lock()?
            .achievements
            .get(id.as_uuid())
            .cloned()
            .unwrap_or_default())
    }

    async fn count_users(&self) -> Result<u64, UserPersistenceError> {
        Ok(self.lock()?.accounts.len() as u64)
    }

    async fn count_paid_subscribers(&self) -> Result<u64, UserPersistenceError> {
        Ok(self
            .lock()?
            .accounts
            .values()
            .filter(|account| account.tier.is_paid())
            .count() as u64)
    }
}

/// Append-only `ChatRepository`.
#[derive(Default)]
pub struct InMemoryChatRepository {
    records: Mutex<Vec<ChatRecord>>,
}

impl InMemoryChatRepository {
    fn lock(&self) -> Result<MutexGuard<'_, Vec<ChatRecord>>, ChatPersistenceError> {
        guard(&self.records, ChatPersistenceError::query)
    }
}

#[async_trait]
impl ChatRepository for InMemoryChatRepository {
    async fn append(&self, record: &ChatRecord) -> Result<(), ChatPersistenceError> {
        self.lock()?.push(record.clone());
        Ok(())
    }

    async fn session_history(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
    ) -> Result<Vec<ChatRecord>, ChatPersistenceError> {
        let mut history: Vec<_> = self
            .lock()?
            .iter()
            .filter(|r| &r.user_id == user_id && &r.session_id == session_id)
            .cloned()
            .collect();
        history.sort_by_key(|r| r.created_at);
        Ok(history)
    }

    async fn sessions(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<ChatSessionSummary>, ChatPersistenceError> {
        let mut by_session: HashMap<SessionId, ChatSessionSummary> = HashMap::new();
        for record in self.lock()?.iter().filter(|r| &r.user_id == user_id) {
            let summary = by_session
                .entry(record.session_id.clone())
                .or_insert_with(|| ChatSessionSummary {
                    session_id: record.session_id.clone(),
                    last_message: record.message.clone(),
                    message_count: 0,
                    last_activity: record.created_at,
                });
            summary.message_count += 1;
            if record.created_at >= summary.last_activity {
                summary.last_activity = record.created_at;
                summary.last_message = record.message.clone();
            }
        }
        let mut summaries: Vec<_> = by_session.into_values().collect();
        summaries.sort_by(|a, b| b.last_activity.cmp(&a.last_activity));
        Ok(summaries)
    }

    async fn recent(
        &self,
        user_id: &UserId,
        limit: u32,
    ) -> Result<Vec<ChatRecord>, ChatPersistenceError> {
        let mut records: Vec<_> = self
            .lock()?
            .iter()
            .filter(|r| &r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn count_all(&self) -> Result<u64, ChatPersistenceError> {
        Ok(self.lock()?.len() as u64)
    }

    async fn count_since(
        &self,
        user_id: &UserId,
        since: DateTime<Utc>,
    ) -> Result<u64, ChatPersistenceError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|r| &r.user_id == user_id && r.created_at >= since)
            .count() as u64)
    }
}

/// `FarmDataRepository` keyed by user.
#[derive(Default)]
pub struct InMemoryFarmDataRepository {
    documents: Mutex<HashMap<Uuid, FarmData>>,
}

impl InMemoryFarmDataRepository {
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<Uuid, FarmData>>, FarmDataPersistenceError> {
        guard(&self.documents, FarmDataPersistenceError::query)
    }

    fn with_document(
        &self,
        user_id: &UserId,
        apply: impl FnOnce(&mut FarmData),
    ) -> Result<(), FarmDataPersistenceError> {
        let mut documents = self.lock()?;
        let document = documents
            .entry(*user_id.as_uuid())
            .or_insert_with(|| FarmData {
                user_id: user_id.clone(),
                profile: FarmProfile::default(),
                pest_reports: Vec::new(),
                irrigation_schedule: Vec::new(),
                updated_at: Utc::now(),
            });
        apply(document);
        document.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl FarmDataRepository for InMemoryFarmDataRepository {
    async fn find(&self, user_id: &UserId) -> Result<Option<FarmData>, FarmDataPersistenceError> {
        Ok(self.lock()?.get(user_id.as_uuid()).cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: &UserId,
        profile: &FarmProfile,
    ) -> Result<FarmData, FarmDataPersistenceError> {
        self.with_document(user_id, |doc| doc.profile = profile.clone())?;
        self.lock()?
            .get(user_id.as_uuid())
            .cloned()
            .ok_or_else(|| FarmDataPersistenceError::query("farm document vanished"))
    }

    async fn append_pest_report(
        &self,
        user_id: &UserId,
        report: &PestReport,
    ) -> Result<(), FarmDataPersistenceError> {
        self.with_document(user_id, |doc| doc.pest_reports.push(report.clone()))
    }

    async fn append_irrigation_plan(
        &self,
        user_id: &UserId,
        plan: &IrrigationPlan,
    ) -> Result<(), FarmDataPersistenceError> {
        self.with_document(user_id, |doc| doc.irrigation_schedule.push(plan.clone()))
    }

    async fn count_records(&self) -> Result<u64, FarmDataPersistenceError> {
        Ok(self.lock()?.len() as u64)
    }

    async fn count_distinct_farmers(&self) -> Result<u64, FarmDataPersistenceError> {
        Ok(self.lock()?.len() as u64)
    }
}

/// `ConsumerDataRepository` keyed by user.
#[derive(Default)]
pub struct InMemoryConsumerDataRepository {
    documents: Mutex<HashMap<Uuid, ConsumerData>>,
}

impl InMemoryConsumerDataRepository {
    fn with_document<R>(
        &self,
        user_id: &UserId,
        apply: impl FnOnce(&mut ConsumerData) -> R,
    ) -> Result<R, ConsumerDataPersistenceError> {
        let mut documents = guard(&self.documents, ConsumerDataPersistenceError::query)?;
        let document = documents
            .entry(*user_id.as_uuid())
            .or_insert_with(|| ConsumerData {
                user_id: user_id.clone(),
                profile: ConsumerProfile::default(),
                food_waste_log: Vec::new(),
                carbon_footprints: Vec::new(),
                updated_at: Utc::now(),
            });
        document.updated_at = Utc::now();
        Ok(apply(document))
    }
}

#[async_trait]
impl ConsumerDataRepository for InMemoryConsumerDataRepository {
    async fn find(
        &self,
        user_id: &UserId,
    ) -> Result<Option<ConsumerData>, ConsumerDataPersistenceError> {
        let documents = guard(&self.documents, ConsumerDataPersistenceError::query)?;
        Ok(documents.get(user_id.as_uuid()).cloned())
    }

    async fn upsert_profile(
        &self,
        user_id: &UserId,
        profile: &ConsumerProfile,
    ) -> Result<ConsumerData, ConsumerDataPersistenceError> {
        self.with_document(user_id, |doc| {
            doc.profile = profile.clone();
            doc.clone()
        })
    }

    async fn append_food_waste(
        &self,
        user_id: &UserId,
        entry: &FoodWasteEntry,
    ) -> Result<(), ConsumerDataPersistenceError> {
        self.with_document(user_id, |doc| doc.food_waste_log.push(entry.clone()))
    }

    async fn append_carbon_footprint(
        &self,
        user_id: &UserId,
        record: &CarbonFootprintRecord,
    ) -> Result<(), ConsumerDataPersistenceError> {
        self.with_document(user_id, |doc| doc.carbon_footprints.push(record.clone()))
    }
}

/// Insert-only snapshot store.
#[derive(Default)]
pub struct InMemorySdgMetricsRepository {
    snapshots: Mutex<Vec<SdgSnapshot>>,
}

#[async_trait]
impl SdgMetricsRepository for InMemorySdgMetricsRepository {
    async fn insert(&self, snapshot: &SdgSnapshot) -> Result<(), SdgMetricsPersistenceError> {
        guard(&self.snapshots, SdgMetricsPersistenceError::query)?.push(snapshot.clone());
        Ok(())
    }

    async fn latest(&self) -> Result<Option<SdgSnapshot>, SdgMetricsPersistenceError> {
        let snapshots = guard(&self.snapshots, SdgMetricsPersistenceError::query)?;
        Ok(snapshots.iter().max_by_key(|s| s.recorded_at).cloned())
    }
}

/// Advisory model that answers with a fixed reply or fails on demand.
pub struct ScriptedAdvisoryModel {
    reply: Mutex<Result<String, AdvisoryModelError>>,
    calls: Mutex<Vec<AdvisoryRequest>>,
}

impl ScriptedAdvisoryModel {
    pub fn replying(reply: impl Into<String>) -> Self {
        Self {
            reply: Mutex::new(Ok(reply.into())),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Make every subsequent call fail with `error`.
    pub fn fail_with(&self, error: AdvisoryModelError) {
        if let Ok(mut reply) = self.reply.lock() {
            *reply = Err(error);
        }
    }

    /// Requests received so far.
    pub fn calls(&self) -> Vec<AdvisoryRequest> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl AdvisoryModel for ScriptedAdvisoryModel {
    async fn generate(&self, request: &AdvisoryRequest) -> Result<String, AdvisoryModelError> {
        guard(&self.calls, AdvisoryModelError::transport)?.push(request.clone());
        guard(&self.reply, AdvisoryModelError::transport)?.clone()
    }
}

/// Reversible "hash" so tests avoid bcrypt's cost.
#[derive(Default)]
pub struct PlaintextPasswordHasher;

#[async_trait]
impl PasswordHasher for PlaintextPasswordHasher {
    async fn hash(&self, password: &str) -> Result<String, PasswordHashError> {
        Ok(format!("plain:{password}"))
    }

    async fn verify(&self, password: &str, hash: &str) -> Result<bool, PasswordHashError> {
        Ok(hash.strip_prefix("plain:") == Some(password))
    }
}

/// Issues `token-<user id>`.
#[derive(Default)]
pub struct StaticTokenIssuer;

impl TokenIssuer for StaticTokenIssuer {
    fn issue(&self, account: &UserAccount) -> Result<AccessToken, TokenIssueError> {
        Ok(AccessToken::new(format!("token-{}", account.id)))
    }
}

/// Payment gateway that keeps checkouts in memory.
///
/// Signatures are real HMAC-SHA512 digests over [`WEBHOOK_SECRET`] and
/// webhook bodies use the Paystack format.
#[derive(Default)]
pub struct StubPaymentGateway {
    checkouts: Mutex<Vec<CheckoutRequest>>,
    verifications: Mutex<HashMap<String, PaymentVerification>>,
}

impl StubPaymentGateway {
    /// Checkout requests received so far.
    pub fn checkouts(&self) -> Vec<CheckoutRequest> {
        self.checkouts.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Make `verify` report `verification` for its reference.
    pub fn settle(&self, verification: PaymentVerification) {
        if let Ok(mut verifications) = self.verifications.lock() {
            verifications.insert(verification.reference.to_string(), verification);
        }
    }

    /// Signature header value for `payload`.
    pub fn sign(payload: &[u8]) -> String {
        signature::sign(WEBHOOK_SECRET, payload).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for StubPaymentGateway {
    async fn initialize(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        guard(&self.checkouts, PaymentGatewayError::transport)?.push(request.clone());
        Ok(CheckoutSession {
            authorization_url: format!("https://checkout.test/{}", request.reference),
            access_code: format!("access_{}", request.reference),
            reference: request.reference.clone(),
        })
    }

    async fn verify(
        &self,
        reference: &PaymentReference,
    ) -> Result<PaymentVerification, PaymentGatewayError> {
        let verifications = guard(&self.verifications, PaymentGatewayError::transport)?;
        Ok(verifications
            .get(reference.as_ref())
            .cloned()
            .unwrap_or_else(|| PaymentVerification {
                reference: reference.clone(),
                status: PaymentStatus::Pending,
                user_id: None,
                plan: None,
            }))
    }

    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool {
        signature::verify(WEBHOOK_SECRET, payload, signature)
    }

    fn parse_webhook(&self, payload: &[u8]) -> Result<WebhookEvent, PaymentGatewayError> {
        parse_webhook_payload(payload)
    }
}

/// Every in-memory port, shared so tests can inspect state after requests.
#[derive(Clone)]
pub struct TestPorts {
    pub users: Arc<InMemoryUserRepository>,
    pub chats: Arc<InMemoryChatRepository>,
    pub farms: Arc<InMemoryFarmDataRepository>,
    pub consumers: Arc<InMemoryConsumerDataRepository>,
    pub metrics: Arc<InMemorySdgMetricsRepository>,
    pub model: Arc<ScriptedAdvisoryModel>,
    pub gateway: Arc<StubPaymentGateway>,
    pub award_policy: DuplicateAwardPolicy,
}

impl Default for TestPorts {
    fn default() -> Self {
        Self {
            users: Arc::default(),
            chats: Arc::default(),
            farms: Arc::default(),
            consumers: Arc::default(),
            metrics: Arc::default(),
            model: Arc::new(ScriptedAdvisoryModel::replying("Rotate maize with legumes.")),
            gateway: Arc::default(),
            award_policy: DuplicateAwardPolicy::default(),
        }
    }
}

impl TestPorts {
    pub fn with_award_policy(mut self, policy: DuplicateAwardPolicy) -> Self {
        self.award_policy = policy;
        self
    }

    /// Store an account with the given tier and counter.
    pub fn seed_user(&self, email: &str, tier: SubscriptionTier, prompts_used: u32) -> UserAccount {
        let account = UserAccount {
            id: UserId::random(),
            email: Email::new(email).unwrap_or_else(|err| panic!("seed email {email}: {err}")),
            password_hash: "plain:password123".into(),
            tier,
            prompts_used,
            total_points: 0,
            sustainability_score: 0,
            profile: UserProfile {
                region: Some("Lagos".into()),
                ..UserProfile::default()
            },
            subscription_reference: None,
            created_at: Utc::now(),
        };
        if let Err(err) = self.users.insert(account.clone()) {
            panic!("seeding user failed: {err}");
        }
        account
    }

    /// Wire the domain services over these ports.
    pub fn http_state(&self) -> HttpState {
        let users: Arc<dyn UserRepository> = self.users.clone();
        let chats: Arc<dyn ChatRepository> = self.chats.clone();
        let farms: Arc<dyn FarmDataRepository> = self.farms.clone();
        let model: Arc<dyn AdvisoryModel> = self.model.clone();
        HttpState {
            accounts: AccountService::new(
                users.clone(),
                Arc::new(PlaintextPasswordHasher),
                Arc::new(StaticTokenIssuer),
            ),
            chat: ChatService::new(users.clone(), chats.clone(), model.clone()),
            farmers: FarmerService::new(users.clone(), farms.clone(), model),
            consumers: ConsumerService::new(users.clone(), self.consumers.clone()),
            premium: PremiumFeatures::new(
                users.clone(),
                chats.clone(),
                farms.clone(),
                self.award_policy,
            ),
            sdg: SdgCalculator::new(users.clone(), chats, farms, self.metrics.clone()),
            subscriptions: SubscriptionService::new(
                users,
                self.gateway.clone(),
                PlanPricing {
                    premium_minor: 500_000,
                    pro_minor: 1_500_000,
                },
                SubscriptionUrls {
                    callback_url: "http://localhost:8080/api/subscriptions/verify".into(),
                    frontend_url: FRONTEND_URL.into(),
                },
            ),
        }
    }
}
