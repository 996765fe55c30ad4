//! Tests for the subscription service.

use super::*;
use crate::domain::ports::{MockPaymentGateway, MockUserRepository, PaymentGatewayError};
use crate::domain::{Email, ErrorCode, UserAccount, UserProfile};
use chrono::Utc;
use rstest::rstest;

const PRICING: PlanPricing = PlanPricing {
    premium_minor: 500_000,
    pro_minor: 1_500_000,
};

fn urls() -> SubscriptionUrls {
    SubscriptionUrls {
        callback_url: "https://api.example.com/api/subscriptions/verify".into(),
        frontend_url: "https://app.example.com/".into(),
    }
}

fn account(tier: SubscriptionTier, prompts_used: u32) -> UserAccount {
    UserAccount {
        id: UserId::random(),
        email: Email::new("payer@example.com").expect("email"),
        password_hash: "hash".into(),
        tier,
        prompts_used,
        total_points: 0,
        sustainability_score: 0,
        profile: UserProfile::default(),
        subscription_reference: None,
        created_at: Utc::now(),
    }
}

fn reference(raw: &str) -> PaymentReference {
    PaymentReference::parse(raw).expect("reference")
}

fn successful(user_id: &UserId, plan: SubscriptionPlan, raw: &str) -> PaymentVerification {
    PaymentVerification {
        reference: reference(raw),
        status: PaymentStatus::Success,
        user_id: Some(user_id.clone()),
        plan: Some(plan),
    }
}

fn make_service(users: MockUserRepository, gateway: MockPaymentGateway) -> SubscriptionService {
    SubscriptionService::new(Arc::new(users), Arc::new(gateway), PRICING, urls())
}

#[rstest]
#[case(SubscriptionPlan::Premium, 500_000)]
#[case(SubscriptionPlan::Pro, 1_500_000)]
#[tokio::test]
async fn initialize_charges_plan_price(#[case] plan: SubscriptionPlan, #[case] amount: u64) {
    let user = account(SubscriptionTier::Free, 0);
    let id = user.id.clone();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(user)));
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_initialize()
        .withf(move |request| {
            request.amount_minor == amount
                && request.plan == plan
                && request.email.as_ref() == "payer@example.com"
        })
        .return_once(|request| {
            Ok(CheckoutSession {
                authorization_url: "https://checkout.example/abc".into(),
                access_code: "abc".into(),
                reference: request.reference.clone(),
            })
        });

    let session = make_service(users, gateway)
        .initialize(&id, plan)
        .await
        .expect("checkout");
    assert_eq!(session.access_code, "abc");
    assert!(session.reference.as_ref().starts_with("fw_"));
}

#[rstest]
#[case(None)]
#[case(Some("bad-signature"))]
#[tokio::test]
async fn webhook_requires_valid_signature(#[case] signature: Option<&'static str>) {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_verify_signature().returning(|_, _| false);
    gateway.expect_parse_webhook().never();

    let err = make_service(MockUserRepository::new(), gateway)
        .handle_webhook(b"{}", signature)
        .await
        .expect_err("unsigned");
    assert_eq!(err.code(), ErrorCode::Unauthorized);
}

#[tokio::test]
async fn charge_success_webhook_upgrades_tier() {
    let user_id = UserId::random();
    let verification = successful(&user_id, SubscriptionPlan::Pro, "fw_1");
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_verify_signature().returning(|_, _| true);
    gateway
        .expect_parse_webhook()
        .return_once(move |_| Ok(WebhookEvent::ChargeSucceeded(verification)));
    let mut users = MockUserRepository::new();
    users
        .expect_apply_subscription()
        .withf(|_, tier, reference| *tier == SubscriptionTier::Pro && reference == "fw_1")
        .times(1)
        .return_once(|_, _, _| Ok(SubscriptionChange::Applied));

    let outcome = make_service(users, gateway)
        .handle_webhook(b"{}", Some("sig"))
        .await
        .expect("webhook")
        .expect("charge applied");
    assert_eq!(outcome.subscription_tier, Some(SubscriptionTier::Pro));
}

#[tokio::test]
async fn other_webhook_events_are_acknowledged() {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_verify_signature().returning(|_, _| true);
    gateway.expect_parse_webhook().return_once(|_| {
        Ok(WebhookEvent::Ignored {
            event: "transfer.success".into(),
        })
    });
    let mut users = MockUserRepository::new();
    users.expect_apply_subscription().never();

    let outcome = make_service(users, gateway)
        .handle_webhook(b"{}", Some("sig"))
        .await
        .expect("webhook");
    assert!(outcome.is_none());
}

#[tokio::test]
async fn replayed_reference_is_still_reported_as_success() {
    let user_id = UserId::random();
    let verification = successful(&user_id, SubscriptionPlan::Premium, "fw_2");
    let mut gateway = MockPaymentGateway::new();
    gateway
        .expect_verify()
        .return_once(move |_| Ok(verification));
    let mut users = MockUserRepository::new();
    users
        .expect_apply_subscription()
        .return_once(|_, _, _| Ok(SubscriptionChange::AlreadyApplied));

    let outcome = make_service(users, gateway)
        .verify(&reference("fw_2"))
        .await
        .expect("verify");
    assert_eq!(outcome.status, PaymentStatus::Success);
    assert_eq!(outcome.subscription_tier, Some(SubscriptionTier::Premium));
}

#[tokio::test]
async fn unsuccessful_payment_changes_nothing() {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_verify().return_once(|reference| {
        Ok(PaymentVerification {
            reference: reference.clone(),
            status: PaymentStatus::Abandoned,
            user_id: None,
            plan: None,
        })
    });
    let mut users = MockUserRepository::new();
    users.expect_apply_subscription().never();

    let outcome = make_service(users, gateway)
        .verify(&reference("fw_3"))
        .await
        .expect("verify");
    assert_eq!(outcome.status, PaymentStatus::Abandoned);
    assert_eq!(outcome.subscription_tier, None);
}

#[tokio::test]
async fn success_without_metadata_is_rejected() {
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_verify().return_once(|reference| {
        Ok(PaymentVerification {
            reference: reference.clone(),
            status: PaymentStatus::Success,
            user_id: None,
            plan: Some(SubscriptionPlan::Pro),
        })
    });

    let err = make_service(MockUserRepository::new(), gateway)
        .verify(&reference("fw_4"))
        .await
        .expect_err("missing metadata");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[rstest]
#[case(true, "https://app.example.com/dashboard?payment=success&reference=fw_5")]
#[case(false, "https://app.example.com/pricing?payment=failed&reference=fw_5")]
#[tokio::test]
async fn redirect_reflects_verification(#[case] gateway_ok: bool, #[case] expected: &str) {
    let user_id = UserId::random();
    let verification = successful(&user_id, SubscriptionPlan::Premium, "fw_5");
    let mut gateway = MockPaymentGateway::new();
    gateway.expect_verify().return_once(move |_| {
        if gateway_ok {
            Ok(verification)
        } else {
            Err(PaymentGatewayError::transport("connection reset"))
        }
    });
    let mut users = MockUserRepository::new();
    users
        .expect_apply_subscription()
        .returning(|_, _, _| Ok(SubscriptionChange::Applied));

    let url = make_service(users, gateway)
        .verification_redirect(&reference("fw_5"))
        .await;
    assert_eq!(url, expected);
}

#[rstest]
#[case(SubscriptionTier::Free, 3, Some(2))]
#[case(SubscriptionTier::Free, 9, Some(0))]
#[case(SubscriptionTier::Pro, 9, None)]
#[tokio::test]
async fn status_reports_remaining_free_prompts(
    #[case] tier: SubscriptionTier,
    #[case] used: u32,
    #[case] remaining: Option<u32>,
) {
    let user = account(tier, used);
    let id = user.id.clone();
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(user)));

    let status = make_service(users, MockPaymentGateway::new())
        .status(&id)
        .await
        .expect("status");
    assert_eq!(status.subscription_tier, tier);
    assert_eq!(status.prompts_remaining, remaining);
}
