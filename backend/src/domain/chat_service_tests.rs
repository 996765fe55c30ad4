//! Tests for the chat service.

use super::*;
use crate::domain::ports::{
    AdvisoryModelError, ChatPersistenceError, MockAdvisoryModel, MockChatRepository,
    MockUserRepository, UserPersistenceError,
};
use crate::domain::{Email, ErrorCode, UserAccount, UserProfile};
use rstest::rstest;

fn account(tier: SubscriptionTier, prompts_used: u32) -> UserAccount {
    UserAccount {
        id: UserId::random(),
        email: Email::new("grower@example.com").expect("email"),
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

fn prompt(user_id: &UserId, language: &str) -> ChatPrompt {
    ChatPrompt::try_new(
        user_id.clone(),
        SessionId::new("session-1").expect("session"),
        "How do I control aphids?",
        Language::new(language),
    )
    .expect("valid prompt")
}

fn users_with(user: UserAccount) -> MockUserRepository {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_id()
        .returning(move |_| Ok(Some(user.clone())));
    users
}

fn make_service(
    users: MockUserRepository,
    chats: MockChatRepository,
    model: MockAdvisoryModel,
) -> ChatService {
    ChatService::new(Arc::new(users), Arc::new(chats), Arc::new(model))
}

#[tokio::test]
async fn send_reserves_prompt_and_records_exchange() {
    let user = account(SubscriptionTier::Free, 2);
    let id = user.id.clone();
    let mut users = users_with(user);
    users
        .expect_reserve_prompt()
        .withf(|_, limit| *limit == FREE_PROMPT_LIMIT)
        .times(1)
        .return_once(|_, _| {
            Ok(PromptReservation::Reserved {
                prompts_used: 3,
                tier: SubscriptionTier::Free,
            })
        });
    users.expect_release_prompt().never();
    let mut model = MockAdvisoryModel::new();
    model
        .expect_generate()
        .withf(|request| request.prompt == "How do I control aphids?")
        .return_once(|_| Ok("Use neem oil.".into()));
    let mut chats = MockChatRepository::new();
    chats
        .expect_append()
        .withf(|record| record.response == "Use neem oil." && record.session_id.as_ref() == "session-1")
        .times(1)
        .return_once(|_| Ok(()));

    let service = make_service(users, chats, model);
    let reply = service.send(prompt(&id, "english")).await.expect("reply");

    assert_eq!(reply.reply, "Use neem oil.");
    assert_eq!(reply.prompts_used, 3);
    assert_eq!(reply.subscription_tier, SubscriptionTier::Free);
    assert_eq!(reply.language.as_ref(), "english");
}

#[rstest]
#[case(0)]
#[case(6)]
#[tokio::test]
async fn free_tier_cannot_use_other_languages(#[case] prompts_used: u32) {
    let user = account(SubscriptionTier::Free, prompts_used);
    let id = user.id.clone();
    let mut users = users_with(user);
    users.expect_reserve_prompt().never();

    let service = make_service(users, MockChatRepository::new(), MockAdvisoryModel::new());
    let err = service
        .send(prompt(&id, "spanish"))
        .await
        .expect_err("language gated");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(err.upgrade_required());
}

#[tokio::test]
async fn paid_tier_may_use_other_languages() {
    let user = account(SubscriptionTier::Premium, 40);
    let id = user.id.clone();
    let mut users = users_with(user);
    users.expect_reserve_prompt().return_once(|_, _| {
        Ok(PromptReservation::Reserved {
            prompts_used: 41,
            tier: SubscriptionTier::Premium,
        })
    });
    let mut model = MockAdvisoryModel::new();
    model
        .expect_generate()
        .withf(|request| request.language.as_ref() == "swahili")
        .return_once(|_| Ok("Jibu".into()));
    let mut chats = MockChatRepository::new();
    chats.expect_append().return_once(|_| Ok(()));

    let service = make_service(users, chats, model);
    let reply = service.send(prompt(&id, "Swahili")).await.expect("reply");
    assert_eq!(reply.prompts_used, 41);
    assert_eq!(reply.language.as_ref(), "swahili");
}

#[tokio::test]
async fn exhausted_quota_is_refused_without_calling_model() {
    let user = account(SubscriptionTier::Free, 6);
    let id = user.id.clone();
    let mut users = users_with(user);
    users
        .expect_reserve_prompt()
        .return_once(|_, _| Ok(PromptReservation::LimitReached { prompts_used: 6 }));
    let mut model = MockAdvisoryModel::new();
    model.expect_generate().never();
    let mut chats = MockChatRepository::new();
    chats.expect_append().never();

    let service = make_service(users, chats, model);
    let err = service.send(prompt(&id, "english")).await.expect_err("limit");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(err.upgrade_required());
}

#[tokio::test]
async fn model_failure_refunds_the_prompt() {
    let user = account(SubscriptionTier::Free, 1);
    let id = user.id.clone();
    let mut users = users_with(user);
    users.expect_reserve_prompt().return_once(|_, _| {
        Ok(PromptReservation::Reserved {
            prompts_used: 2,
            tier: SubscriptionTier::Free,
        })
    });
    users.expect_release_prompt().times(1).return_once(|_| Ok(()));
    let mut model = MockAdvisoryModel::new();
    model
        .expect_generate()
        .return_once(|_| Err(AdvisoryModelError::upstream(503_u16, "overloaded")));
    let mut chats = MockChatRepository::new();
    chats.expect_append().never();

    let service = make_service(users, chats, model);
    let err = service.send(prompt(&id, "english")).await.expect_err("model down");

    assert_eq!(err.code(), ErrorCode::UpstreamFailure);
    assert!(err.message().contains("overloaded"));
}

#[rstest]
#[case(ChatPersistenceError::query("insert failed"), ErrorCode::InternalError)]
#[case(ChatPersistenceError::connection("pool timed out"), ErrorCode::ServiceUnavailable)]
#[tokio::test]
async fn unstored_exchange_refunds_the_prompt(
    #[case] failure: ChatPersistenceError,
    #[case] expected: ErrorCode,
) {
    let user = account(SubscriptionTier::Free, 4);
    let id = user.id.clone();
    let mut users = users_with(user);
    users.expect_reserve_prompt().times(1).return_once(|_, _| {
        Ok(PromptReservation::Reserved {
            prompts_used: 5,
            tier: SubscriptionTier::Free,
        })
    });
    let refunded = id.clone();
    users
        .expect_release_prompt()
        .withf(move |user_id| *user_id == refunded)
        .times(1)
        .return_once(|_| Ok(()));
    let mut model = MockAdvisoryModel::new();
    model
        .expect_generate()
        .times(1)
        .return_once(|_| Ok("Use neem oil.".into()));
    let mut chats = MockChatRepository::new();
    chats.expect_append().times(1).return_once(move |_| Err(failure));

    let service = make_service(users, chats, model);
    let err = service.send(prompt(&id, "english")).await.expect_err("not stored");

    assert_eq!(err.code(), expected);
}

#[tokio::test]
async fn failed_refund_still_reports_the_original_error() {
    let user = account(SubscriptionTier::Free, 0);
    let id = user.id.clone();
    let mut users = users_with(user);
    users.expect_reserve_prompt().return_once(|_, _| {
        Ok(PromptReservation::Reserved {
            prompts_used: 1,
            tier: SubscriptionTier::Free,
        })
    });
    users
        .expect_release_prompt()
        .times(1)
        .return_once(|_| Err(UserPersistenceError::connection("database offline")));
    let mut model = MockAdvisoryModel::new();
    model.expect_generate().return_once(|_| Ok("Mulch.".into()));
    let mut chats = MockChatRepository::new();
    chats
        .expect_append()
        .return_once(|_| Err(ChatPersistenceError::query("insert failed")));

    let service = make_service(users, chats, model);
    let err = service.send(prompt(&id, "english")).await.expect_err("not stored");

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "insert failed");
}

#[tokio::test]
async fn unknown_user_is_not_found() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_id().return_once(|_| Ok(None));

    let service = make_service(users, MockChatRepository::new(), MockAdvisoryModel::new());
    let err = service
        .send(prompt(&UserId::random(), "english"))
        .await
        .expect_err("missing user");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
