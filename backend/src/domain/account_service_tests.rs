//! Tests for the account service.

use super::*;
use crate::domain::ports::{
    MockPasswordHasher, MockTokenIssuer, MockUserRepository, UserPersistenceError,
};
use crate::domain::{Email, ErrorCode, SubscriptionTier, UserProfile};
use chrono::Utc;
use rstest::rstest;

fn stored_account(email: &str) -> UserAccount {
    UserAccount {
        id: UserId::random(),
        email: Email::new(email).expect("email"),
        password_hash: "stored-hash".into(),
        tier: SubscriptionTier::Free,
        prompts_used: 2,
        total_points: 0,
        sustainability_score: 0,
        profile: UserProfile::default(),
        subscription_reference: None,
        created_at: Utc::now(),
    }
}

fn make_service(
    users: MockUserRepository,
    hasher: MockPasswordHasher,
    tokens: MockTokenIssuer,
) -> AccountService {
    AccountService::new(Arc::new(users), Arc::new(hasher), Arc::new(tokens))
}

fn registration() -> Registration {
    Registration::try_new("New@Farm.org", "secret1", UserProfile::default()).expect("valid")
}

#[tokio::test]
async fn register_hashes_password_and_creates_account() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().times(1).return_once(|_| Ok(None));
    users
        .expect_create()
        .withf(|account| {
            account.email.as_ref() == "new@farm.org" && account.password_hash == "hashed"
        })
        .times(1)
        .returning(|account| Ok(account.clone().into_account(Utc::now())));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_hash()
        .withf(|password| password == "secret1")
        .return_once(|_| Ok("hashed".into()));

    let service = make_service(users, hasher, MockTokenIssuer::new());
    let account = service.register(&registration()).await.expect("registered");

    assert_eq!(account.email.as_ref(), "new@farm.org");
    assert_eq!(account.tier, SubscriptionTier::Free);
    assert_eq!(account.prompts_used, 0);
}

#[tokio::test]
async fn register_rejects_existing_email() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(|email| Ok(Some(stored_account(email.as_ref()))));
    users.expect_create().never();

    let service = make_service(users, MockPasswordHasher::new(), MockTokenIssuer::new());
    let err = service
        .register(&registration())
        .await
        .expect_err("duplicate email");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "User already exists");
}

#[tokio::test]
async fn register_maps_insert_race_to_duplicate_error() {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().return_once(|_| Ok(None));
    users
        .expect_create()
        .return_once(|_| Err(UserPersistenceError::duplicate_email("new@farm.org")));
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_hash().return_once(|_| Ok("hashed".into()));

    let service = make_service(users, hasher, MockTokenIssuer::new());
    let err = service.register(&registration()).await.expect_err("race");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn login_issues_token_for_valid_credentials() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(|email| Ok(Some(stored_account(email.as_ref()))));
    let mut hasher = MockPasswordHasher::new();
    hasher
        .expect_verify()
        .withf(|password, hash| password == "secret1" && hash == "stored-hash")
        .return_once(|_, _| Ok(true));
    let mut tokens = MockTokenIssuer::new();
    tokens
        .expect_issue()
        .return_once(|_| Ok(AccessToken::new("jwt")));

    let service = make_service(users, hasher, tokens);
    let creds = LoginCredentials::try_from_parts("grower@example.com", "secret1").expect("creds");
    let session = service.login(&creds).await.expect("login");

    assert_eq!(session.token.as_ref(), "jwt");
    assert_eq!(session.user.email.as_ref(), "grower@example.com");
}

#[rstest]
#[case(true)]
#[case(false)]
#[tokio::test]
async fn login_failures_are_indistinguishable(#[case] known_email: bool) {
    let mut users = MockUserRepository::new();
    users.expect_find_by_email().return_once(move |email| {
        Ok(known_email.then(|| stored_account(email.as_ref())))
    });
    let mut hasher = MockPasswordHasher::new();
    hasher.expect_verify().returning(|_, _| Ok(false));
    let mut tokens = MockTokenIssuer::new();
    tokens.expect_issue().never();

    let service = make_service(users, hasher, tokens);
    let creds = LoginCredentials::try_from_parts("grower@example.com", "wrong").expect("creds");
    let err = service.login(&creds).await.expect_err("bad credentials");

    assert_eq!(err.code(), ErrorCode::Unauthorized);
    assert_eq!(err.message(), INVALID_CREDENTIALS);
}

#[tokio::test]
async fn login_surfaces_repository_outage() {
    let mut users = MockUserRepository::new();
    users
        .expect_find_by_email()
        .return_once(|_| Err(UserPersistenceError::connection("pool exhausted")));

    let service = make_service(users, MockPasswordHasher::new(), MockTokenIssuer::new());
    let creds = LoginCredentials::try_from_parts("grower@example.com", "pw").expect("creds");
    let err = service.login(&creds).await.expect_err("outage");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}
