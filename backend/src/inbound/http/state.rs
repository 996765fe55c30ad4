//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services (which in turn depend on ports) and remain
//! testable without I/O.

use crate::domain::{
    AccountService, ChatService, ConsumerService, FarmerService, PremiumFeatures, SdgCalculator,
    SubscriptionService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Registration and login.
    pub accounts: AccountService,
    pub chat: ChatService,
    pub farmers: FarmerService,
    pub consumers: ConsumerService,
    pub premium: PremiumFeatures,
    /// SDG snapshots for the public dashboard.
    pub sdg: SdgCalculator,
    pub subscriptions: SubscriptionService,
}
