//! Services module
//!
//! Business logic services that coordinate between the HTTP layer, the
//! repository and the external collaborators.

pub mod billing;
pub mod checkout;
pub mod generation;
pub mod logos;
pub mod profiles;

pub use billing::{BillingService, WebhookOutcome};
pub use checkout::{CheckoutLink, CheckoutRequest, CheckoutService, PackPrices};
pub use generation::{GenerateRequest, GenerationReport, GenerationService, ImageOutcome};
pub use logos::{LogoDetail, LogoView, LogosService, SaveReceipt, SaveRequest, UserLogos};
pub use profiles::ProfilesService;
