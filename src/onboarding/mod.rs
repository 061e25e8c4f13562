// SPDX-License-Identifier: MIT

//! Business onboarding: four categories collected in a fixed order
//!
//! The [`supervisor::Supervisor`] drives each turn through a
//! [`agent::DomainAgent`], which extracts, merges and validates one
//! category's fields. Sessions persist through a [`store::SessionStore`].

pub mod agent;
pub mod category;
pub mod config;
pub mod error;
pub mod events;
pub mod extract;
pub mod schema;
pub mod server;
pub mod session;
pub mod store;
pub mod supervisor;
pub mod validation;
pub mod validators;
pub mod verify;

pub use category::Category;
pub use config::OnboardingConfig;
pub use error::OnboardingError;
pub use session::{Session, SessionSummary, Status, TurnResult};
pub use supervisor::Supervisor;
