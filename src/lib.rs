// SPDX-License-Identifier: MIT

//! onboard-rs: a resumable, validated business-onboarding state machine.
//!
//! - [`adk`] - model plumbing used by the model-backed extractor
//! - [`onboarding`] - categories, validation, agents, session store and supervisor

pub mod adk;
pub mod onboarding;
