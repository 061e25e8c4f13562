// SPDX-License-Identifier: MIT

//! Agent development kit: language-model abstractions shared by the onboarding layer.

pub mod error;
pub mod model;
