// SPDX-License-Identifier: MIT

//! The four onboarding categories and their fixed processing order

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One of the four onboarding domains
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Signup,
    Company,
    Kyc,
    Bank,
}

impl Category {
    /// Processing order. The supervisor always works on the first incomplete entry.
    pub const ORDER: [Category; 4] = [
        Category::Signup,
        Category::Company,
        Category::Kyc,
        Category::Bank,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Signup => "signup",
            Category::Company => "company",
            Category::Kyc => "kyc",
            Category::Bank => "bank",
        }
    }

    /// Human-readable label used in guidance messages
    pub fn label(&self) -> &'static str {
        match self {
            Category::Signup => "signup",
            Category::Company => "company details",
            Category::Kyc => "KYC details",
            Category::Bank => "bank details",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signup" => Ok(Category::Signup),
            "company" => Ok(Category::Company),
            "kyc" => Ok(Category::Kyc),
            "bank" => Ok(Category::Bank),
            other => Err(format!("unknown category: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order() {
        assert_eq!(
            Category::ORDER,
            [Category::Signup, Category::Company, Category::Kyc, Category::Bank]
        );
    }

    #[test]
    fn test_round_trip_names() {
        for c in Category::ORDER {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("payroll".parse::<Category>().is_err());
        assert_eq!(" KYC ".parse::<Category>().unwrap(), Category::Kyc);
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(serde_json::to_string(&Category::Kyc).unwrap(), "\"kyc\"");
    }
}
