// SPDX-License-Identifier: MIT

//! Static category schemas
//!
//! Each category owns an ordered list of fields. A field carries the
//! validator to apply, whether it is mandatory for completion, the labels a
//! user might write it under, and a short semantic hint for extractors.

use super::category::Category;
use super::validators::FieldKind;
use serde::Serialize;

/// Definition of a single field within a category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    /// Lower-case labels that identify this field in free text
    #[serde(skip)]
    pub aliases: &'static [&'static str],
    pub hint: &'static str,
}

/// Ordered field set for one category
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CategorySchema {
    pub category: Category,
    pub fields: &'static [FieldSpec],
}

impl CategorySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &'static FieldSpec> {
        self.fields.iter().filter(|f| f.required)
    }
}

const SIGNUP_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "name",
        kind: FieldKind::Text,
        required: true,
        aliases: &["name", "full name", "your name"],
        hint: "full name of the person signing up",
    },
    FieldSpec {
        name: "email",
        kind: FieldKind::Email,
        required: true,
        aliases: &["email", "e-mail", "email address", "mail"],
        hint: "email address",
    },
    FieldSpec {
        name: "phone",
        kind: FieldKind::Phone,
        required: true,
        aliases: &["phone", "phone number", "mobile", "mobile number", "contact number"],
        hint: "phone number, 7 to 15 digits",
    },
];

const COMPANY_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "company_name",
        kind: FieldKind::Text,
        required: true,
        aliases: &[
            "company",
            "company name",
            "business",
            "business name",
            "organization",
            "organisation",
        ],
        hint: "registered name of the company",
    },
    FieldSpec {
        name: "gst",
        kind: FieldKind::Gst,
        required: true,
        aliases: &["gst", "gstin", "gst number", "gst no"],
        hint: "15-character GST identification number",
    },
];

// GST is optional here: the company stage already demands it.
const KYC_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "pan",
        kind: FieldKind::Pan,
        required: true,
        aliases: &["pan", "pan number", "pan no", "pan card"],
        hint: "10-character PAN: 5 letters, 4 digits, 1 letter",
    },
    FieldSpec {
        name: "aadhar",
        kind: FieldKind::Aadhar,
        required: true,
        aliases: &[
            "aadhar",
            "aadhaar",
            "aadhar number",
            "aadhaar number",
            "aadhar no",
            "aadhaar no",
        ],
        hint: "12-digit Aadhar number",
    },
    FieldSpec {
        name: "gst",
        kind: FieldKind::Gst,
        required: false,
        aliases: &["gst", "gstin", "gst number", "gst no"],
        hint: "15-character GST identification number, if not given earlier",
    },
];

const BANK_FIELDS: &[FieldSpec] = &[
    FieldSpec {
        name: "bank_name",
        kind: FieldKind::Text,
        required: true,
        aliases: &["bank", "bank name"],
        hint: "name of the bank",
    },
    FieldSpec {
        name: "account_number",
        kind: FieldKind::AccountNumber,
        required: true,
        aliases: &[
            "account",
            "account number",
            "account no",
            "acc no",
            "a/c",
            "a/c no",
            "bank account",
        ],
        hint: "bank account number, 9 to 18 digits",
    },
    FieldSpec {
        name: "ifsc",
        kind: FieldKind::Ifsc,
        required: true,
        aliases: &["ifsc", "ifsc code"],
        hint: "11-character IFSC code: 4 letters, a zero, 6 digits",
    },
];

static SCHEMAS: [CategorySchema; 4] = [
    CategorySchema {
        category: Category::Signup,
        fields: SIGNUP_FIELDS,
    },
    CategorySchema {
        category: Category::Company,
        fields: COMPANY_FIELDS,
    },
    CategorySchema {
        category: Category::Kyc,
        fields: KYC_FIELDS,
    },
    CategorySchema {
        category: Category::Bank,
        fields: BANK_FIELDS,
    },
];

/// The schema for a category
pub fn schema_for(category: Category) -> &'static CategorySchema {
    match category {
        Category::Signup => &SCHEMAS[0],
        Category::Company => &SCHEMAS[1],
        Category::Kyc => &SCHEMAS[2],
        Category::Bank => &SCHEMAS[3],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_categories_line_up() {
        for c in Category::ORDER {
            assert_eq!(schema_for(c).category, c);
        }
    }

    #[test]
    fn test_required_fields() {
        let names = |c| {
            schema_for(c)
                .required_fields()
                .map(|f| f.name)
                .collect::<Vec<_>>()
        };
        assert_eq!(names(Category::Signup), vec!["name", "email", "phone"]);
        assert_eq!(names(Category::Company), vec!["company_name", "gst"]);
        assert_eq!(names(Category::Kyc), vec!["pan", "aadhar"]);
        assert_eq!(
            names(Category::Bank),
            vec!["bank_name", "account_number", "ifsc"]
        );
    }

    #[test]
    fn test_kyc_gst_is_optional() {
        let gst = schema_for(Category::Kyc).field("gst").unwrap();
        assert!(!gst.required);
        assert_eq!(gst.kind, FieldKind::Gst);
    }

    #[test]
    fn test_aliases_are_lowercase() {
        for c in Category::ORDER {
            for f in schema_for(c).fields {
                for a in f.aliases {
                    assert_eq!(*a, a.to_lowercase());
                }
            }
        }
    }
}
