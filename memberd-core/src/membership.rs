//! Membership wire model
//!
//! Field names follow the JSON contract of the upstream publishers:
//! camelCase throughout, except the historical `roleuuid` key on role
//! associations.

use serde::{Deserialize, Serialize};

/// A person holding a role at an organisation, with optional date bounds
/// and alternative identifiers.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Membership {
    pub uuid: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pref_label: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,

    pub person_uuid: String,

    pub organisation_uuid: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub membership_roles: Vec<MembershipRole>,

    pub alternative_identifiers: AlternativeIdentifiers,
}

/// One role association. Dates live on the HAS_ROLE edge in the graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MembershipRole {
    #[serde(rename = "roleuuid")]
    pub role_uuid: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inception_date: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub termination_date: Option<String>,
}

/// External-system identifiers attached to a membership: at most one
/// Factset value plus any number of other identifier values.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AlternativeIdentifiers {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub factset_identifier: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub uuids: Vec<String>,
}
