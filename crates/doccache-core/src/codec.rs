//! # Name & Type Codec
//!
//! Pure rules that turn raw on-chain labels and primitive types into induced
//! GraphQL names, scalars and search indexes.
//!
//! | primitive   | scalar   | index  | suffix |
//! |-------------|----------|--------|--------|
//! | asset       | String   | term   | a      |
//! | checksum256 | String   | exact  | c      |
//! | int64       | Int64    | int64  | i      |
//! | name        | String   | exact  | n      |
//! | time_point  | DateTime | hour   | t      |
//! | string      | String   | regexp | s      |

use crate::content::ContentType;
use crate::primitives::CORE_EDGE_SUFFIX;
use serde_json::Value as Json;
use std::fmt;

// =============================================================================
// GRAPHQL SCALARS & INDEXES
// =============================================================================

/// GraphQL scalar types used by induced fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GqlScalar {
    String,
    Int64,
    DateTime,
}

impl GqlScalar {
    /// SDL spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::String => "String",
            Self::Int64 => "Int64",
            Self::DateTime => "DateTime",
        }
    }

    /// Parse an SDL scalar name; `None` for object types.
    #[must_use]
    pub fn from_sdl(s: &str) -> Option<Self> {
        match s {
            "String" | "ID" => Some(Self::String),
            "Int64" => Some(Self::Int64),
            "DateTime" => Some(Self::DateTime),
            _ => None,
        }
    }
}

impl fmt::Display for GqlScalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Search index attached to a scalar field (`@search(by: [..])`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SearchIndex {
    Term,
    Exact,
    Int64,
    Hour,
    Regexp,
}

impl SearchIndex {
    /// SDL spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Term => "term",
            Self::Exact => "exact",
            Self::Int64 => "int64",
            Self::Hour => "hour",
            Self::Regexp => "regexp",
        }
    }

    /// Parse an SDL index name.
    #[must_use]
    pub fn from_sdl(s: &str) -> Option<Self> {
        match s {
            "term" => Some(Self::Term),
            "exact" => Some(Self::Exact),
            "int64" => Some(Self::Int64),
            "hour" => Some(Self::Hour),
            "regexp" => Some(Self::Regexp),
            _ => None,
        }
    }
}

// =============================================================================
// PRIMITIVE TYPE MAPPING
// =============================================================================

/// GraphQL scalar of a primitive content type.
#[must_use]
pub const fn gql_scalar(t: ContentType) -> GqlScalar {
    match t {
        ContentType::Int64 => GqlScalar::Int64,
        ContentType::TimePoint => GqlScalar::DateTime,
        _ => GqlScalar::String,
    }
}

/// Search index of a primitive content type.
#[must_use]
pub const fn index(t: ContentType) -> SearchIndex {
    match t {
        ContentType::Asset => SearchIndex::Term,
        ContentType::Checksum256 | ContentType::Name => SearchIndex::Exact,
        ContentType::Int64 => SearchIndex::Int64,
        ContentType::TimePoint => SearchIndex::Hour,
        ContentType::String => SearchIndex::Regexp,
    }
}

/// Name suffix of a primitive content type.
#[must_use]
pub const fn suffix(t: ContentType) -> &'static str {
    match t {
        ContentType::Asset => "a",
        ContentType::Checksum256 => "c",
        ContentType::Int64 => "i",
        ContentType::Name => "n",
        ContentType::TimePoint => "t",
        ContentType::String => "s",
    }
}

// =============================================================================
// NAMES
// =============================================================================

/// Induced field name: `camel(group) _ camel(label) _ suffix`.
#[must_use]
pub fn field_name(group_label: &str, content_label: &str, t: ContentType) -> String {
    format!("{}_{}_{}", camel(group_label), camel(content_label), suffix(t))
}

/// Induced type name of a `system.type` value.
#[must_use]
pub fn type_name(raw: &str) -> String {
    words(raw).map(capitalize).collect()
}

/// Name of the core edge paired with a checksum field.
#[must_use]
pub fn core_edge_name(checksum_field: &str) -> String {
    format!("{checksum_field}{CORE_EDGE_SUFFIX}")
}

/// GraphQL field name of a chain edge (`start.period` → `startPeriod`).
#[must_use]
pub fn edge_field_name(raw: &str) -> String {
    camel(raw)
}

/// lowerCamelCase over `_ . - ` separated words.
#[must_use]
pub fn camel(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for (i, word) in words(raw).enumerate() {
        if i == 0 {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_lowercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

fn words(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

// =============================================================================
// RAW VALUE DECODING
// =============================================================================

/// Decode an int64 that may arrive as a JSON number or a string.
#[must_use]
pub fn parse_int64(raw: &Json) -> Option<i64> {
    match raw {
        Json::Number(n) => n.as_i64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Decode an unsigned id that may arrive as a JSON number or a string.
#[must_use]
pub fn parse_u64(raw: &Json) -> Option<u64> {
    match raw {
        Json::Number(n) => n.as_u64(),
        Json::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Append `Z` to a timestamp that carries no zone.
#[must_use]
pub fn normalize_time_point(raw: &str) -> String {
    let time = raw.find('T').map_or("", |t| &raw[t..]);
    let zoned = raw.ends_with('Z') || raw.ends_with('z') || time.contains(['+', '-']);
    if zoned {
        raw.to_string()
    } else {
        format!("{raw}Z")
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn field_names_follow_table() {
        assert_eq!(field_name("details", "number", ContentType::Int64), "details_number_i");
        assert_eq!(
            field_name("details", "start_period", ContentType::Checksum256),
            "details_startPeriod_c"
        );
        assert_eq!(field_name("ballot", "expiration", ContentType::TimePoint), "ballot_expiration_t");
        assert_eq!(field_name("details", "title", ContentType::String), "details_title_s");
        assert_eq!(field_name("details", "reward", ContentType::Asset), "details_reward_a");
        assert_eq!(field_name("details", "name", ContentType::Name), "details_name_n");
    }

    #[test]
    fn scalars_and_indexes() {
        assert_eq!(gql_scalar(ContentType::Int64), GqlScalar::Int64);
        assert_eq!(gql_scalar(ContentType::TimePoint), GqlScalar::DateTime);
        assert_eq!(gql_scalar(ContentType::Asset), GqlScalar::String);
        assert_eq!(index(ContentType::Asset), SearchIndex::Term);
        assert_eq!(index(ContentType::String), SearchIndex::Regexp);
        assert_eq!(index(ContentType::Int64), SearchIndex::Int64);
    }

    #[test]
    fn type_names_are_pascal_case() {
        assert_eq!(type_name("period"), "Period");
        assert_eq!(type_name("dho"), "Dho");
        assert_eq!(type_name("assignment_payout"), "AssignmentPayout");
        assert_eq!(type_name("vote.tally"), "VoteTally");
    }

    #[test]
    fn camel_keeps_inner_case() {
        assert_eq!(camel("startPeriod"), "startPeriod");
        assert_eq!(camel("Start_period"), "startPeriod");
        assert_eq!(edge_field_name("start.period"), "startPeriod");
    }

    #[test]
    fn core_edge_names() {
        assert_eq!(core_edge_name("details_startPeriod_c"), "details_startPeriod_c_edge");
    }

    #[test]
    fn time_points_gain_zone() {
        assert_eq!(normalize_time_point("2021-04-12T05:09:36.500"), "2021-04-12T05:09:36.500Z");
        assert_eq!(normalize_time_point("2021-04-12T05:09:36Z"), "2021-04-12T05:09:36Z");
        assert_eq!(
            normalize_time_point("2021-04-12T05:09:36+02:00"),
            "2021-04-12T05:09:36+02:00"
        );
    }

    #[test]
    fn int64_decoding() {
        assert_eq!(parse_int64(&json!(12)), Some(12));
        assert_eq!(parse_int64(&json!("-3")), Some(-3));
        assert_eq!(parse_int64(&json!("9223372036854775808")), None);
        assert_eq!(parse_int64(&json!(true)), None);
    }
}
