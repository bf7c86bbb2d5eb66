use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use crate::error::{ClientError, Result};

pub const MIN_RATING: u8 = 1;
pub const MAX_RATING: u8 = 5;

#[derive(Clone, Copy, Serialize, Deserialize, clap::ValueEnum, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReviewTarget {
    Restaurant,
    Food,
}

impl ReviewTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewTarget::Restaurant => "restaurant",
            ReviewTarget::Food => "food",
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Review {
    pub id: String,
    #[serde(alias = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub username: String,
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        serialize_with = "time::serde::rfc3339::option::serialize"
    )]
    pub timestamp: Option<OffsetDateTime>,
    #[serde(default, alias = "avatarColor")]
    pub avatar_color: Option<String>,
    #[serde(default, alias = "avatarUrl")]
    pub avatar_url: Option<String>,
}

/// RFC 3339, or an ISO date-time without offset read as UTC. Anything else is `None`.
fn lenient_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<OffsetDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(deserializer)?;
    Ok(raw.as_ref().and_then(Value::as_str).and_then(parse_timestamp))
}

fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(ts) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(ts);
    }
    let with_t = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second][optional [.[subsecond]]]");
    let with_space = format_description!("[year]-[month]-[day] [hour]:[minute]:[second][optional [.[subsecond]]]");
    PrimitiveDateTime::parse(raw, with_t)
        .or_else(|_| PrimitiveDateTime::parse(raw, with_space))
        .ok()
        .map(PrimitiveDateTime::assume_utc)
}

impl Review {
    pub fn is_owned_by(&self, user_id: &str) -> bool {
        self.user_id == user_id
    }
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NewReview {
    pub target_id: String,
    pub target_type: ReviewTarget,
    pub rating: u8,
    pub comment: String,
}

impl NewReview {
    pub fn validate(&self) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(ClientError::validation(format!(
                "Please pick a rating between {} and {} stars",
                MIN_RATING, MAX_RATING
            )));
        }
        if self.target_id.trim().is_empty() {
            return Err(ClientError::validation("Missing review target"));
        }
        Ok(())
    }
}

/// Answer to a created review; the aggregate is always recomputed by the backend.
#[derive(Deserialize, Clone, Debug)]
pub struct CreatedReview {
    pub review: Review,
    pub current_rating: f64,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DeletedReview {
    pub current_rating: f64,
}

/// Reviews that decoded cleanly, plus the aggregate when the backend sent one.
#[derive(Clone, Debug, Default)]
pub struct ReviewListing {
    pub reviews: Vec<Review>,
    pub current_rating: Option<f64>,
}
