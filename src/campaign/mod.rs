use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::typedid::{TypedId, TypedIdMarker};

pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type CampaignId = TypedId<Campaign>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Campaign {
    #[serde(rename = "_id")]
    pub id: CampaignId,
    pub name: String,
    pub issue_amount: i64,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub issued_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub expires_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl TypedIdMarker for Campaign {
    fn tag() -> &'static str {
        "CPN"
    }
}

/// The campaign metadata as it is cached at `campaign:{id}:data`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct CampaignData {
    pub id: CampaignId,
    pub name: String,
    pub issue_amount: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl From<&Campaign> for CampaignData {
    fn from(campaign: &Campaign) -> CampaignData {
        CampaignData {
            id: campaign.id,
            name: campaign.name.clone(),
            issue_amount: campaign.issue_amount,
            issued_at: campaign.issued_at,
            expires_at: campaign.expires_at,
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        }
    }
}
