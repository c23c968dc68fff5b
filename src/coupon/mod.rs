use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::campaign::CampaignId;
use crate::typedid::{TypedId, TypedIdMarker};

pub mod code;
pub mod db;
pub mod endpoints;
pub mod manager;
pub use endpoints::*;

pub type IssuedCouponId = TypedId<IssuedCoupon>;

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IssuedCoupon {
    #[serde(rename = "_id")]
    pub id: IssuedCouponId,
    pub campaign_id: CampaignId,
    pub code: String,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    pub modified_at: DateTime<Utc>,
}

impl IssuedCoupon {
    pub fn new(campaign_id: CampaignId, code: String, created_at: DateTime<Utc>) -> IssuedCoupon {
        IssuedCoupon {
            id: IssuedCouponId::new(),
            campaign_id,
            code,
            created_at,
            modified_at: created_at,
        }
    }
}

impl TypedIdMarker for IssuedCoupon {
    fn tag() -> &'static str {
        "ISC"
    }
}
