use actix_web::post;
use actix_web::web::{Data, Json, Path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::campaign::CampaignId;
use crate::database::Database;
use crate::error::Error;
use crate::utils::{with_deadline, RequestTimeout};

use super::{manager, IssuedCoupon, IssuedCouponId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssueCouponBody {
    pub requester_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct IssuedCouponBody {
    pub id: IssuedCouponId,
    pub campaign_id: CampaignId,
    pub code: String,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl IssuedCouponBody {
    pub fn render(issued_coupon: IssuedCoupon) -> IssuedCouponBody {
        IssuedCouponBody {
            id: issued_coupon.id,
            campaign_id: issued_coupon.campaign_id,
            code: issued_coupon.code,
            created_at: issued_coupon.created_at,
            modified_at: issued_coupon.modified_at,
        }
    }
}

#[post("/campaigns/{campaign_id}/coupons")]
#[tracing::instrument(skip(db, cache, timeout))]
pub async fn issue_coupon_in_campaign(
    db: Data<Box<dyn Database>>,
    cache: Data<Box<dyn Cache>>,
    timeout: Data<RequestTimeout>,
    params: Path<CampaignId>,
    body: Json<IssueCouponBody>,
) -> Result<Json<IssuedCouponBody>, Error> {
    let campaign_id = params.into_inner();
    let body = body.into_inner();

    let issued_coupon = with_deadline(
        timeout.0,
        manager::issue_coupon(&***db, &***cache, campaign_id, &body.requester_id),
    )
    .await?;

    Ok(Json(IssuedCouponBody::render(issued_coupon)))
}
