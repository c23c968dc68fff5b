use actix_web::web::{Data, Json, Path};
use actix_web::{get, post};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::Cache;
use crate::coupon::IssuedCouponBody;
use crate::database::Database;
use crate::error::Error;
use crate::utils::{with_deadline, RequestTimeout};

use super::{manager, Campaign, CampaignId};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateCampaignBody {
    pub name: String,
    pub issue_amount: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CampaignBody {
    pub id: CampaignId,
    pub name: String,
    pub issue_amount: i64,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub issued_coupons: Vec<IssuedCouponBody>,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl CampaignBody {
    pub async fn render(db: &dyn Database, campaign: Campaign) -> Result<CampaignBody, Error> {
        let issued_coupons = manager::get_issued_coupons(db, &campaign).await?;

        Ok(CampaignBody {
            id: campaign.id,
            name: campaign.name,
            issue_amount: campaign.issue_amount,
            issued_at: campaign.issued_at,
            expires_at: campaign.expires_at,
            issued_coupons: issued_coupons
                .into_iter()
                .map(IssuedCouponBody::render)
                .collect(),
            created_at: campaign.created_at,
            modified_at: campaign.modified_at,
        })
    }
}

#[post("/campaigns")]
#[tracing::instrument(skip(db, cache, timeout))]
pub async fn create_campaign(
    db: Data<Box<dyn Database>>,
    cache: Data<Box<dyn Cache>>,
    timeout: Data<RequestTimeout>,
    body: Json<CreateCampaignBody>,
) -> Result<Json<CampaignBody>, Error> {
    let body = body.into_inner();

    let campaign = with_deadline(
        timeout.0,
        manager::create_campaign(
            &***db,
            &***cache,
            body.name,
            body.issue_amount,
            body.issued_at,
            body.expires_at,
        ),
    )
    .await?;

    let body = CampaignBody {
        id: campaign.id,
        name: campaign.name,
        issue_amount: campaign.issue_amount,
        issued_at: campaign.issued_at,
        expires_at: campaign.expires_at,
        issued_coupons: vec![],
        created_at: campaign.created_at,
        modified_at: campaign.modified_at,
    };

    Ok(Json(body))
}

#[get("/campaigns/{campaign_id}")]
#[tracing::instrument(skip(db, timeout))]
pub async fn get_campaign_by_id(
    db: Data<Box<dyn Database>>,
    timeout: Data<RequestTimeout>,
    params: Path<CampaignId>,
) -> Result<Json<CampaignBody>, Error> {
    let campaign_id = params.into_inner();

    let body = with_deadline(timeout.0, async {
        let campaign = manager::get_campaign_by_id(&***db, campaign_id).await?;
        CampaignBody::render(&***db, campaign).await
    })
    .await?;

    Ok(Json(body))
}
