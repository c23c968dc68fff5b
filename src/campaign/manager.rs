use chrono::{DateTime, Utc};
use tracing::{error, warn};

use crate::cache::{Cache, CampaignKeys};
use crate::coupon::IssuedCoupon;
use crate::database::Database;
use crate::error::Error;

use super::{Campaign, CampaignData, CampaignId};

/// Saves a new campaign and mirrors it into the cache.
///
/// The durable record is written first, then `campaign:{id}:data`, then
/// `campaign:{id}:remaining` seeded with `issue_amount`. When a cache write
/// fails, the earlier writes are undone newest first. A failed undo is
/// reported in place of the write failure that triggered it.
#[tracing::instrument(skip(db, cache))]
pub async fn create_campaign(
    db: &dyn Database,
    cache: &dyn Cache,
    name: String,
    issue_amount: i64,
    issued_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<Campaign, Error> {
    if issue_amount < 0 {
        return Err(Error::InvalidIssueAmount { issue_amount });
    }
    if issued_at > expires_at {
        return Err(Error::InvalidIssuanceWindow {
            issued_at,
            expires_at,
        });
    }

    let now = Utc::now();
    let campaign = Campaign {
        id: CampaignId::new(),
        name,
        issue_amount,
        issued_at,
        expires_at,
        created_at: now,
        modified_at: now,
    };
    let keys = CampaignKeys::new(campaign.id);
    let data = serde_json::to_vec(&CampaignData::from(&campaign))?;

    db.campaigns()
        .insert_campaign(&campaign)
        .await
        .map_err(|err| Error::CampaignSaveFailed {
            campaign_id: campaign.id,
            cause: Box::new(err),
        })?;

    if let Err(cause) = cache.set_value(&keys.data, &data).await {
        warn!(
            campaign_id = %campaign.id,
            error = %cause,
            "failed to cache campaign data, rolling back"
        );
        delete_saved_campaign(db, campaign.id).await?;
        return Err(Error::CacheWriteFailed {
            key: keys.data,
            cause,
        });
    }

    let remaining = campaign.issue_amount.to_string();
    if let Err(cause) = cache.set_value(&keys.remaining, remaining.as_bytes()).await {
        warn!(
            campaign_id = %campaign.id,
            error = %cause,
            "failed to cache remaining amount, rolling back"
        );
        if let Err(delete_cause) = cache.delete_key(&keys.data).await {
            error!(
                campaign_id = %campaign.id,
                error = %delete_cause,
                "failed to remove cached campaign data"
            );
            return Err(Error::CacheDataRecoveryFailed {
                key: keys.data,
                cause: delete_cause,
            });
        }
        delete_saved_campaign(db, campaign.id).await?;
        return Err(Error::CacheWriteFailed {
            key: keys.remaining,
            cause,
        });
    }

    Ok(campaign)
}

async fn delete_saved_campaign(db: &dyn Database, campaign_id: CampaignId) -> Result<(), Error> {
    db.campaigns()
        .delete_campaign(campaign_id)
        .await
        .map_err(|err| {
            error!(%campaign_id, error = %err, "failed to remove saved campaign");
            Error::DataRecoveryFailed {
                campaign_id,
                cause: Box::new(err),
            }
        })
}

#[tracing::instrument(skip(db))]
pub async fn get_campaign_by_id(
    db: &dyn Database,
    campaign_id: CampaignId,
) -> Result<Campaign, Error> {
    let campaign = db
        .campaigns()
        .fetch_campaign_by_id(campaign_id)
        .await?
        .ok_or(Error::CampaignDoesNotExist { campaign_id })?;

    Ok(campaign)
}

#[tracing::instrument(skip(db, campaign), fields(campaign_id = %campaign.id))]
pub async fn get_issued_coupons(
    db: &dyn Database,
    campaign: &Campaign,
) -> Result<Vec<IssuedCoupon>, Error> {
    let issued_coupons = db
        .issued_coupons()
        .fetch_issued_coupons_by_campaign(campaign.id)
        .await?;

    Ok(issued_coupons)
}
