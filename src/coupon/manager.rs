use chrono::{DateTime, Utc};
use tracing::{error, warn};

use crate::cache::{Cache, CampaignKeys};
use crate::campaign::{CampaignData, CampaignId};
use crate::database::Database;
use crate::error::Error;

use super::code::generate_code;
use super::IssuedCoupon;

/// Issues a single coupon of the campaign to the requester.
///
/// The remaining-count and the requester set live under separate keys, so the
/// claim is made with two atomic operations and undone by hand if the second
/// one overdraws the count. See [`issue_coupon_at`].
#[tracing::instrument(skip(db, cache))]
pub async fn issue_coupon(
    db: &dyn Database,
    cache: &dyn Cache,
    campaign_id: CampaignId,
    requester_id: &str,
) -> Result<IssuedCoupon, Error> {
    issue_coupon_at(db, cache, campaign_id, requester_id, Utc::now()).await
}

/// Issues a coupon as if the current time were `now`.
///
/// 1. the cached campaign window must contain `now`
/// 2. the requester is added to `campaign:{id}:requesters`, and a requester
///    already present is rejected without touching anything else
/// 3. `campaign:{id}:remaining` is decremented; a negative result means
///    another caller got the last coupon, so the decrement and the set entry
///    are undone in that order
/// 4. the issued coupon is saved
///
/// A failed save in step 4 leaves the claim from steps 2 and 3 in place.
#[tracing::instrument(skip(db, cache))]
pub async fn issue_coupon_at(
    db: &dyn Database,
    cache: &dyn Cache,
    campaign_id: CampaignId,
    requester_id: &str,
    now: DateTime<Utc>,
) -> Result<IssuedCoupon, Error> {
    if requester_id.is_empty() {
        return Err(Error::InvalidRequesterId);
    }

    let keys = CampaignKeys::new(campaign_id);

    validate_issuance_window(cache, &keys, campaign_id, now).await?;
    claim_coupon(cache, &keys, campaign_id, requester_id).await?;

    let code = generate_code(&mut rand::thread_rng());
    let issued_coupon = IssuedCoupon::new(campaign_id, code, now);

    if let Err(err) = db
        .issued_coupons()
        .insert_issued_coupon(&issued_coupon)
        .await
    {
        error!(
            %campaign_id,
            requester_id,
            error = %err,
            "coupon was claimed in the cache but could not be recorded"
        );
        return Err(Error::IssuanceRecordFailed {
            campaign_id,
            requester_id: requester_id.to_owned(),
            cause: Box::new(err),
        });
    }

    Ok(issued_coupon)
}

#[tracing::instrument(skip(cache, keys))]
async fn validate_issuance_window(
    cache: &dyn Cache,
    keys: &CampaignKeys,
    campaign_id: CampaignId,
    now: DateTime<Utc>,
) -> Result<(), Error> {
    let data = cache.get_value(&keys.data).await.map_err(|cause| {
        if cause.is_not_found() {
            Error::CampaignDataNotFound { campaign_id }
        } else {
            Error::CacheUnavailable {
                key: keys.data.clone(),
                cause,
            }
        }
    })?;

    let campaign: CampaignData = serde_json::from_slice(&data)
        .map_err(|cause| Error::CampaignDataMalformed { campaign_id, cause })?;

    if now < campaign.issued_at {
        return Err(Error::IssuanceNotStarted {
            campaign_id,
            issued_at: campaign.issued_at,
        });
    }
    if now > campaign.expires_at {
        return Err(Error::IssuanceExpired {
            campaign_id,
            expires_at: campaign.expires_at,
        });
    }

    Ok(())
}

#[tracing::instrument(skip(cache, keys))]
async fn claim_coupon(
    cache: &dyn Cache,
    keys: &CampaignKeys,
    campaign_id: CampaignId,
    requester_id: &str,
) -> Result<(), Error> {
    let added = cache
        .add_to_set(&keys.requesters, requester_id)
        .await
        .map_err(|cause| Error::CacheUnavailable {
            key: keys.requesters.clone(),
            cause,
        })?;
    if !added {
        return Err(Error::DuplicateRequester {
            campaign_id,
            requester_id: requester_id.to_owned(),
        });
    }

    // TODO: release the requester set entry when the decrement itself fails;
    // today that path leaves the requester blocked from retrying.
    let remaining = cache
        .decrement(&keys.remaining)
        .await
        .map_err(|cause| Error::CacheUnavailable {
            key: keys.remaining.clone(),
            cause,
        })?;
    if remaining >= 0 {
        return Ok(());
    }

    warn!(%campaign_id, requester_id, remaining, "remaining amount overdrawn, rolling back");

    if let Err(cause) = cache.increment(&keys.remaining).await {
        error!(%campaign_id, requester_id, error = %cause, "failed to restore remaining amount");
        return Err(Error::AmountRecoveryFailed {
            campaign_id,
            requester_id: requester_id.to_owned(),
            cause,
        });
    }

    if let Err(cause) = cache.remove_from_set(&keys.requesters, requester_id).await {
        error!(%campaign_id, requester_id, error = %cause, "failed to release requester");
        return Err(Error::DedupeRecoveryFailed {
            campaign_id,
            requester_id: requester_id.to_owned(),
            cause,
        });
    }

    Err(Error::AllIssued { campaign_id })
}
