use chrono::{Duration, Utc};
use tracing::info;

use crate::cache::Cache;
use crate::campaign::manager::create_campaign;
use crate::campaign::Campaign;
use crate::database::Database;
use crate::error::Error;

pub const SEED_ISSUE_AMOUNT: i64 = 500;

/// Creates a campaign that is open for a week from now.
pub async fn seed(db: &dyn Database, cache: &dyn Cache) -> Result<Campaign, Error> {
    let now = Utc::now();
    let campaign = create_campaign(
        db,
        cache,
        "Launch Event".to_string(),
        SEED_ISSUE_AMOUNT,
        now,
        now + Duration::days(7),
    )
    .await?;

    info!(campaign_id = %campaign.id, "seeded campaign");

    Ok(campaign)
}
