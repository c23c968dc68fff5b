use async_trait::async_trait;
use mongodb::bson;

use crate::database::MongoCampaignStore;
use crate::error::Error;

use super::{Campaign, CampaignId};

#[async_trait]
pub trait CampaignStore: Send + Sync {
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error>;

    async fn fetch_campaign_by_id(&self, campaign_id: CampaignId)
        -> Result<Option<Campaign>, Error>;

    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error>;
}

#[async_trait]
impl CampaignStore for MongoCampaignStore {
    #[tracing::instrument(skip(self))]
    async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
        self.insert_one(campaign, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_campaign_by_id(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<Campaign>, Error> {
        let campaign: Option<Campaign> = self
            .find_one(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(campaign)
    }

    #[tracing::instrument(skip(self))]
    async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
        self.delete_one(bson::doc! { "_id": campaign_id }, None)
            .await?;

        Ok(())
    }
}
