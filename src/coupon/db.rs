use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson;
use mongodb::options::FindOptions;

use crate::campaign::CampaignId;
use crate::database::MongoIssuedCouponStore;
use crate::error::Error;

use super::IssuedCoupon;

#[async_trait]
pub trait IssuedCouponStore: Send + Sync {
    async fn insert_issued_coupon(&self, issued_coupon: &IssuedCoupon) -> Result<(), Error>;

    async fn fetch_issued_coupons_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<IssuedCoupon>, Error>;
}

#[async_trait]
impl IssuedCouponStore for MongoIssuedCouponStore {
    #[tracing::instrument(skip(self))]
    async fn insert_issued_coupon(&self, issued_coupon: &IssuedCoupon) -> Result<(), Error> {
        self.insert_one(issued_coupon, None).await?;

        Ok(())
    }

    #[tracing::instrument(skip(self))]
    async fn fetch_issued_coupons_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<IssuedCoupon>, Error> {
        let options = FindOptions::builder()
            .sort(bson::doc! { "created_at": 1 })
            .build();

        let issued_coupons: Vec<IssuedCoupon> = self
            .find(bson::doc! { "campaign_id": campaign_id }, options)
            .await?
            .try_collect()
            .await?;

        Ok(issued_coupons)
    }
}
