use mongodb::{bson, Collection, Database as MongoDb};

use crate::campaign::db::CampaignStore;
use crate::campaign::Campaign;
use crate::coupon::db::IssuedCouponStore;
use crate::coupon::IssuedCoupon;
use crate::error::Error;

pub type MongoCampaignStore = Collection<Campaign>;
pub type MongoIssuedCouponStore = Collection<IssuedCoupon>;

const CAMPAIGNS: &str = "campaigns";
const ISSUED_COUPONS: &str = "issued_coupons";

pub trait Database: Send + Sync {
    fn campaigns(&self) -> &dyn CampaignStore;
    fn issued_coupons(&self) -> &dyn IssuedCouponStore;
}

#[derive(Debug, Clone)]
pub struct MongoDatabase {
    campaigns: MongoCampaignStore,
    issued_coupons: MongoIssuedCouponStore,
}

impl MongoDatabase {
    pub async fn initialize(db: MongoDb) -> Result<MongoDatabase, Error> {
        // ping the database to ensure connection is established
        db.run_command(bson::doc! { "ping": 1 }, None).await?;

        db.run_command(
            bson::doc! {
                "createIndexes": ISSUED_COUPONS,
                "indexes": [
                    { "key": { "campaign_id": 1 }, "name": "by_campaign_id" },
                ]
            },
            None,
        )
        .await?;

        Ok(MongoDatabase {
            campaigns: db.collection(CAMPAIGNS),
            issued_coupons: db.collection(ISSUED_COUPONS),
        })
    }
}

impl Database for MongoDatabase {
    fn campaigns(&self) -> &dyn CampaignStore {
        &self.campaigns
    }

    fn issued_coupons(&self) -> &dyn IssuedCouponStore {
        &self.issued_coupons
    }
}

#[cfg(test)]
pub mod test {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;

    use crate::campaign::CampaignId;

    use super::*;

    type Hook<A, R> = Box<dyn Fn(A) -> Result<R, Error> + Send + Sync>;

    /// A campaign store that keeps records in memory unless a hook is
    /// replaced.
    pub struct MockCampaignStore {
        pub on_insert_campaign: Box<dyn Fn(&Campaign) -> Result<(), Error> + Send + Sync>,
        pub on_fetch_campaign_by_id: Hook<CampaignId, Option<Campaign>>,
        pub on_delete_campaign: Hook<CampaignId, ()>,
        pub records: Arc<Mutex<HashMap<CampaignId, Campaign>>>,
    }

    pub struct MockIssuedCouponStore {
        pub on_insert_issued_coupon:
            Box<dyn Fn(&IssuedCoupon) -> Result<(), Error> + Send + Sync>,
        pub on_fetch_issued_coupons_by_campaign: Hook<CampaignId, Vec<IssuedCoupon>>,
        pub records: Arc<Mutex<Vec<IssuedCoupon>>>,
    }

    pub struct MockDatabase {
        pub campaigns: MockCampaignStore,
        pub issued_coupons: MockIssuedCouponStore,
    }

    impl MockDatabase {
        pub fn new() -> MockDatabase {
            MockDatabase {
                campaigns: MockCampaignStore::new(),
                issued_coupons: MockIssuedCouponStore::new(),
            }
        }
    }

    impl Database for MockDatabase {
        fn campaigns(&self) -> &dyn CampaignStore {
            &self.campaigns
        }

        fn issued_coupons(&self) -> &dyn IssuedCouponStore {
            &self.issued_coupons
        }
    }

    impl MockCampaignStore {
        fn new() -> MockCampaignStore {
            let records = Arc::new(Mutex::new(HashMap::new()));
            let insert_records = Arc::clone(&records);
            let fetch_records = Arc::clone(&records);
            let delete_records = Arc::clone(&records);

            MockCampaignStore {
                on_insert_campaign: Box::new(move |campaign: &Campaign| {
                    insert_records
                        .lock()
                        .unwrap()
                        .insert(campaign.id, campaign.clone());
                    Ok(())
                }),
                on_fetch_campaign_by_id: Box::new(move |campaign_id| {
                    Ok(fetch_records.lock().unwrap().get(&campaign_id).cloned())
                }),
                on_delete_campaign: Box::new(move |campaign_id| {
                    delete_records.lock().unwrap().remove(&campaign_id);
                    Ok(())
                }),
                records,
            }
        }
    }

    impl MockIssuedCouponStore {
        fn new() -> MockIssuedCouponStore {
            let records = Arc::new(Mutex::new(Vec::new()));
            let insert_records = Arc::clone(&records);
            let fetch_records = Arc::clone(&records);

            MockIssuedCouponStore {
                on_insert_issued_coupon: Box::new(move |issued_coupon: &IssuedCoupon| {
                    insert_records.lock().unwrap().push(issued_coupon.clone());
                    Ok(())
                }),
                on_fetch_issued_coupons_by_campaign: Box::new(move |campaign_id| {
                    Ok(fetch_records
                        .lock()
                        .unwrap()
                        .iter()
                        .filter(|issued_coupon| issued_coupon.campaign_id == campaign_id)
                        .cloned()
                        .collect())
                }),
                records,
            }
        }
    }

    #[async_trait]
    impl CampaignStore for MockCampaignStore {
        async fn insert_campaign(&self, campaign: &Campaign) -> Result<(), Error> {
            (self.on_insert_campaign)(campaign)
        }

        async fn fetch_campaign_by_id(
            &self,
            campaign_id: CampaignId,
        ) -> Result<Option<Campaign>, Error> {
            (self.on_fetch_campaign_by_id)(campaign_id)
        }

        async fn delete_campaign(&self, campaign_id: CampaignId) -> Result<(), Error> {
            (self.on_delete_campaign)(campaign_id)
        }
    }

    #[async_trait]
    impl IssuedCouponStore for MockIssuedCouponStore {
        async fn insert_issued_coupon(&self, issued_coupon: &IssuedCoupon) -> Result<(), Error> {
            (self.on_insert_issued_coupon)(issued_coupon)
        }

        async fn fetch_issued_coupons_by_campaign(
            &self,
            campaign_id: CampaignId,
        ) -> Result<Vec<IssuedCoupon>, Error> {
            (self.on_fetch_issued_coupons_by_campaign)(campaign_id)
        }
    }
}
