//! [`SaleStore`] over the SQLite repositories.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use checkout_core::{Sale, SaleReturn, SaleStatus};
use checkout_db::{Database, DbResult};

use crate::collaborators::SaleStore;

#[async_trait]
impl SaleStore for Database {
    async fn insert_sale(&self, sale: &Sale) -> DbResult<()> {
        self.sales().insert(sale).await
    }

    async fn update_draft(&self, sale: &Sale) -> DbResult<()> {
        self.sales().update_draft(sale).await
    }

    async fn load_sale(&self, sale_id: &str) -> DbResult<Option<Sale>> {
        self.sales().get_by_id(sale_id).await
    }

    async fn delete_draft(&self, sale_id: &str) -> DbResult<()> {
        self.sales().delete_draft(sale_id).await
    }

    async fn save_return(
        &self,
        sale_return: &SaleReturn,
        sale_updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        self.returns().record(sale_return, sale_updated_at).await
    }

    async fn load_returns_by_sale(&self, sale_id: &str) -> DbResult<Vec<SaleReturn>> {
        self.returns().list_by_sale(sale_id).await
    }

    async fn sales_by_status(&self, status: SaleStatus) -> DbResult<Vec<Sale>> {
        self.sales().list_by_status(status).await
    }

    async fn sales_by_customer(&self, customer_id: &str) -> DbResult<Vec<Sale>> {
        self.sales().list_by_customer(customer_id).await
    }
}
