use crate::db::errors::Result;

/// Common shape of the entity repositories.
///
/// Each implementor wraps a borrowed `PgConnection` (pool connection or transaction), so callers
/// decide the transactional scope.
#[async_trait::async_trait]
pub trait Repository {
    type CreateRequest: Send + Sync;
    type Response: Send;
    type Id: Send;
    type Filter: Send + Sync;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response>;

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>>;

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>>;
}
