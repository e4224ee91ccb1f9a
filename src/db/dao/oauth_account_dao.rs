use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter, Select};

use super::DaoBase;
use crate::db::entities::oauth_account;
use crate::db::entities::prelude::OAuthAccount;

#[derive(Clone)]
pub struct OAuthAccountDao {
    db: DatabaseConnection,
}

impl DaoBase for OAuthAccountDao {
    type Entity = OAuthAccount;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl OAuthAccountDao {
    pub fn by_provider_account(
        provider: String,
        provider_user_id: String,
    ) -> impl FnOnce(Select<OAuthAccount>) -> Select<OAuthAccount> + Send {
        move |query| {
            query
                .filter(oauth_account::Column::Provider.eq(provider))
                .filter(oauth_account::Column::ProviderUserId.eq(provider_user_id))
        }
    }
}
