use sea_orm::{ColumnTrait, DatabaseConnection, QueryFilter};

use super::{DaoBase, DaoResult};
use crate::db::entities::prelude::Station;
use crate::db::entities::station;

#[derive(Clone)]
pub struct StationDao {
    db: DatabaseConnection,
}

impl DaoBase for StationDao {
    type Entity = Station;

    fn new(db: &DatabaseConnection) -> Self {
        Self { db: db.clone() }
    }

    fn db(&self) -> &DatabaseConnection {
        &self.db
    }
}

impl StationDao {
    pub async fn find_by_name(&self, name: &str) -> DaoResult<Option<station::Model>> {
        let name = name.to_string();
        self.find_first(move |query| query.filter(station::Column::Name.eq(name)))
            .await
    }
}
