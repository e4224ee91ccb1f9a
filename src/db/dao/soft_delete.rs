use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, FromQueryResult, IntoActiveModel, PrimaryKeyTrait,
    QueryFilter, Select,
};
use uuid::Uuid;

use super::base::DaoBase;
use super::base_traits::{
    HasIdActiveModel, HasTimestampColumns, SoftDeleteActiveModel, SoftDeleteEntity,
    TimestampedActiveModel,
};
use super::error::{DaoLayerError, DaoResult};

/// Restricts a query to rows that have not been soft deleted.
pub fn visible<E: SoftDeleteEntity>(select: Select<E>) -> Select<E> {
    select.filter(E::deleted_at_column().is_null())
}

#[async_trait::async_trait]
pub trait SoftDeleteDao: DaoBase
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel: ActiveModelTrait<Entity = Self::Entity>
        + HasIdActiveModel
        + TimestampedActiveModel
        + SoftDeleteActiveModel
        + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    Self::Entity: HasTimestampColumns + SoftDeleteEntity,
{
    async fn find_visible_by_id(
        &self,
        id: Uuid,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        visible(Self::Entity::find_by_id(id))
            .one(self.db())
            .await
            .map_err(DaoLayerError::from)?
            .ok_or(DaoLayerError::NotFound {
                entity: Self::entity_name(),
                id,
            })
    }

    /// Hides a visible row; already deleted rows answer NotFound.
    async fn soft_delete(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        self.find_visible_by_id(id).await?;
        let now = Utc::now().fixed_offset();
        self.update(id, move |active| active.set_deleted_at(Some(now)))
            .await
    }

    async fn restore(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        self.update(id, |active| active.set_deleted_at(None)).await
    }
}

impl<D> SoftDeleteDao for D
where
    D: DaoBase,
    <D::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<D::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <D::Entity as EntityTrait>::ActiveModel: ActiveModelTrait<Entity = D::Entity>
        + HasIdActiveModel
        + TimestampedActiveModel
        + SoftDeleteActiveModel
        + Send,
    <<D::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    D::Entity: HasTimestampColumns + SoftDeleteEntity,
{
}
