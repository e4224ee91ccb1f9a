pub trait HasTimestampColumns: sea_orm::EntityTrait {
    fn created_at_column() -> Self::Column;
    fn updated_at_column() -> Self::Column;
}

pub trait HasIdActiveModel {
    fn set_id(&mut self, id: uuid::Uuid);
}

pub trait TimestampedActiveModel {
    fn set_created_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone);
    fn set_updated_at(&mut self, ts: sea_orm::entity::prelude::DateTimeWithTimeZone);
}

/// Entities whose rows are hidden, not removed, on delete.
pub trait SoftDeleteEntity: sea_orm::EntityTrait {
    fn deleted_at_column() -> Self::Column;
}

pub trait SoftDeleteActiveModel {
    fn set_deleted_at(&mut self, ts: Option<sea_orm::entity::prelude::DateTimeWithTimeZone>);
}
