use chrono::Utc;
use sea_orm::sea_query::{Alias, ColumnType, Expr, ExprTrait, Func, LikeExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DeleteMany, EntityTrait,
    FromQueryResult, IdenStatic, IntoActiveModel, Order, PaginatorTrait, PrimaryKeyTrait,
    QueryFilter, QueryOrder, QuerySelect, Select, TransactionTrait, UpdateMany,
};
use uuid::Uuid;

use super::base_traits::{HasIdActiveModel, HasTimestampColumns, TimestampedActiveModel};
use super::error::{DaoLayerError, DaoResult};

#[derive(Debug, serde::Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub page_size: u64,
    pub has_next: bool,
    pub total: Option<u64>,
}

#[derive(Debug, Clone)]
pub enum FilterOp {
    Eq(sea_orm::sea_query::Value),
    Compare {
        op: CompareOp,
        value: sea_orm::sea_query::Value,
    },
    Like { pattern: String, escape: char },
    Between {
        min: sea_orm::sea_query::Value,
        max: sea_orm::sea_query::Value,
    },
}

#[derive(Debug, Clone, Copy)]
pub enum CompareOp {
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone)]
pub struct ColumnFilter<C> {
    pub column: C,
    pub op: FilterOp,
}

/// `_count`, `_sum`, `_avg`, `_min` and `_max` of one column. Only numeric
/// columns carry the four statistics; any other scalar column is counted.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct AggregateResult {
    pub column: String,
    pub count: u64,
    pub sum: Option<f64>,
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct GroupCount {
    pub value: Option<String>,
    pub count: u64,
}

pub fn apply_filters<E>(select: Select<E>, filters: &[ColumnFilter<E::Column>]) -> Select<E>
where
    E: EntityTrait,
    E::Column: Clone,
{
    filters.iter().fold(select, |select, filter| match &filter.op {
        FilterOp::Eq(value) => select.filter(filter.column.clone().eq(value.clone())),
        FilterOp::Compare { op, value } => {
            let expr = Expr::col(filter.column.clone());
            let value = Expr::val(value.clone());
            let expr = match op {
                CompareOp::Lt => expr.lt(value),
                CompareOp::Lte => expr.lte(value),
                CompareOp::Gt => expr.gt(value),
                CompareOp::Gte => expr.gte(value),
            };
            select.filter(expr)
        }
        FilterOp::Like { pattern, escape } => select.filter(
            Expr::col(filter.column.clone()).like(LikeExpr::new(pattern).escape(*escape)),
        ),
        FilterOp::Between { min, max } => select.filter(
            Expr::col(filter.column.clone())
                .between(Expr::val(min.clone()), Expr::val(max.clone())),
        ),
    })
}

/// Blob and document columns have no meaningful aggregate.
fn is_countable_column_type(column_type: &ColumnType) -> bool {
    !matches!(
        column_type,
        ColumnType::Json
            | ColumnType::JsonBinary
            | ColumnType::Binary(_)
            | ColumnType::VarBinary(_)
            | ColumnType::Blob
            | ColumnType::Array(_)
    )
}

pub fn is_numeric_column_type(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::TinyInteger
            | ColumnType::SmallInteger
            | ColumnType::Integer
            | ColumnType::BigInteger
            | ColumnType::TinyUnsigned
            | ColumnType::SmallUnsigned
            | ColumnType::Unsigned
            | ColumnType::BigUnsigned
            | ColumnType::Float
            | ColumnType::Double
            | ColumnType::Decimal(_)
            | ColumnType::Money(_)
    )
}

fn as_double(expr: Expr) -> Expr {
    Expr::from(Func::cast_as(expr, Alias::new("double precision")))
}

/// Walks every page of a `find` query, one round trip per page.
pub struct DaoPager<D, F>
where
    D: DaoBase,
    F: Fn(Select<D::Entity>) -> Select<D::Entity> + Clone + Send,
{
    dao: D,
    page: u64,
    page_size: u64,
    order: Option<(<D::Entity as EntityTrait>::Column, Order)>,
    apply: F,
    done: bool,
}

impl<D, F> DaoPager<D, F>
where
    D: DaoBase,
    F: Fn(Select<D::Entity>) -> Select<D::Entity> + Clone + Send,
    <D::Entity as EntityTrait>::Column: Clone,
{
    pub async fn next_page(
        &mut self,
    ) -> DaoResult<Option<PaginatedResponse<<D::Entity as EntityTrait>::Model>>> {
        if self.done {
            return Ok(None);
        }

        let response = self
            .dao
            .find(
                self.page,
                self.page_size,
                self.order.clone(),
                self.apply.clone(),
            )
            .await?;

        if !response.has_next {
            self.done = true;
        }
        self.page = self.page.saturating_add(1);

        Ok(Some(response))
    }

    pub async fn collect_all(mut self) -> DaoResult<Vec<<D::Entity as EntityTrait>::Model>> {
        let mut rows = Vec::new();
        while let Some(mut response) = self.next_page().await? {
            rows.append(&mut response.data);
        }
        Ok(rows)
    }
}

/// The per-model delegate. Every operation runs against the pool; the `*_on`
/// variants take any connection so they can also run inside a transaction.
#[async_trait::async_trait]
pub trait DaoBase: Clone + Send + Sync + Sized
where
    <Self::Entity as EntityTrait>::Model:
        FromQueryResult + IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send + Sync,
    <Self::Entity as EntityTrait>::ActiveModel:
        ActiveModelTrait<Entity = Self::Entity> + HasIdActiveModel + TimestampedActiveModel + Send,
    <<Self::Entity as EntityTrait>::PrimaryKey as PrimaryKeyTrait>::ValueType:
        From<Uuid> + Send + Sync,
    Self::Entity: HasTimestampColumns,
{
    type Entity: EntityTrait + Send + Sync;
    const MAX_PAGE_SIZE: u64 = 100;

    fn new(db: &DatabaseConnection) -> Self;

    fn db(&self) -> &DatabaseConnection;

    fn entity_name() -> &'static str {
        std::any::type_name::<Self::Entity>()
    }

    async fn create_on<C>(
        conn: &C,
        mut active: <Self::Entity as EntityTrait>::ActiveModel,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let now = Utc::now().fixed_offset();
        active.set_id(Uuid::new_v4());
        active.set_created_at(now);
        active.set_updated_at(now);
        active.insert(conn).await.map_err(DaoLayerError::from)
    }

    async fn create(
        &self,
        data: impl IntoActiveModel<<Self::Entity as EntityTrait>::ActiveModel> + Send,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        Self::create_on(self.db(), data.into_active_model()).await
    }

    /// Inserts every row or none of them.
    async fn create_many(
        &self,
        rows: Vec<<Self::Entity as EntityTrait>::ActiveModel>,
    ) -> DaoResult<u64> {
        if rows.is_empty() {
            return Ok(0);
        }
        let txn = self.db().begin().await.map_err(DaoLayerError::from)?;
        let mut inserted = 0u64;
        for row in rows {
            if let Err(err) = Self::create_on(&txn, row).await {
                txn.rollback().await.map_err(DaoLayerError::from)?;
                return Err(err);
            }
            inserted += 1;
        }
        txn.commit().await.map_err(DaoLayerError::from)?;
        Ok(inserted)
    }

    async fn find_by_id_on<C>(conn: &C, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: ConnectionTrait + Sync,
    {
        let model = Self::Entity::find_by_id(id)
            .one(conn)
            .await
            .map_err(DaoLayerError::from)?;

        model.ok_or(DaoLayerError::NotFound {
            entity: Self::entity_name(),
            id,
        })
    }

    async fn find_by_id(&self, id: Uuid) -> DaoResult<<Self::Entity as EntityTrait>::Model> {
        Self::find_by_id_on(self.db(), id).await
    }

    async fn find_first_on<C>(
        conn: &C,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Option<<Self::Entity as EntityTrait>::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        apply(Self::Entity::find())
            .order_by_desc(Self::Entity::created_at_column())
            .one(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    async fn find_first(
        &self,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Option<<Self::Entity as EntityTrait>::Model>> {
        Self::find_first_on(self.db(), apply).await
    }

    /// Every row matching `apply`, unpaginated. Meant for bounded rule
    /// checks such as one employee's logs for a day.
    async fn find_all_on<C>(
        conn: &C,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Vec<<Self::Entity as EntityTrait>::Model>>
    where
        C: ConnectionTrait + Sync,
    {
        apply(Self::Entity::find())
            .all(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    async fn find(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>> {
        if page == 0 || page_size == 0 || page_size > Self::MAX_PAGE_SIZE {
            return Err(DaoLayerError::InvalidPagination { page, page_size });
        }

        let filtered = apply(Self::Entity::find());
        let ordered = match order {
            Some((column, order)) => filtered.order_by(column, order),
            None => filtered.order_by_desc(Self::Entity::created_at_column()),
        };
        let fetch_size = page_size.saturating_add(1);
        let offset = page.saturating_sub(1).saturating_mul(page_size);
        let mut data = ordered
            .limit(fetch_size)
            .offset(offset)
            .all(self.db())
            .await
            .map_err(DaoLayerError::from)?;

        let has_next = data.len() > page_size as usize;
        if has_next {
            data.truncate(page_size as usize);
        }

        Ok(PaginatedResponse {
            data,
            page,
            page_size,
            has_next,
            total: None,
        })
    }

    async fn find_with_filters(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        filters: &[ColumnFilter<<Self::Entity as EntityTrait>::Column>],
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<PaginatedResponse<<Self::Entity as EntityTrait>::Model>>
    where
        <Self::Entity as EntityTrait>::Column: Clone,
    {
        self.find(page, page_size, order, move |select| {
            apply_filters(apply(select), filters)
        })
        .await
    }

    fn find_iter<F>(
        &self,
        page_size: Option<u64>,
        order: Option<(<Self::Entity as EntityTrait>::Column, Order)>,
        apply: F,
    ) -> DaoPager<Self, F>
    where
        F: Fn(Select<Self::Entity>) -> Select<Self::Entity> + Clone + Send,
        <Self::Entity as EntityTrait>::Column: Clone,
    {
        DaoPager {
            dao: self.clone(),
            page: 1,
            page_size: page_size.unwrap_or(Self::MAX_PAGE_SIZE),
            order,
            apply,
            done: false,
        }
    }

    async fn count_on<C>(
        conn: &C,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<u64>
    where
        C: ConnectionTrait + Sync,
    {
        apply(Self::Entity::find())
            .count(conn)
            .await
            .map_err(DaoLayerError::from)
    }

    async fn count(
        &self,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<u64> {
        Self::count_on(self.db(), apply).await
    }

    async fn update_on<C, F>(
        conn: &C,
        id: Uuid,
        apply: F,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: ConnectionTrait + Sync,
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        let model = Self::find_by_id_on(conn, id).await?;

        let mut active = model.into_active_model();
        apply(&mut active);
        active.set_updated_at(Utc::now().fixed_offset());

        active.update(conn).await.map_err(DaoLayerError::from)
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        Self::update_on(self.db(), id, apply).await
    }

    /// Column assignments over a filter; `updated_at` is always bumped.
    async fn update_many(
        &self,
        apply: impl FnOnce(UpdateMany<Self::Entity>) -> UpdateMany<Self::Entity> + Send,
    ) -> DaoResult<u64> {
        let statement = apply(Self::Entity::update_many()).col_expr(
            Self::Entity::updated_at_column(),
            Expr::value(Utc::now().fixed_offset()),
        );
        statement
            .exec(self.db())
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::from)
    }

    /// Updates the first row matched by `find`, or creates `create` when
    /// nothing matches.
    async fn upsert_on<C, F>(
        conn: &C,
        find: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
        create: <Self::Entity as EntityTrait>::ActiveModel,
        apply_update: F,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        C: ConnectionTrait + Sync,
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        match Self::find_first_on(conn, find).await? {
            Some(existing) => {
                let mut active = existing.into_active_model();
                apply_update(&mut active);
                active.set_updated_at(Utc::now().fixed_offset());
                active.update(conn).await.map_err(DaoLayerError::from)
            }
            None => Self::create_on(conn, create).await,
        }
    }

    async fn upsert<F>(
        &self,
        find: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
        create: <Self::Entity as EntityTrait>::ActiveModel,
        apply_update: F,
    ) -> DaoResult<<Self::Entity as EntityTrait>::Model>
    where
        F: for<'a> FnOnce(&'a mut <Self::Entity as EntityTrait>::ActiveModel) + Send,
    {
        Self::upsert_on(self.db(), find, create, apply_update).await
    }

    async fn delete(&self, id: Uuid) -> DaoResult<Uuid> {
        let result = Self::Entity::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(DaoLayerError::from)?;

        if result.rows_affected == 0 {
            return Err(DaoLayerError::NotFound {
                entity: Self::entity_name(),
                id,
            });
        }

        Ok(id)
    }

    async fn delete_many(
        &self,
        apply: impl FnOnce(DeleteMany<Self::Entity>) -> DeleteMany<Self::Entity> + Send,
    ) -> DaoResult<u64> {
        apply(Self::Entity::delete_many())
            .exec(self.db())
            .await
            .map(|result| result.rows_affected)
            .map_err(DaoLayerError::from)
    }

    async fn aggregate(
        &self,
        column: <Self::Entity as EntityTrait>::Column,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<AggregateResult>
    where
        <Self::Entity as EntityTrait>::Column: ColumnTrait + Copy,
    {
        let column_name = column.as_str().to_string();
        let column_type = column.def().get_column_type().clone();
        if !is_countable_column_type(&column_type) {
            return Err(DaoLayerError::InvalidAggregate(format!(
                "column '{column_name}' cannot be aggregated"
            )));
        }
        if !is_numeric_column_type(&column_type) {
            let count: Option<i64> = apply(Self::Entity::find())
                .select_only()
                .column_as(Expr::from(Func::count(Expr::col(column))), "count")
                .into_tuple()
                .one(self.db())
                .await
                .map_err(DaoLayerError::from)?;
            return Ok(AggregateResult {
                column: column_name,
                count: count.and_then(|n| u64::try_from(n).ok()).unwrap_or_default(),
                ..AggregateResult::default()
            });
        }

        let row: Option<(i64, Option<f64>, Option<f64>, Option<f64>, Option<f64>)> =
            apply(Self::Entity::find())
                .select_only()
                .column_as(Expr::from(Func::count(Expr::col(column))), "count")
                .column_as(as_double(Func::sum(Expr::col(column)).into()), "sum")
                .column_as(as_double(Func::avg(Expr::col(column)).into()), "avg")
                .column_as(as_double(Func::min(Expr::col(column)).into()), "min")
                .column_as(as_double(Func::max(Expr::col(column)).into()), "max")
                .into_tuple()
                .one(self.db())
                .await
                .map_err(DaoLayerError::from)?;

        let Some((count, sum, avg, min, max)) = row else {
            return Ok(AggregateResult {
                column: column_name,
                ..AggregateResult::default()
            });
        };
        Ok(AggregateResult {
            column: column_name,
            count: u64::try_from(count).unwrap_or_default(),
            sum,
            avg,
            min,
            max,
        })
    }

    /// Row counts per distinct value of `column`, largest group first.
    async fn group_by_count(
        &self,
        column: <Self::Entity as EntityTrait>::Column,
        apply: impl FnOnce(Select<Self::Entity>) -> Select<Self::Entity> + Send,
    ) -> DaoResult<Vec<GroupCount>>
    where
        <Self::Entity as EntityTrait>::Column: ColumnTrait + Copy,
    {
        let rows: Vec<(Option<String>, i64)> = apply(Self::Entity::find())
            .select_only()
            .column_as(
                Expr::from(Func::cast_as(Expr::col(column), Alias::new("text"))),
                "value",
            )
            .column_as(Expr::from(Func::count(Expr::val(1))), "count")
            .group_by(column)
            .order_by_desc(Expr::col(Alias::new("count")))
            .into_tuple()
            .all(self.db())
            .await
            .map_err(DaoLayerError::from)?;

        Ok(rows
            .into_iter()
            .map(|(value, count)| GroupCount {
                value,
                count: u64::try_from(count).unwrap_or_default(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use sea_orm::sea_query::{ColumnType, StringLen};

    use super::{is_countable_column_type, is_numeric_column_type};

    #[test]
    fn text_is_counted_but_not_summed() {
        let text = ColumnType::String(StringLen::None);
        assert!(is_countable_column_type(&text));
        assert!(!is_numeric_column_type(&text));
        assert!(is_numeric_column_type(&ColumnType::Integer));
    }

    #[test]
    fn documents_cannot_be_aggregated() {
        assert!(!is_countable_column_type(&ColumnType::Json));
        assert!(!is_countable_column_type(&ColumnType::JsonBinary));
    }
}
