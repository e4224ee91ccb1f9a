use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use sea_orm::sea_query::{ColumnType, Value as QueryValue};
use sea_orm::{
    ActiveValue, ColumnTrait, EntityTrait, IdenStatic, IntoActiveModel, Iterable, Order, Select,
};
use serde_json::Value as JsonValue;
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use crate::db::dao::{
    AggregateResult, ColumnFilter, CompareOp, DaoBase, DaoLayerError, FilterOp, GroupCount,
    PaginatedResponse,
};
use crate::error::AppError;

type CrudEntity<D> = <D as DaoBase>::Entity;
type CrudModel<D> = <CrudEntity<D> as EntityTrait>::Model;
type CrudActiveModel<D> = <CrudEntity<D> as EntityTrait>::ActiveModel;
type CrudColumn<D> = <CrudEntity<D> as EntityTrait>::Column;

/// Client-facing messages a service reports for each failure class.
#[derive(Clone, Copy)]
pub struct CrudErrors {
    pub create_failed: &'static str,
    pub find_failed: &'static str,
    pub not_found: &'static str,
    pub update_failed: &'static str,
    pub delete_failed: &'static str,
    pub conflict: &'static str,
}

impl Default for CrudErrors {
    fn default() -> Self {
        Self {
            create_failed: "Create failed",
            find_failed: "Find failed",
            not_found: "Resource not found",
            update_failed: "Update failed",
            delete_failed: "Delete failed",
            conflict: "Resource already exists",
        }
    }
}

#[derive(Clone, Copy)]
pub enum CrudOp {
    Create,
    Find,
    List,
    Update,
    Delete,
}

const INVALID_FILTER_MESSAGE: &str = "Invalid filter";
const INVALID_FILTER_VALUE_MESSAGE: &str = "Invalid filter value";
const INVALID_COLUMN_MESSAGE: &str = "Invalid column";

/// The generic CRUD contract behind every `/api/v1/<model>` router.
///
/// Query-string filters are parsed per column type: strings accept `*`
/// wildcards at either end, orderable columns accept `>`, `>=`, `<`, `<=`
/// prefixes and `a..b` ranges, everything else is an equality match.
#[async_trait::async_trait]
pub trait CrudService {
    type Dao: DaoBase;

    fn dao(&self) -> &Self::Dao;

    /// Columns clients may never filter, aggregate or group on, such as
    /// secrets and hashes.
    fn hidden_columns(&self) -> &'static [&'static str] {
        &[]
    }

    /// Narrows every list, count and aggregate query. Services with
    /// soft-deleted rows hide them here.
    fn list_scope(select: Select<CrudEntity<Self::Dao>>) -> Select<CrudEntity<Self::Dao>> {
        select
    }

    fn errors(&self) -> CrudErrors {
        CrudErrors::default()
    }

    fn map_error(&self, op: CrudOp, err: DaoLayerError) -> AppError {
        let errors = self.errors();
        match err {
            DaoLayerError::Db(db_err) => {
                let context = match op {
                    CrudOp::Create => errors.create_failed,
                    CrudOp::Find | CrudOp::List => errors.find_failed,
                    CrudOp::Update => errors.update_failed,
                    CrudOp::Delete => errors.delete_failed,
                };
                let message = format!("{context}. Please check the logs for more details");
                AppError::internal_with_source(message, db_err)
            }
            DaoLayerError::NotFound { .. } => AppError::not_found(errors.not_found),
            DaoLayerError::UniqueViolation(_) => AppError::conflict(errors.conflict),
            DaoLayerError::InvalidPagination { .. } | DaoLayerError::InvalidAggregate(_) => {
                AppError::bad_request(err.to_string())
            }
            DaoLayerError::TransactionTimeout(_) => AppError::from(err),
        }
    }

    async fn create<T>(&self, data: T) -> Result<CrudModel<Self::Dao>, AppError>
    where
        T: IntoActiveModel<CrudActiveModel<Self::Dao>> + Send,
    {
        self.dao()
            .create(data)
            .await
            .map_err(|err| self.map_error(CrudOp::Create, err))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<CrudModel<Self::Dao>, AppError> {
        self.dao()
            .find_by_id(id)
            .await
            .map_err(|err| self.map_error(CrudOp::Find, err))
    }

    async fn find<F>(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(CrudColumn<Self::Dao>, Order)>,
        apply: F,
    ) -> Result<PaginatedResponse<CrudModel<Self::Dao>>, AppError>
    where
        F: FnOnce(Select<CrudEntity<Self::Dao>>) -> Select<CrudEntity<Self::Dao>> + Send,
    {
        self.dao()
            .find(page, page_size, order, move |select| {
                apply(Self::list_scope(select))
            })
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))
    }

    async fn find_with_filters<F>(
        &self,
        page: u64,
        page_size: u64,
        order: Option<(CrudColumn<Self::Dao>, Order)>,
        filters: HashMap<String, String>,
        apply: F,
    ) -> Result<PaginatedResponse<CrudModel<Self::Dao>>, AppError>
    where
        F: FnOnce(Select<CrudEntity<Self::Dao>>) -> Select<CrudEntity<Self::Dao>> + Send,
        CrudColumn<Self::Dao>: ColumnTrait + Copy,
    {
        let column_filters = self.build_column_filters(filters)?;
        self.dao()
            .find_with_filters(page, page_size, order, &column_filters, move |select| {
                apply(Self::list_scope(select))
            })
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))
    }

    async fn count(&self, filters: HashMap<String, String>) -> Result<u64, AppError>
    where
        CrudColumn<Self::Dao>: ColumnTrait + Copy,
    {
        let column_filters = self.build_column_filters(filters)?;
        self.dao()
            .count(move |select| {
                crate::db::dao::apply_filters(Self::list_scope(select), &column_filters)
            })
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))
    }

    /// `_count/_sum/_avg/_min/_max` of one numeric column over the filtered rows.
    async fn aggregate(
        &self,
        column: &str,
        filters: HashMap<String, String>,
    ) -> Result<AggregateResult, AppError>
    where
        CrudColumn<Self::Dao>: ColumnTrait + Copy,
    {
        let column = self.resolve_column(column)?;
        let column_filters = self.build_column_filters(filters)?;
        self.dao()
            .aggregate(column, move |select| {
                crate::db::dao::apply_filters(Self::list_scope(select), &column_filters)
            })
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))
    }

    async fn group_by(
        &self,
        column: &str,
        filters: HashMap<String, String>,
    ) -> Result<Vec<GroupCount>, AppError>
    where
        CrudColumn<Self::Dao>: ColumnTrait + Copy,
    {
        let column = self.resolve_column(column)?;
        let column_filters = self.build_column_filters(filters)?;
        self.dao()
            .group_by_count(column, move |select| {
                crate::db::dao::apply_filters(Self::list_scope(select), &column_filters)
            })
            .await
            .map_err(|err| self.map_error(CrudOp::List, err))
    }

    async fn update<F>(&self, id: Uuid, apply: F) -> Result<CrudModel<Self::Dao>, AppError>
    where
        F: for<'a> FnOnce(&'a mut CrudActiveModel<Self::Dao>) + Send,
    {
        self.dao()
            .update(id, apply)
            .await
            .map_err(|err| self.map_error(CrudOp::Update, err))
    }

    async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.dao()
            .delete(id)
            .await
            .map(|_| ())
            .map_err(|err| self.map_error(CrudOp::Delete, err))
    }

    /// Looks up a column a client may filter or aggregate on.
    fn resolve_column(&self, name: &str) -> Result<CrudColumn<Self::Dao>, AppError>
    where
        CrudColumn<Self::Dao>: ColumnTrait + Copy,
    {
        let name = name.trim();
        if self.hidden_columns().contains(&name) {
            return Err(AppError::bad_request(INVALID_COLUMN_MESSAGE));
        }
        CrudColumn::<Self::Dao>::iter()
            .find(|column| column.as_str() == name)
            .ok_or_else(|| AppError::bad_request(INVALID_COLUMN_MESSAGE))
    }

    fn build_column_filters(
        &self,
        filters: HashMap<String, String>,
    ) -> Result<Vec<ColumnFilter<CrudColumn<Self::Dao>>>, AppError>
    where
        CrudColumn<Self::Dao>: ColumnTrait + Copy,
    {
        if filters.is_empty() {
            return Ok(Vec::new());
        }

        let hidden: HashSet<&'static str> = self.hidden_columns().iter().copied().collect();
        let column_map: HashMap<&'static str, CrudColumn<Self::Dao>> =
            CrudColumn::<Self::Dao>::iter()
                .map(|column| (column.as_str(), column))
                .collect();

        filters
            .into_iter()
            .map(|(key, value)| {
                if hidden.contains(key.as_str()) {
                    return Err(invalid_filter());
                }
                let column = *column_map.get(key.as_str()).ok_or_else(invalid_filter)?;
                let column_def = column.def();
                let column_type = column_def.get_column_type();
                let op = if is_string_column_type(column_type) {
                    parse_string_filter(&value)?
                } else {
                    parse_non_string_filter(&value, column_type)?
                };
                Ok(ColumnFilter { column, op })
            })
            .collect()
    }
}

/// The value an active model carries for a field, unless it was never set.
pub fn active_value<V>(value: &ActiveValue<V>) -> Option<&V>
where
    V: Into<sea_orm::Value>,
{
    match value {
        ActiveValue::Set(value) | ActiveValue::Unchanged(value) => Some(value),
        ActiveValue::NotSet => None,
    }
}

/// Maps a missing row to `404 message`, everything else the default way.
pub fn not_found_as(message: &'static str) -> impl Fn(DaoLayerError) -> AppError + Copy {
    move |err| match err {
        DaoLayerError::NotFound { .. } => AppError::not_found(message),
        other => AppError::from(other),
    }
}

fn invalid_filter() -> AppError {
    AppError::bad_request(INVALID_FILTER_MESSAGE)
}

fn invalid_filter_value() -> AppError {
    AppError::bad_request(INVALID_FILTER_VALUE_MESSAGE)
}

fn invalid_filter_value_with(detail: impl std::fmt::Display) -> AppError {
    AppError::bad_request(format!("{INVALID_FILTER_VALUE_MESSAGE}: {detail}"))
}

fn parse_bool(raw: &str) -> Result<bool, AppError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "1" | "yes" | "y" => Ok(true),
        "false" | "f" | "0" | "no" | "n" => Ok(false),
        _ => Err(invalid_filter_value()),
    }
}

fn parse_number<T>(raw: &str) -> Result<T, AppError>
where
    T: std::str::FromStr,
    <T as std::str::FromStr>::Err: std::fmt::Display,
{
    raw.trim().parse::<T>().map_err(invalid_filter_value_with)
}

fn parse_date(raw: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(invalid_filter_value_with)
}

fn parse_time(raw: &str) -> Result<NaiveTime, AppError> {
    let raw = raw.trim();
    ["%H:%M:%S%.f", "%H:%M:%S", "%H:%M"]
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
        .ok_or_else(|| invalid_filter_value_with(format!("Unrecognized time format: {raw}")))
}

fn parse_naive_datetime(raw: &str) -> Result<NaiveDateTime, AppError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.naive_utc());
    }
    [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ]
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
    .ok_or_else(|| invalid_filter_value_with(format!("Unrecognized datetime format: {raw}")))
}

/// RFC 3339, or a bare date meaning midnight UTC.
fn parse_datetime_with_tz(raw: &str) -> Result<DateTime<FixedOffset>, AppError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }
    DateTime::parse_from_rfc3339(raw).map_err(invalid_filter_value_with)
}

fn parse_json(raw: &str) -> Result<JsonValue, AppError> {
    serde_json::from_str(raw.trim()).map_err(invalid_filter_value_with)
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

fn parse_string_filter(raw: &str) -> Result<FilterOp, AppError> {
    let raw = raw.trim();
    let leading = raw.starts_with('*');
    let trailing = raw.len() > 1 && raw.ends_with('*');
    let inner = raw.trim_matches('*');
    if inner.is_empty() || inner.contains('*') {
        return Err(invalid_filter_value());
    }

    if !leading && !trailing {
        return Ok(FilterOp::Eq(QueryValue::String(Some(inner.to_string()))));
    }

    let escaped = escape_like(inner);
    let pattern = format!(
        "{}{escaped}{}",
        if leading { "%" } else { "" },
        if trailing { "%" } else { "" }
    );
    Ok(FilterOp::Like {
        pattern,
        escape: '\\',
    })
}

const COMPARISON_PREFIXES: [(&str, CompareOp); 4] = [
    (">=", CompareOp::Gte),
    ("<=", CompareOp::Lte),
    (">", CompareOp::Gt),
    ("<", CompareOp::Lt),
];

fn parse_comparison(raw: &str) -> Option<(CompareOp, &str)> {
    let raw = raw.trim_start();
    COMPARISON_PREFIXES.iter().find_map(|(prefix, op)| {
        raw.strip_prefix(prefix)
            .map(|rest| (*op, rest.trim_start()))
    })
}

fn parse_range(raw: &str) -> Result<Option<(&str, &str)>, AppError> {
    let raw = raw.trim();
    let Some((start, end)) = raw.split_once("..") else {
        return Ok(None);
    };
    let (start, end) = (start.trim(), end.trim());
    if end.contains("..") || start.is_empty() || end.is_empty() {
        return Err(invalid_filter_value());
    }
    Ok(Some((start, end)))
}

fn is_orderable_column_type(column_type: &ColumnType) -> bool {
    crate::db::dao::base::is_numeric_column_type(column_type)
        || matches!(
            column_type,
            ColumnType::DateTime
                | ColumnType::Timestamp
                | ColumnType::TimestampWithTimeZone
                | ColumnType::Time
                | ColumnType::Date
                | ColumnType::Year
        )
}

fn parse_non_string_filter(raw: &str, column_type: &ColumnType) -> Result<FilterOp, AppError> {
    let raw = raw.trim();
    if raw.is_empty() || raw.contains('*') {
        return Err(invalid_filter_value());
    }

    if let Some((op, rest)) = parse_comparison(raw) {
        if rest.is_empty() || !is_orderable_column_type(column_type) {
            return Err(invalid_filter());
        }
        let value = parse_value_by_column_type(rest, column_type)?;
        return Ok(FilterOp::Compare { op, value });
    }

    if let Some((start, end)) = parse_range(raw)? {
        if !is_orderable_column_type(column_type) {
            return Err(invalid_filter());
        }
        return Ok(FilterOp::Between {
            min: parse_value_by_column_type(start, column_type)?,
            max: parse_value_by_column_type(end, column_type)?,
        });
    }

    Ok(FilterOp::Eq(parse_value_by_column_type(raw, column_type)?))
}

fn is_string_column_type(column_type: &ColumnType) -> bool {
    matches!(
        column_type,
        ColumnType::Char(_) | ColumnType::String(_) | ColumnType::Text | ColumnType::Enum { .. }
    )
}

fn parse_value_by_column_type(raw: &str, column_type: &ColumnType) -> Result<QueryValue, AppError> {
    if raw.trim().eq_ignore_ascii_case("null") {
        return Err(invalid_filter_value());
    }

    let value = match column_type {
        ColumnType::String(_) | ColumnType::Text => QueryValue::String(Some(raw.to_string())),
        ColumnType::SmallInteger => QueryValue::SmallInt(Some(parse_number::<i16>(raw)?)),
        ColumnType::Integer | ColumnType::Year => QueryValue::Int(Some(parse_number::<i32>(raw)?)),
        ColumnType::BigInteger => QueryValue::BigInt(Some(parse_number::<i64>(raw)?)),
        ColumnType::Float => QueryValue::Float(Some(parse_number::<f32>(raw)?)),
        ColumnType::Double | ColumnType::Decimal(_) | ColumnType::Money(_) => {
            QueryValue::Double(Some(parse_number::<f64>(raw)?))
        }
        ColumnType::DateTime | ColumnType::Timestamp => {
            QueryValue::ChronoDateTime(Some(parse_naive_datetime(raw)?))
        }
        ColumnType::TimestampWithTimeZone => {
            QueryValue::ChronoDateTimeWithTimeZone(Some(parse_datetime_with_tz(raw)?))
        }
        ColumnType::Time => QueryValue::ChronoTime(Some(parse_time(raw)?)),
        ColumnType::Date => QueryValue::ChronoDate(Some(parse_date(raw)?)),
        ColumnType::Boolean => QueryValue::Bool(Some(parse_bool(raw)?)),
        ColumnType::Json | ColumnType::JsonBinary => {
            QueryValue::Json(Some(Box::new(parse_json(raw)?)))
        }
        ColumnType::Uuid => {
            QueryValue::Uuid(Some(Uuid::parse_str(raw.trim()).map_err(invalid_filter_value_with)?))
        }
        ColumnType::Enum { variants, .. } => {
            let raw = raw.trim();
            if !variants.iter().any(|variant| variant.to_string() == raw) {
                return Err(invalid_filter_value());
            }
            QueryValue::String(Some(raw.to_string()))
        }
        _ => return Err(invalid_filter()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeMap, HashMap};

    use sea_orm::entity::prelude::*;
    use sea_orm::{DatabaseBackend, DatabaseConnection, DbErr, MockDatabase, MockExecResult, Set};
    use uuid::Uuid;

    use crate::db::dao::{
        DaoBase, DaoLayerError, HasIdActiveModel, HasTimestampColumns, TimestampedActiveModel,
    };
    use crate::error::AppError;
    use crate::test_helpers::fixtures::ts;

    use super::{CompareOp, CrudErrors, CrudOp, CrudService, FilterOp, QueryValue};

    mod shift_entity {
        use sea_orm::entity::prelude::*;

        #[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
        #[sea_orm(table_name = "test_shift_records")]
        pub struct Model {
            #[sea_orm(primary_key, auto_increment = false)]
            pub id: uuid::Uuid,
            pub created_at: DateTimeWithTimeZone,
            pub updated_at: DateTimeWithTimeZone,
            pub label: String,
            pub units: i32,
            pub hours: f64,
            pub approved: bool,
            pub badge_id: uuid::Uuid,
            pub started_at: DateTimeWithTimeZone,
        }

        #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
        pub enum Relation {}

        impl ActiveModelBehavior for ActiveModel {}
    }

    impl HasTimestampColumns for shift_entity::Entity {
        fn created_at_column() -> Self::Column {
            shift_entity::Column::CreatedAt
        }

        fn updated_at_column() -> Self::Column {
            shift_entity::Column::UpdatedAt
        }
    }

    impl HasIdActiveModel for shift_entity::ActiveModel {
        fn set_id(&mut self, id: Uuid) {
            self.id = Set(id);
        }
    }

    impl TimestampedActiveModel for shift_entity::ActiveModel {
        fn set_created_at(&mut self, ts: DateTimeWithTimeZone) {
            self.created_at = Set(ts);
        }

        fn set_updated_at(&mut self, ts: DateTimeWithTimeZone) {
            self.updated_at = Set(ts);
        }
    }

    #[derive(Clone)]
    struct ShiftDao {
        db: DatabaseConnection,
    }

    impl DaoBase for ShiftDao {
        type Entity = shift_entity::Entity;

        fn new(db: &DatabaseConnection) -> Self {
            Self { db: db.clone() }
        }

        fn db(&self) -> &DatabaseConnection {
            &self.db
        }
    }

    #[derive(Clone)]
    struct ShiftService {
        dao: ShiftDao,
        deny: &'static [&'static str],
        errors: CrudErrors,
    }

    #[async_trait::async_trait]
    impl CrudService for ShiftService {
        type Dao = ShiftDao;

        fn dao(&self) -> &Self::Dao {
            &self.dao
        }

        fn hidden_columns(&self) -> &'static [&'static str] {
            self.deny
        }

        fn errors(&self) -> CrudErrors {
            self.errors
        }
    }

    struct ShiftServiceBuilder {
        mock: MockDatabase,
        service: ShiftService,
    }

    impl ShiftServiceBuilder {
        fn new() -> Self {
            let mock = MockDatabase::new(DatabaseBackend::Postgres);
            let placeholder = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
            Self {
                mock,
                service: ShiftService {
                    dao: ShiftDao::new(&placeholder),
                    deny: &[],
                    errors: CrudErrors::default(),
                },
            }
        }

        fn deny(mut self, deny: &'static [&'static str]) -> Self {
            self.service.deny = deny;
            self
        }

        fn errors(mut self, errors: CrudErrors) -> Self {
            self.service.errors = errors;
            self
        }

        fn rows(mut self, rows: Vec<shift_entity::Model>) -> Self {
            self.mock = self.mock.append_query_results([rows]);
            self
        }

        fn counted(mut self, count: i64) -> Self {
            let count = sea_orm::Value::BigInt(Some(count));
            let row = BTreeMap::from([("count".to_string(), count)]);
            self.mock = self.mock.append_query_results([vec![row]]);
            self
        }

        fn query_error(mut self, error: DbErr) -> Self {
            self.mock = self.mock.append_query_errors([error]);
            self
        }

        fn exec(mut self, rows_affected: u64) -> Self {
            self.mock = self.mock.append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected,
            }]);
            self
        }

        fn build(self) -> ShiftService {
            let db = self.mock.into_connection();
            ShiftService {
                dao: ShiftDao::new(&db),
                ..self.service
            }
        }
    }

    fn shift(id: Uuid, label: &str, units: i32) -> shift_entity::Model {
        shift_entity::Model {
            id,
            created_at: ts(),
            updated_at: ts(),
            label: label.to_string(),
            units,
            hours: 7.5,
            approved: false,
            badge_id: Uuid::new_v4(),
            started_at: ts(),
        }
    }

    fn new_shift(label: &str) -> shift_entity::ActiveModel {
        shift_entity::ActiveModel {
            label: Set(label.to_string()),
            units: Set(0),
            hours: Set(0.0),
            approved: Set(false),
            badge_id: Set(Uuid::new_v4()),
            started_at: Set(ts()),
            ..Default::default()
        }
    }

    fn filters(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
            .collect()
    }

    fn first_op(service: &ShiftService, key: &str, value: &str) -> FilterOp {
        service
            .build_column_filters(filters(&[(key, value)]))
            .expect("filter should parse")
            .remove(0)
            .op
    }

    fn filter_error(service: &ShiftService, key: &str, value: &str) -> String {
        service
            .build_column_filters(filters(&[(key, value)]))
            .expect_err("filter should be rejected")
            .message()
            .to_string()
    }

    #[tokio::test]
    async fn create_returns_inserted_model() {
        let id = Uuid::new_v4();
        let service = ShiftServiceBuilder::new()
            .rows(vec![shift(id, "early", 0)])
            .build();

        let created = service
            .create(new_shift("early"))
            .await
            .expect("create should succeed");

        assert_eq!(created.id, id);
    }

    #[tokio::test]
    async fn create_failure_hides_database_error() {
        let service = ShiftServiceBuilder::new()
            .query_error(DbErr::Custom("insert failed".to_string()))
            .build();

        let err = service
            .create(new_shift("early"))
            .await
            .expect_err("create should fail");

        assert_eq!(
            err.message(),
            "Create failed. Please check the logs for more details"
        );
        assert!(err.source_message().is_some());
    }

    #[tokio::test]
    async fn missing_row_uses_service_not_found_message() {
        let service = ShiftServiceBuilder::new()
            .errors(CrudErrors {
                not_found: "Shift not found",
                ..CrudErrors::default()
            })
            .rows(Vec::new())
            .build();

        let err = service
            .find_by_id(Uuid::new_v4())
            .await
            .expect_err("lookup should fail");

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "Shift not found");
    }

    #[tokio::test]
    async fn find_rejects_page_zero_without_querying() {
        let service = ShiftServiceBuilder::new().build();

        let err = service
            .find(0, 10, None, |query| query)
            .await
            .expect_err("find should fail");

        assert_eq!(err.message(), "Invalid pagination: page=0 page_size=10");
    }

    #[tokio::test]
    async fn find_with_filters_rejects_unknown_key_before_querying() {
        let service = ShiftServiceBuilder::new().build();

        let err = service
            .find_with_filters(1, 10, None, filters(&[("nope", "1")]), |query| query)
            .await
            .expect_err("unknown filter should fail");

        assert_eq!(err.message(), "Invalid filter");
    }

    #[tokio::test]
    async fn find_with_filters_returns_page() {
        let service = ShiftServiceBuilder::new()
            .rows(vec![shift(Uuid::new_v4(), "late", 4)])
            .build();

        let page = service
            .find_with_filters(1, 10, None, filters(&[("units", ">=4")]), |query| query)
            .await
            .expect("filtered find should succeed");

        assert_eq!(page.data.len(), 1);
        assert!(!page.has_next);
    }

    #[tokio::test]
    async fn update_reads_then_writes() {
        let id = Uuid::new_v4();
        let service = ShiftServiceBuilder::new()
            .rows(vec![shift(id, "before", 1)])
            .rows(vec![shift(id, "after", 1)])
            .build();

        let updated = service
            .update(id, |active| {
                active.label = Set("after".to_string());
            })
            .await
            .expect("update should succeed");

        assert_eq!(updated.label, "after");
    }

    #[tokio::test]
    async fn delete_of_missing_row_is_not_found() {
        let service = ShiftServiceBuilder::new().exec(0).build();

        let err = service
            .delete(Uuid::new_v4())
            .await
            .expect_err("delete should fail");

        assert_eq!(err.message(), "Resource not found");
    }

    #[tokio::test]
    async fn delete_succeeds_when_a_row_is_removed() {
        let service = ShiftServiceBuilder::new().exec(1).build();

        assert!(service.delete(Uuid::new_v4()).await.is_ok());
    }

    #[tokio::test]
    async fn aggregate_of_text_column_is_a_count() {
        let service = ShiftServiceBuilder::new().counted(7).build();

        let result = service
            .aggregate("label", HashMap::new())
            .await
            .expect("text column should be counted");

        assert_eq!(result.count, 7);
        assert_eq!(result.avg, None);
    }

    #[tokio::test]
    async fn aggregate_rejects_denied_column() {
        let service = ShiftServiceBuilder::new().deny(&["units"]).build();

        let err = service
            .aggregate("units", HashMap::new())
            .await
            .expect_err("denied column should fail");

        assert_eq!(err.message(), "Invalid column");
    }

    #[test]
    fn unique_violation_maps_to_conflict_message() {
        let service = ShiftServiceBuilder::new()
            .errors(CrudErrors {
                conflict: "Shift label already taken",
                ..CrudErrors::default()
            })
            .build();

        let err = service.map_error(
            CrudOp::Create,
            DaoLayerError::UniqueViolation("duplicate key".to_string()),
        );

        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(err.message(), "Shift label already taken");
    }

    #[test]
    fn update_failure_uses_custom_context() {
        let service = ShiftServiceBuilder::new()
            .errors(CrudErrors {
                update_failed: "Shift update failed",
                ..CrudErrors::default()
            })
            .build();

        let err = service.map_error(CrudOp::Update, DaoLayerError::Db(DbErr::Custom("x".into())));

        assert_eq!(
            err.message(),
            "Shift update failed. Please check the logs for more details"
        );
    }

    #[test]
    fn hidden_columns_cannot_be_filtered() {
        let service = ShiftServiceBuilder::new().deny(&["badge_id"]).build();

        assert_eq!(
            filter_error(&service, "badge_id", &Uuid::new_v4().to_string()),
            "Invalid filter"
        );
        assert!(matches!(first_op(&service, "label", "night"), FilterOp::Eq(_)));
    }

    #[test]
    fn wildcards_become_escaped_like_patterns() {
        let service = ShiftServiceBuilder::new().build();

        assert!(matches!(
            first_op(&service, "label", "*night*"),
            FilterOp::Like { pattern, .. } if pattern == "%night%"
        ));
        assert!(matches!(
            first_op(&service, "label", "ni*"),
            FilterOp::Like { pattern, .. } if pattern == "ni%"
        ));
        assert!(matches!(
            first_op(&service, "label", "*50%_off"),
            FilterOp::Like { pattern, .. } if pattern == "%50\\%\\_off"
        ));
        assert_eq!(filter_error(&service, "label", "a*b"), "Invalid filter value");
        assert_eq!(filter_error(&service, "label", "*"), "Invalid filter value");
    }

    #[test]
    fn orderable_columns_accept_comparisons_and_ranges() {
        let service = ShiftServiceBuilder::new().build();

        assert!(matches!(
            first_op(&service, "units", "<= 12"),
            FilterOp::Compare {
                op: CompareOp::Lte,
                value: QueryValue::Int(Some(12))
            }
        ));
        assert!(matches!(
            first_op(&service, "hours", "4..8.5"),
            FilterOp::Between {
                min: QueryValue::Double(Some(_)),
                max: QueryValue::Double(Some(_))
            }
        ));
        assert!(matches!(
            first_op(&service, "started_at", ">2026-01-01"),
            FilterOp::Compare {
                op: CompareOp::Gt,
                value: QueryValue::ChronoDateTimeWithTimeZone(Some(_))
            }
        ));
        assert_eq!(filter_error(&service, "units", "1..2..3"), "Invalid filter value");
    }

    #[test]
    fn non_orderable_columns_reject_comparisons() {
        let service = ShiftServiceBuilder::new().build();

        assert_eq!(filter_error(&service, "approved", ">true"), "Invalid filter");
        assert_eq!(
            filter_error(&service, "badge_id", "1..2"),
            "Invalid filter"
        );
    }

    #[test]
    fn equality_values_parse_by_column_type() {
        let service = ShiftServiceBuilder::new().build();
        let badge = Uuid::new_v4();

        assert!(matches!(
            first_op(&service, "approved", "yes"),
            FilterOp::Eq(QueryValue::Bool(Some(true)))
        ));
        assert!(matches!(
            first_op(&service, "badge_id", &badge.to_string()),
            FilterOp::Eq(QueryValue::Uuid(Some(value))) if value == badge
        ));
        assert!(
            filter_error(&service, "badge_id", "not-a-uuid").starts_with("Invalid filter value:")
        );
        assert_eq!(filter_error(&service, "units", "null"), "Invalid filter value");
    }
}
