use axum::{
    Json, Router,
    extract::rejection::QueryRejection,
    extract::{Path, Query},
    routing::{MethodRouter, delete, get, patch, post},
};
use sea_orm::{
    ActiveModelTrait, ActiveValue, ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable,
    Order, PrimaryKeyToColumn, Select, TryIntoModel,
};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

use super::base_router::BaseRouter;
use crate::{
    db::dao::DaoBase, error::AppError, response::JsonApiResponse,
    services::crud_service::CrudService,
};

pub(crate) type DaoOf<S> = <S as CrudService>::Dao;
pub(crate) type EntityOf<S> = <DaoOf<S> as DaoBase>::Entity;
pub(crate) type ModelOf<S> = <EntityOf<S> as EntityTrait>::Model;
pub(crate) type ActiveModelOf<S> = <EntityOf<S> as EntityTrait>::ActiveModel;
pub(crate) type ColumnOf<S> = <EntityOf<S> as EntityTrait>::Column;

/// `page` and `page_size` plus every other query parameter as a column filter.
#[derive(Clone, Debug, Default)]
pub struct ListQuery {
    pub page: Option<u64>,
    pub page_size: Option<u64>,
    pub filters: HashMap<String, String>,
}

impl ListQuery {
    pub fn from_params(mut params: HashMap<String, String>) -> Result<Self, AppError> {
        let page = take_number(&mut params, "page")?;
        let page_size = take_number(&mut params, "page_size")?;
        Ok(Self {
            page,
            page_size,
            filters: params,
        })
    }
}

fn take_number(params: &mut HashMap<String, String>, key: &str) -> Result<Option<u64>, AppError> {
    params
        .remove(key)
        .map(|raw| {
            raw.trim().parse::<u64>().map_err(|err| {
                AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: {key}: {err}"))
            })
        })
        .transpose()
}

fn take_column(params: &mut HashMap<String, String>) -> Result<String, AppError> {
    params
        .remove("column")
        .filter(|column| !column.trim().is_empty())
        .ok_or_else(|| {
            AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: column is required"))
        })
}

fn query_params(
    query: Result<Query<HashMap<String, String>>, QueryRejection>,
) -> Result<HashMap<String, String>, AppError> {
    query
        .map(|Query(params)| params)
        .map_err(|err| AppError::bad_request(format!("{INVALID_QUERY_MESSAGE}: {err}")))
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Method {
    Create,
    List,
    Get,
    Patch,
    Delete,
    Count,
    Aggregate,
    GroupBy,
}

impl Method {
    pub fn is_read(self) -> bool {
        matches!(
            self,
            Method::List | Method::Get | Method::Count | Method::Aggregate | Method::GroupBy
        )
    }
}

pub(crate) const DEFAULT_ALLOWED_METHODS: [Method; 8] = [
    Method::Create,
    Method::List,
    Method::Get,
    Method::Patch,
    Method::Delete,
    Method::Count,
    Method::Aggregate,
    Method::GroupBy,
];

pub const READ_METHODS: [Method; 5] = [
    Method::List,
    Method::Get,
    Method::Count,
    Method::Aggregate,
    Method::GroupBy,
];

const INVALID_PAYLOAD_MESSAGE: &str = "Invalid payload";
const INVALID_QUERY_MESSAGE: &str = "Invalid query";

// Stand-ins for absent uuid and temporal columns; the columns are reset to
// `NotSet` once the payload is parsed.
fn placeholder_for(column_type: &ColumnType) -> Option<Value> {
    let placeholder = match column_type {
        ColumnType::Uuid => Uuid::nil().to_string(),
        ColumnType::TimestampWithTimeZone => "1970-01-01T00:00:00+00:00".to_string(),
        ColumnType::Timestamp | ColumnType::DateTime => "1970-01-01T00:00:00".to_string(),
        ColumnType::Date => "1970-01-01".to_string(),
        ColumnType::Time => "00:00:00".to_string(),
        _ => return None,
    };
    Some(Value::String(placeholder))
}

#[allow(async_fn_in_trait)]
pub trait BaseApiRouter: BaseRouter
where
    ActiveModelOf<Self::Service>: ActiveModelTrait + TryIntoModel<ModelOf<Self::Service>>,
    ModelOf<Self::Service>: for<'de> serde::Deserialize<'de> + serde::Serialize,
    ModelOf<Self::Service>: sea_orm::IntoActiveModel<ActiveModelOf<Self::Service>>,
    ColumnOf<Self::Service>: ColumnTrait + Copy,
{
    type Service: CrudService + Clone + Send + Sync + 'static;

    fn service(&self) -> Self::Service;
    fn base_path(&self) -> &'static str;

    fn allowed_methods(&self) -> &[Method] {
        &DEFAULT_ALLOWED_METHODS
    }

    fn list_default_page_size() -> u64 {
        25
    }

    fn list_order() -> Option<(ColumnOf<Self::Service>, Order)> {
        None
    }

    fn list_apply(
        _query: &ListQuery,
        select: Select<EntityOf<Self::Service>>,
    ) -> Select<EntityOf<Self::Service>> {
        select
    }

    /// Reads a partial JSON object into an active model where only the keys
    /// present in `payload` are `Set`.
    fn active_from_json(payload: Value) -> Result<ActiveModelOf<Self::Service>, AppError> {
        let Value::Object(mut fields) = payload else {
            return Err(AppError::bad_request(format!(
                "{INVALID_PAYLOAD_MESSAGE}: expected a JSON object"
            )));
        };

        let mut filled = Vec::new();
        for col in ColumnOf::<Self::Service>::iter() {
            let key = col.json_key();
            if fields.contains_key(key) {
                continue;
            }
            if let Some(placeholder) = placeholder_for(col.def().get_column_type()) {
                fields.insert(key.to_owned(), placeholder);
                filled.push(col);
            }
        }

        let mut active = <ActiveModelOf<Self::Service> as ActiveModelTrait>::default();
        active
            .set_from_json(Value::Object(fields))
            .map_err(|err| AppError::bad_request(format!("{INVALID_PAYLOAD_MESSAGE}: {err}")))?;
        for col in filled {
            active.not_set(col);
        }
        Ok(active)
    }

    fn build_create(payload: Value) -> Result<ActiveModelOf<Self::Service>, AppError> {
        Self::active_from_json(payload)
    }

    fn build_update(payload: Value) -> Result<ActiveModelOf<Self::Service>, AppError> {
        Self::active_from_json(payload)
    }

    fn apply_patch(active: &mut ActiveModelOf<Self::Service>, patch: ActiveModelOf<Self::Service>) {
        let primary_keys: Vec<&'static str> =
            <EntityOf<Self::Service> as EntityTrait>::PrimaryKey::iter()
                .map(|pk| pk.into_column().as_str())
                .collect();

        for col in ColumnOf::<Self::Service>::iter() {
            if primary_keys.iter().any(|pk| *pk == col.as_str()) {
                continue;
            }
            match patch.get(col) {
                ActiveValue::Set(value) | ActiveValue::Unchanged(value) => active.set(col, value),
                ActiveValue::NotSet => {}
            }
        }
    }

    fn apply_router_middleware<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
    }

    fn apply_method_middleware<S>(&self, _method: Method, route: MethodRouter<S>) -> MethodRouter<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        route
    }

    fn register_routes<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
    }

    fn router_for<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let base = self.base_path();
        let id_path = format!("{base}/{{id}}");
        let allowed = self.allowed_methods();
        let mut router = Router::<S>::new();

        if allowed.contains(&Method::Create) {
            let route = post({
                let service = self.service();
                move |Json(payload)| async move {
                    let active = Self::build_create(payload)?;
                    let model: ModelOf<Self::Service> = service.create(active).await?;
                    JsonApiResponse::created(model)
                }
            });
            router = router.route(base, self.apply_method_middleware(Method::Create, route));
        }

        if allowed.contains(&Method::List) {
            let route = get({
                let service = self.service();
                move |query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                    let query = ListQuery::from_params(query_params(query)?)?;
                    let page = query.page.unwrap_or(1);
                    let page_size = query.page_size.unwrap_or_else(Self::list_default_page_size);
                    let response = service
                        .find_with_filters(
                            page,
                            page_size,
                            Self::list_order(),
                            query.filters.clone(),
                            |select| Self::list_apply(&query, select),
                        )
                        .await?;
                    JsonApiResponse::ok(response)
                }
            });
            router = router.route(base, self.apply_method_middleware(Method::List, route));
        }

        if allowed.contains(&Method::Count) {
            let route = get({
                let service = self.service();
                move |query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                    let filters = query_params(query)?;
                    let count = service.count(filters).await?;
                    JsonApiResponse::ok(CountResponse { count })
                }
            });
            router = router.route(
                &format!("{base}/count"),
                self.apply_method_middleware(Method::Count, route),
            );
        }

        if allowed.contains(&Method::Aggregate) {
            let route = get({
                let service = self.service();
                move |query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                    let mut filters = query_params(query)?;
                    let column = take_column(&mut filters)?;
                    let result = service.aggregate(&column, filters).await?;
                    JsonApiResponse::ok(result)
                }
            });
            router = router.route(
                &format!("{base}/aggregate"),
                self.apply_method_middleware(Method::Aggregate, route),
            );
        }

        if allowed.contains(&Method::GroupBy) {
            let route = get({
                let service = self.service();
                move |query: Result<Query<HashMap<String, String>>, QueryRejection>| async move {
                    let mut filters = query_params(query)?;
                    let column = take_column(&mut filters)?;
                    let groups = service.group_by(&column, filters).await?;
                    JsonApiResponse::ok(groups)
                }
            });
            router = router.route(
                &format!("{base}/group-by"),
                self.apply_method_middleware(Method::GroupBy, route),
            );
        }

        if allowed.contains(&Method::Get) {
            let route = get({
                let service = self.service();
                move |Path(id): Path<Uuid>| async move {
                    let model: ModelOf<Self::Service> = service.find_by_id(id).await?;
                    JsonApiResponse::ok(model)
                }
            });
            router = router.route(&id_path, self.apply_method_middleware(Method::Get, route));
        }

        if allowed.contains(&Method::Patch) {
            let route = patch({
                let service = self.service();
                move |Path(id): Path<Uuid>, Json(payload)| async move {
                    let patch = Self::build_update(payload)?;
                    let model: ModelOf<Self::Service> = service
                        .update(id, move |active| Self::apply_patch(active, patch))
                        .await?;
                    JsonApiResponse::ok(model)
                }
            });
            router = router.route(&id_path, self.apply_method_middleware(Method::Patch, route));
        }

        if allowed.contains(&Method::Delete) {
            let route = delete({
                let service = self.service();
                move |Path(id): Path<Uuid>| async move {
                    service.delete(id).await?;
                    JsonApiResponse::deleted()
                }
            });
            router = router.route(
                &id_path,
                self.apply_method_middleware(Method::Delete, route),
            );
        }

        let router = self.register_routes(router);
        <Self as BaseApiRouter>::apply_router_middleware(self, router)
    }
}

impl<T> BaseRouter for T
where
    T: BaseApiRouter,
{
    fn apply_router_middleware<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        <T as BaseApiRouter>::apply_router_middleware(self, router)
    }

    fn router_for<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        <T as BaseApiRouter>::router_for(self)
    }
}
