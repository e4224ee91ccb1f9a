use axum::{
    Router,
    extract::Request,
    response::Response,
    routing::{MethodRouter, Route},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, TryIntoModel};
use std::{collections::HashMap, convert::Infallible, sync::Arc};
use tower::{Layer, Service, util::BoxCloneSyncServiceLayer};

use super::base_api_router::{
    ActiveModelOf, BaseApiRouter, ColumnOf, DEFAULT_ALLOWED_METHODS, ModelOf,
};
use crate::{
    auth::RequiredRole, middleware::RequireRoleLayer, services::crud_service::CrudService,
    state::AppState,
};

pub use super::base_api_router::Method;

type MethodLayer = BoxCloneSyncServiceLayer<Route<Infallible>, Request, Response, Infallible>;

/// Generic `/api/v1/<model>` router over any [`CrudService`].
pub struct CrudApiRouter<S> {
    service: S,
    base_path: &'static str,
    allowed_methods: Vec<Method>,
    method_middlewares: HashMap<Method, Vec<MethodLayer>>,
}

impl<S> CrudApiRouter<S> {
    pub fn new(service: S, base_path: &'static str) -> Self {
        Self {
            service,
            base_path,
            allowed_methods: DEFAULT_ALLOWED_METHODS.to_vec(),
            method_middlewares: HashMap::new(),
        }
    }

    pub fn set_allowed_methods(mut self, methods: &[Method]) -> Self {
        self.allowed_methods = methods.to_vec();
        self
    }

    pub fn set_method_middleware<L>(mut self, method: Method, layer: L) -> Self
    where
        L: Layer<Route<Infallible>> + Clone + Send + Sync + 'static,
        L::Service: Service<Request, Response = Response, Error = Infallible>
            + Clone
            + Send
            + Sync
            + 'static,
        <L::Service as Service<Request>>::Future: Send + 'static,
    {
        self.method_middlewares
            .entry(method)
            .or_default()
            .push(BoxCloneSyncServiceLayer::new(layer));
        self
    }

    /// Guards reads with `R` and writes with `W`.
    pub fn with_roles<R, W>(self, state: &Arc<AppState>) -> Self
    where
        R: RequiredRole,
        W: RequiredRole,
    {
        let methods = self.allowed_methods.clone();
        methods.into_iter().fold(self, |router, method| {
            let allowed = if method.is_read() {
                R::allowed()
            } else {
                W::allowed()
            };
            router.set_method_middleware(method, RequireRoleLayer::new(Arc::clone(state), allowed))
        })
    }
}

impl<S> CrudApiRouter<S>
where
    S: CrudService + Clone + Send + Sync + 'static,
    ActiveModelOf<S>: ActiveModelTrait + TryIntoModel<ModelOf<S>>,
    ModelOf<S>: for<'de> serde::Deserialize<'de> + serde::Serialize,
    ModelOf<S>: sea_orm::IntoActiveModel<ActiveModelOf<S>>,
    ColumnOf<S>: ColumnTrait + Copy,
{
    pub fn router<State>(self) -> Router<State>
    where
        State: Clone + Send + Sync + 'static,
    {
        BaseApiRouter::router_for(&self)
    }
}

impl<S> BaseApiRouter for CrudApiRouter<S>
where
    S: CrudService + Clone + Send + Sync + 'static,
    ActiveModelOf<S>: ActiveModelTrait + TryIntoModel<ModelOf<S>>,
    ModelOf<S>: for<'de> serde::Deserialize<'de> + serde::Serialize,
    ModelOf<S>: sea_orm::IntoActiveModel<ActiveModelOf<S>>,
    ColumnOf<S>: ColumnTrait + Copy,
{
    type Service = S;

    fn service(&self) -> Self::Service {
        self.service.clone()
    }

    fn base_path(&self) -> &'static str {
        self.base_path
    }

    fn allowed_methods(&self) -> &[Method] {
        self.allowed_methods.as_slice()
    }

    fn apply_method_middleware<State>(
        &self,
        method: Method,
        route: MethodRouter<State>,
    ) -> MethodRouter<State>
    where
        State: Clone + Send + Sync + 'static,
    {
        match self.method_middlewares.get(&method) {
            Some(layers) => layers
                .iter()
                .fold(route, |route, layer| route.route_layer(layer.clone())),
            None => route,
        }
    }
}
