use axum::Router;

/// A resource that knows how to mount itself into an axum router.
pub trait BaseRouter {
    fn apply_router_middleware<S>(&self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
    }

    fn router_for<S>(&self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static;
}
