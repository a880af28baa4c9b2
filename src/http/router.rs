//! Route table.

use axum::middleware::from_fn_with_state;
use axum::routing::{delete, get, post, put, MethodRouter};
use axum::Router;
use std::sync::Arc;

use super::handlers;
use super::middleware::{admit, RouteGuard};
use crate::ratelimit::AdmissionControl;
use crate::store::BookStore;

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookStore>,
    pub admission: Arc<AdmissionControl>,
}

impl AppState {
    pub fn new(store: Arc<dyn BookStore>, admission: Arc<AdmissionControl>) -> Self {
        Self { store, admission }
    }
}

/// Wrap a method router in admission control under the name `route`.
fn guarded(
    route: &'static str,
    admission: &Arc<AdmissionControl>,
    method_router: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    let guard = RouteGuard::new(route, Arc::clone(admission));
    method_router.route_layer(from_fn_with_state(guard, admit))
}

/// Build the service router. Every book route gets its own guard named after
/// its handler; `/hello` is left unguarded.
pub fn router(state: AppState) -> Router {
    let admission = &state.admission;

    Router::new()
        .route("/hello", get(handlers::hello))
        .route(
            "/books",
            guarded("list_books", admission, get(handlers::list_books)),
        )
        .route(
            "/books/create",
            guarded("create_book", admission, post(handlers::create_book)),
        )
        .route(
            "/books/{id}",
            guarded("get_book", admission, get(handlers::get_book))
                .merge(guarded("update_book", admission, put(handlers::update_book)))
                .merge(guarded("delete_book", admission, delete(handlers::delete_book))),
        )
        .with_state(state)
}
