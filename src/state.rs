use std::{convert::Infallible, sync::Arc};

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::infrastructure::{CommandContext, CommandStore};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CommandStore>,
    pub development: bool,
}

impl AppState {
    pub fn new(store: Arc<dyn CommandStore>) -> Self {
        Self {
            store,
            development: false,
        }
    }

    pub fn with_development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }
}

/// Every request gets its own unit of work over the shared store.
impl FromRequestParts<AppState> for CommandContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(CommandContext::new(state.store.clone()))
    }
}
