use std::sync::Arc;

use crate::engine::AppShared;
use crate::error::BoxError;
use crate::exchange::Exchange;
use crate::filter::FilterChain;
use crate::http::StatusCode;
use crate::log::{debug, warning};
use crate::route::RouteDecision;

/// Run one exchange through the filter chain and its handler.
///
/// Always ends the response and destroys the exchange, whatever the chain
/// did.
pub(crate) async fn run(mut exchange: Exchange, app: Arc<AppShared>) {
    if let Err(_err) = run_chain(&mut exchange, &app).await {
        warning!("handler error: {_err}");
        let response = exchange.response_mut();
        if response.is_committed() {
            // the head is out, nothing sensible can be sent anymore
            response.abort();
        } else {
            let _ = response.send_error(StatusCode::INTERNAL_SERVER_ERROR).await;
        }
    }
    let _ = exchange.response_mut().finish().await;
    exchange.destroy();
}

async fn run_chain(exchange: &mut Exchange, app: &AppShared) -> Result<(), BoxError> {
    let table = app.routes.load();
    match table.resolve(exchange.request().path()) {
        RouteDecision::Match { handler, handler_id: _id } => {
            debug!("{} -> {_id}", exchange.request().path());
            FilterChain::new(app.filters.clone(), handler).next(exchange).await
        }
        RouteDecision::RedirectRoot => {
            let location = format!("{}/", table.context_path());
            exchange.response_mut().send_redirect(&location).await?;
            Ok(())
        }
        RouteDecision::NotFound => {
            exchange.response_mut().send_error(StatusCode::NOT_FOUND).await?;
            Ok(())
        }
    }
}
