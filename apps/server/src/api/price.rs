use std::sync::Arc;

use axum::{extract::State, Json};
use pricefeed_core::prices::PriceSnapshot;

use crate::main_lib::AppState;

/// Latest prices, or a soft error marker. Always 200.
pub async fn get_price(State(state): State<Arc<AppState>>) -> Json<PriceSnapshot> {
    Json(state.price_service.get_prices().await)
}
