//! HTTP request handlers.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;

use lnrelay_types::ports::PriceOracle;
use lnrelay_types::{
    AppError, ConversionQuery, ConversionResponse, ErrorResponse, FiatAmount, HealthQuery,
    HealthResponse, NwcPaymentRequest, NwcPaymentResponse, PaymentError, WalletConnector,
    WalletId,
};

use crate::{HealthProbe, PaymentOrchestrator};

/// Default deadline for one relay, from request to settlement.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(120);

/// Application state shared across handlers.
pub struct AppState<C: WalletConnector, O: PriceOracle> {
    pub service: PaymentOrchestrator<C, O>,
    pub health: HealthProbe<C>,
    pub transfer_timeout: Duration,
}

impl<C: WalletConnector, O: PriceOracle> AppState<C, O> {
    pub fn new(service: PaymentOrchestrator<C, O>, health: HealthProbe<C>) -> Self {
        Self {
            service,
            health,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
        }
    }

    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }
}

/// Wrapper to implement IntoResponse for AppError (orphan rule workaround).
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        ApiError(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::BadRequest(_) | AppError::InsufficientFunds { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Upstream(_) => StatusCode::BAD_GATEWAY,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self.0, "request failed");
        } else {
            tracing::debug!(status = status.as_u16(), error = %self.0, "request rejected");
        }

        let body = ErrorResponse {
            error: self.0.to_string(),
            code: status.as_u16(),
        };
        (status, Json(body)).into_response()
    }
}

/// Relay a euro payment between two registered wallets.
///
/// The relay runs on its own task. Dropping the request or passing the
/// transfer deadline cancels it at its next step boundary.
#[tracing::instrument(skip_all)]
pub async fn nwc_payment<C: WalletConnector, O: PriceOracle>(
    State(state): State<Arc<AppState<C, O>>>,
    payload: Result<Json<NwcPaymentRequest>, JsonRejection>,
) -> Result<Json<NwcPaymentResponse>, ApiError> {
    let Json(req) = payload
        .map_err(|e| AppError::BadRequest(format!("invalid request: {}", e.body_text())))?;

    let sender = WalletId::new(&req.sender);
    let recipient = WalletId::new(&req.recipient);
    let fiat = FiatAmount::new(req.euro_amount);
    tracing::info!(%sender, %recipient, %fiat, "relay requested");

    let cancel = CancellationToken::new();
    let _cancel_on_drop = cancel.clone().drop_guard();

    let task = {
        let state = Arc::clone(&state);
        let cancel = cancel.clone();
        tokio::spawn(async move {
            state
                .service
                .transfer_with_cancel(&sender, &recipient, fiat, &cancel)
                .await
        })
    };

    let outcome = match tokio::time::timeout(state.transfer_timeout, task).await {
        Ok(Ok(result)) => result?,
        Ok(Err(e)) => return Err(AppError::Internal(format!("relay task failed: {e}")).into()),
        Err(_) => {
            cancel.cancel();
            return Err(AppError::Timeout(format!(
                "relay did not finish within {}s",
                state.transfer_timeout.as_secs()
            ))
            .into());
        }
    };

    Ok(Json(outcome.into()))
}

/// Quote a euro amount in millisatoshis.
#[tracing::instrument(skip(state))]
pub async fn convert_eur_to_msats<C: WalletConnector, O: PriceOracle>(
    State(state): State<Arc<AppState<C, O>>>,
    Query(query): Query<ConversionQuery>,
) -> Result<Json<ConversionResponse>, ApiError> {
    let raw = query
        .amount
        .filter(|raw| !raw.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("amount parameter is required".into()))?;
    let euro_amount = parse_amount(&raw)
        .ok_or_else(|| AppError::BadRequest("invalid amount format".into()))?;

    let msats = state.service.convert(FiatAmount::new(euro_amount)).await?;

    Ok(Json(ConversionResponse {
        euro_amount,
        msat_amount: msats,
    }))
}

/// Accepts plain decimals as well as float syntax such as `1e-3`.
fn parse_amount(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    Decimal::from_str(raw).ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .and_then(FiatAmount::from_f64)
            .map(|fiat| fiat.eur())
    })
}

/// Wallet reachability. Public.
#[tracing::instrument(skip(state))]
pub async fn health<C: WalletConnector, O: PriceOracle>(
    State(state): State<Arc<AppState<C, O>>>,
    Query(query): Query<HealthQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let target = query
        .wallet_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(WalletId::new);

    let report = state.health.check(target.as_ref()).await?;
    Ok(Json(HealthResponse::from(report)))
}
