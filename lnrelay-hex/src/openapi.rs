//! OpenAPI specification and documentation.

#![allow(dead_code)] // Path functions are only used by utoipa for documentation generation

use lnrelay_types::HealthStatus;
use lnrelay_types::dto::{
    ConversionQuery, ConversionResponse, ErrorResponse, HealthQuery, HealthResponse,
    NwcPaymentRequest, NwcPaymentResponse,
};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

// Dummy functions to generate path documentation
// These are not the actual handlers, just for OpenAPI path generation

/// Wallet reachability
///
/// Probes one wallet, or every registered wallet when `wallet_id` is omitted.
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    params(HealthQuery),
    responses(
        (status = 200, description = "Reachability report", body = HealthResponse),
        (status = 404, description = "Unknown wallet", body = ErrorResponse)
    )
)]
async fn health() {}

/// Relay a euro payment between two wallets
#[utoipa::path(
    post,
    path = "/nwc_payment",
    tag = "payments",
    request_body = NwcPaymentRequest,
    security(("api_key" = []), ("api_key_query" = [])),
    responses(
        (status = 200, description = "Payment settled", body = NwcPaymentResponse),
        (status = 400, description = "Invalid amount, insufficient funds or same wallet", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 404, description = "Unknown sender or recipient", body = ErrorResponse),
        (status = 429, description = "Rate limit exceeded"),
        (status = 502, description = "Price oracle or wallet failure", body = ErrorResponse),
        (status = 504, description = "Relay did not finish in time", body = ErrorResponse)
    )
)]
async fn nwc_payment() {}

/// Convert euros to millisatoshis at the current rate
#[utoipa::path(
    get,
    path = "/convert/eur-to-msats",
    tag = "payments",
    params(ConversionQuery),
    security(("api_key" = []), ("api_key_query" = [])),
    responses(
        (status = 200, description = "Converted amount", body = ConversionResponse),
        (status = 400, description = "Missing or malformed amount", body = ErrorResponse),
        (status = 401, description = "Missing or invalid API key", body = ErrorResponse),
        (status = 502, description = "Price oracle failure", body = ErrorResponse)
    )
)]
async fn convert_eur_to_msats() {}

/// OpenAPI documentation for the relay API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Lightning Payment Relay API",
        version = "1.0.0",
        description = "Relays euro-denominated payments between Nostr Wallet Connect wallets.\n\n## Authentication\n\nPayment and conversion endpoints need the server's API key, either as a header or as the `api_key` query parameter:\n\n```\nX-API-Key: your_api_key_here\n```",
        license(name = "MIT"),
    ),
    paths(health, nwc_payment, convert_eur_to_msats),
    components(
        schemas(
            NwcPaymentRequest,
            NwcPaymentResponse,
            ConversionResponse,
            HealthResponse,
            HealthStatus,
            ErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "health", description = "Wallet health checks"),
        (name = "payments", description = "Payment relay and conversion"),
    )
)]
pub struct ApiDoc;

/// Security schemes for the API key.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-API-Key"))),
            );
            components.add_security_scheme(
                "api_key_query",
                SecurityScheme::ApiKey(ApiKey::Query(ApiKeyValue::new("api_key"))),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_routes_and_schemes() {
        let doc = ApiDoc::openapi();

        for path in ["/health", "/nwc_payment", "/convert/eur-to-msats"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let schemes = &doc.components.as_ref().unwrap().security_schemes;
        assert!(schemes.contains_key("api_key"));
        assert!(schemes.contains_key("api_key_query"));
    }
}
