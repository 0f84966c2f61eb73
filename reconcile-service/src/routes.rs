use actix_web::{get, post, web, HttpRequest, HttpResponse};
use serde_json::Value;

use reconcile_core::{hmac, PaymentFilter, PaymentStatus, ReconcileError};

use crate::metrics;
use crate::pagination::{paginate, PageParams};
use crate::state::AppState;
use crate::webhook::{self, IngestOutcome, PaymentCreatedPayload, TransactionSettledPayload};

const SIGNATURE_HEADER: &str = "X-Webhook-Signature";

/// Verifies the webhook signature over the raw JSON body. The caller
/// must pass the parsed [`serde_json::Value`] of the same bytes that
/// were signed — canonicalization happens on that value, not on the
/// wire bytes, so whitespace in the request body never matters.
fn validate_signature(req: &HttpRequest, payload: &Value, state: &AppState) -> Result<(), HttpResponse> {
    let header_value = req
        .headers()
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match header_value {
        Some(sig) if hmac::verify_signature(state.settings.webhook_secret.as_bytes(), payload, sig) => {
            Ok(())
        }
        Some(_) => {
            tracing::warn!("webhook signature mismatch");
            metrics::HMAC_FAILURES.with_label_values(&["invalid"]).inc();
            Err(HttpResponse::Unauthorized().json(serde_json::json!({
                "detail": "Invalid webhook signature"
            })))
        }
        None => {
            tracing::warn!("webhook signature header missing");
            metrics::HMAC_FAILURES.with_label_values(&["missing"]).inc();
            Err(HttpResponse::Unauthorized().json(serde_json::json!({
                "detail": "Invalid webhook signature"
            })))
        }
    }
}

fn error_response(err: ReconcileError) -> HttpResponse {
    match err {
        ReconcileError::InvalidSignature => {
            HttpResponse::Unauthorized().json(serde_json::json!({"detail": err.to_string()}))
        }
        ReconcileError::ValidationError(_) | ReconcileError::SerdeError(_) => {
            HttpResponse::UnprocessableEntity().json(serde_json::json!({"detail": err.to_string()}))
        }
        ReconcileError::PaymentNotFound => {
            HttpResponse::NotFound().json(serde_json::json!({"detail": "Payment not found"}))
        }
        ReconcileError::StorageFailure(_) => {
            tracing::error!(error = %err, "internal error handling webhook");
            HttpResponse::InternalServerError().json(serde_json::json!({"detail": "internal error"}))
        }
    }
}

#[get("/")]
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "reconciliation-service",
    }))
}

#[get("/metrics")]
pub async fn metrics_endpoint() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(metrics::metrics_output())
}

#[post("/payments")]
pub async fn payment_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let start = std::time::Instant::now();

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["payment", "invalid"])
                .inc();
            return error_response(ReconcileError::SerdeError(e));
        }
    };

    if let Err(resp) = validate_signature(&req, &raw, &state) {
        metrics::WEBHOOK_REQUESTS
            .with_label_values(&["payment", "unauthorized"])
            .inc();
        return resp;
    }

    let payload: PaymentCreatedPayload = match serde_json::from_value(raw) {
        Ok(p) => p,
        Err(e) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["payment", "invalid"])
                .inc();
            return error_response(ReconcileError::SerdeError(e));
        }
    };

    let result = webhook::ingest_payment(
        state.repository.as_ref(),
        payload,
        state.settings.fee_tolerance_percent,
    );
    metrics::RECONCILE_LATENCY
        .with_label_values(&["payment"])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => {
            let label = match outcome {
                IngestOutcome::Stored => "accepted",
                IngestOutcome::Duplicate => "duplicate",
            };
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["payment", label])
                .inc();
            HttpResponse::Ok().finish()
        }
        Err(e) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["payment", "error"])
                .inc();
            error_response(e)
        }
    }
}

#[post("/transactions")]
pub async fn transaction_webhook(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Bytes,
) -> HttpResponse {
    let start = std::time::Instant::now();

    let raw: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["transaction", "invalid"])
                .inc();
            return error_response(ReconcileError::SerdeError(e));
        }
    };

    if let Err(resp) = validate_signature(&req, &raw, &state) {
        metrics::WEBHOOK_REQUESTS
            .with_label_values(&["transaction", "unauthorized"])
            .inc();
        return resp;
    }

    let payload: TransactionSettledPayload = match serde_json::from_value(raw) {
        Ok(p) => p,
        Err(e) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["transaction", "invalid"])
                .inc();
            return error_response(ReconcileError::SerdeError(e));
        }
    };

    let result = webhook::ingest_transaction(
        state.repository.as_ref(),
        payload,
        state.settings.fee_tolerance_percent,
    );
    metrics::RECONCILE_LATENCY
        .with_label_values(&["transaction"])
        .observe(start.elapsed().as_secs_f64());

    match result {
        Ok(outcome) => {
            let label = match outcome {
                IngestOutcome::Stored => "accepted",
                IngestOutcome::Duplicate => "duplicate",
            };
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["transaction", label])
                .inc();
            HttpResponse::Ok().finish()
        }
        Err(e) => {
            metrics::WEBHOOK_REQUESTS
                .with_label_values(&["transaction", "error"])
                .inc();
            error_response(e)
        }
    }
}

#[derive(serde::Deserialize)]
pub struct PaymentsQuery {
    pub currency: Option<String>,
    pub status: Option<PaymentStatus>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

#[get("/payments/")]
pub async fn list_payments(
    state: web::Data<AppState>,
    query: web::Query<PaymentsQuery>,
) -> HttpResponse {
    let status_in = query.status.map(|s| [s]);
    let filter = PaymentFilter {
        currency: query.currency.as_deref(),
        status_in: status_in.as_ref().map(|s| s.as_slice()),
    };

    match state.repository.get_all_payments(filter) {
        Ok(payments) => {
            let page = paginate(
                &payments,
                PageParams {
                    offset: query.offset,
                    limit: query.limit,
                },
            );
            HttpResponse::Ok().json(page)
        }
        Err(e) => error_response(e),
    }
}

#[derive(serde::Serialize)]
struct PaymentDetail {
    #[serde(flatten)]
    payment: reconcile_core::Payment,
    reconciliation_links: Vec<reconcile_core::ReconciliationLink>,
}

#[get("/payments/{payment_id}")]
pub async fn get_payment(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let payment_id = path.into_inner();
    let payment = match state.repository.get_payment(&payment_id) {
        Ok(Some(payment)) => payment,
        Ok(None) => return error_response(ReconcileError::PaymentNotFound),
        Err(e) => return error_response(e),
    };
    match state.repository.get_links_for_payment(&payment_id) {
        Ok(reconciliation_links) => HttpResponse::Ok().json(PaymentDetail {
            payment,
            reconciliation_links,
        }),
        Err(e) => error_response(e),
    }
}
