use crate::db::BookingStore;
use crate::errors::AppError;
use crate::models::{BookingStatus, Verification};

use super::payment::PaymentGateway;

#[derive(Debug, Clone)]
pub struct Reconciliation {
    pub success: bool,
    pub verification: Verification,
    pub booking_ref: Option<String>,
    /// Status of the booking after reconciliation, when it could be read.
    pub booking_status: Option<BookingStatus>,
    /// True only for the call that actually moved the booking to `paid`.
    pub updated: bool,
}

/// Checks a charge with the gateway and marks its booking paid.
///
/// Safe to repeat: a booking that is already `paid` is left alone. Store-side
/// anomalies after a successful charge are logged rather than failing the
/// caller, because the money has moved either way.
pub async fn reconcile(
    store: &BookingStore,
    gateway: &dyn PaymentGateway,
    reference: &str,
) -> Result<Reconciliation, AppError> {
    let verification = gateway.verify(reference).await?;
    let success = verification.is_success();
    let booking_ref = verification.booking_ref();

    let mut outcome = Reconciliation {
        success,
        booking_ref: booking_ref.clone(),
        verification,
        booking_status: None,
        updated: false,
    };

    if !success {
        tracing::info!(reference, status = %outcome.verification.status, "payment not successful");
        return Ok(outcome);
    }

    let Some(booking_ref) = booking_ref else {
        tracing::warn!(reference, "successful payment carries no booking reference in metadata");
        return Ok(outcome);
    };

    match store.update_status(&booking_ref, BookingStatus::Paid) {
        Ok(change) => {
            outcome.booking_status = Some(change.booking.status);
            outcome.updated = change.changed;
            if !change.changed {
                tracing::debug!(booking_ref = %booking_ref, "booking already paid");
            }
        }
        Err(AppError::NotFound(_)) => {
            tracing::warn!(reference, booking_ref = %booking_ref, "payment for unknown booking");
        }
        Err(AppError::IllegalTransition { from, .. }) => {
            tracing::error!(
                reference,
                booking_ref = %booking_ref,
                status = %from,
                "payment succeeded for a booking that cannot become paid"
            );
            outcome.booking_status = Some(from);
        }
        Err(AppError::StorageUnavailable) => {
            tracing::warn!(booking_ref = %booking_ref, "booking store unavailable, payment not recorded");
        }
        Err(e) => return Err(e),
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::json;

    use crate::models::{
        ChargeRequest, ChargeSession, MetadataField, Money, NewBooking, PaymentMethod, RoomType,
    };
    use crate::services::payment::GatewayError;

    struct StubGateway {
        status: &'static str,
        metadata: Vec<MetadataField>,
        calls: AtomicUsize,
    }

    impl StubGateway {
        fn paid(booking_ref: &str) -> Self {
            Self {
                status: "success",
                metadata: vec![MetadataField::booking_ref(booking_ref)],
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PaymentGateway for StubGateway {
        async fn initialize(&self, _request: &ChargeRequest) -> Result<ChargeSession, GatewayError> {
            unimplemented!("not used by reconciliation")
        }

        async fn verify(&self, reference: &str) -> Result<Verification, GatewayError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Verification {
                status: self.status.to_string(),
                reference: reference.to_string(),
                metadata: self.metadata.clone(),
                raw: json!({ "status": self.status, "reference": reference }),
            })
        }
    }

    fn store_with(booking_ref: &str, status: BookingStatus) -> BookingStore {
        let store = BookingStore::new(crate::db::init_db(":memory:").unwrap());
        store
            .insert(&NewBooking {
                booking_ref: booking_ref.to_string(),
                check_in: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
                check_out: NaiveDate::from_ymd_opt(2025, 6, 4).unwrap(),
                nights: 3,
                room_type: RoomType::Executive,
                guests: 1,
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: "+2348000000000".to_string(),
                special_requests: None,
                subtotal: Money::from_major(36_000),
                tax: Money::from_major(1_800),
                total: Money::from_major(37_800),
                payment_method: PaymentMethod::Paystack,
                status,
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn success_marks_booking_paid_once() {
        let store = store_with("EBOMI-1-AAAAAA", BookingStatus::PendingPayment);
        let gateway = StubGateway::paid("EBOMI-1-AAAAAA");

        let first = reconcile(&store, &gateway, "EBOMI-1-AAAAAA").await.unwrap();
        assert!(first.success);
        assert!(first.updated);
        assert_eq!(first.booking_status, Some(BookingStatus::Paid));
        let paid_at = store.get("EBOMI-1-AAAAAA").unwrap().updated_at;

        let second = reconcile(&store, &gateway, "EBOMI-1-AAAAAA").await.unwrap();
        assert!(second.success);
        assert!(!second.updated);
        assert_eq!(second.booking_status, Some(BookingStatus::Paid));

        let booking = store.get("EBOMI-1-AAAAAA").unwrap();
        assert_eq!(booking.status, BookingStatus::Paid);
        assert_eq!(booking.updated_at, paid_at);
        assert_eq!(gateway.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_payment_leaves_booking_pending() {
        let store = store_with("EBOMI-1-AAAAAA", BookingStatus::PendingPayment);
        let gateway = StubGateway {
            status: "abandoned",
            ..StubGateway::paid("EBOMI-1-AAAAAA")
        };

        let outcome = reconcile(&store, &gateway, "EBOMI-1-AAAAAA").await.unwrap();
        assert!(!outcome.success);
        assert!(!outcome.updated);
        assert_eq!(
            store.get("EBOMI-1-AAAAAA").unwrap().status,
            BookingStatus::PendingPayment
        );
    }

    #[tokio::test]
    async fn missing_metadata_ref_is_not_an_error() {
        let store = store_with("EBOMI-1-AAAAAA", BookingStatus::PendingPayment);
        let gateway = StubGateway {
            metadata: vec![],
            ..StubGateway::paid("EBOMI-1-AAAAAA")
        };

        let outcome = reconcile(&store, &gateway, "EBOMI-1-AAAAAA").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.booking_ref, None);
        assert!(!outcome.updated);
        assert_eq!(
            store.get("EBOMI-1-AAAAAA").unwrap().status,
            BookingStatus::PendingPayment
        );
    }

    #[tokio::test]
    async fn payment_for_cancelled_booking_is_logged_not_applied() {
        let store = store_with("EBOMI-1-AAAAAA", BookingStatus::Cancelled);
        let gateway = StubGateway::paid("EBOMI-1-AAAAAA");

        let outcome = reconcile(&store, &gateway, "EBOMI-1-AAAAAA").await.unwrap();
        assert!(outcome.success);
        assert!(!outcome.updated);
        assert_eq!(outcome.booking_status, Some(BookingStatus::Cancelled));
    }

    #[tokio::test]
    async fn unknown_booking_is_not_an_error() {
        let store = store_with("EBOMI-1-AAAAAA", BookingStatus::PendingPayment);
        let gateway = StubGateway::paid("EBOMI-9-ZZZZZZ");

        let outcome = reconcile(&store, &gateway, "EBOMI-9-ZZZZZZ").await.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.booking_status, None);
    }
}
