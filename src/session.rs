use hourglass_rs::SafeTimeProvider;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SaleTerms;
use crate::decimal::Money;
use crate::errors::{FinancingError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::{PaymentLedger, PaymentVoucher};
use crate::schedule::{AmortizationParameters, AmortizationSchedule};
use crate::types::{Currency, LedgerPhase, SaleId, SaleType};

/// atomic batch handed to the payment-registration collaborator
///
/// The whole voucher set is submitted as one unit; the core never sends a
/// subset. Consistency of the remote write is the collaborator's problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentBatch {
    pub sale_id: SaleId,
    pub vouchers: Vec<PaymentVoucher>,
    pub total_amount: Money,
    pub currency: Currency,
}

/// outcome of an in-flight submission, reported back by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Succeeded,
    Failed { reason: String },
}

/// boundary trait for the external payment-registration collaborator
pub trait PaymentRegistrar {
    fn register_payment(&mut self, batch: &PaymentBatch) -> Result<()>;
}

/// one user's collection session for one sale
///
/// Owns the ledger and the derived required amount, and gates submission:
/// nothing reaches the registrar until the ledger reports completion, and
/// only one submission may be in flight at a time.
pub struct FinancingSession {
    pub sale_id: SaleId,
    terms: SaleTerms,
    currency: Currency,
    schedule: Option<AmortizationSchedule>,
    ledger: PaymentLedger,
    events: EventStore,
    submission_in_flight: bool,
}

impl FinancingSession {
    /// open a session for the given sale terms
    pub fn new(
        terms: SaleTerms,
        currency: Currency,
        time_provider: &SafeTimeProvider,
    ) -> Result<Self> {
        terms.validate()?;

        let sale_id = Uuid::new_v4();
        let mut events = EventStore::new();
        let schedule = Self::build_schedule(&terms)?;

        if let Some(schedule) = &schedule {
            events.emit(Event::ScheduleGenerated {
                sale_id,
                installments: schedule.number_of_payments,
                first_due_date: schedule.first_payment_date,
                total_amount: schedule.total_amount,
                timestamp: time_provider.now(),
            });
        }

        let ledger = PaymentLedger::new(terms.net_total());

        Ok(Self {
            sale_id,
            terms,
            currency,
            schedule,
            ledger,
            events,
            submission_in_flight: false,
        })
    }

    /// the calculator is only invoked for financed sales
    fn build_schedule(terms: &SaleTerms) -> Result<Option<AmortizationSchedule>> {
        if terms.sale_type != SaleType::Financed {
            return Ok(None);
        }

        let first_payment_date =
            terms
                .first_payment_date
                .ok_or_else(|| FinancingError::InvalidParameter {
                    message: "financed sale requires a first payment date".to_string(),
                })?;

        let params = AmortizationParameters {
            total_amount: terms.gross_total(),
            initial_amount: terms.initial_amount,
            reservation_amount: terms.reservation_amount,
            interest_rate: terms.interest_rate,
            number_of_payments: terms.number_of_payments,
            first_payment_date,
            rounding: terms.rounding,
        };

        AmortizationSchedule::generate(&params).map(Some)
    }

    pub fn terms(&self) -> &SaleTerms {
        &self.terms
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn schedule(&self) -> Option<&AmortizationSchedule> {
        self.schedule.as_ref()
    }

    pub fn ledger(&self) -> &PaymentLedger {
        &self.ledger
    }

    pub fn required_amount(&self) -> Money {
        self.ledger.required_amount()
    }

    pub fn is_payment_complete(&self) -> bool {
        self.ledger.is_payment_complete()
    }

    pub fn submission_in_flight(&self) -> bool {
        self.submission_in_flight
    }

    /// replace the sale terms, fully recomputing the required amount and
    /// schedule (no incremental patching)
    pub fn update_terms(
        &mut self,
        terms: SaleTerms,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        if self.submission_in_flight {
            return Err(FinancingError::SubmissionInFlight);
        }

        terms.validate()?;
        let schedule = Self::build_schedule(&terms)?;

        let old_required = self.ledger.required_amount();
        let new_required = terms.net_total();

        if new_required != old_required {
            self.ledger.set_required_amount(new_required);
            self.events.emit(Event::RequiredAmountChanged {
                sale_id: self.sale_id,
                old_amount: old_required,
                new_amount: new_required,
                timestamp: time_provider.now(),
            });
        }

        if let Some(schedule) = &schedule {
            self.events.emit(Event::ScheduleGenerated {
                sale_id: self.sale_id,
                installments: schedule.number_of_payments,
                first_due_date: schedule.first_payment_date,
                total_amount: schedule.total_amount,
                timestamp: time_provider.now(),
            });
        }

        self.terms = terms;
        self.schedule = schedule;
        Ok(())
    }

    /// record a voucher
    pub fn add_payment(
        &mut self,
        voucher: PaymentVoucher,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let voucher_id = voucher.id;
        let amount = voucher.amount;
        self.ledger.add_payment(voucher)?;

        self.events.emit(Event::VoucherAdded {
            sale_id: self.sale_id,
            voucher_id,
            amount,
            total_paid: self.ledger.total_paid(),
            remaining: self.ledger.remaining_amount(),
            timestamp: time_provider.now(),
        });

        self.emit_if_completed(time_provider);
        Ok(())
    }

    /// replace the voucher at `index`
    pub fn edit_payment(
        &mut self,
        index: usize,
        voucher: PaymentVoucher,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let was_complete = self.ledger.is_payment_complete();
        let old_amount = self
            .ledger
            .entries()
            .get(index)
            .map(|e| e.amount)
            .unwrap_or(Money::ZERO);
        let voucher_id = voucher.id;
        let new_amount = voucher.amount;

        self.ledger.edit_payment(index, voucher)?;

        self.events.emit(Event::VoucherEdited {
            sale_id: self.sale_id,
            voucher_id,
            old_amount,
            new_amount,
            total_paid: self.ledger.total_paid(),
            timestamp: time_provider.now(),
        });

        if !was_complete {
            self.emit_if_completed(time_provider);
        }
        Ok(())
    }

    /// remove the voucher at `index`
    pub fn delete_payment(
        &mut self,
        index: usize,
        time_provider: &SafeTimeProvider,
    ) -> Result<PaymentVoucher> {
        let removed = self.ledger.delete_payment(index)?;

        self.events.emit(Event::VoucherDeleted {
            sale_id: self.sale_id,
            voucher_id: removed.id,
            amount: removed.amount,
            total_paid: self.ledger.total_paid(),
            timestamp: time_provider.now(),
        });

        Ok(removed)
    }

    fn emit_if_completed(&mut self, time_provider: &SafeTimeProvider) {
        if self.ledger.is_payment_complete() && !self.ledger.entries().is_empty() {
            self.events.emit(Event::CollectionCompleted {
                sale_id: self.sale_id,
                total_paid: self.ledger.total_paid(),
                voucher_count: self.ledger.entries().len() as u32,
                timestamp: time_provider.now(),
            });
        }
    }

    /// start a submission, taking the single in-flight token
    ///
    /// Returns `Ok(None)` with no side effect while the completion gate
    /// is closed. A second begin while one is in flight is rejected, not
    /// queued.
    pub fn begin_submission(
        &mut self,
        time_provider: &SafeTimeProvider,
    ) -> Result<Option<PaymentBatch>> {
        if self.submission_in_flight {
            return Err(FinancingError::SubmissionInFlight);
        }

        if !self.ledger.is_payment_complete() {
            return Ok(None);
        }

        let batch = PaymentBatch {
            sale_id: self.sale_id,
            vouchers: self.ledger.entries().to_vec(),
            total_amount: self.ledger.total_paid(),
            currency: self.currency,
        };

        self.submission_in_flight = true;
        self.events.emit(Event::SubmissionDispatched {
            sale_id: self.sale_id,
            total_amount: batch.total_amount,
            voucher_count: batch.vouchers.len() as u32,
            timestamp: time_provider.now(),
        });

        Ok(Some(batch))
    }

    /// settle an in-flight submission
    ///
    /// Success clears the ledger for the next collection; failure leaves
    /// every voucher in place so the user can retry without re-entering.
    pub fn resolve_submission(
        &mut self,
        outcome: SubmissionOutcome,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        if !self.submission_in_flight {
            return Err(FinancingError::NoSubmissionInFlight);
        }
        self.submission_in_flight = false;

        match outcome {
            SubmissionOutcome::Succeeded => {
                self.events.emit(Event::SubmissionSucceeded {
                    sale_id: self.sale_id,
                    total_amount: self.ledger.total_paid(),
                    timestamp: time_provider.now(),
                });
                self.ledger.reset_payments();
                self.events.emit(Event::PaymentsCleared {
                    sale_id: self.sale_id,
                    timestamp: time_provider.now(),
                });
            }
            SubmissionOutcome::Failed { reason } => {
                self.events.emit(Event::SubmissionFailed {
                    sale_id: self.sale_id,
                    reason,
                    timestamp: time_provider.now(),
                });
            }
        }

        Ok(())
    }

    /// drive a full synchronous submission through the registrar
    ///
    /// Returns `Ok(false)` while the gate is closed, `Ok(true)` after a
    /// successful registration, and propagates the registrar's failure
    /// with the ledger retained for retry.
    pub fn submit(
        &mut self,
        registrar: &mut dyn PaymentRegistrar,
        time_provider: &SafeTimeProvider,
    ) -> Result<bool> {
        let batch = match self.begin_submission(time_provider)? {
            Some(batch) => batch,
            None => return Ok(false),
        };

        match registrar.register_payment(&batch) {
            Ok(()) => {
                self.resolve_submission(SubmissionOutcome::Succeeded, time_provider)?;
                Ok(true)
            }
            Err(err) => {
                self.resolve_submission(
                    SubmissionOutcome::Failed {
                        reason: err.to_string(),
                    },
                    time_provider,
                )?;
                Err(err)
            }
        }
    }

    /// get events
    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }

    pub fn events(&self) -> &[Event] {
        self.events.events()
    }

    /// serializable snapshot for display/persistence collaborators
    pub fn view(&self) -> SessionView {
        SessionView {
            sale_id: self.sale_id,
            currency: self.currency,
            sale_type: self.terms.sale_type,
            required_amount: self.ledger.required_amount(),
            total_paid: self.ledger.total_paid(),
            remaining_amount: self.ledger.remaining_amount(),
            is_payment_complete: self.ledger.is_payment_complete(),
            phase: self.ledger.phase(),
            submission_in_flight: self.submission_in_flight,
            vouchers: self.ledger.entries().to_vec(),
            installment_count: self
                .schedule
                .as_ref()
                .map(|s| s.number_of_payments)
                .unwrap_or(0),
            schedule_total: self.schedule.as_ref().map(|s| s.total_amount),
        }
    }
}

/// serializable view of a session's state
///
/// Amounts are raw decimals and dates are ISO; currency symbols and
/// locale formatting belong to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub sale_id: SaleId,
    pub currency: Currency,
    pub sale_type: SaleType,
    pub required_amount: Money,
    pub total_paid: Money,
    pub remaining_amount: Money,
    pub is_payment_complete: bool,
    pub phase: LedgerPhase,
    pub submission_in_flight: bool,
    pub vouchers: Vec<PaymentVoucher>,
    pub installment_count: u32,
    pub schedule_total: Option<Money>,
}

impl SessionView {
    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use chrono::{NaiveDate, TimeZone, Utc};
    use hourglass_rs::TimeSource;
    use rust_decimal_macros::dec;

    fn test_clock() -> SafeTimeProvider {
        SafeTimeProvider::new(TimeSource::Test(
            Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap(),
        ))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn voucher(amount: i64) -> PaymentVoucher {
        PaymentVoucher::new(
            Some("Interbank".to_string()),
            Some("DEP-4471".to_string()),
            date(2024, 3, 1),
            Money::from_major(amount),
        )
    }

    fn financed_terms() -> SaleTerms {
        // 50,000 lot + 5,000 urban development, 10,000 down, 1,000 reserved
        SaleTerms::financed(
            Money::from_major(50_000),
            Some(Money::from_major(5_000)),
            Money::from_major(10_000),
            Money::from_major(1_000),
            Rate::from_percentage(dec!(0)),
            24,
            date(2024, 4, 1),
        )
    }

    struct FakeRegistrar {
        calls: u32,
        fail: bool,
    }

    impl FakeRegistrar {
        fn new(fail: bool) -> Self {
            Self { calls: 0, fail }
        }
    }

    impl PaymentRegistrar for FakeRegistrar {
        fn register_payment(&mut self, _batch: &PaymentBatch) -> Result<()> {
            self.calls += 1;
            if self.fail {
                Err(FinancingError::SubmissionFailed {
                    message: "gateway timeout".to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_financed_sale_builds_schedule_and_required_amount() {
        let time = test_clock();
        let session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();

        assert_eq!(session.required_amount(), Money::from_major(44_000));
        let schedule = session.schedule().unwrap();
        assert_eq!(schedule.installments.len(), 24);
        // principal scheduled is gross total minus the down payment
        assert_eq!(schedule.principal, Money::from_major(45_000));
        assert!(matches!(
            session.events().first(),
            Some(Event::ScheduleGenerated { .. })
        ));
    }

    #[test]
    fn test_direct_sale_skips_calculator() {
        let time = test_clock();
        let terms = SaleTerms::direct(
            Money::from_major(20_000),
            None,
            Money::from_major(2_000),
        );
        let session = FinancingSession::new(terms, Currency::USD, &time).unwrap();

        assert!(session.schedule().is_none());
        assert_eq!(session.required_amount(), Money::from_major(18_000));
    }

    #[test]
    fn test_submit_gated_until_complete() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();
        let mut registrar = FakeRegistrar::new(false);

        session.add_payment(voucher(10_000), &time).unwrap();
        assert!(!session.is_payment_complete());

        // gate closed: no call reaches the registrar, no side effect
        assert!(!session.submit(&mut registrar, &time).unwrap());
        assert_eq!(registrar.calls, 0);
        assert!(!session.submission_in_flight());

        session.add_payment(voucher(34_000), &time).unwrap();
        assert!(session.is_payment_complete());

        assert!(session.submit(&mut registrar, &time).unwrap());
        assert_eq!(registrar.calls, 1);
    }

    #[test]
    fn test_successful_submission_resets_ledger() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();
        let mut registrar = FakeRegistrar::new(false);

        session.add_payment(voucher(44_000), &time).unwrap();
        session.submit(&mut registrar, &time).unwrap();

        assert!(session.ledger().entries().is_empty());
        assert_eq!(session.ledger().phase(), LedgerPhase::Empty);
        assert!(!session.submission_in_flight());

        let events = session.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::SubmissionSucceeded { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::PaymentsCleared { .. })));
    }

    #[test]
    fn test_failed_submission_retains_vouchers_for_retry() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();
        let mut failing = FakeRegistrar::new(true);

        session.add_payment(voucher(44_000), &time).unwrap();

        let err = session.submit(&mut failing, &time).unwrap_err();
        assert!(matches!(err, FinancingError::SubmissionFailed { .. }));

        // ledger untouched, token released
        assert_eq!(session.ledger().entries().len(), 1);
        assert!(session.is_payment_complete());
        assert!(!session.submission_in_flight());

        // retry on a healthy registrar succeeds without re-entering vouchers
        let mut healthy = FakeRegistrar::new(false);
        assert!(session.submit(&mut healthy, &time).unwrap());
        assert!(session.ledger().entries().is_empty());
    }

    #[test]
    fn test_in_flight_token_rejects_reentrant_begin() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();

        session.add_payment(voucher(44_000), &time).unwrap();

        let batch = session.begin_submission(&time).unwrap().unwrap();
        assert_eq!(batch.total_amount, Money::from_major(44_000));
        assert_eq!(batch.vouchers.len(), 1);
        assert_eq!(batch.currency, Currency::PEN);

        let err = session.begin_submission(&time).unwrap_err();
        assert!(matches!(err, FinancingError::SubmissionInFlight));

        // terms may not change mid-flight either
        assert!(session.update_terms(financed_terms(), &time).is_err());

        session
            .resolve_submission(SubmissionOutcome::Succeeded, &time)
            .unwrap();
        assert!(session.ledger().entries().is_empty());
    }

    #[test]
    fn test_resolve_without_begin_rejected() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();

        let err = session
            .resolve_submission(SubmissionOutcome::Succeeded, &time)
            .unwrap_err();
        assert!(matches!(err, FinancingError::NoSubmissionInFlight));
    }

    #[test]
    fn test_update_terms_recomputes_everything() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();
        session.take_events();

        let mut new_terms = financed_terms();
        new_terms.lot_price = Money::from_major(60_000);
        new_terms.number_of_payments = 36;
        session.update_terms(new_terms, &time).unwrap();

        assert_eq!(session.required_amount(), Money::from_major(54_000));
        assert_eq!(session.schedule().unwrap().installments.len(), 36);

        let events = session.take_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::RequiredAmountChanged { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::ScheduleGenerated { .. })));
    }

    #[test]
    fn test_voucher_events_emitted() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();
        session.take_events();

        session.add_payment(voucher(20_000), &time).unwrap();
        session.edit_payment(0, voucher(24_000), &time).unwrap();
        session.delete_payment(0, &time).unwrap();
        session.add_payment(voucher(44_000), &time).unwrap();

        let events = session.take_events();
        assert!(events.iter().any(|e| matches!(e, Event::VoucherAdded { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::VoucherEdited { .. })));
        assert!(events.iter().any(|e| matches!(e, Event::VoucherDeleted { .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, Event::CollectionCompleted { .. })));
    }

    #[test]
    fn test_session_view_serializes() {
        let time = test_clock();
        let mut session = FinancingSession::new(financed_terms(), Currency::PEN, &time).unwrap();
        session.add_payment(voucher(5_000), &time).unwrap();

        let view = session.view();
        assert_eq!(view.required_amount, Money::from_major(44_000));
        assert_eq!(view.total_paid, Money::from_major(5_000));
        assert_eq!(view.installment_count, 24);

        let json = view.to_json_pretty().unwrap();
        assert!(json.contains("\"PEN\""));
        assert!(json.contains("Accumulating"));
    }
}
