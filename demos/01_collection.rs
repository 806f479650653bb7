/// collection - reconcile payment vouchers and submit the batch
use chrono::NaiveDate;
use lot_financing_rs::{
    Currency, FinancingSession, Money, PaymentBatch, PaymentRegistrar, PaymentVoucher, Rate,
    Result, SafeTimeProvider, SaleTerms, TimeSource,
};
use rust_decimal_macros::dec;

/// stand-in for the remote payment-registration service
struct ConsoleRegistrar;

impl PaymentRegistrar for ConsoleRegistrar {
    fn register_payment(&mut self, batch: &PaymentBatch) -> Result<()> {
        println!(
            "registering {} vouchers totalling {} {:?}",
            batch.vouchers.len(),
            batch.total_amount,
            batch.currency
        );
        Ok(())
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::System);

    // financed sale: 30,000 lot + 3,000 urban development, 5,000 down,
    // 1,000 reserved, 0% over 18 months
    let terms = SaleTerms::financed(
        Money::from_major(30_000),
        Some(Money::from_major(3_000)),
        Money::from_major(5_000),
        Money::from_major(1_000),
        Rate::from_percentage(dec!(0)),
        18,
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
    );

    let mut session = FinancingSession::new(terms, Currency::PEN, &time)?;
    println!("required amount: {}", session.required_amount());

    // the client pays in two deposits
    let date = NaiveDate::from_ymd_opt(2024, 4, 20).unwrap();
    session.add_payment(
        PaymentVoucher::new(
            Some("BCP".to_string()),
            Some("OP-58102".to_string()),
            date,
            Money::from_major(15_000),
        ),
        &time,
    )?;
    println!("remaining: {}", session.ledger().remaining_amount());

    session.add_payment(
        PaymentVoucher::new(
            Some("Interbank".to_string()),
            Some("DEP-90771".to_string()),
            date,
            Money::from_major(12_000),
        ),
        &time,
    )?;
    println!("complete: {}", session.is_payment_complete());

    // gate is open, submit the whole batch
    let mut registrar = ConsoleRegistrar;
    let submitted = session.submit(&mut registrar, &time)?;
    println!("submitted: {submitted}");

    println!("{}", session.view().to_json_pretty()?);

    Ok(())
}
