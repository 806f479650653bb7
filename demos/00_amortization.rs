/// amortization - generate an installment schedule for a financed lot
use chrono::NaiveDate;
use lot_financing_rs::{
    AmortizationParameters, AmortizationSchedule, Money, Rate, RoundingMode,
};
use rust_decimal_macros::dec;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // S/ 48,000 lot with S/ 8,000 down, 2% per period, 12 monthly payments
    let params = AmortizationParameters {
        total_amount: Money::from_major(48_000),
        initial_amount: Money::from_major(8_000),
        reservation_amount: Money::from_major(500),
        interest_rate: Rate::from_percentage(dec!(2)),
        number_of_payments: 12,
        first_payment_date: NaiveDate::from_ymd_opt(2024, 4, 15).unwrap(),
        rounding: RoundingMode::WholeUnits,
    };

    let schedule = AmortizationSchedule::generate(&params)?;

    println!("principal:      {}", schedule.principal);
    println!("total interest: {}", schedule.total_interest);
    println!("schedule total: {}", schedule.total_amount);
    println!();

    for installment in &schedule.installments {
        println!(
            "cuota {:>2}  {}  {}",
            installment.number, installment.due_date, installment.amount
        );
    }

    Ok(())
}
