/// lifecycle - application intake through approval, payout and closure
use chrono::{Duration, TimeZone, Utc};
use loan_intake::{
    InMemoryLoanRepository, LoanApplication, LoanApplicationRequest, LoanRepository,
    SafeTimeProvider, TimeSource,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    println!("=== loan application lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 15, 10, 0, 0).unwrap(),
    ));
    let controller = time.test_control().unwrap();
    let repo = InMemoryLoanRepository::new();

    // 1. intake
    let request: LoanApplicationRequest = serde_json::from_str(
        r#"{
            "firstName": "Jane",
            "middleName": "",
            "lastName": "Doe",
            "phoneNumber": "+1 555 0100",
            "email": "jane.doe@example.com",
            "userId": "user-42",
            "loanType": "PERSONAL",
            "loanAmount": 120000,
            "interestRate": 10,
            "loanTermMonths": 12,
            "purpose": "home renovation"
        }"#,
    )?;

    let validated = request.validate_default()?;
    let mut application = LoanApplication::create_from_request(validated, &time)?;
    let id = repo.save(&mut application, &time)?;

    println!("1. submitted application #{}", id);
    println!("  applicant: {}", application.full_name());
    println!("  monthly emi: {}", application.monthly_emi());
    println!("  total payable: {}", application.total_amount());

    // 2. review and approval
    controller.advance(Duration::days(2));
    let mut application = repo.get(id)?;
    application.start_review(&time)?;
    repo.save(&mut application, &time)?;

    controller.advance(Duration::days(1));
    application.approve(&time)?;
    repo.save(&mut application, &time)?;
    println!("\n2. approved on {}", time.now().format("%Y-%m-%d"));

    // 3. payout and schedule
    controller.advance(Duration::days(1));
    application.disburse(&time)?;
    repo.save(&mut application, &time)?;

    let schedule = application.amortization_schedule()?;
    println!("\n3. disbursed, repayment plan:");
    for payment in &schedule.payments {
        println!(
            "  #{:>2} {}  payment {:>9}  interest {:>8}  balance {:>10}",
            payment.payment_number,
            payment.due_date.format("%Y-%m-%d"),
            payment.payment_amount,
            payment.interest_portion,
            payment.closing_balance,
        );
    }

    // 4. closure
    controller.advance(Duration::days(365));
    application.close(&time)?;
    repo.save(&mut application, &time)?;

    println!("\n4. final state:");
    println!("{}", application.to_response().to_json());
    println!("\n  events recorded: {}", repo.history(id).len());

    Ok(())
}
