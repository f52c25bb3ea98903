//! Vertical card display for cases, appropriations and payment plans.
//!
//! Each card is a title line followed by labelled sections. Empty values
//! are skipped so a sparsely filled record stays short.

use bevplatform_client::AppropriationPage;
use bevplatform_core::format::{
    appropriation_header, cost, cpr, display_date, display_opt_date, number, user_display_name,
};
use bevplatform_core::permissions::warn_edit_payment;
use bevplatform_core::{
    Activity, Appropriation, Case, PaymentCapabilities, PaymentCostType, PaymentPlan,
};
use bevplatform_store::Store;
use chrono::NaiveDate;

// ── Public API ──

/// Print a case with the appropriations filed under it.
pub fn print_case_card(store: &Store, case: &Case, appropriations: &[Appropriation]) {
    println!("=== Sag {} ===", case.sbsys_id);
    if !case.name.is_empty() {
        println!("{}", case.name);
    }
    println!();

    print_section(
        "Borger",
        &[
            ("cpr", Some(cpr(&case.cpr_number))),
            ("navn", non_empty(&case.name)),
        ],
    );
    print_section(
        "Sagsbehandling",
        &[
            (
                "sagsbehandler",
                case.case_worker
                    .and_then(|id| store.user_by_id(id))
                    .map(|u| user_display_name(&u)),
            ),
            (
                "team",
                case.team
                    .and_then(|id| store.team_by_id(id))
                    .map(|t| t.name),
            ),
            ("indsatstrappe", case.effort_step.map(|s| s.to_string())),
            ("skaleringstrappe", case.scaling_step.map(|s| s.to_string())),
        ],
    );
    print_section(
        "Kommuner",
        &[
            ("betalingskommune", municipality(store, case.paying_municipality)),
            ("handlekommune", municipality(store, case.acting_municipality)),
            ("bopælskommune", municipality(store, case.residence_municipality)),
        ],
    );

    if appropriations.is_empty() {
        println!("Ingen bevillinger");
        return;
    }
    println!("Bevillinger");
    for appropriation in appropriations {
        println!(
            "  {:<26} {} ({} aktiviteter)",
            appropriation.sbsys_id,
            appropriation.status.label(),
            appropriation.activities.len()
        );
    }
    println!();
}

/// Print an appropriation with its section and every activity.
pub fn print_appropriation_card(store: &Store, page: &AppropriationPage) {
    let appropriation = &page.appropriation;
    println!("=== {} ===", appropriation_header(appropriation));
    println!("Sag {} · {}", page.case.sbsys_id, cpr(&page.case.cpr_number));
    println!();

    let section = appropriation
        .section
        .and_then(|id| store.section_by_id(id))
        .map(|s| format!("{} {}", s.paragraph, s.text));
    print_section(
        "Bevilling",
        &[
            ("paragraf", section),
            (
                "bevilget fra",
                appropriation.granted_from_date.map(display_date),
            ),
            ("bevilget til", appropriation.granted_to_date.map(display_date)),
            ("note", non_empty(&appropriation.note)),
        ],
    );

    if page.activities.is_empty() {
        println!("Ingen aktiviteter");
        return;
    }
    println!("Aktiviteter");
    for activity in &page.activities {
        print_activity_line(store, activity);
    }
    println!();
}

/// Print the payments of an activity's plan, with what the current user may do.
pub fn print_payment_table(
    activity: &Activity,
    plan: &PaymentPlan,
    caps: PaymentCapabilities,
    today: NaiveDate,
) {
    println!(
        "=== Betalinger for aktivitet {} ===",
        activity.id.map(|id| id.to_string()).unwrap_or_default()
    );
    println!("{} · {}", plan.payment_type.label(), activity.status.label());
    println!();

    print_section(
        "Betalingsplan",
        &[
            ("modtager", plan.recipient_name.clone()),
            ("betalingsmåde", plan.payment_method.map(|m| m.label().to_string())),
            ("frekvens", plan.payment_frequency.map(|f| f.label().to_string())),
            ("beløb", plan_amount(plan, today)),
        ],
    );

    println!("Rettigheder");
    println!("  {:<26} {}", "opret betaling", yes_no(caps.can_create));
    println!("  {:<26} {}", "rediger betaling", yes_no(caps.can_edit));
    println!("  {:<26} {}", "slet betaling", yes_no(caps.can_delete));
    println!();

    if plan.payments.is_empty() {
        println!("Ingen betalinger");
        return;
    }
    println!("Betalinger");
    let mut warnings = Vec::new();
    for payment in &plan.payments {
        let state = if payment.paid {
            format!(
                "betalt {} {}",
                display_opt_date(payment.paid_date),
                payment.paid_amount.map(cost).unwrap_or_default()
            )
        } else {
            "ikke betalt".to_string()
        };
        println!(
            "  {:<26} {:>16}  {}",
            display_date(payment.date),
            cost(payment.amount),
            state.trim_end()
        );
        if let Some(warning) = warn_edit_payment(payment, today) {
            warnings.push(warning);
        }
    }
    println!();
    for warning in warnings {
        println!("! {warning}");
    }
}

// ── Helpers ──

fn print_section(header: &str, rows: &[(&str, Option<String>)]) {
    if rows.iter().all(|(_, value)| value.is_none()) {
        return;
    }
    println!("{header}");
    for (label, value) in rows {
        if let Some(value) = value {
            println!("  {:<26} {}", label, value);
        }
    }
    println!();
}

fn print_activity_line(store: &Store, activity: &Activity) {
    let name = activity
        .details
        .and_then(|id| store.activity_details_by_id(id))
        .map(|d| d.name)
        .unwrap_or_else(|| activity.activity_type.label().to_string());
    let period = format!(
        "{} - {}",
        display_opt_date(activity.start_date),
        display_opt_date(activity.end_date)
    );
    println!(
        "  {:<26} {:<12} {}  {}",
        name,
        activity.status.label(),
        period,
        activity.total_cost.map(cost).unwrap_or_default()
    );
}

fn plan_amount(plan: &PaymentPlan, today: NaiveDate) -> Option<String> {
    match plan.payment_cost_type {
        Some(PaymentCostType::PerUnit) => {
            let price = plan
                .price_per_unit
                .as_ref()
                .and_then(|p| p.amount)
                .or_else(|| plan.current_price(today))?;
            let units = plan.payment_units.unwrap_or_default();
            Some(format!("{} x {}", number(units, 2), cost(price)))
        }
        Some(PaymentCostType::GlobalRate) => plan.payment_rate.map(|r| format!("takst {r}")),
        Some(PaymentCostType::Fixed) | None => plan.payment_amount.map(cost),
    }
}

fn municipality(store: &Store, id: Option<i64>) -> Option<String> {
    id.and_then(|id| store.municipality_by_id(id)).map(|m| m.name)
}

fn non_empty(s: &str) -> Option<String> {
    (!s.is_empty()).then(|| s.to_string())
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "ja" } else { "nej" }
}
