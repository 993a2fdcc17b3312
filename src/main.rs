use chrono::Utc;
use dotenvy::dotenv;
use itdesk::{
    config::{database, settings},
    core::{consumable, ledger, report},
    errors::Result,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Load settings (missing file means defaults)
    let app_config = settings::load_default_config()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Connect and make sure every table exists
    let db = database::create_connection()
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|_| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to initialize database: {}", e))?;

    // 5. Seed consumable models listed in config.toml
    let seeded = consumable::seed_models(&db, &app_config.consumables)
        .await
        .inspect_err(|e| error!("Failed to seed consumable models: {}", e))?;
    info!(seeded, "Consumable models seeded");

    // 6. Verify every cached stock quantity against its ledger
    let repair = app_config.ledger.repair_on_startup;
    for check in ledger::reconcile_all(&db, repair).await? {
        if !check.is_consistent() {
            warn!(
                model_id = check.model_id,
                cached = check.cached,
                replayed = check.replayed,
                repaired = check.repaired,
                "Stock cache disagrees with ledger"
            );
        }
    }

    // 7. Log what needs attention today
    let digest = report::generate_digest(&db, Utc::now(), &app_config.status).await?;
    if digest.is_clear() {
        info!("Nothing needs attention");
        return Ok(());
    }

    for model in &digest.low_stock {
        warn!(
            model = %model.model_number,
            stock = model.stock_quantity,
            min = model.min_stock_level,
            "Low stock"
        );
    }
    for schedule in &digest.overdue_pm {
        warn!(schedule = %schedule.name, asset_id = schedule.asset_id, "PM overdue");
    }
    for schedule in &digest.due_soon_pm {
        info!(
            schedule = %schedule.name,
            due = %schedule.next_due_date.format("%Y-%m-%d"),
            "PM due soon"
        );
    }
    for summary in &digest.critical_budgets {
        warn!("Budget critical: {}", report::format_budget_summary(summary));
    }
    for license in &digest.expiring_licenses {
        info!(
            license = %license.license_number,
            software = %license.software_name,
            "License expiring soon"
        );
    }
    for contract in &digest.expiring_contracts {
        info!(
            contract = %contract.contract_number,
            ends = %contract.end_date.format("%Y-%m-%d"),
            "Contract expiring soon"
        );
    }
    for request in &digest.overdue_borrows {
        warn!(
            request_id = request.id,
            asset_id = request.asset_id,
            requester = %request.requester_id,
            "Borrowed asset overdue"
        );
    }

    Ok(())
}
