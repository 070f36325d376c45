use crate::commands::CommandResult;
use smartmenu_core::config::{AppConfig, LoadOptions};
use smartmenu_db::{
    connect_with_settings, migrations, seed_demo_orders, verify_demo_orders, SqlOrderRepository,
};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "config_validation",
                format!("configuration issue: {error}"),
                2,
            );
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                "seed",
                "runtime_init",
                format!("failed to initialize async runtime: {error}"),
                3,
            );
        }
    };

    let result = runtime.block_on(async {
        let pool = connect_with_settings(
            &config.database.url,
            config.database.max_connections,
            config.database.timeout_secs,
        )
        .await
        .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let repository = SqlOrderRepository::new(pool.clone());

        let seeded = seed_demo_orders(&repository)
            .await
            .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

        let verification = verify_demo_orders(&repository)
            .await
            .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

        pool.close().await;

        if verification.is_ok() {
            Ok(seeded.orders_inserted)
        } else {
            Err(("seed_verification", verification.issues.join("; "), 6u8))
        }
    });

    match result {
        Ok(count) => {
            CommandResult::success("seed", format!("seeded {count} demo orders and verified them"))
        }
        Err((error_class, message, exit_code)) => {
            CommandResult::failure("seed", error_class, message, exit_code)
        }
    }
}
