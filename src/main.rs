use clap::Parser;
use geocode_batch::utils::{logger, validation::Validate};
use geocode_batch::{BatchController, CliConfig, GeocodeClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 不存在時沿用既有環境變數
    dotenvy::dotenv().ok();

    // 無法辨識或互相衝突的參數只印出說明，不視為錯誤
    let config = match CliConfig::try_parse() {
        Ok(config) => config,
        Err(_) => {
            println!("{}", CliConfig::usage());
            return Ok(());
        }
    };

    let Some(mode) = config.run_mode() else {
        println!("{}", CliConfig::usage());
        return Ok(());
    };

    if config.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::info!("Starting geocode-batch CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let settings = match config.resolve() {
        Ok(settings) => settings,
        Err(e) => {
            report(&e);
            return Ok(());
        }
    };

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        report(&e);
        return Ok(());
    }

    let controller = match GeocodeClient::new(&settings)
        .and_then(|client| BatchController::new(client, settings))
    {
        Ok(controller) => controller,
        Err(e) => {
            report(&e);
            return Ok(());
        }
    };

    match controller.run(mode).await {
        Ok(summary) => {
            println!(
                "✅ {} run finished: {} rows pending, {} OK, {} ERROR, {} skipped",
                summary.mode, summary.pending, summary.succeeded, summary.failed, summary.skipped
            );
            if let Ok(json) = serde_json::to_string(&summary) {
                tracing::debug!("Run summary: {}", json);
            }
        }
        Err(e) => {
            tracing::error!("❌ Run aborted: {}", e);
            report(&e);
        }
    }

    Ok(())
}

fn report(e: &geocode_batch::GeocodeError) {
    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());
}
