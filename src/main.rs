use clap::Parser;
use genegraph::utils::error::GeneGraphError;
use genegraph::utils::logger;
use genegraph::{build_engine, render_summary, CliConfig, LocalStorage, ProfileExporter};

fn fail(stage: &str, e: GeneGraphError) -> ! {
    tracing::error!("❌ {} failed: {} (kind: {:?})", stage, e, e.kind());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 建議: {}", e.recovery_suggestion());
    std::process::exit(e.exit_code());
}

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.log_json {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting genegraph CLI");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = cli
        .load_config()
        .unwrap_or_else(|e| fail("Configuration", e));
    let request = cli
        .birth_request(&config)
        .unwrap_or_else(|e| fail("Reading birth data", e));
    let engine = build_engine(&config).unwrap_or_else(|e| fail("Engine setup", e));

    let profile = match engine.compute(request).await {
        Ok(profile) => profile,
        Err(e) => fail("Profile computation", e),
    };

    let storage = LocalStorage::new(config.output.path.clone());
    let exporter = ProfileExporter::new(storage, config.output.clone());
    match exporter.export(&profile).await {
        Ok(files) => {
            for file in &files {
                tracing::info!("📁 Output saved to: {}/{}", config.output.path, file);
            }
        }
        Err(e) => fail("Export", e),
    }

    if cli.stdout {
        match serde_json::to_string_pretty(&profile) {
            Ok(json) => println!("{}", json),
            Err(e) => fail("Serialization", e.into()),
        }
    } else {
        print!("{}", render_summary(&profile));
    }
}
