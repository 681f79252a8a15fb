use bastion::prelude::*;
use bastion_kernel::environment::{PARAM_LOG_DIR, PARAM_PROVIDER};
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn test_production_logs_roll_into_json_files() -> Result<(), Box<dyn std::error::Error>> {
    let tmp_dir = tempdir()?;
    let log_dir = tmp_dir.path().join("logs");
    let environment = CryptoEnvironment::builder()
        .kind(DeploymentType::Production)
        .build()
        .with_parameter(PARAM_PROVIDER, "portable")
        .with_parameter(PARAM_LOG_DIR, log_dir.to_string_lossy());

    let logger = init_logging(&environment, "bastion-services")?;
    assert!(logger.guard().is_some());

    let err = init_logging(&environment, "bastion-services").unwrap_err();
    assert!(matches!(err, BastionError::Logging { .. }));

    let _services = CryptoServices::in_memory(environment)?;
    std::thread::sleep(Duration::from_millis(30));
    drop(logger);

    let log_file = fs::read_dir(&log_dir)?
        .flatten()
        .map(|entry| entry.path())
        .find(|path| path.extension().and_then(|ext| ext.to_str()) == Some("log"))
        .expect("log file should be created");
    let name = log_file.file_name().and_then(|name| name.to_str()).unwrap_or_default();
    assert!(name.starts_with("bastion-services"));

    let contents = fs::read_to_string(&log_file)?;
    let ready = contents
        .lines()
        .find(|line| line.contains("Crypto services ready"))
        .expect("readiness is logged");
    assert!(ready.starts_with('{'), "production file logs are JSON");
    assert!(ready.contains("portable"));

    Ok(())
}
