use bastion_logger::{LevelFilter, LogMetadata, Logger, SecureLogger, TracingLogger};

#[test]
fn console_only_logger_has_no_file_guard() {
    let logger = Logger::builder()
        .name("bastion-console-only")
        .console(true)
        .level(LevelFilter::INFO)
        .env_filter("bastion=debug")
        .init()
        .expect("logger should initialize");

    let metadata = LogMetadata::new().private("key_id", "k1");
    TracingLogger::new().info("generate_key", "Key generated", &metadata);

    assert!(logger.guard().is_none(), "console-only logger should not create a file guard");
}
