use std::io;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use mocks_cli::{
    Alert, Cli, CliConfig, CliDriver, EventQueue, FileSink, InMemoryCore, LogLevel, Logger, PlainMock,
    PlainRouteVariant, TerminalInquirer,
};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let core = Arc::new(
        InMemoryCore::builder()
            .setting("host", "0.0.0.0")
            .setting("port", 3100)
            .setting("log", "info")
            .setting("delay", 0)
            .setting("watch", true)
            .setting("pathLegacy", false)
            .mock("base", &["get-users:success", "get-user:success"])
            .mock("users-error", &["get-users:error"])
            .route("get-users", "/api/users", &["success", "error"])
            .route("get-user", "/api/users/:id", &["success", "not-found"])
            .build(),
    );

    let log_path = std::env::temp_dir().join("mocks_cli_demo.log");
    let mut config = CliConfig::default();
    config.logger =
        Some(Logger::new(FileSink::new(&log_path, 1024 * 1024)?).with_min_level(LogLevel::Info));
    config.enable_metrics();
    config.tick_interval = Duration::from_millis(100);

    // Stand-in for the host's file watcher.
    let host = Arc::clone(&core);
    thread::spawn(move || {
        thread::sleep(Duration::from_secs(10));
        host.push_alert(Alert::warning("Mocks folder changed, reloading"));
        thread::sleep(Duration::from_secs(2));
        host.reload_mocks(
            vec![PlainMock {
                id: "base".into(),
                from: None,
                routes_variants: vec!["get-users:success".into()],
            }],
            vec![PlainRouteVariant {
                id: "get-users:success".into(),
                route_id: "get-users".into(),
                handler: Some("default".into()),
                delay: None,
            }],
        );
        host.clear_alerts();
    });

    let queue = EventQueue::new();
    let inquirer = TerminalInquirer::new(io::stdout(), queue.sender());
    let cli = Cli::with_config(core, inquirer, queue, config);
    CliDriver::new(cli).run()?;

    println!("controller log written to {}", log_path.display());
    Ok(())
}
