use std::env;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    breakeven::logging::init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = raw_args
            .get(2)
            .and_then(|s| s.parse::<u16>().ok())
            .unwrap_or(8080);
        if let Err(e) = breakeven::api::run_http_server(port).await {
            tracing::error!(error = %e, "server error");
            return ExitCode::FAILURE;
        }
        return ExitCode::SUCCESS;
    }

    breakeven::api::run_cli()
}
