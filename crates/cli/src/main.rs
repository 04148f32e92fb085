use std::process::ExitCode;

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    webhook_relay_cli::run()
}
