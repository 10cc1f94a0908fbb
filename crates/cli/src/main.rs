use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    leadcall_cli::run().await
}
