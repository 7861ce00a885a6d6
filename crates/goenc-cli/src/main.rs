//! goenc: password-based file encryption.
//!
//! Exit status: 0 success; 1 tag verification failed; 2 bad command line;
//! 3 any other error; 128+n when a signal n interrupted the prompt.

mod app;
mod options;

use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    init_tracing();
    let opts = options::parse();
    if let Err(err) = app::run(&opts).await {
        std::process::exit(report(&err));
    }
}

/// Map an error to its exit code, printing the diagnostic line for
/// everything except signal interruption.
fn report(err: &anyhow::Error) -> i32 {
    if let Some(goenc_prompt::Error::Signal(n)) = err.downcast_ref::<goenc_prompt::Error>() {
        return 128 + n;
    }

    eprintln!("goenc: error: {err:#}");
    match err.downcast_ref::<goenc_crypto::Error>() {
        Some(goenc_crypto::Error::InvalidTag) => 1,
        _ if err.is::<app::UsageError>() => 2,
        _ => 3,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("GOENC_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
