mod daemon;
mod domain;
mod error;
mod infrastructure;

use anyhow::Context;
use domain::Settings;
use tracing::info;

// Current-thread runtime: every task suspends at I/O boundaries and the
// client set sees one mutation at a time, matching the cooperative model
// the protocol handling was designed around.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    let _logging = infrastructure::logging::init_logger(&settings.log)?;

    info!(
        host = %settings.ingest.host,
        port = settings.ingest.port,
        "starting hidlink Bluetooth HID daemon"
    );

    daemon::run(settings).await
}
