//! Daemon orchestration.
//!
//! Wires the startup sequence together and runs the long-lived loops:
//! ingestion listener, control acceptor, interrupt acceptor. All loops run
//! until one of them fails fatally or a shutdown signal arrives; teardown
//! of the profile registration happens on the graceful path.

use crate::domain::{FunctionRegistry, Settings};
use crate::infrastructure::bluetooth::{
    advertisement, registrar, Broadcaster, L2capAcceptor, ProfileRegistrar, PSM_HID_CONTROL,
    PSM_HID_INTERRUPT,
};
use crate::infrastructure::ingest::IngestListener;
use anyhow::{Context, Result};
use tracing::info;

pub async fn run(settings: Settings) -> Result<()> {
    registrar::ensure_privileged()?;

    let registry = FunctionRegistry::from_configs(&settings.functions);
    info!(
        functions = registry.len(),
        "registered HID function descriptors"
    );

    let advertisement = advertisement::build(&settings.bluetooth.service_uuid, &registry)?;

    let registrar = ProfileRegistrar::connect()
        .await
        .context("connecting to BlueZ")?;
    let registration = registrar.register(&advertisement).await?;
    let adapter = registration.adapter_address;

    let broadcaster = Broadcaster::new(settings.bluetooth.client_queue_depth);

    let ingest = IngestListener::bind(&settings.ingest.host, settings.ingest.port).await?;
    let backlog = settings.bluetooth.accept_backlog;
    let control = L2capAcceptor::bind(adapter, PSM_HID_CONTROL, backlog)?;
    let interrupt = L2capAcceptor::bind(adapter, PSM_HID_INTERRUPT, backlog)?;

    info!("daemon running");

    let result = tokio::select! {
        res = ingest.run(broadcaster.clone()) => res.context("ingestion listener failed"),
        res = control.run_control() => res.context("control acceptor failed"),
        res = interrupt.run_interrupt(broadcaster.clone()) => res.context("interrupt acceptor failed"),
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    };

    // Unregisters the profile record from BlueZ.
    drop(registration);
    result
}
