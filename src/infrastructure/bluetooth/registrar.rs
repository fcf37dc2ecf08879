//! Profile Registrar
//!
//! Registers the daemon as a Bluetooth HID profile server with BlueZ over
//! D-Bus and resolves the default adapter's address for socket binding.
//! Runs once at startup; the returned [`Registration`] keeps the profile
//! entry alive and unregisters it when dropped.

use crate::error::StartupError;
use crate::infrastructure::bluetooth::advertisement::ServiceAdvertisement;
use anyhow::{Context, Result};
use bluer::rfcomm::{Profile, ProfileHandle, Role};
use bluer::{Address, Session};
use tracing::info;

/// Live profile registration. Dropping this unregisters the record from
/// BlueZ; process exit would revoke it anyway, but the explicit path keeps
/// restarts clean.
pub struct Registration {
    pub adapter_address: Address,
    _handle: ProfileHandle,
}

pub struct ProfileRegistrar {
    session: Session,
}

impl ProfileRegistrar {
    /// Connect to the system D-Bus and the BlueZ service.
    pub async fn connect() -> bluer::Result<Self> {
        let session = Session::new().await?;
        Ok(Self { session })
    }

    /// Register the HID profile server and resolve the default adapter.
    ///
    /// Authentication and authorization are intentionally not required:
    /// the daemon emulates a plain input peripheral and relies on the
    /// host-side pairing flow, exactly like a dedicated hardware keyboard.
    pub async fn register(&self, advertisement: &ServiceAdvertisement) -> Result<Registration> {
        let profile = Profile {
            uuid: advertisement.uuid,
            name: Some("hidlink".to_string()),
            role: Some(Role::Server),
            require_authentication: Some(false),
            require_authorization: Some(false),
            auto_connect: Some(true),
            service_record: Some(advertisement.record.clone()),
            ..Default::default()
        };

        let handle = self
            .session
            .register_profile(profile)
            .await
            .context("registering HID profile with BlueZ")?;

        let adapter = self
            .session
            .default_adapter()
            .await
            .context("no Bluetooth adapter present")?;
        let adapter_address = adapter.address().await.context("resolving adapter address")?;

        info!(
            adapter = %adapter.name(),
            address = %adapter_address,
            uuid = %advertisement.uuid,
            "registered HID profile"
        );

        Ok(Registration {
            adapter_address,
            _handle: handle,
        })
    }
}

/// Raw L2CAP sockets require root regardless of what the D-Bus registration
/// allows; check up front so the daemon fails before touching the stack.
pub fn ensure_privileged() -> Result<(), StartupError> {
    let euid = unsafe { libc::geteuid() };
    if euid != 0 {
        return Err(StartupError::InsufficientPrivilege(euid));
    }
    Ok(())
}
