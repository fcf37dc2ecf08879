//! Service Advertisement Builder
//!
//! Builds the SDP record registered with BlueZ. The record template carries
//! the standard HID profile attributes (service class 0x1124, L2CAP PSMs
//! 0x0011/0x0013); the HIDDescriptorList attribute (0x0206) receives one
//! entry per registered HID-class function, each a sequence of the report
//! descriptor type tag (0x22) and the descriptor bytes hex-encoded.

use crate::domain::registry::FunctionRegistry;
use crate::error::StartupError;
use std::fmt::Write;
use uuid::Uuid;

/// Substitution point inside [`SERVICE_RECORD_TEMPLATE`].
const DESCRIPTOR_PLACEHOLDER: &str = "{descriptors}";

/// SDP type tag for a report descriptor inside HIDDescriptorList.
const HID_DESCRIPTOR_TYPE_REPORT: u8 = 0x22;

/// HID profile SDP record. Attribute layout follows the Bluetooth HID
/// specification; only 0x0206 varies per configuration.
const SERVICE_RECORD_TEMPLATE: &str = r#"<?xml version="1.0" encoding="UTF-8" ?>
<record>
    <attribute id="0x0001">
        <sequence>
            <uuid value="0x1124" />
        </sequence>
    </attribute>
    <attribute id="0x0004">
        <sequence>
            <sequence>
                <uuid value="0x0100" />
                <uint16 value="0x0011" />
            </sequence>
            <sequence>
                <uuid value="0x0011" />
            </sequence>
        </sequence>
    </attribute>
    <attribute id="0x0005">
        <sequence>
            <uuid value="0x1002" />
        </sequence>
    </attribute>
    <attribute id="0x0006">
        <sequence>
            <uint16 value="0x656e" />
            <uint16 value="0x006a" />
            <uint16 value="0x0100" />
        </sequence>
    </attribute>
    <attribute id="0x0009">
        <sequence>
            <sequence>
                <uuid value="0x1124" />
                <uint16 value="0x0100" />
            </sequence>
        </sequence>
    </attribute>
    <attribute id="0x000d">
        <sequence>
            <sequence>
                <sequence>
                    <uuid value="0x0100" />
                    <uint16 value="0x0013" />
                </sequence>
                <sequence>
                    <uuid value="0x0011" />
                </sequence>
            </sequence>
        </sequence>
    </attribute>
    <attribute id="0x0100">
        <text value="hidlink gadget" />
    </attribute>
    <attribute id="0x0101">
        <text value="Bluetooth HID bridge" />
    </attribute>
    <attribute id="0x0102">
        <text value="hidlink" />
    </attribute>
    <attribute id="0x0200">
        <uint16 value="0x0100" />
    </attribute>
    <attribute id="0x0201">
        <uint16 value="0x0111" />
    </attribute>
    <attribute id="0x0202">
        <uint8 value="0x40" />
    </attribute>
    <attribute id="0x0203">
        <uint8 value="0x00" />
    </attribute>
    <attribute id="0x0204">
        <boolean value="true" />
    </attribute>
    <attribute id="0x0205">
        <boolean value="true" />
    </attribute>
    <attribute id="0x0206">
        <sequence>
            {descriptors}
        </sequence>
    </attribute>
    <attribute id="0x0207">
        <sequence>
            <sequence>
                <uint16 value="0x0409" />
                <uint16 value="0x0100" />
            </sequence>
        </sequence>
    </attribute>
    <attribute id="0x020b">
        <uint16 value="0x0100" />
    </attribute>
    <attribute id="0x020c">
        <uint16 value="0x0c80" />
    </attribute>
    <attribute id="0x020d">
        <boolean value="false" />
    </attribute>
    <attribute id="0x020e">
        <boolean value="true" />
    </attribute>
</record>
"#;

/// Finished advertisement, ready for profile registration.
#[derive(Debug, Clone)]
pub struct ServiceAdvertisement {
    pub uuid: Uuid,
    pub record: String,
}

/// Build the advertisement for the given registry. Pure transform; fails
/// only on startup configuration errors.
pub fn build(
    service_uuid: &str,
    registry: &FunctionRegistry,
) -> Result<ServiceAdvertisement, StartupError> {
    if registry.is_empty() {
        return Err(StartupError::NoHidFunctions);
    }
    if !SERVICE_RECORD_TEMPLATE.contains(DESCRIPTOR_PLACEHOLDER) {
        return Err(StartupError::MalformedTemplate(DESCRIPTOR_PLACEHOLDER));
    }

    let uuid = Uuid::parse_str(service_uuid).map_err(|source| StartupError::InvalidServiceUuid {
        uuid: service_uuid.to_string(),
        source,
    })?;

    let mut entries = String::new();
    for function in registry.entries() {
        entries.push_str(&format!(
            "<sequence>\n                <uint8 value=\"0x{:02x}\" />\n                \
             <text encoding=\"hex\" value=\"{}\" />\n            </sequence>\n            ",
            HID_DESCRIPTOR_TYPE_REPORT,
            hex_encode(&function.descriptor),
        ));
    }

    let record = SERVICE_RECORD_TEMPLATE.replace(DESCRIPTOR_PLACEHOLDER, entries.trim_end());
    debug_assert!(!record.contains(DESCRIPTOR_PLACEHOLDER));

    Ok(ServiceAdvertisement { uuid, record })
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().fold(String::new(), |mut out, b| {
        let _ = write!(out, "{b:02x}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::functions::{Ethernet, HidFunction, Keyboard, Mouse, Touch};
    use crate::domain::settings::HID_SERVICE_UUID;

    fn registry() -> FunctionRegistry {
        let kb = Keyboard::new("kb0");
        let eth = Ethernet::new("usb0");
        let mouse = Mouse::new("mouse0");
        let touch = Touch::new("touch0");
        let functions: [&dyn HidFunction; 4] = [&kb, &eth, &mouse, &touch];
        FunctionRegistry::from_functions(functions)
    }

    #[test]
    fn test_record_contains_one_entry_per_hid_function() {
        let adv = build(HID_SERVICE_UUID, &registry()).unwrap();
        let entries = adv.record.matches("<uint8 value=\"0x22\" />").count();
        assert_eq!(entries, 3);
        assert!(!adv.record.contains(DESCRIPTOR_PLACEHOLDER));
    }

    #[test]
    fn test_descriptors_are_hex_encoded_in_registration_order() {
        let reg = registry();
        let adv = build(HID_SERVICE_UUID, &reg).unwrap();

        let mut last_pos = 0;
        for function in reg.entries() {
            let hex = hex_encode(&function.descriptor);
            let pos = adv.record[last_pos..]
                .find(&hex)
                .unwrap_or_else(|| panic!("descriptor for {} missing or out of order", function.name));
            last_pos += pos + hex.len();
        }
    }

    #[test]
    fn test_keyboard_descriptor_hex_prefix() {
        let adv = build(HID_SERVICE_UUID, &registry()).unwrap();
        // Keyboard descriptor starts 05 01 09 06 a1 01 (Generic Desktop / Keyboard).
        assert!(adv.record.contains("value=\"05010906a101"));
    }

    #[test]
    fn test_default_uuid_parses() {
        let adv = build(HID_SERVICE_UUID, &registry()).unwrap();
        assert_eq!(
            adv.uuid.to_string(),
            "00001124-0000-1000-8000-00805f9b34fb"
        );
    }

    #[test]
    fn test_invalid_uuid_is_fatal() {
        let err = build("not-a-uuid", &registry()).unwrap_err();
        assert!(matches!(err, StartupError::InvalidServiceUuid { .. }));
    }

    #[test]
    fn test_empty_registry_is_fatal() {
        let err = build(HID_SERVICE_UUID, &FunctionRegistry::default()).unwrap_err();
        assert!(matches!(err, StartupError::NoHidFunctions));
    }
}
