//! HID Function Definitions
//!
//! Each device function the gadget can expose is a concrete type
//! implementing [`HidFunction`]. The daemon only cares about the stable
//! instance name and the raw report descriptor bytes; report *contents* are
//! produced elsewhere and arrive pre-encoded over the ingestion socket.

use serde::{Deserialize, Serialize};

/// Capability exposed by every configurable device function.
///
/// Non-HID functions (e.g. the ECM ethernet function) still appear in the
/// configuration but are excluded from report-id assignment and from the
/// service record.
pub trait HidFunction {
    /// Configured instance name, unique within the gadget.
    fn name(&self) -> &str;

    /// Raw HID report descriptor bytes. Empty for non-HID functions.
    fn report_descriptor(&self) -> &'static [u8];

    /// Whether this function speaks the HID protocol.
    fn is_hid_class(&self) -> bool {
        true
    }
}

/// Standard 8-byte boot keyboard with LED output report.
pub struct Keyboard {
    name: String,
}

/// Three-button mouse with 16-bit relative X/Y and an 8-bit wheel.
pub struct Mouse {
    name: String,
}

/// Absolute single-touch digitizer (stylus), 16-bit X/Y in [0, 10000].
pub struct Touch {
    name: String,
}

/// ECM ethernet function. Not HID-class; never advertised.
pub struct Ethernet {
    name: String,
}

const KEYBOARD_REPORT_DESC: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x03, //   Usage Maximum (Scroll Lock)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x03, //   Report Count (3)
    0x91, 0x02, //   Output (Data,Var,Abs)
    0x09, 0x4B, //   Usage (Generic Indicator)
    0x95, 0x01, //   Report Count (1)
    0x91, 0x02, //   Output (Data,Var,Abs)
    0x95, 0x04, //   Report Count (4)
    0x91, 0x01, //   Output (Const,Array,Abs) ; LED padding
    0x05, 0x07, //   Usage Page (Kbrd/Keypad)
    0x19, 0xE0, //   Usage Minimum (Left Ctrl)
    0x29, 0xE7, //   Usage Maximum (Right Meta)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data,Var,Abs) ; modifiers
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x01, //   Input (Const,Array,Abs) ; reserved byte
    0x19, 0x00, //   Usage Minimum (0x00)
    0x29, 0x91, //   Usage Maximum (0x91)
    0x26, 0xFF, 0x00, // Logical Maximum (255)
    0x95, 0x06, //   Report Count (6)
    0x81, 0x00, //   Input (Data,Array,Abs) ; keycode rollover
    0xC0, // End Collection
];

const MOUSE_REPORT_DESC: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x03, //   Usage Maximum (Button 3)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x95, 0x03, //   Report Count (3)
    0x75, 0x01, //   Report Size (1)
    0x81, 0x02, //   Input (Data,Var,Abs) ; buttons
    0x95, 0x01, //   Report Count (1)
    0x75, 0x05, //   Report Size (5)
    0x81, 0x03, //   Input (Const) ; padding
    0x05, 0x01, //   Usage Page (Generic Desktop)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x16, 0x01, 0x80, // Logical Minimum (-32767)
    0x26, 0xFF, 0x7F, // Logical Maximum (32767)
    0x75, 0x10, //     Report Size (16)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x06, //     Input (Data,Var,Rel) ; dx, dy
    0xC0, //   End Collection
    0x09, 0x38, //   Usage (Wheel)
    0x15, 0x81, //   Logical Minimum (-127)
    0x25, 0x7F, //   Logical Maximum (127)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x06, //   Input (Data,Var,Rel)
    0xC0, // End Collection
];

const TOUCH_REPORT_DESC: &[u8] = &[
    0x05, 0x0D, // Usage Page (Digitizer)
    0x09, 0x02, // Usage (Pen)
    0xA1, 0x01, // Collection (Application)
    0x09, 0x20, //   Usage (Stylus)
    0xA1, 0x00, //   Collection (Physical)
    0x09, 0x42, //     Usage (Tip Switch)
    0x09, 0x32, //     Usage (In Range)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x02, //     Report Count (2)
    0x81, 0x02, //     Input (Data,Var,Abs)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x06, //     Report Count (6)
    0x81, 0x01, //     Input (Const,Array,Abs) ; padding
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x01, //     Usage (Pointer)
    0xA1, 0x00, //     Collection (Physical)
    0x09, 0x30, //       Usage (X)
    0x09, 0x31, //       Usage (Y)
    0x16, 0x00, 0x00, //   Logical Minimum (0)
    0x26, 0x10, 0x27, //   Logical Maximum (10000)
    0x36, 0x00, 0x00, //   Physical Minimum (0)
    0x46, 0x10, 0x27, //   Physical Maximum (10000)
    0x66, 0x00, 0x00, //   Unit (None)
    0x75, 0x10, //       Report Size (16)
    0x95, 0x02, //       Report Count (2)
    0x81, 0x02, //       Input (Data,Var,Abs)
    0xC0, //     End Collection
    0xC0, //   End Collection
    0xC0, // End Collection
];

impl Keyboard {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Mouse {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Touch {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Ethernet {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl HidFunction for Keyboard {
    fn name(&self) -> &str {
        &self.name
    }

    fn report_descriptor(&self) -> &'static [u8] {
        KEYBOARD_REPORT_DESC
    }
}

impl HidFunction for Mouse {
    fn name(&self) -> &str {
        &self.name
    }

    fn report_descriptor(&self) -> &'static [u8] {
        MOUSE_REPORT_DESC
    }
}

impl HidFunction for Touch {
    fn name(&self) -> &str {
        &self.name
    }

    fn report_descriptor(&self) -> &'static [u8] {
        TOUCH_REPORT_DESC
    }
}

impl HidFunction for Ethernet {
    fn name(&self) -> &str {
        &self.name
    }

    fn report_descriptor(&self) -> &'static [u8] {
        &[]
    }

    fn is_hid_class(&self) -> bool {
        false
    }
}

/// Function kind as it appears in the settings file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    Keyboard,
    Mouse,
    Touch,
    Ethernet,
}

/// One configured function instance: a kind plus a stable name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub kind: FunctionKind,
    pub name: String,
}

impl FunctionConfig {
    pub fn instantiate(&self) -> Box<dyn HidFunction> {
        match self.kind {
            FunctionKind::Keyboard => Box::new(Keyboard::new(&self.name)),
            FunctionKind::Mouse => Box::new(Mouse::new(&self.name)),
            FunctionKind::Touch => Box::new(Touch::new(&self.name)),
            FunctionKind::Ethernet => Box::new(Ethernet::new(&self.name)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors_nonempty_for_hid_functions() {
        let kb = Keyboard::new("kb0");
        let mouse = Mouse::new("mouse0");
        let touch = Touch::new("touch0");
        assert!(!kb.report_descriptor().is_empty());
        assert!(!mouse.report_descriptor().is_empty());
        assert!(!touch.report_descriptor().is_empty());
        assert!(kb.is_hid_class() && mouse.is_hid_class() && touch.is_hid_class());
    }

    #[test]
    fn test_ethernet_is_not_hid_class() {
        let eth = Ethernet::new("usb0");
        assert!(!eth.is_hid_class());
        assert!(eth.report_descriptor().is_empty());
    }

    #[test]
    fn test_function_kind_parses_lowercase() {
        let cfg: FunctionConfig =
            serde_json::from_str(r#"{"kind": "keyboard", "name": "kb0"}"#).unwrap();
        assert_eq!(cfg.kind, FunctionKind::Keyboard);
        assert_eq!(cfg.instantiate().name(), "kb0");
    }
}
