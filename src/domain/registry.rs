//! Report Descriptor Registry
//!
//! Assigns report ids to configured HID-class functions and holds their
//! descriptor bytes for the advertisement builder. Ids are dense, start at
//! 1, and follow configuration order; non-HID functions get no id at all.

use crate::domain::functions::{FunctionConfig, HidFunction};

/// A registered HID-class function with its assigned report id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredFunction {
    pub name: String,
    pub report_id: u8,
    pub descriptor: Vec<u8>,
}

/// Static registry built once at startup from the configured function set.
#[derive(Debug, Default)]
pub struct FunctionRegistry {
    entries: Vec<RegisteredFunction>,
}

impl FunctionRegistry {
    /// Build a registry over the given functions, in order. Only HID-class
    /// functions are registered; everything else is skipped without
    /// consuming a report id.
    pub fn from_functions<'a, I>(functions: I) -> Self
    where
        I: IntoIterator<Item = &'a dyn HidFunction>,
    {
        let mut entries = Vec::new();
        let mut next_id = 1u8;

        for function in functions {
            if !function.is_hid_class() {
                continue;
            }
            entries.push(RegisteredFunction {
                name: function.name().to_string(),
                report_id: next_id,
                descriptor: function.report_descriptor().to_vec(),
            });
            next_id += 1;
        }

        Self { entries }
    }

    /// Instantiate the configured functions and register the HID-class ones.
    pub fn from_configs(configs: &[FunctionConfig]) -> Self {
        let functions: Vec<Box<dyn HidFunction>> =
            configs.iter().map(|c| c.instantiate()).collect();
        Self::from_functions(functions.iter().map(|f| f.as_ref()))
    }

    /// Registered functions in report-id order.
    pub fn entries(&self) -> &[RegisteredFunction] {
        &self.entries
    }

    /// Report id assigned to a function name, if it is registered.
    pub fn report_id(&self, name: &str) -> Option<u8> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.report_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::functions::{Ethernet, Keyboard, Mouse};

    #[test]
    fn test_report_ids_skip_non_hid_functions() {
        let kb = Keyboard::new("kb0");
        let eth = Ethernet::new("usb0");
        let mouse = Mouse::new("mouse0");
        let functions: [&dyn HidFunction; 3] = [&kb, &eth, &mouse];

        let registry = FunctionRegistry::from_functions(functions);

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.report_id("kb0"), Some(1));
        assert_eq!(registry.report_id("mouse0"), Some(2));
        assert_eq!(registry.report_id("usb0"), None);
    }

    #[test]
    fn test_report_ids_are_dense_and_ordered() {
        let a = Mouse::new("a");
        let b = Mouse::new("b");
        let c = Mouse::new("c");
        let functions: [&dyn HidFunction; 3] = [&a, &b, &c];

        let registry = FunctionRegistry::from_functions(functions);

        let ids: Vec<u8> = registry.entries().iter().map(|e| e.report_id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let names: Vec<&str> = registry.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_registry() {
        let eth = Ethernet::new("usb0");
        let functions: [&dyn HidFunction; 1] = [&eth];
        let registry = FunctionRegistry::from_functions(functions);
        assert!(registry.is_empty());
    }
}
