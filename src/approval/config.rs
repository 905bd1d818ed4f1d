// SPDX-License-Identifier: MIT

//! Runtime settings from the environment
//!
//! `.env` is loaded by the binary before these are read. Command line flags
//! take precedence over anything set here.

use std::path::PathBuf;

use crate::engine::error::ApprovalError;

pub const FLOW_FILE_VAR: &str = "APPROVAL_FLOW_FILE";
pub const PORT_VAR: &str = "APPROVAL_PORT";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Flow definition loaded at startup
    pub flow_file: Option<PathBuf>,
    pub port: u16,
}

impl Settings {
    pub fn from_env() -> Result<Self, ApprovalError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ApprovalError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let flow_file = lookup(FLOW_FILE_VAR)
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);
        let port = match lookup(PORT_VAR) {
            Some(raw) => parse_port(&raw)?,
            None => DEFAULT_PORT,
        };
        Ok(Self { flow_file, port })
    }

    /// Apply command line overrides
    pub fn with_overrides(mut self, flow_file: Option<PathBuf>, port: Option<u16>) -> Self {
        if flow_file.is_some() {
            self.flow_file = flow_file;
        }
        if let Some(port) = port {
            self.port = port;
        }
        self
    }
}

fn parse_port(raw: &str) -> Result<u16, ApprovalError> {
    let Ok(port) = raw.trim().parse() else {
        let message = format!("{} must be a port number, got '{}'", PORT_VAR, raw);
        return Err(ApprovalError::config(message));
    };
    Ok(port)
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            flow_file: None,
            port: DEFAULT_PORT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_reads_variables() {
        let flow = "demos/flows/campus.yaml";
        let vars = [(FLOW_FILE_VAR, flow), (PORT_VAR, "8088")];
        let settings = Settings::from_lookup(lookup(&vars)).unwrap();
        assert_eq!(settings.flow_file, Some(PathBuf::from(flow)));
        assert_eq!(settings.port, 8088);
    }

    #[test]
    fn test_invalid_port() {
        let result = Settings::from_lookup(lookup(&[(PORT_VAR, "eighty")]));
        assert!(matches!(result, Err(ApprovalError::Config(_))));
    }

    #[test]
    fn test_overrides_win() {
        let settings = Settings::from_lookup(lookup(&[(PORT_VAR, "8088")]))
            .unwrap()
            .with_overrides(Some(PathBuf::from("flow.json")), Some(9000));
        assert_eq!(settings.port, 9000);
        assert_eq!(settings.flow_file, Some(PathBuf::from("flow.json")));

        let kept = Settings::default().with_overrides(None, None);
        assert_eq!(kept, Settings::default());
    }
}
