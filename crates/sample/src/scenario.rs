//! Scenario definitions.

use eventlock_types::Operation;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Errors loading a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// No built-in scenario has this name.
    #[error("Unknown scenario: {0} (expected one of: chain, deadlock, undeclared-wait)")]
    Unknown(String),

    /// The scenario file could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The scenario file is not valid.
    #[error("Invalid scenario file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// One step of a scenario. Events are referred to by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Create an event.
    CreateEvent { name: String },
    /// Destroy an event.
    DestroyEvent { name: String },
    /// Reset an event from the host.
    ResetEvent { name: String },
    /// Append an operation to the command list.
    Append {
        operation: Operation,
        #[serde(default)]
        signal: Option<String>,
        #[serde(default)]
        waits: Vec<String>,
    },
}

/// A named sequence of steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario name.
    pub name: String,
    /// What the scenario demonstrates.
    #[serde(default)]
    pub description: String,
    /// Steps, run in order.
    pub steps: Vec<Step>,
}

const BUFFER_SIZE: u64 = 1024;
const HOST_BUFFER: u64 = 0x7f00_0000_0000;
const DEVICE_BUFFER: u64 = 0xff00_0000_0000;

fn host_to_device(signal: &str, waits: &[&str]) -> Step {
    Step::Append {
        operation: Operation::MemoryCopy {
            dst: DEVICE_BUFFER,
            src: HOST_BUFFER,
            size: BUFFER_SIZE,
        },
        signal: Some(signal.to_string()),
        waits: waits.iter().map(|w| w.to_string()).collect(),
    }
}

fn create<'a>(names: &'a [&'a str]) -> impl Iterator<Item = Step> + 'a {
    names.iter().map(|name| Step::CreateEvent {
        name: name.to_string(),
    })
}

fn destroy<'a>(names: &'a [&'a str]) -> impl Iterator<Item = Step> + 'a {
    names.iter().map(|name| Step::DestroyEvent {
        name: name.to_string(),
    })
}

impl Scenario {
    /// Look up a built-in scenario by name.
    pub fn builtin(name: &str) -> Result<Self, ScenarioError> {
        match name.to_lowercase().as_str() {
            "chain" => Ok(Self::chain()),
            "deadlock" => Ok(Self::deadlock()),
            "undeclared-wait" | "undeclared" => Ok(Self::undeclared_wait()),
            _ => Err(ScenarioError::Unknown(name.to_string())),
        }
    }

    /// Load a scenario from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&text)
    }

    /// Parse a scenario from TOML text.
    pub fn from_toml(text: &str) -> Result<Self, ScenarioError> {
        Ok(toml::from_str(text)?)
    }

    /// Three host-to-device copies, each waiting on the previous one.
    pub fn chain() -> Self {
        let events = ["e0", "e1", "e2"];
        let steps = create(&events)
            .chain([
                host_to_device("e0", &[]),
                host_to_device("e1", &["e0"]),
                host_to_device("e2", &["e1"]),
            ])
            .chain(destroy(&events))
            .collect();
        Self {
            name: "chain".to_string(),
            description: "Linear chain of copies; no cycle.".to_string(),
            steps,
        }
    }

    /// Three copies whose waits form a loop.
    ///
    /// The first copy waits on the event signaled by the last one, so the
    /// third append closes the cycle.
    pub fn deadlock() -> Self {
        let events = ["e0", "e1", "e2"];
        let steps = create(&events)
            .chain([
                host_to_device("e0", &["e2"]),
                host_to_device("e1", &["e0"]),
                host_to_device("e2", &["e1"]),
            ])
            .chain(destroy(&events))
            .collect();
        Self {
            name: "deadlock".to_string(),
            description: "Copies e0 -> e1 -> e2 where the first waits on e2.".to_string(),
            steps,
        }
    }

    /// A copy waiting on an event that was never created.
    pub fn undeclared_wait() -> Self {
        let steps = create(&["e0"])
            .chain([host_to_device("e0", &["missing"])])
            .chain(destroy(&["e0"]))
            .collect();
        Self {
            name: "undeclared-wait".to_string(),
            description: "Wait on an event handle that was never created.".to_string(),
            steps,
        }
    }
}
