//! Event-bearing command list operations.

use crate::{CommandListHandle, EventHandle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An operation appended to a command list that may signal and wait on events.
///
/// Only the fields needed to describe the operation in diagnostics are kept;
/// the checker never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Operation {
    /// Linear memory copy.
    MemoryCopy { dst: u64, src: u64, size: u64 },
    /// Memory fill with a repeating pattern.
    MemoryFill {
        ptr: u64,
        pattern_size: u64,
        size: u64,
    },
    /// Strided region copy.
    MemoryCopyRegion { dst: u64, src: u64 },
    /// Image to image copy.
    ImageCopy { dst: u64, src: u64 },
    /// Kernel launch.
    LaunchKernel { kernel: String, group_count: [u32; 3] },
    /// Cooperative kernel launch.
    LaunchCooperativeKernel { kernel: String, group_count: [u32; 3] },
    /// Execution barrier.
    Barrier,
    /// Barrier restricted to a set of memory ranges.
    MemoryRangesBarrier { ranges: u32 },
    /// Signal an event from the device.
    SignalEvent,
    /// Wait on events from the device.
    WaitOnEvents,
    /// Write a global timestamp to device memory.
    WriteGlobalTimestamp { dst: u64 },
}

impl Operation {
    /// Name of the intercepted entry point that appends this operation.
    pub fn api_name(&self) -> &'static str {
        match self {
            Operation::MemoryCopy { .. } => "zeCommandListAppendMemoryCopy",
            Operation::MemoryFill { .. } => "zeCommandListAppendMemoryFill",
            Operation::MemoryCopyRegion { .. } => "zeCommandListAppendMemoryCopyRegion",
            Operation::ImageCopy { .. } => "zeCommandListAppendImageCopy",
            Operation::LaunchKernel { .. } => "zeCommandListAppendLaunchKernel",
            Operation::LaunchCooperativeKernel { .. } => {
                "zeCommandListAppendLaunchCooperativeKernel"
            }
            Operation::Barrier => "zeCommandListAppendBarrier",
            Operation::MemoryRangesBarrier { .. } => "zeCommandListAppendMemoryRangesBarrier",
            Operation::SignalEvent => "zeCommandListAppendSignalEvent",
            Operation::WaitOnEvents => "zeCommandListAppendWaitOnEvents",
            Operation::WriteGlobalTimestamp { .. } => "zeCommandListAppendWriteGlobalTimestamp",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::MemoryCopy { dst, src, size } => {
                write!(f, "MemoryCopy(dst={dst:#x}, src={src:#x}, size={size})")
            }
            Operation::MemoryFill {
                ptr,
                pattern_size,
                size,
            } => write!(
                f,
                "MemoryFill(ptr={ptr:#x}, pattern_size={pattern_size}, size={size})"
            ),
            Operation::MemoryCopyRegion { dst, src } => {
                write!(f, "MemoryCopyRegion(dst={dst:#x}, src={src:#x})")
            }
            Operation::ImageCopy { dst, src } => {
                write!(f, "ImageCopy(dst={dst:#x}, src={src:#x})")
            }
            Operation::LaunchKernel {
                kernel,
                group_count: [x, y, z],
            } => write!(f, "LaunchKernel({kernel}, groups={x}x{y}x{z})"),
            Operation::LaunchCooperativeKernel {
                kernel,
                group_count: [x, y, z],
            } => write!(f, "LaunchCooperativeKernel({kernel}, groups={x}x{y}x{z})"),
            Operation::Barrier => write!(f, "Barrier"),
            Operation::MemoryRangesBarrier { ranges } => {
                write!(f, "MemoryRangesBarrier(ranges={ranges})")
            }
            Operation::SignalEvent => write!(f, "SignalEvent"),
            Operation::WaitOnEvents => write!(f, "WaitOnEvents"),
            Operation::WriteGlobalTimestamp { dst } => {
                write!(f, "WriteGlobalTimestamp(dst={dst:#x})")
            }
        }
    }
}

/// One intercepted append call: an operation plus its event dependencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    /// Command list the operation was appended to.
    #[serde(default)]
    pub command_list: CommandListHandle,
    /// The appended operation.
    pub operation: Operation,
    /// Event signaled when the operation completes.
    #[serde(default)]
    pub signal: Option<EventHandle>,
    /// Events that must be signaled before the operation may start.
    #[serde(default)]
    pub waits: Vec<EventHandle>,
}

impl Submission {
    /// Create a submission with no signal event and no waits.
    pub fn new(command_list: CommandListHandle, operation: Operation) -> Self {
        Self {
            command_list,
            operation,
            signal: None,
            waits: Vec::new(),
        }
    }

    /// Set the signal event.
    pub fn with_signal(mut self, event: EventHandle) -> Self {
        self.signal = Some(event);
        self
    }

    /// Set the wait events.
    pub fn with_waits(mut self, waits: impl IntoIterator<Item = EventHandle>) -> Self {
        self.waits = waits.into_iter().collect();
        self
    }

    /// Human-readable description recorded against the operation's graph node.
    pub fn describe(&self) -> String {
        let mut out = format!(
            "{} on {}: {}",
            self.operation.api_name(),
            self.command_list,
            self.operation
        );
        if let Some(signal) = self.signal {
            out.push_str(&format!(", signals {signal}"));
        }
        if !self.waits.is_empty() {
            let waits: Vec<String> = self.waits.iter().map(|w| w.to_string()).collect();
            out.push_str(&format!(", waits on [{}]", waits.join(", ")));
        }
        out
    }
}
