//! Simulated runtime that sends scenario steps through the validation layer.

use crate::{Scenario, Step};
use eventlock_core::{ApiCall, CallOutcome, Violation};
use eventlock_layer::ValidationLayer;
use eventlock_types::{CommandListHandle, EventHandle, EventPoolHandle, Submission};
use std::collections::HashMap;
use tracing::{debug, info};

/// Counts of what a scenario run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps that completed.
    pub steps: usize,
    /// Events created.
    pub created: usize,
    /// Operations appended.
    pub appended: usize,
}

/// Stands in for the accelerator runtime.
///
/// Event handles of destroyed events are handed out again on the next
/// create, the way a real event pool recycles slots.
pub struct SimulatedDriver {
    layer: ValidationLayer,
    pool: EventPoolHandle,
    command_list: CommandListHandle,
    events: HashMap<String, EventHandle>,
    free_handles: Vec<EventHandle>,
    next_handle: u64,
    next_index: u32,
}

impl SimulatedDriver {
    /// Create a driver that routes every call through `layer`.
    pub fn new(layer: ValidationLayer) -> Self {
        Self {
            layer,
            pool: EventPoolHandle(0x5000),
            command_list: CommandListHandle(0xc000),
            events: HashMap::new(),
            free_handles: Vec::new(),
            next_handle: 0xe000,
            next_index: 0,
        }
    }

    /// The layer calls are routed through.
    pub fn layer(&self) -> &ValidationLayer {
        &self.layer
    }

    /// Handle currently bound to the event `name`.
    pub fn event(&self, name: &str) -> Option<EventHandle> {
        self.events.get(name).copied()
    }

    /// Run every step of `scenario`, stopping at the first violation.
    pub fn run(&mut self, scenario: &Scenario) -> Result<RunSummary, Violation> {
        info!(scenario = %scenario.name, steps = scenario.steps.len(), "Running scenario");
        let mut summary = RunSummary::default();

        for step in &scenario.steps {
            match step {
                Step::CreateEvent { name } => {
                    self.create_event(name)?;
                    summary.created += 1;
                }
                Step::DestroyEvent { name } => {
                    if let Some(event) = self.events.remove(name) {
                        self.call(ApiCall::EventDestroy { event }, CallOutcome::Success)?;
                        self.free_handles.push(event);
                    }
                }
                Step::ResetEvent { name } => {
                    let event = self.resolve(name);
                    self.call(ApiCall::EventHostReset { event }, CallOutcome::Success)?;
                }
                Step::Append {
                    operation,
                    signal,
                    waits,
                } => {
                    let submission = Submission {
                        command_list: self.command_list,
                        operation: operation.clone(),
                        signal: signal.as_deref().map(|name| self.resolve(name)),
                        waits: waits.iter().map(|name| self.resolve(name)).collect(),
                    };
                    self.call(ApiCall::Append(submission), CallOutcome::Success)?;
                    summary.appended += 1;
                }
            }
            summary.steps += 1;
        }

        info!(
            scenario = %scenario.name,
            created = summary.created,
            appended = summary.appended,
            "Scenario completed"
        );
        Ok(summary)
    }

    fn create_event(&mut self, name: &str) -> Result<EventHandle, Violation> {
        let call = ApiCall::EventCreate {
            pool: self.pool,
            index: self.next_index,
        };
        self.next_index += 1;

        self.layer.prologue(&call)?;
        let event = self.free_handles.pop().unwrap_or_else(|| self.fresh_handle());
        self.layer.epilogue(&call, &CallOutcome::Created(event))?;

        self.events.insert(name.to_string(), event);
        debug!(name, %event, "SUCCESS : zeEventCreate");
        Ok(event)
    }

    /// Handle for `name`, inventing one if the scenario never created it.
    fn resolve(&mut self, name: &str) -> EventHandle {
        if let Some(&event) = self.events.get(name) {
            return event;
        }
        let event = self.fresh_handle();
        debug!(name, %event, "Using handle of an event that was never created");
        self.events.insert(name.to_string(), event);
        event
    }

    fn fresh_handle(&mut self) -> EventHandle {
        let event = EventHandle(self.next_handle);
        self.next_handle += 0x40;
        event
    }

    fn call(&self, call: ApiCall, outcome: CallOutcome) -> Result<(), Violation> {
        self.layer.prologue(&call)?;
        self.layer.epilogue(&call, &outcome)?;
        debug!("SUCCESS : {}", call.api_name());
        Ok(())
    }
}
