//! Per-user session state.
//!
//! One [`Session`] is created when a wizard run starts and dropped when it
//! ends. The controller borrows it mutably for every action, so there is no
//! global state.

use super::step::WizardStep;
use crate::catalog::WorkingSet;
use crate::config::{AppSettings, AuditLog};

/// Workflow-specific fields; everything "reset flow" clears.
#[derive(Debug, Clone, Default)]
pub struct FlowState {
    pub step: WizardStep,
    pub schema: Option<String>,
    pub table: Option<String>,
    pub working_set: WorkingSet,
    pub table_description: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub settings: AppSettings,
    connection_verified: bool,
    flow: FlowState,
    log: AuditLog,
}

impl Session {
    pub fn new(settings: AppSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn step(&self) -> WizardStep {
        self.flow.step
    }

    pub fn schema(&self) -> Option<&str> {
        self.flow.schema.as_deref()
    }

    pub fn table(&self) -> Option<&str> {
        self.flow.table.as_deref()
    }

    /// `schema.table` of the loaded table, if any.
    pub fn qualified_table(&self) -> Option<String> {
        Some(format!("{}.{}", self.schema()?, self.table()?))
    }

    pub fn working_set(&self) -> &WorkingSet {
        &self.flow.working_set
    }

    pub fn table_description(&self) -> Option<&str> {
        self.flow.table_description.as_deref()
    }

    pub fn connection_verified(&self) -> bool {
        self.connection_verified
    }

    pub fn log(&self) -> &AuditLog {
        &self.log
    }

    pub fn log_event(&mut self, message: impl Into<String>) {
        self.log.push(message);
    }

    /// Clear every field, configuration included.
    pub fn full_reset(&mut self) {
        *self = Self::default();
        tracing::info!("Session fully reset");
    }

    /// Clear the workflow (step, table, working set, description, log) but
    /// keep settings and connection status.
    pub fn reset_flow(&mut self) {
        self.flow = FlowState::default();
        self.log = AuditLog::new();
        tracing::info!("Workflow reset");
    }

    pub(crate) fn set_connection_verified(&mut self, verified: bool) {
        self.connection_verified = verified;
    }

    pub(crate) fn flow_mut(&mut self) -> &mut FlowState {
        &mut self.flow
    }

    pub(crate) fn flow_and_log_mut(&mut self) -> (&mut FlowState, &mut AuditLog) {
        (&mut self.flow, &mut self.log)
    }
}
