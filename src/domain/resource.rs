//! Usage: Per-view settings resource state (form value, remote snapshot, sync state machine).

use serde::Serialize;

use crate::domain::schema::{FieldValue, SettingsPayload, SettingsSchema};
use crate::domain::validate;
use crate::error::SyncError;

/// Lifecycle of one settings resource while a view holds it.
///
/// ```text
/// Unloaded -> Loading -> Clean | LoadFailed
/// Clean -> Dirty -> Submitting -> Clean | Dirty
/// Dirty/Clean -> (reset) -> Clean
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Unloaded,
    Loading,
    LoadFailed,
    Clean,
    Dirty,
    Submitting,
}

/// Outcome of a successful save. Failures travel as `SyncError` and leave the
/// form value untouched for retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionResult {
    /// Server-persisted payload; may differ from what was sent when the
    /// server normalizes values.
    pub value: SettingsPayload,
    pub saved_at_ms: u64,
}

/// A settings bucket as one mounted view sees it: the last known server state
/// plus the in-progress edits. Dropping the resource discards unsaved edits.
#[derive(Debug, Clone)]
pub struct SettingsResource {
    schema: SettingsSchema,
    remote_value: Option<SettingsPayload>,
    form_value: SettingsPayload,
    state: SyncState,
    last_error: Option<String>,
    revision: u64,
}

impl SettingsResource {
    pub(crate) fn new(schema: SettingsSchema) -> Self {
        let form_value = schema.defaults();
        Self {
            schema,
            remote_value: None,
            form_value,
            state: SyncState::Unloaded,
            last_error: None,
            revision: 0,
        }
    }

    pub fn key(&self) -> &str {
        self.schema.key()
    }

    pub fn schema(&self) -> &SettingsSchema {
        &self.schema
    }

    pub fn state(&self) -> SyncState {
        self.state
    }

    pub fn remote_value(&self) -> Option<&SettingsPayload> {
        self.remote_value.as_ref()
    }

    pub fn form_value(&self) -> &SettingsPayload {
        &self.form_value
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Monotonic per-resource counter, bumped on every successful save.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Form differs from the last known server state. Before the first
    /// successful load there is no server state, so nothing counts as dirty.
    pub fn is_dirty(&self) -> bool {
        match &self.remote_value {
            Some(remote) => self.form_value != *remote,
            None => false,
        }
    }

    /// Applies one local edit. Rejected values leave the form untouched so a
    /// slider or text input snapping out of range can never corrupt state.
    /// Edits to currently-hidden fields are stored (flipping the parent back
    /// restores them) but are excluded from validation and submit while
    /// hidden.
    pub fn update_field(&mut self, name: &str, value: FieldValue) -> Result<(), SyncError> {
        let Some(spec) = self.schema.field(name) else {
            return Err(SyncError::single_violation(name, "unknown field"));
        };
        if let Err(violation) = validate::check_value(spec, &value) {
            return Err(SyncError::Validation {
                violations: vec![violation],
            });
        }

        self.form_value.insert(name.to_string(), value);
        self.recompute_edit_state();
        Ok(())
    }

    /// Discards edits and returns to the last known server state. Idempotent;
    /// before the first load it just re-applies schema defaults.
    pub fn reset(&mut self) {
        if let Some(remote) = &self.remote_value {
            self.form_value = remote.clone();
            self.state = SyncState::Clean;
        } else {
            self.form_value = self.schema.defaults();
            if self.state != SyncState::LoadFailed {
                self.state = SyncState::Unloaded;
            }
        }
        self.last_error = None;
    }

    /// The payload a submit would send right now: form value projected onto
    /// the currently visible fields.
    pub fn submit_payload(&self) -> SettingsPayload {
        self.schema.visible_payload(&self.form_value)
    }

    fn recompute_edit_state(&mut self) {
        if self.remote_value.is_some() {
            self.state = if self.is_dirty() {
                SyncState::Dirty
            } else {
                SyncState::Clean
            };
        }
    }

    pub(crate) fn begin_load(&mut self) {
        self.state = SyncState::Loading;
        self.last_error = None;
    }

    pub(crate) fn complete_load(&mut self, value: SettingsPayload) {
        self.remote_value = Some(value.clone());
        self.form_value = value;
        self.state = SyncState::Clean;
        self.last_error = None;
    }

    pub(crate) fn fail_load(&mut self, message: &str) {
        self.state = SyncState::LoadFailed;
        self.last_error = Some(message.to_string());
    }

    pub(crate) fn begin_submit(&mut self) {
        self.state = SyncState::Submitting;
        self.last_error = None;
    }

    /// Server value wins: both snapshots take the persisted payload so a
    /// server-side normalization leaves no residual dirty flag.
    pub(crate) fn complete_submit(&mut self, persisted: SettingsPayload) {
        self.remote_value = Some(persisted.clone());
        self.form_value = persisted;
        self.state = SyncState::Clean;
        self.last_error = None;
        self.revision += 1;
    }

    pub(crate) fn fail_submit(&mut self, message: &str) {
        self.state = SyncState::Dirty;
        self.last_error = Some(message.to_string());
    }

    /// Submit rejected before any network round trip (local validation, or a
    /// save for this key already in flight): record the error without
    /// pretending a request happened. Dirtiness stays whatever the edits say.
    pub(crate) fn reject_submit(&mut self, message: &str) {
        self.last_error = Some(message.to_string());
        self.recompute_edit_state();
    }
}
