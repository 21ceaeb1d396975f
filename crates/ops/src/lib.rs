//! Tabula ops: crud popup orchestration for one table instance.
//!
//! Owns the transient popup state (view / edit / delete-confirm), the edit
//! buffer with its field errors, and the notification channel surfacing
//! outcomes. On confirmed submit it emits a [`Mutation`] for the record
//! store; it never applies mutations itself.

#![forbid(unsafe_code)]

use std::collections::BTreeMap;

use metrics::counter;
use tabula_core::columns::EntityKind;
use tabula_core::{FieldValue, Fields, Mutation, Record, RecordId, StoreError};
use tracing::debug;

mod notify;

pub use notify::{Notification, NotificationChannel, NotificationKind};

/// Working copy of one record under edit, plus field-level errors.
///
/// Created when a create/edit popup opens, discarded on cancel, turned into
/// exactly one [`Mutation`] on a valid submit. `id` is `None` for creates.
#[derive(Debug, Clone)]
pub struct EditBuffer {
    pub id: Option<RecordId>,
    pub fields: Fields,
    errors: BTreeMap<String, String>,
    dirty: bool,
}

impl EditBuffer {
    fn for_create(entity: EntityKind) -> Self {
        Self {
            id: None,
            fields: tabula_schema::default_template(entity),
            errors: BTreeMap::new(),
            dirty: false,
        }
    }

    fn for_edit(record: &Record) -> Self {
        Self {
            id: Some(record.id.clone()),
            fields: record.fields.clone(),
            errors: BTreeMap::new(),
            dirty: false,
        }
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &BTreeMap<String, String> {
        &self.errors
    }

    /// True once any field was touched since the buffer opened.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Which popup (if any) is open. One table shows at most one popup at a time.
#[derive(Debug, Clone)]
pub enum PopupState {
    Closed,
    Viewing(Record),
    Editing(EditBuffer),
    Deleting(Record),
}

impl PopupState {
    pub fn is_closed(&self) -> bool {
        matches!(self, PopupState::Closed)
    }
}

/// Result of a [`CrudOrchestrator::close`] request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The buffer has unsaved edits; the popup stays open until the caller
    /// resolves the prompt via `confirm_discard` or `cancel_discard`.
    ConfirmRequired,
}

/// Mediates create/edit/delete intents for one table.
pub struct CrudOrchestrator {
    entity: EntityKind,
    state: PopupState,
    discard_pending: bool,
    pub notifications: NotificationChannel,
}

impl CrudOrchestrator {
    pub fn new(entity: EntityKind) -> Self {
        Self {
            entity,
            state: PopupState::Closed,
            discard_pending: false,
            notifications: NotificationChannel::new(),
        }
    }

    pub fn entity(&self) -> EntityKind {
        self.entity
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    /// True while a discard-confirmation prompt is waiting on the user.
    pub fn discard_pending(&self) -> bool {
        self.discard_pending
    }

    // ---------------- opening ----------------

    /// Open the read-only detail popup. Only from `Closed`; a popup already
    /// on screen wins.
    pub fn open_view(&mut self, record: Record) {
        if !self.state.is_closed() {
            debug!(entity = self.entity.as_str(), "ignoring open_view while a popup is open");
            return;
        }
        self.state = PopupState::Viewing(record);
    }

    /// Open the create popup with the entity's default-valued template. The
    /// buffer has no id and no validation errors; rules bite at submit.
    pub fn open_create(&mut self) {
        if !self.state.is_closed() {
            debug!(entity = self.entity.as_str(), "ignoring open_create while a popup is open");
            return;
        }
        self.state = PopupState::Editing(EditBuffer::for_create(self.entity));
    }

    /// Open the edit popup over a working copy of `record`. Allowed from
    /// `Closed` or from the detail popup.
    pub fn open_edit(&mut self, record: &Record) {
        match self.state {
            PopupState::Closed | PopupState::Viewing(_) => {
                self.state = PopupState::Editing(EditBuffer::for_edit(record));
            }
            _ => debug!(entity = self.entity.as_str(), "ignoring open_edit while editing or deleting"),
        }
    }

    // ---------------- editing ----------------

    /// Mutate one buffer field in place. A previous validation error on the
    /// field is cleared; re-validation only happens at submit.
    pub fn update_field(&mut self, name: &str, value: FieldValue) {
        match &mut self.state {
            PopupState::Editing(buffer) => {
                buffer.fields.insert(name.to_string(), value);
                buffer.errors.remove(name);
                buffer.dirty = true;
            }
            _ => debug!(field = name, "ignoring field update outside an edit popup"),
        }
    }

    /// Validate the buffer and, if clean, emit the mutation and close.
    ///
    /// On validation errors the popup stays open with the errors attached
    /// and no mutation is produced. An unchanged edit is not special-cased;
    /// it still emits an `Update`.
    pub fn submit(&mut self) -> Option<Mutation> {
        let buffer = match &mut self.state {
            PopupState::Editing(buffer) => buffer,
            _ => {
                debug!("ignoring submit outside an edit popup");
                return None;
            }
        };
        let errors = tabula_schema::validate(self.entity, &buffer.fields);
        if !errors.is_empty() {
            counter!("crud_submit_rejected_total", 1u64);
            buffer.errors = errors;
            return None;
        }

        let buffer = match std::mem::replace(&mut self.state, PopupState::Closed) {
            PopupState::Editing(buffer) => buffer,
            _ => unreachable!("state checked above"),
        };
        self.discard_pending = false;
        let mutation = match buffer.id {
            None => {
                self.notifications.push("Record created", NotificationKind::Success);
                counter!("crud_mutations_total", 1u64, "kind" => "create");
                Mutation::Create { fields: buffer.fields }
            }
            Some(id) => {
                self.notifications.push("Record updated", NotificationKind::Success);
                counter!("crud_mutations_total", 1u64, "kind" => "update");
                Mutation::Update { id, fields: buffer.fields }
            }
        };
        Some(mutation)
    }

    // ---------------- deleting ----------------

    /// Raise the delete confirmation gate; no mutation until confirmed.
    pub fn request_delete(&mut self, record: Record) {
        match self.state {
            PopupState::Closed | PopupState::Viewing(_) => {
                self.state = PopupState::Deleting(record);
            }
            _ => debug!(entity = self.entity.as_str(), "ignoring request_delete while editing"),
        }
    }

    pub fn confirm_delete(&mut self) -> Option<Mutation> {
        match std::mem::replace(&mut self.state, PopupState::Closed) {
            PopupState::Deleting(record) => {
                self.notifications.push("Record deleted", NotificationKind::Success);
                counter!("crud_mutations_total", 1u64, "kind" => "delete");
                Some(Mutation::Delete { id: record.id })
            }
            other => {
                self.state = other;
                debug!("ignoring confirm_delete outside the delete gate");
                None
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        if matches!(self.state, PopupState::Deleting(_)) {
            self.state = PopupState::Closed;
        }
    }

    // ---------------- closing ----------------

    /// Request closing whatever popup is open.
    ///
    /// A dirty edit buffer is never discarded silently: the first close
    /// raises a confirmation prompt and the popup stays open until
    /// [`confirm_discard`](Self::confirm_discard) or
    /// [`cancel_discard`](Self::cancel_discard) resolves it.
    pub fn close(&mut self) -> CloseOutcome {
        if let PopupState::Editing(buffer) = &self.state {
            if buffer.is_dirty() {
                self.discard_pending = true;
                return CloseOutcome::ConfirmRequired;
            }
        }
        self.force_close();
        CloseOutcome::Closed
    }

    /// Close using a caller-supplied confirmation gate, for hosts with their
    /// own blocking dialog. The gate is consulted only for dirty buffers.
    pub fn close_via(&mut self, gate: impl FnOnce(&EditBuffer) -> bool) -> CloseOutcome {
        if let PopupState::Editing(buffer) = &self.state {
            if buffer.is_dirty() && !gate(buffer) {
                return CloseOutcome::ConfirmRequired;
            }
        }
        self.force_close();
        CloseOutcome::Closed
    }

    /// Resolve a pending discard prompt by throwing the buffer away.
    pub fn confirm_discard(&mut self) {
        if self.discard_pending {
            self.force_close();
        }
    }

    /// Resolve a pending discard prompt by keeping the popup open.
    pub fn cancel_discard(&mut self) {
        self.discard_pending = false;
    }

    fn force_close(&mut self) {
        self.state = PopupState::Closed;
        self.discard_pending = false;
    }

    // ---------------- failure reporting ----------------

    /// Surface a backing-store failure without touching the popup state, so
    /// a preserved edit buffer can be resubmitted.
    pub fn report_failure(&mut self, message: impl Into<String>) {
        self.notifications.push(message, NotificationKind::Error);
    }

    /// Like [`report_failure`](Self::report_failure), for errors returned by
    /// a persistent backing store.
    pub fn report_store_error(&mut self, error: &StoreError) {
        counter!("crud_store_errors_total", 1u64);
        self.report_failure(error.to_string());
    }
}
