//! Usage: Settings synchronization engine (load → edit → validate → submit → reconcile → report).

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::domain::catalog;
use crate::domain::resource::{SettingsResource, SubmissionResult};
use crate::domain::schema::{SettingsPayload, SettingsSchema};
use crate::domain::validate;
use crate::error::SyncError;
use crate::infra::invalidation::{Invalidation, InvalidationHub};
use crate::infra::transport::SettingsTransport;
use crate::shared::mutex_ext::MutexExt;
use crate::shared::notice::{self, NoticeLevel, NoticeSink, TracingNoticeSink};
use crate::shared::time;

/// One engine per console session. Views open resources through it; the
/// engine owns the transport, the per-key submit serialization, the
/// invalidation hub, and the notice reporting. Local edits stay synchronous
/// on the resource itself; only load and submit touch the network.
pub struct SettingsEngine {
    transport: Arc<dyn SettingsTransport>,
    schemas: HashMap<String, SettingsSchema>,
    hub: InvalidationHub,
    notices: Arc<dyn NoticeSink>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl std::fmt::Debug for SettingsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsEngine")
            .field("schemas", &self.schemas.keys())
            .finish_non_exhaustive()
    }
}

impl SettingsEngine {
    /// Engine over the built-in console catalog.
    pub fn new(transport: Arc<dyn SettingsTransport>) -> Self {
        // Static data; key uniqueness is covered by the catalog tests.
        Self::with_schemas(transport, catalog::catalog())
            .expect("built-in catalog has unique resource keys")
    }

    /// Engine over a caller-supplied schema set. Resource keys must be
    /// unique; a duplicate would silently shadow another resource.
    pub fn with_schemas(
        transport: Arc<dyn SettingsTransport>,
        schemas: Vec<SettingsSchema>,
    ) -> Result<Self, String> {
        let mut map = HashMap::with_capacity(schemas.len());
        for schema in schemas {
            let key = schema.key().to_string();
            if map.insert(key.clone(), schema).is_some() {
                return Err(format!("duplicate resource key: {key}"));
            }
        }
        Ok(Self {
            transport,
            schemas: map,
            hub: InvalidationHub::new(),
            notices: Arc::new(TracingNoticeSink),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    pub fn with_notice_sink(mut self, sink: Arc<dyn NoticeSink>) -> Self {
        self.notices = sink;
        self
    }

    /// Other views subscribe here to learn that their resource key was saved
    /// elsewhere and must refetch before next use.
    pub fn subscribe(&self, key: &str) -> broadcast::Receiver<Invalidation> {
        self.hub.subscribe(key)
    }

    /// Creates an unloaded resource for a catalog key. Key syntax and catalog
    /// membership are checked up front so typos fail before any network call.
    pub fn open(&self, key: &str) -> Result<SettingsResource, SyncError> {
        validate::validate_resource_key(key).map_err(|message| SyncError::InvalidKey {
            key: key.to_string(),
            message,
        })?;
        let schema = self
            .schemas
            .get(key)
            .ok_or_else(|| SyncError::UnknownResource(key.to_string()))?;
        Ok(SettingsResource::new(schema.clone()))
    }

    /// Convenience: open + first fetch. On fetch failure the resource is
    /// dropped with the error; use `open` + `reload` when the view needs to
    /// keep a retryable load-failed resource on screen.
    pub async fn load(&self, key: &str) -> Result<SettingsResource, SyncError> {
        let mut resource = self.open(key)?;
        self.reload(&mut resource).await?;
        Ok(resource)
    }

    /// Fetches the remote value into the resource. Re-enterable: a
    /// load-failed resource retries through here, and a view reacting to an
    /// invalidation refetches through here. Unsaved local edits are replaced
    /// by the fetched value (the form restarts clean).
    pub async fn reload(&self, resource: &mut SettingsResource) -> Result<(), SyncError> {
        let key = resource.key().to_string();
        resource.begin_load();

        match self.transport.fetch(&key).await {
            Ok(fetched) => {
                let value = adopt_remote(resource.schema(), &key, fetched, None);
                resource.complete_load(value);
                tracing::debug!(key = %key, "settings loaded");
                Ok(())
            }
            Err(err) => {
                let err = err.into_fetch(&key);
                let message = err.to_string();
                resource.fail_load(&message);
                tracing::warn!(key = %key, error = %message, "settings load failed");
                self.notices.notify(notice::build(
                    NoticeLevel::Error,
                    Some(&title_for(&key)),
                    message,
                ));
                Err(err)
            }
        }
    }

    /// Validates and saves the whole form. Never sends a partially valid
    /// payload; never sends hidden fields; at most one in-flight save per
    /// resource key engine-wide. On failure the form value is left exactly
    /// as it was, so the user can correct and resubmit.
    pub async fn submit(
        &self,
        resource: &mut SettingsResource,
    ) -> Result<SubmissionResult, SyncError> {
        let key = resource.key().to_string();

        if resource.remote_value().is_none() {
            return Err(SyncError::NotLoaded { key });
        }

        let violations = validate::validate_payload(resource.schema(), resource.form_value());
        if !violations.is_empty() {
            let err = SyncError::Validation { violations };
            resource.reject_submit(&notice_body(&err));
            return Err(err);
        }

        // Guard drops on every exit path below, releasing the key.
        let _guard = match self.begin_in_flight(&key) {
            Ok(guard) => guard,
            Err(err) => {
                let body = err.to_string();
                resource.reject_submit(&body);
                tracing::debug!(key = %key, "submit rejected; one already in flight");
                self.notices.notify(notice::build(
                    NoticeLevel::Warning,
                    Some(&title_for(&key)),
                    body,
                ));
                return Err(err);
            }
        };

        let payload = resource.submit_payload();
        resource.begin_submit();
        tracing::debug!(key = %key, fields = payload.len(), "submitting settings");

        match self.transport.mutate(&key, &payload).await {
            Ok(persisted) => {
                let value =
                    adopt_remote(resource.schema(), &key, persisted, Some(resource.form_value()));
                resource.complete_submit(value.clone());
                self.hub.publish(&key, resource.revision());
                self.notices.notify(notice::build(
                    NoticeLevel::Success,
                    Some(&title_for(&key)),
                    "Settings saved",
                ));
                Ok(SubmissionResult {
                    value,
                    saved_at_ms: time::unix_ms(),
                })
            }
            Err(err) => {
                let err = err.into_submit(&key);
                let body = notice_body(&err);
                resource.fail_submit(&body);
                tracing::warn!(key = %key, error = %body, "settings submit failed");
                self.notices.notify(notice::build(
                    NoticeLevel::Error,
                    Some(&title_for(&key)),
                    body,
                ));
                Err(err)
            }
        }
    }

    fn begin_in_flight(&self, key: &str) -> Result<InFlightGuard, SyncError> {
        let mut in_flight = self.in_flight.lock_or_recover();
        if !in_flight.insert(key.to_string()) {
            return Err(SyncError::SubmitInFlight {
                key: key.to_string(),
            });
        }
        Ok(InFlightGuard {
            set: Arc::clone(&self.in_flight),
            key: key.to_string(),
        })
    }
}

fn title_for(key: &str) -> String {
    format!("{key} settings")
}

/// Reconciles a server-returned payload against the schema: known fields are
/// adopted, unknown keys are dropped (logged, never stored), and fields the
/// server did not return keep their local value (hidden conditional fields
/// never round-trip through the server) or fall back to the schema default
/// on first load.
fn adopt_remote(
    schema: &SettingsSchema,
    key: &str,
    returned: SettingsPayload,
    local: Option<&SettingsPayload>,
) -> SettingsPayload {
    let mut value = match local {
        Some(form) => form.clone(),
        None => schema.defaults(),
    };
    for (name, field_value) in returned {
        if schema.field(&name).is_some() {
            value.insert(name, field_value);
        } else {
            tracing::warn!(key = %key, field = %name, "server returned unknown settings field; dropped");
        }
    }
    value
}

/// Server detail verbatim: field-by-field when the server returned it, the
/// single top-level message otherwise.
fn notice_body(err: &SyncError) -> String {
    let violations = err.violations();
    if violations.is_empty() {
        return err.to_string();
    }
    let detail: Vec<String> = violations
        .iter()
        .map(|v| format!("{}: {}", v.field, v.message))
        .collect();
    format!("{err} ({})", detail.join("; "))
}

struct InFlightGuard {
    set: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set.lock_or_recover().remove(&self.key);
    }
}
