//! Six-step product lifecycle
//!
//! `CREATE -> READ -> UPDATE -> READ(verify) -> DELETE -> VERIFY_DELETED`.
//! A failed CREATE ends the iteration since there is nothing to operate on;
//! any later failure marks the flow failed and the remaining steps still run.

use serde_json::Value as JsonValue;
use stampede_http::RequestOutcome;
use stampede_runtime::{ExpectedStatus, VuContext};
use std::fmt;
use std::time::Instant;
use tracing::{debug, warn};

use crate::data::{id_segment, product_payload, update_payload};
use crate::session::ProductApi;
use crate::validators::{
    validate_created, validate_deleted, validate_item, validate_not_found, validate_updated,
};

pub const CRUD_STEP_DURATION: &str = "crud_step_duration";
pub const CRUD_STEPS: &str = "crud_steps";
pub const CRUD_FLOW_SUCCESS: &str = "crud_flow_success";
pub const CRUD_FLOWS_FAILED: &str = "crud_flows_failed";
/// Tag carrying the step name on CRUD metrics
pub const STEP_TAG: &str = "step";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CrudStep {
    Create,
    Read,
    Update,
    ReadVerify,
    Delete,
    VerifyDeleted,
}

impl CrudStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CrudStep::Create => "create",
            CrudStep::Read => "read",
            CrudStep::Update => "update",
            CrudStep::ReadVerify => "read_verify",
            CrudStep::Delete => "delete",
            CrudStep::VerifyDeleted => "verify_deleted",
        }
    }

    /// Steps in execution order
    pub fn sequence() -> &'static [CrudStep] {
        &[
            CrudStep::Create,
            CrudStep::Read,
            CrudStep::Update,
            CrudStep::ReadVerify,
            CrudStep::Delete,
            CrudStep::VerifyDeleted,
        ]
    }
}

impl fmt::Display for CrudStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// State threaded through one CRUD iteration
#[derive(Debug, Clone, PartialEq)]
pub struct CrudFlowState {
    pub created_id: Option<JsonValue>,
    /// Latest known representation of the resource
    pub snapshot: Option<JsonValue>,
    pub success: bool,
    /// Steps that ran, in order
    pub executed: Vec<CrudStep>,
}

impl Default for CrudFlowState {
    fn default() -> Self {
        Self {
            created_id: None,
            snapshot: None,
            success: true,
            executed: Vec::new(),
        }
    }
}

impl CrudFlowState {
    fn fail(&mut self, step: CrudStep) {
        if self.success {
            debug!("CRUD flow failed at step {}", step);
        }
        self.success = false;
    }
}

/// Run one lifecycle and record its outcome
pub async fn crud_flow(api: &ProductApi, ctx: &VuContext) -> CrudFlowState {
    let mut state = CrudFlowState::default();
    let pause = api.settings().crud_step_pause;

    // CREATE
    let payload = product_payload();
    let (created, ok) = timed(ctx, &mut state, CrudStep::Create, async {
        let outcome = api.create(ctx, payload).await;
        let ok = validate_created(ctx, &outcome);
        (outcome, ok)
    })
    .await;

    let created_body = created.parsed_body();
    let id = created_body
        .as_ref()
        .and_then(|body| body.get("id"))
        .and_then(id_segment);

    let id = match (ok, id) {
        (true, Some(id)) => id,
        _ => {
            warn!(
                "CRUD flow aborted: create returned status {} (VU {}, iteration {})",
                created.status,
                ctx.vu_id(),
                ctx.iteration()
            );
            state.fail(CrudStep::Create);
            finish(ctx, &state);
            return state;
        }
    };
    state.created_id = created_body.as_ref().and_then(|body| body.get("id").cloned());
    state.snapshot = created_body;

    // READ
    ctx.sleep(pause).await;
    let (read, ok) = timed(ctx, &mut state, CrudStep::Read, async {
        let outcome = api.details(ctx, &id).await;
        let ok = validate_item(ctx, &outcome);
        (outcome, ok)
    })
    .await;
    let read_body = read.parsed_body();
    let same_id = ctx.check(
        "read returns created item",
        read_body.as_ref().and_then(|body| body.get("id")) == state.created_id.as_ref(),
    );
    if ok && same_id {
        state.snapshot = read_body;
    } else {
        state.fail(CrudStep::Read);
    }

    // UPDATE
    ctx.sleep(pause).await;
    let update = update_payload(state.snapshot.as_ref());
    let new_name = update.get("name").cloned().unwrap_or(JsonValue::Null);
    let (updated, ok) = timed(ctx, &mut state, CrudStep::Update, async {
        let outcome = api.update(ctx, &id, update).await;
        let ok = validate_updated(ctx, &outcome, "name", &new_name);
        (outcome, ok)
    })
    .await;
    if ok {
        state.snapshot = updated.parsed_body();
    } else {
        state.fail(CrudStep::Update);
    }

    // READ(verify)
    ctx.sleep(pause).await;
    let (_, ok) = timed(ctx, &mut state, CrudStep::ReadVerify, async {
        let outcome = api
            .read(ctx, &id, "read_verify", ExpectedStatus::Success)
            .await;
        let persisted = ctx.check(
            "update persisted",
            outcome
                .parsed_body()
                .is_some_and(|body| body.get("name") == Some(&new_name)),
        );
        let ok = outcome.status == 200 && persisted;
        (outcome, ok)
    })
    .await;
    if !ok {
        state.fail(CrudStep::ReadVerify);
    }

    // DELETE
    ctx.sleep(pause).await;
    let (_, ok) = timed(ctx, &mut state, CrudStep::Delete, async {
        let outcome = api.delete(ctx, &id).await;
        let ok = validate_deleted(ctx, &outcome);
        (outcome, ok)
    })
    .await;
    if !ok {
        state.fail(CrudStep::Delete);
    }

    // VERIFY_DELETED
    ctx.sleep(pause).await;
    let (gone, ok) = timed(ctx, &mut state, CrudStep::VerifyDeleted, async {
        let outcome = api
            .read(ctx, &id, "verify_deleted", ExpectedStatus::Exactly(404))
            .await;
        let ok = validate_not_found(ctx, &outcome);
        (outcome, ok)
    })
    .await;
    if !ok {
        if gone.is_success() {
            warn!("Product {} still exists after delete", id);
        }
        state.fail(CrudStep::VerifyDeleted);
    }

    finish(ctx, &state);
    state
}

/// Run a step and record its duration and count, whatever the outcome
async fn timed<F>(
    ctx: &VuContext,
    state: &mut CrudFlowState,
    step: CrudStep,
    work: F,
) -> (RequestOutcome, bool)
where
    F: std::future::Future<Output = (RequestOutcome, bool)>,
{
    let started = Instant::now();
    let result = work.await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

    let tags = [(STEP_TAG, step.as_str())];
    ctx.add_trend(CRUD_STEP_DURATION, elapsed_ms, &tags);
    ctx.add_counter(CRUD_STEPS, 1.0, &tags);
    state.executed.push(step);
    result
}

fn finish(ctx: &VuContext, state: &CrudFlowState) {
    ctx.add_rate(CRUD_FLOW_SUCCESS, state.success, &[]);
    if !state.success {
        ctx.add_counter(CRUD_FLOWS_FAILED, 1.0, &[]);
    }
}
