//! Products API bound to a client and scenario settings
//!
//! Every call goes through the HTTP facade and is recorded into the calling
//! VU's metrics with `endpoint` and `operation` tags.

use serde_json::Value as JsonValue;
use stampede_config::ScenarioSettings;
use stampede_http::{ApiRequest, HttpClient, RequestOutcome};
use stampede_runtime::{ExpectedStatus, VuContext};
use std::sync::Arc;

use crate::slo::Operation;

/// Tag naming the API operation of a request
pub const ENDPOINT_TAG: &str = "endpoint";
/// Tag carrying `read` or `write`
pub const OPERATION_TAG: &str = "operation";

#[derive(Clone)]
pub struct ProductApi {
    client: Arc<dyn HttpClient>,
    settings: Arc<ScenarioSettings>,
}

impl ProductApi {
    pub fn new(client: Arc<dyn HttpClient>, settings: ScenarioSettings) -> Self {
        Self {
            client,
            settings: Arc::new(settings),
        }
    }

    pub fn settings(&self) -> &ScenarioSettings {
        &self.settings
    }

    pub async fn list(&self, ctx: &VuContext, page: u32) -> RequestOutcome {
        let request = ApiRequest::get(self.settings.list_path(page))
            .as_role(self.settings.read_role)
            .with_context(format!("List products page {}", page));
        self.send(ctx, request, Operation::List, "list", ExpectedStatus::Success)
            .await
    }

    pub async fn details(&self, ctx: &VuContext, id: &str) -> RequestOutcome {
        self.read(ctx, id, "details", ExpectedStatus::Success).await
    }

    /// GET an item under a custom endpoint label and expectation
    pub async fn read(
        &self,
        ctx: &VuContext,
        id: &str,
        endpoint: &str,
        expected: ExpectedStatus,
    ) -> RequestOutcome {
        let request = ApiRequest::get(self.settings.item_path(id))
            .as_role(self.settings.read_role)
            .with_context(format!("Get product {}", id));
        self.send(ctx, request, Operation::Details, endpoint, expected)
            .await
    }

    pub async fn create(&self, ctx: &VuContext, payload: JsonValue) -> RequestOutcome {
        let request = ApiRequest::post(self.settings.resource_path.clone(), payload)
            .as_role(self.settings.write_role)
            .with_context("Create product");
        self.send(ctx, request, Operation::Create, "create", ExpectedStatus::Success)
            .await
    }

    /// POST a payload the API is expected to reject with a 4xx
    pub async fn create_invalid(&self, ctx: &VuContext, payload: JsonValue) -> RequestOutcome {
        let request = ApiRequest::post(self.settings.resource_path.clone(), payload)
            .as_role(self.settings.write_role)
            .with_context("Create invalid product");
        self.send(
            ctx,
            request,
            Operation::Create,
            "create_invalid",
            ExpectedStatus::ClientError,
        )
        .await
    }

    pub async fn update(&self, ctx: &VuContext, id: &str, payload: JsonValue) -> RequestOutcome {
        let request = ApiRequest::put(self.settings.item_path(id), payload)
            .as_role(self.settings.write_role)
            .with_context(format!("Update product {}", id));
        self.send(ctx, request, Operation::Update, "update", ExpectedStatus::Success)
            .await
    }

    pub async fn delete(&self, ctx: &VuContext, id: &str) -> RequestOutcome {
        let request = ApiRequest::delete(self.settings.item_path(id))
            .as_role(self.settings.write_role)
            .with_context(format!("Delete product {}", id));
        self.send(ctx, request, Operation::Delete, "delete", ExpectedStatus::Success)
            .await
    }

    async fn send(
        &self,
        ctx: &VuContext,
        request: ApiRequest,
        operation: Operation,
        endpoint: &str,
        expected: ExpectedStatus,
    ) -> RequestOutcome {
        let outcome = self.client.execute(request).await;
        ctx.record_request(
            &outcome,
            expected,
            &[(ENDPOINT_TAG, endpoint), (OPERATION_TAG, operation.kind())],
        );
        outcome
    }

    /// Random page in `1..=max_page`
    pub fn random_page(&self) -> u32 {
        fastrand::u32(1..=self.settings.max_page.max(1))
    }

    /// Random id in the configured detail range
    pub fn random_detail_id(&self) -> u64 {
        let min = self.settings.detail_id_min;
        fastrand::u64(min..=self.settings.detail_id_max.max(min))
    }
}
