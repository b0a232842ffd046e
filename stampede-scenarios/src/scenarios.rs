//! Scenario definitions for the products API

use async_trait::async_trait;
use stampede_runtime::{ScenarioHandler, VuContext};
use std::fmt;
use tracing::debug;

use crate::crud::crud_flow;
use crate::data::{invalid_product_payload, product_payload};
use crate::session::ProductApi;
use crate::validators::{validate_created, validate_item, validate_list, validate_rejected};
use crate::weighted::WeightedChoice;

/// GET a random list page, validate it, think
pub async fn list_products(api: &ProductApi, ctx: &VuContext) -> bool {
    let outcome = api.list(ctx, api.random_page()).await;
    let ok = validate_list(ctx, &outcome, api.settings().max_list_items);
    ctx.sleep(api.settings().think_time).await;
    ok
}

/// GET a random product by id; a 404 counts as a failure
pub async fn product_details(api: &ProductApi, ctx: &VuContext) -> bool {
    let id = api.random_detail_id().to_string();
    let outcome = api.details(ctx, &id).await;
    let ok = validate_item(ctx, &outcome);
    ctx.sleep(api.settings().think_time).await;
    ok
}

/// POST a generated product
pub async fn create_product(api: &ProductApi, ctx: &VuContext) -> bool {
    let outcome = api.create(ctx, product_payload()).await;
    let ok = validate_created(ctx, &outcome);
    ctx.sleep(api.settings().think_time).await;
    ok
}

/// POST `{}` and expect a 4xx naming the problem
pub async fn create_invalid_product(api: &ProductApi, ctx: &VuContext) -> bool {
    let outcome = api.create_invalid(ctx, invalid_product_payload()).await;
    let ok = validate_rejected(ctx, &outcome);
    ctx.sleep(api.settings().think_time).await;
    ok
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductScenario {
    List,
    Details,
    Create,
    CreateInvalid,
    Crud,
}

impl ProductScenario {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductScenario::List => "list_products",
            ProductScenario::Details => "product_details",
            ProductScenario::Create => "create_product",
            ProductScenario::CreateInvalid => "create_invalid_product",
            ProductScenario::Crud => "crud_flow",
        }
    }

    pub async fn run(&self, api: &ProductApi, ctx: &VuContext) -> bool {
        match self {
            ProductScenario::List => list_products(api, ctx).await,
            ProductScenario::Details => product_details(api, ctx).await,
            ProductScenario::Create => create_product(api, ctx).await,
            ProductScenario::CreateInvalid => create_invalid_product(api, ctx).await,
            ProductScenario::Crud => {
                let state = crud_flow(api, ctx).await;
                ctx.sleep(api.settings().think_time).await;
                state.success
            }
        }
    }
}

impl fmt::Display for ProductScenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs one weighted pick of product scenarios per iteration
pub struct ProductHandler {
    api: ProductApi,
    choice: WeightedChoice<ProductScenario>,
}

impl ProductHandler {
    pub fn new(api: ProductApi, choice: WeightedChoice<ProductScenario>) -> Self {
        Self { api, choice }
    }

    pub fn single(api: ProductApi, scenario: ProductScenario) -> Self {
        Self::new(api, WeightedChoice::single(scenario))
    }

    pub fn choice(&self) -> &WeightedChoice<ProductScenario> {
        &self.choice
    }
}

#[async_trait]
impl ScenarioHandler for ProductHandler {
    async fn iteration(&self, ctx: &VuContext) {
        let scenario = *self.choice.choose();
        if !scenario.run(&self.api, ctx).await {
            debug!(
                "{} failed on VU {} iteration {}",
                scenario,
                ctx.vu_id(),
                ctx.iteration()
            );
        }
    }
}
