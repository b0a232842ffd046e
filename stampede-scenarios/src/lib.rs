//! Products API load scenarios
//!
//! SLO table and threshold generation, response validators, the scenario
//! functions (list, details, create, CRUD lifecycle), weighted scenario
//! mixes and the test plans the CLI runs.

pub mod crud;
pub mod data;
pub mod orchestrator;
pub mod scenarios;
pub mod session;
pub mod slo;
pub mod thresholds;
pub mod validators;
pub mod weighted;

pub use crud::{crud_flow, CrudFlowState, CrudStep};
pub use orchestrator::{allocate, allocate_vus, TestName, TestPlanner, VuAllocation};
pub use scenarios::{
    create_invalid_product, create_product, list_products, product_details, ProductHandler,
    ProductScenario,
};
pub use session::ProductApi;
pub use slo::{EndpointSlo, Operation, SloTable};
pub use thresholds::{scoped, thresholds_for};
pub use validators::JsonType;
pub use weighted::{WeightError, WeightedChoice};
