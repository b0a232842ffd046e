//! Test plans: VU pools, weighted scenario mixes and their thresholds

use serde::Serialize;
use stampede_config::LoadProfile;
use stampede_runtime::{LoadTest, ScenarioSpec, Threshold, ThresholdSet, SCENARIO_TAG};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::crud::{CrudStep, CRUD_FLOW_SUCCESS, CRUD_STEP_DURATION, STEP_TAG};
use crate::scenarios::{ProductHandler, ProductScenario};
use crate::session::{ProductApi, ENDPOINT_TAG};
use crate::slo::{Operation, SloTable, PRODUCTS};
use crate::thresholds::{global_thresholds, operation_thresholds, scoped, thresholds_for};
use crate::weighted::{WeightError, WeightedChoice};

/// Floor on the share of successful CRUD lifecycles
pub const CRUD_MIN_SUCCESS_RATE: f64 = 0.95;

pub const LIST_POOL: &str = "list_products";
pub const DETAILS_POOL: &str = "product_details";
pub const CREATE_POOL: &str = "create_products";

/// Tests selectable from the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TestName {
    All,
    GetEndpoint,
    PostEndpoint,
    Crud,
    Mixed,
}

impl TestName {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestName::All => "all",
            TestName::GetEndpoint => "get-endpoint",
            TestName::PostEndpoint => "post-endpoint",
            TestName::Crud => "crud",
            TestName::Mixed => "mixed",
        }
    }

    pub fn variants() -> &'static [TestName] {
        &[
            TestName::All,
            TestName::GetEndpoint,
            TestName::PostEndpoint,
            TestName::Crud,
            TestName::Mixed,
        ]
    }

    /// Concrete tests this name runs; `all` expands to the three endpoint suites
    pub fn expand(&self) -> Vec<TestName> {
        match self {
            TestName::All => vec![TestName::GetEndpoint, TestName::PostEndpoint, TestName::Crud],
            other => vec![*other],
        }
    }
}

impl fmt::Display for TestName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestName::variants()
            .iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .copied()
            .ok_or_else(|| {
                let choices: Vec<&str> = TestName::variants().iter().map(|t| t.as_str()).collect();
                format!("unknown test '{}' (expected one of: {})", s, choices.join(", "))
            })
    }
}

/// VUs per pool of the mixed traffic split
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct VuAllocation {
    pub list: u32,
    pub details: u32,
    pub create: u32,
}

impl VuAllocation {
    pub fn total(&self) -> u32 {
        self.list + self.details + self.create
    }
}

/// 70% list, 20% details, 10% create with at least one create VU
pub fn allocate(profile: &LoadProfile) -> VuAllocation {
    allocate_vus(profile.virtual_users)
}

pub fn allocate_vus(virtual_users: u32) -> VuAllocation {
    let share = |percent: u64| (u64::from(virtual_users) * percent / 100) as u32;
    VuAllocation {
        list: share(70),
        details: share(20),
        create: share(10).max(1),
    }
}

/// Builds the load tests behind each [`TestName`]
pub struct TestPlanner {
    api: ProductApi,
    profile: LoadProfile,
    slo: SloTable,
}

impl TestPlanner {
    pub fn new(api: ProductApi, profile: LoadProfile) -> Self {
        Self {
            api,
            profile,
            slo: SloTable::defaults().clone(),
        }
    }

    pub fn with_slo_table(mut self, slo: SloTable) -> Self {
        self.slo = slo;
        self
    }

    pub fn profile(&self) -> &LoadProfile {
        &self.profile
    }

    /// One load test per concrete test `name` expands to
    pub fn plan(&self, name: TestName) -> Result<Vec<LoadTest>, WeightError> {
        let tests = match name {
            TestName::All => vec![
                self.get_endpoint_test()?,
                self.post_endpoint_test()?,
                self.crud_test(),
            ],
            TestName::GetEndpoint => vec![self.get_endpoint_test()?],
            TestName::PostEndpoint => vec![self.post_endpoint_test()?],
            TestName::Crud => vec![self.crud_test()],
            TestName::Mixed => vec![self.mixed_test()],
        };
        Ok(tests)
    }

    /// One pool; each iteration lists (70%) or fetches a detail (30%)
    pub fn get_endpoint_test(&self) -> Result<LoadTest, WeightError> {
        let choice = WeightedChoice::new(vec![
            (70.0, ProductScenario::List),
            (30.0, ProductScenario::Details),
        ])?;

        let mut thresholds = self.base_thresholds();
        thresholds.extend(self.endpoint_thresholds(Operation::List, "list"));
        thresholds.extend(self.endpoint_thresholds(Operation::Details, "details"));

        Ok(LoadTest::new(TestName::GetEndpoint.as_str())
            .scenario(
                self.pool("get_endpoint", self.profile.virtual_users),
                Arc::new(ProductHandler::new(self.api.clone(), choice)),
            )
            .with_thresholds(thresholds))
    }

    /// One pool; each iteration creates a product (90%) or posts an invalid payload (10%)
    pub fn post_endpoint_test(&self) -> Result<LoadTest, WeightError> {
        let choice = WeightedChoice::new(vec![
            (90.0, ProductScenario::Create),
            (10.0, ProductScenario::CreateInvalid),
        ])?;

        let mut thresholds = self.base_thresholds();
        thresholds.extend(self.endpoint_thresholds(Operation::Create, "create"));

        Ok(LoadTest::new(TestName::PostEndpoint.as_str())
            .scenario(
                self.pool("post_endpoint", self.profile.virtual_users),
                Arc::new(ProductHandler::new(self.api.clone(), choice)),
            )
            .with_thresholds(thresholds))
    }

    /// Full lifecycle pool with flow success and per-step latency thresholds
    pub fn crud_test(&self) -> LoadTest {
        let mut thresholds = self.base_thresholds();
        thresholds.push(Threshold::new(CRUD_FLOW_SUCCESS).rate().gt(CRUD_MIN_SUCCESS_RATE));
        for step in CrudStep::sequence() {
            if let Some(slo) = self.slo.get(PRODUCTS, step_operation(*step)) {
                thresholds.push(
                    Threshold::new(CRUD_STEP_DURATION)
                        .tag(STEP_TAG, step.as_str())
                        .p(95.0)
                        .lt(slo.p95_ms),
                );
            }
        }

        LoadTest::new(TestName::Crud.as_str())
            .scenario(
                self.pool("crud_flow", self.profile.virtual_users),
                Arc::new(ProductHandler::single(self.api.clone(), ProductScenario::Crud)),
            )
            .with_thresholds(thresholds)
    }

    /// Concurrent list/details/create pools split 70/20/10; create starts late
    pub fn mixed_test(&self) -> LoadTest {
        let allocation = allocate(&self.profile);
        let offset = self.api.settings().create_start_offset;
        let (offset, create_duration) = if offset < self.profile.duration {
            (offset, self.profile.duration - offset)
        } else {
            warn!(
                "Create start offset {:?} is not shorter than the profile duration {:?}; starting create pool immediately",
                offset, self.profile.duration
            );
            (Duration::ZERO, self.profile.duration)
        };

        debug!(
            "Mixed allocation: list {}, details {}, create {}",
            allocation.list, allocation.details, allocation.create
        );

        let pools = [
            (LIST_POOL, ProductScenario::List, Operation::List, allocation.list),
            (DETAILS_POOL, ProductScenario::Details, Operation::Details, allocation.details),
            (CREATE_POOL, ProductScenario::Create, Operation::Create, allocation.create),
        ];

        let mut thresholds = self.base_thresholds();
        let mut test = LoadTest::new(TestName::Mixed.as_str());
        for (name, scenario, operation, vus) in pools {
            if vus == 0 {
                debug!("Pool '{}' has no virtual users; not scheduled", name);
                continue;
            }

            let spec = if scenario == ProductScenario::Create {
                ScenarioSpec::constant_vus(name, vus, create_duration).starting_after(offset)
            } else {
                self.pool(name, vus)
            };
            if let Some(slo) = self.slo.get(PRODUCTS, operation) {
                thresholds.extend(scoped(&thresholds_for(slo), SCENARIO_TAG, name));
            }
            test = test.scenario(
                spec,
                Arc::new(ProductHandler::single(self.api.clone(), scenario)),
            );
        }

        test.with_thresholds(thresholds)
    }

    fn pool(&self, name: &str, virtual_users: u32) -> ScenarioSpec {
        ScenarioSpec::constant_vus(name, virtual_users, self.profile.duration)
    }

    fn base_thresholds(&self) -> ThresholdSet {
        let mut thresholds = global_thresholds();
        thresholds.extend(operation_thresholds());
        thresholds
    }

    fn endpoint_thresholds(&self, operation: Operation, endpoint: &str) -> ThresholdSet {
        match self.slo.get(PRODUCTS, operation) {
            Some(slo) => scoped(&thresholds_for(slo), ENDPOINT_TAG, endpoint),
            None => ThresholdSet::new(),
        }
    }
}

/// SLO entry governing a CRUD step's latency
fn step_operation(step: CrudStep) -> Operation {
    match step {
        CrudStep::Create => Operation::Create,
        CrudStep::Read | CrudStep::ReadVerify | CrudStep::VerifyDeleted => Operation::Details,
        CrudStep::Update => Operation::Update,
        CrudStep::Delete => Operation::Delete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stampede_config::{ProfileName, ScenarioSettings};
    use stampede_http::{ApiRequest, HttpClient, RequestOutcome};

    struct Unreachable;

    #[async_trait]
    impl HttpClient for Unreachable {
        async fn execute(&self, request: ApiRequest) -> RequestOutcome {
            RequestOutcome::transport_failure(
                request.method,
                request.path,
                Duration::ZERO,
                "not connected",
            )
        }
    }

    fn planner(profile: ProfileName) -> TestPlanner {
        let api = ProductApi::new(Arc::new(Unreachable), ScenarioSettings::default());
        TestPlanner::new(api, LoadProfile::builtin(profile))
    }

    #[test]
    fn test_allocation_examples() {
        assert_eq!(allocate_vus(1), VuAllocation { list: 0, details: 0, create: 1 });
        assert_eq!(allocate_vus(10), VuAllocation { list: 7, details: 2, create: 1 });
        assert_eq!(allocate_vus(50), VuAllocation { list: 35, details: 10, create: 5 });
        assert_eq!(allocate_vus(100).total(), 100);
        assert_eq!(allocate_vus(9), VuAllocation { list: 6, details: 1, create: 1 });
    }

    #[test]
    fn test_test_name_parsing() {
        assert_eq!("get-endpoint".parse::<TestName>(), Ok(TestName::GetEndpoint));
        assert_eq!("ALL".parse::<TestName>(), Ok(TestName::All));
        assert!("load".parse::<TestName>().unwrap_err().contains("post-endpoint"));
        assert_eq!(
            TestName::All.expand(),
            vec![TestName::GetEndpoint, TestName::PostEndpoint, TestName::Crud]
        );
        assert_eq!(TestName::Mixed.expand(), vec![TestName::Mixed]);
    }

    #[test]
    fn test_all_plans_three_tests() {
        let tests = planner(ProfileName::Smoke).plan(TestName::All).unwrap();
        let names: Vec<&str> = tests.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["get-endpoint", "post-endpoint", "crud"]);
        assert!(tests.iter().all(|t| t.validate().is_ok()));
    }

    #[test]
    fn test_mixed_pools_and_thresholds() {
        let test = planner(ProfileName::Light).mixed_test();
        let specs: Vec<&ScenarioSpec> = test.scenarios().iter().map(|s| &s.spec).collect();

        assert_eq!(specs.len(), 3);
        assert_eq!(specs[0].name, LIST_POOL);
        assert_eq!(specs[0].virtual_users, 7);
        assert_eq!(specs[1].virtual_users, 2);

        let create = specs[2];
        assert_eq!(create.name, CREATE_POOL);
        assert_eq!(create.virtual_users, 1);
        assert_eq!(create.start_offset, Duration::from_secs(10));
        assert_eq!(create.duration, Duration::from_secs(110));

        let map = test.thresholds().to_map();
        assert_eq!(map["http_req_failed"], vec!["rate<0.05"]);
        assert_eq!(map["checks"], vec!["rate>0.95"]);
        assert_eq!(map["http_req_failed{operation:read}"], vec!["rate<0.01"]);
        assert_eq!(map["http_req_failed{operation:write}"], vec!["rate<0.02"]);
        assert_eq!(
            map["http_req_duration{scenario:list_products}"],
            vec!["p(95)<500", "p(99)<1000"]
        );
        assert_eq!(
            map["http_req_duration{scenario:product_details}"],
            vec!["p(95)<300", "p(99)<600"]
        );
        assert_eq!(
            map["http_req_duration{scenario:create_products}"],
            vec!["p(95)<800", "p(99)<1500"]
        );
    }

    #[test]
    fn test_mixed_smoke_skips_empty_pools() {
        let test = planner(ProfileName::Smoke).mixed_test();
        let names: Vec<&str> = test.scenarios().iter().map(|s| s.spec.name.as_str()).collect();
        assert_eq!(names, vec![CREATE_POOL]);
        assert!(!test
            .thresholds()
            .to_map()
            .contains_key("http_req_duration{scenario:list_products}"));
    }

    #[test]
    fn test_crud_thresholds() {
        let map = planner(ProfileName::Smoke).crud_test().thresholds().to_map();
        assert_eq!(map["crud_flow_success"], vec!["rate>0.95"]);
        assert_eq!(map["crud_step_duration{step:create}"], vec!["p(95)<800"]);
        assert_eq!(map["crud_step_duration{step:verify_deleted}"], vec!["p(95)<300"]);
        assert_eq!(map["crud_step_duration{step:delete}"], vec!["p(95)<500"]);
    }

    #[test]
    fn test_get_endpoint_thresholds_scope_by_endpoint() {
        let test = planner(ProfileName::Smoke).get_endpoint_test().unwrap();
        let map = test.thresholds().to_map();
        assert_eq!(map["http_req_duration{endpoint:list}"], vec!["p(95)<500", "p(99)<1000"]);
        assert_eq!(map["http_req_failed{endpoint:details}"], vec!["rate<0.01"]);
        assert_eq!(test.scenarios()[0].spec.virtual_users, 1);
    }
}
