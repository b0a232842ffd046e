//! SLO to threshold translation

use stampede_runtime::metrics::{CHECKS, HTTP_REQ_DURATION, HTTP_REQ_FAILED};
use stampede_runtime::{Threshold, ThresholdSet};

use crate::slo::EndpointSlo;

/// Overall failed-request ceiling
pub const GLOBAL_MAX_FAILED_RATE: f64 = 0.05;
/// Overall check pass-rate floor
pub const GLOBAL_MIN_CHECK_RATE: f64 = 0.95;
pub const READ_MAX_FAILED_RATE: f64 = 0.01;
pub const WRITE_MAX_FAILED_RATE: f64 = 0.02;

/// `p(95)`, `p(99)` latency bounds and the error-rate ceiling of one SLO
pub fn thresholds_for(slo: &EndpointSlo) -> ThresholdSet {
    ThresholdSet::new()
        .with(Threshold::new(HTTP_REQ_DURATION).p(95.0).lt(slo.p95_ms))
        .with(Threshold::new(HTTP_REQ_DURATION).p(99.0).lt(slo.p99_ms))
        .with(Threshold::new(HTTP_REQ_FAILED).rate().lt(slo.error_rate))
}

/// The same thresholds evaluated only over samples tagged `tag_key:tag_value`
pub fn scoped(set: &ThresholdSet, tag_key: &str, tag_value: &str) -> ThresholdSet {
    set.scoped(tag_key, tag_value)
}

pub fn global_thresholds() -> ThresholdSet {
    ThresholdSet::new()
        .with(Threshold::new(HTTP_REQ_FAILED).rate().lt(GLOBAL_MAX_FAILED_RATE))
        .with(Threshold::new(CHECKS).rate().gt(GLOBAL_MIN_CHECK_RATE))
}

/// Read and write error ceilings keyed by the `operation` tag
pub fn operation_thresholds() -> ThresholdSet {
    ThresholdSet::new()
        .with(
            Threshold::new(HTTP_REQ_FAILED)
                .tag("operation", "read")
                .rate()
                .lt(READ_MAX_FAILED_RATE),
        )
        .with(
            Threshold::new(HTTP_REQ_FAILED)
                .tag("operation", "write")
                .rate()
                .lt(WRITE_MAX_FAILED_RATE),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slo::{Operation, SloTable, PRODUCTS};

    #[test]
    fn test_thresholds_for_slo() {
        let slo = SloTable::defaults().get(PRODUCTS, Operation::List).unwrap();
        let map = thresholds_for(slo).to_map();

        assert_eq!(
            map.get("http_req_duration"),
            Some(&vec!["p(95)<500".to_string(), "p(99)<1000".to_string()])
        );
        assert_eq!(map.get("http_req_failed"), Some(&vec!["rate<0.01".to_string()]));
    }

    #[test]
    fn test_scoped_keys() {
        let slo = SloTable::defaults().get(PRODUCTS, Operation::Create).unwrap();
        let set = scoped(&thresholds_for(slo), "scenario", "create_products");

        let keys: Vec<String> = set.iter().map(|t| t.to_string()).collect();
        assert_eq!(
            keys,
            vec![
                "http_req_duration{scenario:create_products}: p(95)<800",
                "http_req_duration{scenario:create_products}: p(99)<1500",
                "http_req_failed{scenario:create_products}: rate<0.02",
            ]
        );
    }

    #[test]
    fn test_global_and_operation_thresholds() {
        let global = global_thresholds().to_map();
        assert_eq!(global.get("http_req_failed"), Some(&vec!["rate<0.05".to_string()]));
        assert_eq!(global.get("checks"), Some(&vec!["rate>0.95".to_string()]));

        let operations = operation_thresholds().to_map();
        assert_eq!(
            operations.get("http_req_failed{operation:read}"),
            Some(&vec!["rate<0.01".to_string()])
        );
        assert_eq!(
            operations.get("http_req_failed{operation:write}"),
            Some(&vec!["rate<0.02".to_string()])
        );
    }
}
