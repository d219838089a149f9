use crate::models::{Classification, SecurityEventFinding};

/// Decide whether a vulnerability is confirmed at runtime. Pure function of
/// the container match count and the security-event finding; rules are
/// evaluated in order and the first match wins:
///
/// 1. events found, some function IN_USE       -> Confirmed
/// 2. events found, no function IN_USE         -> Not-confirmed
/// 3. no events, service containers running    -> Not-confirmed
/// 4. no events, no containers                 -> Not-confirmed
///
/// Confirmed requires a matching security event AND runtime function usage;
/// the container count alone can never confirm.
pub fn classify(
    containers_found: usize,
    finding: &SecurityEventFinding,
) -> (Classification, String) {
    if finding.found {
        if finding.any_function_in_use() {
            (
                Classification::Confirmed,
                "Vulnerability found in security events AND vulnerable function is in use".into(),
            )
        } else {
            (
                Classification::NotConfirmed,
                "Vulnerability found in security events but vulnerable function is NOT in use"
                    .into(),
            )
        }
    } else if containers_found > 0 {
        (
            Classification::NotConfirmed,
            "Service is running but vulnerability not found in security events".into(),
        )
    } else {
        (
            Classification::NotConfirmed,
            "Service not running and vulnerability not found in security events".into(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FunctionUsage, SecurityEvent};
    use serde_json::json;

    fn event(usage: FunctionUsage) -> SecurityEvent {
        let mut event: SecurityEvent = serde_json::from_value(json!({})).unwrap();
        event.vulnerable_function = usage;
        event
    }

    fn finding(usages: &[FunctionUsage]) -> SecurityEventFinding {
        SecurityEventFinding::from_events(usages.iter().map(|u| event(*u)).collect())
    }

    #[test]
    fn test_in_use_confirms_regardless_of_container_count() {
        // Scenario: CVE-2024-21508, two containers, one IN_USE record.
        for containers in [0, 1, 2, 10] {
            let (status, reason) = classify(
                containers,
                &finding(&[FunctionUsage::NotInUse, FunctionUsage::InUse]),
            );
            assert_eq!(status, Classification::Confirmed);
            assert!(reason.contains("in use"));
        }
    }

    #[test]
    fn test_events_without_usage_not_confirmed() {
        let (status, reason) = classify(3, &finding(&[FunctionUsage::NotInUse]));
        assert_eq!(status, Classification::NotConfirmed);
        assert!(reason.contains("NOT in use"));
    }

    #[test]
    fn test_unknown_usage_does_not_confirm() {
        let (status, _) = classify(1, &finding(&[FunctionUsage::Unknown]));
        assert_eq!(status, Classification::NotConfirmed);
    }

    #[test]
    fn test_running_service_without_events() {
        // Scenario: CVE-2021-44906, one container, nothing in security events.
        let (status, reason) = classify(1, &SecurityEventFinding::default());
        assert_eq!(status, Classification::NotConfirmed);
        assert!(reason.contains("running"));
        assert!(reason.contains("not found"));
    }

    #[test]
    fn test_stopped_service_without_events() {
        // Scenario: CVE-2023-41419, service not deployed at all.
        let (status, reason) = classify(0, &SecurityEventFinding::default());
        assert_eq!(status, Classification::NotConfirmed);
        assert!(reason.contains("not running"));
    }

    #[test]
    fn test_both_no_event_branches_share_status_but_not_reason() {
        let (running_status, running_reason) = classify(2, &SecurityEventFinding::default());
        let (stopped_status, stopped_reason) = classify(0, &SecurityEventFinding::default());
        assert_eq!(running_status, stopped_status);
        assert_ne!(running_reason, stopped_reason);
    }
}
