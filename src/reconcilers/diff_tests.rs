// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::reconcilers::diff::plan_changes;
    use crate::reconcilers::testing::entry;
    use crate::reconcilers::types::{ChangePlan, Classification, ManagedEntry};
    use crate::source::HostnameMapping;

    const MARKER: &str = "Entry created by unboundCLI sync";

    fn mapping(entries: &[(&str, &str)]) -> HostnameMapping {
        entries
            .iter()
            .map(|(h, t)| ((*h).to_string(), (*t).to_string()))
            .collect()
    }

    fn classification(owned: Vec<ManagedEntry>, foreign: Vec<ManagedEntry>) -> Classification {
        Classification {
            owned: owned.into_iter().map(|e| (e.key(), e)).collect(),
            foreign: foreign.into_iter().map(|e| (e.key(), e)).collect(),
            ..Classification::default()
        }
    }

    fn keys(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    // =====================================================
    // Scenarios
    // =====================================================

    #[test]
    fn test_new_hostname_is_added() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &Classification::default(),
            Some(MARKER),
        );
        assert_eq!(
            plan,
            ChangePlan {
                to_add: keys(&["svc.example.com"]),
                ..ChangePlan::default()
            }
        );
    }

    #[test]
    fn test_in_sync_entry_needs_nothing() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![entry("svc.example.com", "10.0.0.5", MARKER)], vec![]),
            Some(MARKER),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_stale_value_is_updated() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![entry("svc.example.com", "10.0.0.9", MARKER)], vec![]),
            Some(MARKER),
        );
        assert_eq!(
            plan,
            ChangePlan {
                to_update: keys(&["svc.example.com"]),
                ..ChangePlan::default()
            }
        );
    }

    #[test]
    fn test_owned_entry_missing_from_source_is_removed() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(
                vec![
                    entry("svc.example.com", "10.0.0.5", MARKER),
                    entry("old.example.com", "10.0.0.5", MARKER),
                ],
                vec![],
            ),
            Some(MARKER),
        );
        assert_eq!(
            plan,
            ChangePlan {
                to_remove: keys(&["old.example.com"]),
                ..ChangePlan::default()
            }
        );
    }

    // =====================================================
    // Rules
    // =====================================================

    #[test]
    fn test_legacy_marker_gets_marker_update() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![entry("svc.example.com", "10.0.0.5", "Route via Caddy")], vec![]),
            Some(MARKER),
        );
        assert_eq!(plan.to_update_marker, keys(&["svc.example.com"]));
        assert!(plan.to_update.is_empty());
    }

    #[test]
    fn test_value_mismatch_wins_over_marker_mismatch() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![entry("svc.example.com", "10.0.0.9", "Route via Caddy")], vec![]),
            Some(MARKER),
        );
        assert_eq!(plan.to_update, keys(&["svc.example.com"]));
        assert!(plan.to_update_marker.is_empty());
    }

    #[test]
    fn test_markerless_target_never_gets_marker_updates() {
        let owned = ManagedEntry::from_fqdn("svc.example.com", "10.0.0.5", None);
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![owned], vec![]),
            None,
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_bare_hostnames_never_planned() {
        let plan = plan_changes(
            &mapping(&[("myhost", "10.0.0.5"), ("svc.example.com", "10.0.0.5")]),
            &Classification::default(),
            Some(MARKER),
        );
        assert_eq!(plan.to_add, keys(&["svc.example.com"]));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_foreign_collision_left_alone() {
        let manual = entry("svc.example.com", "10.0.0.77", "Manually added");
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![], vec![manual]),
            Some(MARKER),
        );
        assert!(plan.is_empty());
    }

    #[test]
    fn test_foreign_entries_never_removed() {
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification(vec![], vec![entry("nas.lan.example.com", "10.0.0.9", "")]),
            Some(MARKER),
        );
        assert!(plan.to_remove.is_empty());
        assert_eq!(plan.to_add, keys(&["svc.example.com"]));
    }

    #[test]
    fn test_split_horizon_keys_planned_independently() {
        let plan = plan_changes(
            &mapping(&[
                ("grafana.dev.home.net", "10.0.0.7"),
                ("grafana.caddy.home.net", "192.168.1.15"),
            ]),
            &classification(vec![entry("grafana.dev.home.net", "10.0.0.7", MARKER)], vec![]),
            Some(MARKER),
        );
        assert_eq!(plan.to_add, keys(&["grafana.caddy.home.net"]));
        assert_eq!(plan.len(), 1);
    }

    #[test]
    fn test_foreign_entry_differing_in_case_is_left_alone() {
        let manual = entry("Svc.example.com", "10.0.0.77", "Manually added");
        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5"), ("web.example.com", "10.0.0.5")]),
            &classification(vec![], vec![manual]),
            Some(MARKER),
        );
        assert_eq!(plan.to_add, keys(&["web.example.com"]));
        assert_eq!(plan.len(), 1);
    }

    // =====================================================
    // Duplicates
    // =====================================================

    #[test]
    fn test_shadowed_owned_duplicate_is_removed() {
        let mut kept = entry("svc.example.com", "10.0.0.5", MARKER);
        kept.id = Some("a".into());
        let mut stale = entry("svc.example.com", "10.0.0.9", MARKER);
        stale.id = Some("b".into());
        let mut classification = classification(vec![kept], vec![]);
        classification.shadowed.push(stale.clone());

        let plan = plan_changes(
            &mapping(&[("svc.example.com", "10.0.0.5")]),
            &classification,
            Some(MARKER),
        );
        assert_eq!(
            plan,
            ChangePlan {
                to_remove_duplicates: vec![stale],
                ..ChangePlan::default()
            }
        );
    }

    #[test]
    fn test_exact_duplicate_without_id_is_not_removed() {
        let kept = ManagedEntry::from_fqdn("svc.example.com", "192.168.1.15", None);
        let mut classification = classification(vec![kept.clone()], vec![]);
        classification.shadowed.push(kept);

        let plan = plan_changes(
            &mapping(&[("svc.example.com", "192.168.1.15")]),
            &classification,
            None,
        );
        assert!(plan.is_empty());
    }
}
