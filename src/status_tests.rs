// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::reconcilers::{ManagedEntry, OwnershipRule, SyncOptions};
    use crate::source::HostnameMapping;
    use crate::status::{
        build_status, HostStatus, OverallStatus, StatusFilter, StatusSummary, StatusTable,
        SystemSnapshot,
    };

    const PROXY: &str = "192.168.1.15";
    const MARKER: &str = "Entry created by unboundCLI caddy-sync-all";

    fn options() -> SyncOptions {
        SyncOptions {
            legacy_markers: vec!["Route via Caddy".into()],
            ..SyncOptions::new(MARKER)
        }
    }

    fn mapping(hosts: &[&str]) -> HostnameMapping {
        hosts
            .iter()
            .map(|h| ((*h).to_string(), PROXY.to_string()))
            .collect()
    }

    fn unbound(entries: &[(&str, &str, &str)]) -> SystemSnapshot {
        SystemSnapshot {
            name: "Unbound".into(),
            rule: OwnershipRule::Marker,
            entries: entries
                .iter()
                .map(|(fqdn, value, marker)| {
                    let mut e = ManagedEntry::from_fqdn(fqdn, value, Some(marker));
                    e.id = Some(format!("uuid-{fqdn}"));
                    e
                })
                .collect(),
        }
    }

    fn adguard(entries: &[(&str, &str)]) -> SystemSnapshot {
        SystemSnapshot {
            name: "AdGuard Home".into(),
            rule: OwnershipRule::SourceAddress(PROXY.into()),
            entries: entries
                .iter()
                .map(|(domain, answer)| ManagedEntry::from_fqdn(domain, answer, None))
                .collect(),
        }
    }

    fn row<'a>(rows: &'a [HostStatus], hostname: &str) -> &'a HostStatus {
        rows.iter().find(|r| r.hostname == hostname).unwrap()
    }

    #[test]
    fn test_overall_classification() {
        let rows = build_status(
            &mapping(&["full.example.com", "half.example.com", "none.example.com", "wrong.example.com"]),
            &[
                unbound(&[
                    ("full.example.com", PROXY, MARKER),
                    ("half.example.com", PROXY, MARKER),
                    ("wrong.example.com", "10.0.0.1", "manual"),
                ]),
                adguard(&[("full.example.com", PROXY), ("wrong.example.com", "10.0.0.2")]),
            ],
            &options(),
        );

        assert_eq!(row(&rows, "full.example.com").overall, OverallStatus::FullyInSync);
        assert_eq!(row(&rows, "half.example.com").overall, OverallStatus::PartiallyInSync);
        assert_eq!(row(&rows, "none.example.com").overall, OverallStatus::SourceOnly);
        assert_eq!(row(&rows, "wrong.example.com").overall, OverallStatus::OutOfSync);
    }

    #[test]
    fn test_stale_tool_records_join_universe() {
        let rows = build_status(
            &mapping(&["svc.example.com"]),
            &[
                unbound(&[
                    ("svc.example.com", PROXY, MARKER),
                    ("old.example.com", PROXY, "Route via Caddy"),
                    ("nas.example.com", "10.0.0.9", "manual"),
                ]),
                adguard(&[("svc.example.com", PROXY), ("gone.example.com", PROXY), ("tv.example.com", "10.0.0.4")]),
            ],
            &options(),
        );

        let hosts: Vec<_> = rows.iter().map(|r| r.hostname.as_str()).collect();
        assert_eq!(hosts, vec!["gone.example.com", "old.example.com", "svc.example.com"]);

        let old = row(&rows, "old.example.com");
        assert_eq!(old.overall, OverallStatus::OutOfSync);
        assert_eq!(old.source_value, None);
        assert!(old.systems[0].present && !old.systems[0].in_sync);
        // Absent from AdGuard, which is the desired state for a stale hostname
        assert!(!old.systems[1].present && old.systems[1].in_sync);
    }

    #[test]
    fn test_skipped_system_is_not_evaluated() {
        // Only Unbound is evaluated: AdGuard state never drags the row down
        let rows = build_status(
            &mapping(&["svc.example.com"]),
            &[unbound(&[("svc.example.com", PROXY, MARKER)])],
            &options(),
        );
        assert_eq!(rows[0].overall, OverallStatus::FullyInSync);
        assert_eq!(rows[0].systems.len(), 1);
        assert_eq!(rows[0].systems[0].id.as_deref(), Some("uuid-svc.example.com"));
    }

    #[test]
    fn test_tool_record_preferred_over_foreign_duplicate() {
        let rows = build_status(
            &mapping(&["svc.example.com"]),
            &[unbound(&[
                ("svc.example.com", "10.0.0.1", "manual"),
                ("svc.example.com", PROXY, MARKER),
            ])],
            &options(),
        );
        assert_eq!(rows[0].systems[0].marker.as_deref(), Some(MARKER));
        assert!(rows[0].systems[0].in_sync);
    }

    #[test]
    fn test_filters() {
        let rows = build_status(
            &mapping(&["Grafana.example.com", "git.example.com"]),
            &[unbound(&[("git.example.com", PROXY, MARKER)])],
            &options(),
        );

        let out_of_sync = StatusFilter {
            out_of_sync_only: true,
            hostname: None,
        };
        let kept: Vec<_> = rows.iter().filter(|r| out_of_sync.matches(r)).collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].hostname, "Grafana.example.com");

        let by_name = StatusFilter {
            out_of_sync_only: false,
            hostname: Some("GRAF".into()),
        };
        assert_eq!(rows.iter().filter(|r| by_name.matches(r)).count(), 1);
    }

    #[test]
    fn test_summary_counts() {
        let rows = build_status(
            &mapping(&["a.example.com", "b.example.com"]),
            &[unbound(&[("a.example.com", PROXY, MARKER), ("z.example.com", PROXY, MARKER)])],
            &options(),
        );
        let summary = StatusSummary::from_rows(&rows);
        assert_eq!(
            summary,
            StatusSummary {
                total: 3,
                fully_in_sync: 1,
                partially_in_sync: 0,
                out_of_sync: 1,
                source_only: 1,
            }
        );
        assert!(summary.needs_attention());
        assert!(summary.to_string().starts_with("3 hostnames: 1 in sync"));

        let clean = StatusSummary {
            total: 2,
            fully_in_sync: 1,
            source_only: 1,
            ..StatusSummary::default()
        };
        assert!(!clean.needs_attention());
    }

    #[test]
    fn test_status_table_with_ips() {
        let rows = build_status(
            &mapping(&["a.example.com"]),
            &[unbound(&[("a.example.com", "10.0.0.1", MARKER)])],
            &options(),
        );
        let names = ["Unbound".to_string()];
        let table = StatusTable::new(&names, &rows, true).to_string();
        let lines: Vec<_> = table.lines().collect();
        assert!(lines[0].starts_with("HOSTNAME"));
        assert!(lines[0].contains("Unbound"));
        assert!(lines[1].contains("out of sync"));
        assert!(lines[1].contains("✗ 10.0.0.1"));
        assert!(lines[1].contains(PROXY));
    }
}
