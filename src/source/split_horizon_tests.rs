// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

#[cfg(test)]
mod tests {
    use crate::source::split_horizon::{split_horizon_mapping, SplitHorizonOptions};
    use crate::source::HostnameMapping;

    const PROXY: &str = "192.168.1.15";

    fn proxy_mapping(entries: &[(&str, &str)]) -> HostnameMapping {
        entries
            .iter()
            .map(|(h, t)| ((*h).to_string(), (*t).to_string()))
            .collect()
    }

    #[test]
    fn test_both_variants() {
        let mapping = split_horizon_mapping(
            &proxy_mapping(&[("grafana.example.com", "10.0.0.7")]),
            PROXY,
            &SplitHorizonOptions::new("home.net"),
        );

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["grafana.dev.home.net"], "10.0.0.7");
        assert_eq!(mapping["grafana.caddy.home.net"], PROXY);
    }

    #[test]
    fn test_direct_only_and_caddy_only() {
        let source = proxy_mapping(&[("grafana.example.com", "10.0.0.7")]);

        let mut direct = SplitHorizonOptions::new("home.net");
        direct.caddy = false;
        let mapping = split_horizon_mapping(&source, PROXY, &direct);
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["grafana.dev.home.net"]);

        let mut caddy = SplitHorizonOptions::new("home.net");
        caddy.direct = false;
        let mapping = split_horizon_mapping(&source, PROXY, &caddy);
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["grafana.caddy.home.net"]);
    }

    #[test]
    fn test_custom_subdomains() {
        let mut options = SplitHorizonOptions::new("home.net");
        options.direct_subdomain = "lan".into();
        options.caddy_subdomain = "proxy".into();

        let mapping =
            split_horizon_mapping(&proxy_mapping(&[("app.example.com", PROXY)]), PROXY, &options);
        assert!(mapping.contains_key("app.lan.home.net"));
        assert!(mapping.contains_key("app.proxy.home.net"));
    }

    #[test]
    fn test_same_service_deduplicated_per_name() {
        // Two hostnames sharing a first label collapse onto the same derived names
        let mapping = split_horizon_mapping(
            &proxy_mapping(&[("app.a.com", "10.0.0.1"), ("app.b.com", "10.0.0.2")]),
            PROXY,
            &SplitHorizonOptions::new("home.net"),
        );

        assert_eq!(mapping.len(), 2);
        assert_eq!(mapping["app.dev.home.net"], "10.0.0.1");
    }

    #[test]
    fn test_bare_hostname_is_its_own_service() {
        let mapping = split_horizon_mapping(
            &proxy_mapping(&[("nas", PROXY)]),
            PROXY,
            &SplitHorizonOptions::new("home.net"),
        );
        assert!(mapping.contains_key("nas.dev.home.net"));
    }

    #[test]
    fn test_empty_proxy_mapping() {
        assert!(
            split_horizon_mapping(&HostnameMapping::new(), PROXY, &SplitHorizonOptions::new("x.net"))
                .is_empty()
        );
    }
}
