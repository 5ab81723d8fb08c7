//! Tests for the semantic validation pass.

use rstest::{fixture, rstest};

use crate::{Configuration, ValidationError, default_configuration, validate};

#[fixture]
fn config() -> Configuration {
    default_configuration()
}

#[rstest]
fn defaults_are_valid(config: Configuration) {
    validate(&config).expect("defaults validate");
}

#[rstest]
#[case(1, 2)]
#[case(7890, 7891)]
#[case(65535, 1)]
#[case(80, 65534)]
fn accepts_distinct_ports_in_range(
    mut config: Configuration,
    #[case] http: u16,
    #[case] socks: u16,
) {
    config.http_port = http;
    config.socks_port = socks;
    validate(&config).expect("ports are valid");
}

#[rstest]
#[case(0, 7891, "port")]
#[case(7890, 0, "socks-port")]
#[case(0, 0, "port")]
#[case(7890, 7890, "socks-port")]
fn rejects_bad_ports_naming_field(
    mut config: Configuration,
    #[case] http: u16,
    #[case] socks: u16,
    #[case] field: &str,
) {
    config.http_port = http;
    config.socks_port = socks;
    let error = validate(&config).expect_err("ports are invalid");
    assert_eq!(error.field(), field);
}

#[rstest]
#[case("rule")]
#[case("global")]
#[case("direct")]
fn accepts_known_modes(mut config: Configuration, #[case] mode: &str) {
    config.mode = mode.to_owned();
    validate(&config).expect("mode is valid");
}

#[rstest]
#[case("Rule")]
#[case("script")]
#[case("")]
fn rejects_unknown_modes(mut config: Configuration, #[case] mode: &str) {
    config.mode = mode.to_owned();
    let error = validate(&config).expect_err("mode is invalid");
    assert_eq!(
        error,
        ValidationError::InvalidMode {
            value: mode.to_owned()
        }
    );
    assert!(error.to_string().contains("rule/global/direct"));
}

#[rstest]
fn rejects_unknown_log_level(mut config: Configuration) {
    config.log_level = String::from("verbose");
    let error = validate(&config).expect_err("log level is invalid");
    assert_eq!(error.field(), "log-level");
}

#[rstest]
fn tun_stack_is_only_checked_when_enabled(mut config: Configuration) {
    config.tun.stack = String::from("lwip");
    let error = validate(&config).expect_err("stack is invalid while enabled");
    assert!(matches!(error, ValidationError::InvalidTunStack { .. }));

    config.tun.enable = false;
    validate(&config).expect("stack is ignored while disabled");
}

#[rstest]
fn dns_mode_is_only_checked_when_enabled(mut config: Configuration) {
    config.dns.enhanced_mode = String::from("mapping");
    let error = validate(&config).expect_err("mode is invalid while enabled");
    assert!(matches!(error, ValidationError::InvalidDnsMode { .. }));

    config.dns.enable = false;
    validate(&config).expect("mode is ignored while disabled");
}

#[rstest]
fn reports_first_violation_in_order(mut config: Configuration) {
    config.http_port = 0;
    config.mode = String::from("bogus");
    config.log_level = String::from("bogus");
    let error = validate(&config).expect_err("config is invalid");
    assert_eq!(
        error,
        ValidationError::InvalidPort {
            field: "port",
            value: 0
        }
    );
}

#[rstest]
fn rejects_duplicate_proxy_names(mut config: Configuration) {
    let duplicate = config.proxies[0].clone();
    config.proxies.push(duplicate);
    let error = validate(&config).expect_err("duplicate proxy");
    assert_eq!(
        error,
        ValidationError::DuplicateProxy {
            name: String::from("example-proxy")
        }
    );
}

#[rstest]
fn rejects_duplicate_group_names(mut config: Configuration) {
    let duplicate = config.proxy_groups[0].clone();
    config.proxy_groups.push(duplicate);
    let error = validate(&config).expect_err("duplicate group");
    assert_eq!(error.field(), "proxy-groups");
}

#[rstest]
fn rejects_undeclared_group_member(mut config: Configuration) {
    config.proxy_groups[0].proxies.push(String::from("missing"));
    let error = validate(&config).expect_err("unknown member");
    assert_eq!(
        error,
        ValidationError::UnknownGroupMember {
            group: String::from("PROXY"),
            member: String::from("missing"),
        }
    );
}

#[rstest]
fn accepts_reserved_and_nested_group_members(mut config: Configuration) {
    let mut nested = config.proxy_groups[0].clone();
    nested.name = String::from("AUTO");
    nested.proxies = vec![String::from("PROXY"), String::from("REJECT")];
    config.proxy_groups.push(nested);
    validate(&config).expect("references resolve");
}
