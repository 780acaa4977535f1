#![allow(clippy::unwrap_used)]

use std::io::Write;

use creamy_config::{ListValue, load_settings};
use creamy_core::Gateway;
use figment::Jail;
use pretty_assertions::assert_eq;
use secrecy::ExposeSecret;

const FILE: &str = r#"
remote_host = "https://192.168.1.1"
remote_username = "admin"
remote_password = "from-file"
remote_interface = "lan"
port = 9000

[[gateways]]
name = "WAN1_DHCP"
label = "Primary"
status_name = "WAN1"

[[gateways]]
name = "WAN2"
label = "Backup"
"#;

fn config_file(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn file_then_environment() {
    let file = config_file(FILE);

    Jail::expect_with(|jail| {
        jail.set_env("CREAMY_GATEWAY_REMOTE_PASSWORD", "from-env");
        jail.set_env("CREAMY_GATEWAY_TRUST_FORWARDED_HEADERS", "true");

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(settings.remote_username, "admin");
        assert_eq!(settings.remote_password.expose_secret(), "from-env");
        assert_eq!(settings.port, 9000);
        assert!(settings.trust_forwarded_headers);

        let config = settings.selector_config().unwrap();
        assert_eq!(config.url.as_str(), "https://192.168.1.1/");
        assert!(!format!("{settings:?}").contains("from-env"));
        assert_eq!(
            config.gateways,
            vec![
                Gateway::new("WAN1_DHCP", "Primary").with_status_name("WAN1"),
                Gateway::new("WAN2", "Backup"),
            ]
        );
        Ok(())
    });
}

#[test]
fn environment_only_with_comma_lists() {
    let file = config_file("");

    Jail::expect_with(|jail| {
        jail.set_env("CREAMY_GATEWAY_REMOTE_HOST", "https://10.0.0.1");
        jail.set_env("CREAMY_GATEWAY_REMOTE_USERNAME", "admin");
        jail.set_env("CREAMY_GATEWAY_REMOTE_PASSWORD", "pfsense");
        jail.set_env("CREAMY_GATEWAY_REMOTE_INTERFACE", "opt1");
        jail.set_env("CREAMY_GATEWAY_REMOTE_REFERRER", "https://10.0.0.1/");
        jail.set_env("CREAMY_GATEWAY_GATEWAY_NAMES", "WAN1,WAN2");
        jail.set_env("CREAMY_GATEWAY_GATEWAY_LABELS", "Primary,Backup");

        let settings = load_settings(Some(file.path())).unwrap();
        assert_eq!(
            settings.gateway_names,
            Some(ListValue::Joined("WAN1,WAN2".into()))
        );

        let config = settings.selector_config().unwrap();
        assert_eq!(config.interface, "opt1");
        assert_eq!(config.referrer.as_deref(), Some("https://10.0.0.1/"));
        assert_eq!(
            config.gateways,
            vec![Gateway::new("WAN1", "Primary"), Gateway::new("WAN2", "Backup")]
        );
        Ok(())
    });
}

#[test]
fn toml_arrays_are_accepted_for_lists() {
    let file = config_file(
        r#"
remote_host = "https://192.168.1.1"
remote_interface = "lan"
gateway_names = ["WAN1", "WAN2"]
gateway_labels = ["Primary", "Backup", "Extra"]
"#,
    );

    Jail::expect_with(|_| {
        let settings = load_settings(Some(file.path())).unwrap();
        let config = settings.selector_config().unwrap();
        assert_eq!(
            config.gateways,
            vec![Gateway::new("WAN1", "WAN1"), Gateway::new("WAN2", "WAN2")]
        );
        Ok(())
    });
}

#[test]
fn malformed_value_is_a_load_error() {
    let file = config_file("port = \"not a port\"\n");

    Jail::expect_with(|_| {
        let err = load_settings(Some(file.path())).unwrap_err();
        assert!(err.to_string().starts_with("config loading failed"));
        Ok(())
    });
}
