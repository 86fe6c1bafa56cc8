//! Tests for the credential issuer microservices of a bundle

use credibil_bundler::archive::Archive;
use credibil_bundler::provider::StandardEnvironment;
use credibil_bundler::{Config, CredentialOffer, Snapshot, create_bundle};
use serde_json::json;
use test_utils::read_json;

const ACME: &str = "ci_acme_issuer";
const BADGES: &str = "ci_badge_issuer";
const WELL_KNOWN: &str = "public/credential_issuer/.well-known/openid-credential-issuer";

fn bundle(snapshot: &Snapshot, config: &Config) -> Archive {
    let bytes =
        create_bundle(&test_utils::template(), snapshot, &StandardEnvironment::default(), config)
            .expect("should create bundle");
    test_utils::open(&bytes)
}

// Should advertise one credential configuration per linked issuance flow.
#[test]
fn metadata() {
    let bundle = bundle(&test_utils::snapshot(), &Config::default());
    let metadata = read_json(&bundle, &format!("{ACME}/{WELL_KNOWN}"));

    assert_eq!(metadata["credential_issuer"], "https://issuer.acme.example/credential_issuer");
    assert_eq!(
        metadata["credential_endpoint"],
        "https://issuer.acme.example/credential_issuer/credential"
    );
    assert_eq!(
        metadata["authorization_servers"],
        json!(["https://auth.acme.example/authz_server", "https://auth.partner.example/authz_server"])
    );
    assert_eq!(metadata["display"], json!([{"name": "Acme Issuer", "locale": "en-US"}]));

    // template configurations are replaced, not extended
    let configurations = metadata["credential_configurations_supported"]
        .as_object()
        .expect("should be an object");
    assert_eq!(configurations.keys().collect::<Vec<_>>(), vec!["EmployeeCard", "Membership"]);

    // other template fields are kept
    assert_eq!(metadata["jwks"]["keys"][0]["kid"], "template-key");
}

// Should describe SD-JWT and W3C credentials in their own formats.
#[test]
fn credential_formats() {
    let bundle = bundle(&test_utils::snapshot(), &Config::default());
    let metadata = read_json(&bundle, &format!("{ACME}/{WELL_KNOWN}"));
    let configurations = &metadata["credential_configurations_supported"];

    let employee = &configurations["EmployeeCard"];
    assert_eq!(employee["format"], "dc+sd-jwt");
    assert_eq!(employee["vct"], "EmployeeCard");
    assert_eq!(employee["credential_signing_alg_values_supported"], json!(["ES256"]));
    assert!(employee.get("credential_definition").is_none());
    assert_eq!(
        employee["claims"],
        json!([
            {
                "mandatory": true,
                "display": [{"locale": "en-US", "name": "Given name"}],
                "path": ["given_name"]
            },
            {
                "mandatory": false,
                "display": [{"locale": "en-US", "name": "Family name"}],
                "path": ["family_name"]
            },
            {
                "mandatory": false,
                "display": [{"locale": "en-US", "name": "street"}],
                "path": ["address", "street"]
            }
        ])
    );
    assert_eq!(employee["display"][0]["name"], "Employee Card");
    assert_eq!(employee["display"][0]["logo"]["alt_text"], "Employee Card logo");

    let membership = &configurations["Membership"];
    assert_eq!(membership["format"], "ldp_vc");
    assert_eq!(
        membership["credential_definition"]["type"],
        json!(["VerifiableCredential", "Membership"])
    );
    assert_eq!(
        membership["credential_definition"]["@context"][0],
        "https://www.w3.org/ns/credentials/v2"
    );
    assert!(membership.get("vct").is_none());
}

// Should write expiration policies only for flows that have one.
#[test]
fn expiration() {
    let bundle = bundle(&test_utils::snapshot(), &Config::default());

    assert_eq!(
        read_json(&bundle, &format!("{ACME}/custom_code/credential_issuer/EmployeeCard.time.json")),
        json!({"mode": "duration", "duration": {"day": 0, "month": 3, "year": 2}})
    );
    assert!(!bundle.contains(&format!("{ACME}/custom_code/credential_issuer/Membership.time.json")));
}

// Should name the authorization server in offers only when the issuer has
// more than one.
#[test]
fn offer_grants() {
    let bundle = bundle(&test_utils::snapshot(), &Config::default());

    let keys = read_json(
        &bundle,
        &format!("{ACME}/public/credential_issuer/if_member/deeplink.keys.json"),
    );
    assert_eq!(
        keys,
        json!({
            "offer": {
                "credential_configuration_ids": ["Membership"],
                "credential_issuer": "https://issuer.acme.example/credential_issuer",
                "grants": {
                    "authorization_code": {
                        "authorization_server": "https://auth.partner.example/authz_server"
                    }
                }
            },
            "deeplink_path": "public/credential_issuer/if_member/deeplink"
        })
    );
    let offer: CredentialOffer =
        serde_json::from_value(keys["offer"].clone()).expect("should deserialize");
    assert_eq!(offer.authorization_server(), Some("https://auth.partner.example/authz_server"));

    let keys = read_json(
        &bundle,
        &format!("{BADGES}/public/credential_issuer/if_badge/qrcode.keys.json"),
    );
    assert_eq!(
        keys,
        json!({
            "offer": {
                "credential_configuration_ids": ["Badge"],
                "credential_issuer": "https://auth.acme.example/credential_issuer"
            },
            "qrcode_path": "public/credential_issuer/if_badge/qrcode",
            "command": "./scripts/qrcode.sh public/credential_issuer/if_badge/qrcode"
        })
    );
    let offer: CredentialOffer =
        serde_json::from_value(keys["offer"].clone()).expect("should deserialize");
    assert_eq!(offer.authorization_server(), None);
}

// Should publish a deep-link and a QR code page per flow, sharing one offer.
#[test]
fn offer_pages() {
    let bundle = bundle(&test_utils::snapshot(), &Config::default());
    let flow = format!("{ACME}/public/credential_issuer/if_employee");

    for page in ["deeplink.zen", "deeplink.keys.json", "qrcode.zen", "qrcode.keys.json"] {
        assert!(bundle.contains(&format!("{flow}/{page}")), "missing {page}");
    }
    assert_eq!(
        bundle.get(&format!("{flow}/qrcode.zen")),
        bundle.get(&format!("{ACME}/public/credential_issuer/qrcode.zen"))
    );

    let deeplink = read_json(&bundle, &format!("{flow}/deeplink.keys.json"));
    let qrcode = read_json(&bundle, &format!("{flow}/qrcode.keys.json"));
    assert_eq!(deeplink["offer"], qrcode["offer"]);
}

// Should fall back to the default contract when a template has no script.
#[test]
fn custom_code() {
    let bundle = bundle(&test_utils::snapshot(), &Config::default());
    let code = format!("{ACME}/custom_code/credential_issuer");

    assert_eq!(bundle.get(&format!("{code}/EmployeeCard.zen")), bundle.get(&format!("{code}/default.zen")));
    assert_eq!(
        bundle.read_text(&format!("{code}/Membership.zen")).expect("should exist"),
        "Given I have a 'string' named 'membership_number'\nThen print the 'membership_number'"
    );
    assert!(!bundle.contains(&format!("{code}/Membership.keys.json")));
    assert!(bundle.contains(&format!("{BADGES}/custom_code/credential_issuer/Badge.zen")));
}

// Should apply configured locale, colours and indentation.
#[test]
fn configured_display() {
    let config = Config::from_json(
        r##"{"locale": "it-IT", "json_indent": 2, "display": {"background_color": "#000000"}}"##,
    )
    .expect("should parse");
    let bundle = bundle(&test_utils::snapshot(), &config);
    let path = format!("{ACME}/{WELL_KNOWN}");

    let metadata = read_json(&bundle, &path);
    assert_eq!(metadata["display"][0]["locale"], "it-IT");

    let employee = &metadata["credential_configurations_supported"]["EmployeeCard"];
    assert_eq!(employee["display"][0]["locale"], "it-IT");
    assert_eq!(employee["display"][0]["background_color"], "#000000");
    assert_eq!(employee["display"][0]["text_color"], "#FFFFFF");
    assert_eq!(employee["claims"][0]["display"][0]["locale"], "it-IT");

    let text = bundle.read_text(&path).expect("should exist");
    assert!(text.starts_with("{\n  \"credential_issuer\""));
}
