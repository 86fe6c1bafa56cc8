//! Tests for the authorization server microservices of a bundle

use credibil_bundler::archive::Archive;
use credibil_bundler::provider::StandardEnvironment;
use credibil_bundler::{Config, create_bundle};
use serde_json::json;
use test_utils::read_json;

const MAIN: &str = "as_main_auth";
const PARTNER: &str = "as_partner_auth";
const WELL_KNOWN: &str = "public/authz_server/.well-known/oauth-authorization-server";
const CUSTOM_CODE: &str = "custom_code/authz_server";

fn bundle() -> Archive {
    let bytes = create_bundle(
        &test_utils::template(),
        &test_utils::snapshot(),
        &StandardEnvironment::default(),
        &Config::default(),
    )
    .expect("should create bundle");
    test_utils::open(&bytes)
}

// Should advertise one scope per credential type the server authorizes.
#[test]
fn metadata() {
    let bundle = bundle();

    let metadata = read_json(&bundle, &format!("{MAIN}/{WELL_KNOWN}"));
    assert_eq!(metadata["issuer"], "https://auth.acme.example/authz_server");
    assert_eq!(metadata["token_endpoint"], "https://auth.acme.example/authz_server/token");
    assert_eq!(metadata["scopes_supported"], json!(["EmployeeCard", "Badge"]));
    assert_eq!(metadata["jwks"]["keys"][0]["kid"], "");
    assert_eq!(metadata["jwks"]["keys"][0]["kty"], "EC");
    assert_eq!(metadata["response_types_supported"], json!(["code"]));

    let metadata = read_json(&bundle, &format!("{PARTNER}/{WELL_KNOWN}"));
    assert_eq!(metadata["issuer"], "https://auth.partner.example/authz_server");
    assert_eq!(metadata["scopes_supported"], json!(["Membership"]));
}

// Should describe the holder's form fields and the attributes it releases.
#[test]
fn schema_description() {
    let bundle = bundle();

    assert_eq!(
        read_json(&bundle, &format!("{MAIN}/{CUSTOM_CODE}/EmployeeCard.schema.json")),
        json!({
            "type": "object",
            "properties": {
                "code": {"type": "string", "title": "One-time code"},
                "email": {"type": "string", "title": "Email"}
            },
            "required": ["email"],
            "form_fields": ["code"],
            "user_attributes": ["email"]
        })
    );
    assert_eq!(
        read_json(&bundle, &format!("{MAIN}/{CUSTOM_CODE}/EmployeeCard.metadata.json")),
        json!({
            "claims": [
                {
                    "mandatory": false,
                    "display": [{"locale": "en-US", "name": "One-time code"}],
                    "path": ["code"]
                },
                {
                    "mandatory": true,
                    "display": [{"locale": "en-US", "name": "Email"}],
                    "path": ["email"]
                }
            ]
        })
    );

    let schema = read_json(&bundle, &format!("{MAIN}/{CUSTOM_CODE}/Badge.schema.json"));
    assert_eq!(schema["form_fields"], json!([]));
    assert_eq!(schema["user_attributes"], json!(["username"]));
}

// Should write the template's contract and keys, or the default contract.
#[test]
fn custom_code() {
    let bundle = bundle();
    let code = format!("{MAIN}/{CUSTOM_CODE}");

    assert_eq!(
        bundle.read_text(&format!("{code}/EmployeeCard.zen")).expect("should exist"),
        "Given I have a 'string' named 'email'\nThen print the 'email'"
    );
    assert_eq!(
        bundle.read_text(&format!("{code}/EmployeeCard.keys.json")).expect("should exist"),
        r#"{"allowed_domain": "acme.example"}"#
    );
    assert_eq!(bundle.get(&format!("{code}/Badge.zen")), bundle.get(&format!("{code}/default.zen")));
    assert!(!bundle.contains(&format!("{code}/Badge.keys.json")));

    // flows belonging to other servers are not assembled here
    assert!(!bundle.contains(&format!("{code}/Membership.zen")));
    assert!(bundle.contains(&format!("{PARTNER}/{CUSTOM_CODE}/Membership.zen")));
}

// Should keep the template's own authorization pages.
#[test]
fn template_pages() {
    let bundle = bundle();

    for server in [MAIN, PARTNER] {
        assert!(bundle.contains(&format!("{server}/public/authz_server/authorize.zen")));
        assert!(bundle.contains(&format!("{server}/.env.example")));
    }
}
