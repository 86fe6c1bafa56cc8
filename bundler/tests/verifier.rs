//! Tests for the verifier microservices of a bundle

use credibil_bundler::archive::Archive;
use credibil_bundler::provider::StandardEnvironment;
use credibil_bundler::{Config, Error, Snapshot, VerificationFlow, create_bundle};
use serde_json::{Value, json};
use test_utils::read_json;

const SHOP: &str = "rp_shop_verifier";

fn create(template: &[u8], snapshot: &Snapshot) -> Result<Archive, Error> {
    let bytes =
        create_bundle(template, snapshot, &StandardEnvironment::default(), &Config::default())?;
    Ok(test_utils::open(&bytes))
}

fn bundle(snapshot: &Snapshot) -> Archive {
    create(&test_utils::template(), snapshot).expect("should create bundle")
}

fn stored_query(snapshot: &Snapshot) -> Value {
    snapshot
        .templates
        .iter()
        .find(|t| t.id == "tpl_verify_employee")
        .and_then(|t| t.dcql_query.clone())
        .expect("should have a query")
}

// Should identify the verifier and trust every issuer of the organization.
#[test]
fn metadata() {
    let bundle = bundle(&test_utils::snapshot());
    let metadata = read_json(&bundle, &format!("{SHOP}/public/verifier/.well-known/openid-relying-party"));

    assert_eq!(metadata["client_id"], "https://shop.example.com/verifier");
    assert_eq!(metadata["redirect_uris"], json!(["https://shop.example.com/verifier/callback"]));
    assert_eq!(metadata["display"], json!([{"name": "Shop Verifier", "locale": "en-US"}]));
    assert_eq!(metadata["jwks"]["keys"][0]["kid"], "");
    assert_eq!(metadata["jwks"]["keys"][0]["crv"], "P-256");
    assert_eq!(
        metadata["trusted_credential_issuers"],
        json!([
            "https://issuer.acme.example/credential_issuer",
            "https://auth.acme.example/credential_issuer"
        ])
    );
}

// Should render a details page and the stored query for each flow.
#[test]
fn flow_pages() {
    let snapshot = test_utils::snapshot();
    let bundle = bundle(&snapshot);
    let flow = format!("{SHOP}/public/verifier/vf_employee");

    let details = bundle.read_text(&format!("{flow}/details.zen")).expect("should exist");
    assert!(details.contains("When I write string 'Employee check' in 'title'"));
    assert!(details.contains("When I write string 'Proves current employment' in 'description'"));
    assert!(!details.contains("{{"));

    assert_eq!(
        read_json(&bundle, &format!("{flow}/dcql_query.keys.json")),
        json!({"dcql_query": stored_query(&snapshot)})
    );
}

// Should embed an Authorization Request carrying the query in both pages.
#[test]
fn request_pages() {
    let snapshot = test_utils::snapshot();
    let bundle = bundle(&snapshot);
    let flow = format!("{SHOP}/public/verifier/vf_employee");

    let request = json!({
        "client_id": "https://shop.example.com/verifier",
        "response_type": "vp_token",
        "response_mode": "direct_post",
        "dcql_query": stored_query(&snapshot)
    });
    assert_eq!(
        read_json(&bundle, &format!("{flow}/deeplink.keys.json")),
        json!({
            "request": request,
            "deeplink_path": "public/verifier/vf_employee/deeplink"
        })
    );

    let qrcode = read_json(&bundle, &format!("{flow}/qrcode.keys.json"));
    assert_eq!(qrcode["request"], request);
    assert_eq!(qrcode["command"], "./scripts/qrcode.sh public/verifier/vf_employee/qrcode");
    assert!(bundle.contains(&format!("{flow}/qrcode.zen")));
}

// Should list every flow with a link to its details page.
#[test]
fn flow_list() {
    let bundle = bundle(&test_utils::snapshot());

    assert_eq!(
        read_json(&bundle, &format!("{SHOP}/public/verifier/list.keys.json")),
        json!({
            "flows": [{
                "name": "Employee check",
                "description": "Proves current employment",
                "url": "https://shop.example.com/verifier/vf_employee/details"
            }]
        })
    );
}

// Should name the verification contract after the requested credential type.
#[test]
fn custom_code() {
    let bundle = bundle(&test_utils::snapshot());

    assert_eq!(
        bundle.read_text(&format!("{SHOP}/custom_code/verifier/EmployeeCard.zen")).expect("should exist"),
        "Given I have a 'string dictionary' named 'vp_token'\nThen print the 'vp_token'"
    );
}

// Should accept queries stored as text, and W3C type queries.
#[test]
fn text_query() {
    let mut snapshot = test_utils::snapshot();
    let query = json!({
        "credentials": [{
            "id": "membership",
            "format": "ldp_vc",
            "meta": {"type_values": [["VerifiableCredential", "Membership"]]}
        }]
    });
    let template = snapshot
        .templates
        .iter_mut()
        .find(|t| t.id == "tpl_verify_employee")
        .expect("should exist");
    template.dcql_query = Some(Value::String(serde_json::to_string_pretty(&query).expect("should serialize")));

    let bundle = bundle(&snapshot);
    assert!(bundle.contains(&format!("{SHOP}/custom_code/verifier/Membership.zen")));

    let keys = read_json(&bundle, &format!("{SHOP}/public/verifier/vf_employee/deeplink.keys.json"));
    assert_eq!(keys["request"]["dcql_query"], query);
}

// Should write an empty list for a verifier without flows.
#[test]
fn no_flows() {
    let mut snapshot = test_utils::snapshot();
    snapshot.verification_flows.clear();
    let bundle = bundle(&snapshot);

    assert_eq!(read_json(&bundle, &format!("{SHOP}/public/verifier/list.keys.json")), json!({"flows": []}));
    assert!(!bundle.has_folder(&format!("{SHOP}/public/verifier/vf_employee")));
}

// Should reject flows whose template has no usable query.
#[test]
fn invalid_query() {
    let mut snapshot = test_utils::snapshot();
    snapshot.templates.iter_mut().for_each(|t| {
        if t.id == "tpl_verify_employee" {
            t.dcql_query = None;
        }
    });
    let err = create(&test_utils::template(), &snapshot).expect_err("should fail");
    assert!(matches!(err, Error::InvalidInput(_)));

    let mut snapshot = test_utils::snapshot();
    snapshot.templates.iter_mut().for_each(|t| {
        if t.id == "tpl_verify_employee" {
            t.dcql_query = Some(json!("{ not a query"));
        }
    });
    let err = create(&test_utils::template(), &snapshot).expect_err("should fail");
    assert!(matches!(err, Error::InvalidInput(_)));

    let mut snapshot = test_utils::snapshot();
    snapshot.verification_flows.push(VerificationFlow {
        id: "vf_unknown".to_string(),
        relying_party: "rp_shop".to_string(),
        template: "tpl_unknown".to_string(),
        ..VerificationFlow::default()
    });
    let err = create(&test_utils::template(), &snapshot).expect_err("should fail");
    assert!(matches!(err, Error::InputResolution(_)));
}

// Should fail when the details page has nothing to fill in.
#[test]
fn details_without_markers() {
    let mut template = test_utils::template_archive();
    template.add_entry(
        &format!("{}/public/verifier/details.zen", test_utils::TEMPLATE_ROOT),
        "Given nothing\nThen print 'done'",
    );
    let template = template.to_bytes().expect("should serialize");

    let err = create(&template, &test_utils::snapshot()).expect_err("should fail");
    assert!(matches!(err, Error::MalformedTemplate(_)));
}
