use miette::Result;
use quickbooks_rs::{
    BatchItem, BatchRequest, Credentials, DataService, Error, RequestOptions, TransportError,
    endpoints::SANDBOX_BASE_URL, error::BoxError,
};
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use url::Url;


use test_utils::{FakeTransport, REALM_ID, service};

#[tokio::test]
async fn read_gets_the_record_url_and_decodes_an_entity() -> Result<()> {
    test_utils::do_setup();
    let transport = FakeTransport::default().respond_json(json!({
        "Customer": {"Id": "5", "SyncToken": "3", "DisplayName": "Bill's Windsurf Shop"},
        "time": "2015-07-23T10:58:12.099-07:00"
    }));
    let service = service(&transport);

    let customer = service
        .entity("Customer")
        .read(5)
        .await?
        .into_entity()
        .expect("entity expected");

    assert_eq!(customer.id(), Some(5));
    assert_eq!(customer.sync_token(), Some("3"));

    let request = transport.last_request();
    assert_eq!(request.method, Method::GET);
    assert_eq!(
        request.url.as_str(),
        format!("https://quickbooks.api.intuit.com/v3/company/{REALM_ID}/customer/5")
    );
    assert_eq!(request.body, None);
    Ok(())
}

#[tokio::test]
async fn create_posts_the_json_payload_with_signed_headers() -> Result<()> {
    test_utils::do_setup();
    let transport = FakeTransport::default().respond_json(json!({
        "Customer": {"Id": "67", "DisplayName": "Sonnenschein Family Store"}
    }));
    let service = service(&transport).with_user_agent("acme-sync/1.0");

    let payload = json!({"DisplayName": "Sonnenschein Family Store"});
    let created = service
        .entity("Customer")
        .create(&payload, &RequestOptions::minor_version(65))
        .await?;
    assert_eq!(created.as_entity().and_then(|c| c.id()), Some(67));

    let request = transport.last_request();
    assert_eq!(request.method, Method::POST);
    assert_eq!(
        request.url.as_str(),
        "https://quickbooks.api.intuit.com/v3/company/123145/customer?minorversion=65"
    );
    assert_eq!(
        request.body.as_deref().map(serde_json::from_str::<Value>).transpose().unwrap(),
        Some(payload)
    );
    assert_eq!(request.headers["Accept"], "application/json");
    assert_eq!(request.headers["Content-Type"], "application/json");
    assert_eq!(request.headers["User-Agent"], "acme-sync/1.0");
    assert_eq!(
        request.headers["Authorization"],
        "OAuth oauth_consumer_key=\"consumer-key\", oauth_token=\"access-token\", signed=\"POST https://quickbooks.api.intuit.com/v3/company/123145/customer?minorversion=65\""
    );
    Ok(())
}

#[tokio::test]
async fn user_agent_is_omitted_unless_configured() -> Result<()> {
    let transport = FakeTransport::default().respond_json(json!({"Customer": {}}));
    let service = service(&transport);

    service.entity("Customer").read(1).await?;
    assert!(!transport.last_request().headers.contains_key("User-Agent"));
    Ok(())
}

#[tokio::test]
async fn update_and_delete_use_operation_parameters() -> Result<()> {
    test_utils::do_setup();
    let transport = FakeTransport::default()
        .respond_json(json!({"Invoice": {"Id": "130", "SyncToken": "1"}}))
        .respond_json(json!({"Invoice": {"Id": "130", "SyncToken": "0"}}))
        .respond_json(json!({"Invoice": {"Id": "130", "status": "Deleted"}}));
    let service = service(&transport);
    let invoices = service.entity("Invoice");
    let payload = json!({"Id": "130", "SyncToken": "0", "sparse": true, "DueDate": "2015-08-23"});

    let updated = invoices.update(&payload, &RequestOptions::minor_version(4)).await?;
    assert_eq!(updated.as_entity().and_then(|i| i.sync_token()), Some("1"));
    invoices.update(&payload, &RequestOptions::default()).await?;
    invoices.delete(&json!({"Id": "130", "SyncToken": "1"})).await?;

    let urls: Vec<String> = transport
        .requests()
        .into_iter()
        .map(|request| request.url.to_string())
        .collect();
    assert_eq!(
        urls,
        [
            "https://quickbooks.api.intuit.com/v3/company/123145/invoice?operation=update&minorversion=4",
            "https://quickbooks.api.intuit.com/v3/company/123145/invoice?operation=update",
            "https://quickbooks.api.intuit.com/v3/company/123145/invoice?operation=delete",
        ]
    );
    assert!(transport.requests().iter().all(|r| r.method == Method::POST));
    Ok(())
}

#[tokio::test]
async fn entity_query_defaults_to_select_all() -> Result<()> {
    test_utils::do_setup();
    let transport = FakeTransport::default()
        .respond_json(json!({
            "QueryResponse": {"Customer": [{"Id": "1"}, {"Id": "2"}], "startPosition": 1, "maxResults": 2}
        }))
        .respond_json(json!({"QueryResponse": {"totalCount": 29}}));
    let service = service(&transport);

    let customers = service
        .entity("Customer")
        .query(None, &RequestOptions::default())
        .await?
        .into_query()
        .expect("query expected");
    assert_eq!(customers.len(), 2);
    assert_eq!(
        transport.last_request().url.as_str(),
        "https://quickbooks.api.intuit.com/v3/company/123145/query?query=select+*+from+Customer"
    );

    let count = service
        .entity("Customer")
        .query(Some("select count(*) from Customer"), &RequestOptions::minor_version(65))
        .await?
        .into_query()
        .expect("query expected");
    assert_eq!(count.total_count(), Some(29));
    assert_eq!(
        transport.last_request().url.as_str(),
        "https://quickbooks.api.intuit.com/v3/company/123145/query?query=select+count%28*%29+from+Customer&minorversion=65"
    );
    assert_eq!(transport.last_request().method, Method::GET);
    Ok(())
}

#[tokio::test]
async fn batch_posts_batch_item_request() -> Result<()> {
    test_utils::do_setup();
    let mut request = BatchRequest::new();
    let query_id = request.query("select * from Customer maxresults 1");

    let transport = FakeTransport::default().respond_json(json!({
        "BatchItemResponse": [
            {"bId": query_id.clone(), "QueryResponse": {"Customer": [{"Id": "1"}]}}
        ]
    }));
    let service = service(&transport).with_base_url(SANDBOX_BASE_URL);

    let batch = service
        .batch(&request, &RequestOptions::minor_version(65))
        .await?
        .into_batch()
        .expect("batch expected");
    assert_eq!(
        batch.get(&query_id).and_then(BatchItem::as_query).map(|q| q.len()),
        Some(1)
    );

    let sent = transport.last_request();
    assert_eq!(
        sent.url.as_str(),
        "https://sandbox-quickbooks.api.intuit.com/v3/company/123145/batch?minorversion=65"
    );
    let body: Value = serde_json::from_str(sent.body.as_deref().unwrap()).unwrap();
    assert_eq!(
        body,
        json!({"BatchItemRequest": [{"bId": query_id, "Query": "select * from Customer maxresults 1"}]})
    );
    Ok(())
}

#[tokio::test]
async fn non_success_status_surfaces_body_status_and_cause() {
    test_utils::do_setup();
    let fault = r#"{"Fault":{"Error":[{"Message":"message=AuthenticationFailed","code":"3200"}],"type":"AuthenticationFault"}}"#;
    let transport = FakeTransport::default().fail(TransportError::Status {
        status: StatusCode::UNAUTHORIZED,
        body: fault.to_string(),
        source: "401 Unauthorized".into(),
    });
    let service = service(&transport);

    let error = service
        .entity("Customer")
        .read(1)
        .await
        .expect_err("request should fail");

    match &error {
        Error::BadResponse {
            status_code,
            response_body,
            url,
            source,
            ..
        } => {
            assert_eq!(*status_code, StatusCode::UNAUTHORIZED);
            assert_eq!(response_body, fault);
            assert_eq!(url, "https://quickbooks.api.intuit.com/v3/company/123145/customer/1");
            assert_eq!(source.to_string(), "401 Unauthorized");
        }
        other => panic!("expected BadResponse, got {other:?}"),
    }
    assert_eq!(
        error.to_string(),
        format!("received error [{fault}] with status code [401] when sending request")
    );
    assert_eq!(transport.requests().len(), 1, "requests are never retried");
}

#[tokio::test]
async fn non_success_status_returned_as_ok_is_still_an_error() {
    let transport =
        FakeTransport::default().respond(StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded");
    let service = service(&transport);

    let error = service
        .query("select * from Customer", &RequestOptions::default())
        .await
        .expect_err("request should fail");

    assert_eq!(error.status_code(), Some(StatusCode::INTERNAL_SERVER_ERROR));
    assert_eq!(error.response_body(), Some("upstream exploded"));
    assert!(std::error::Error::source(&error).is_some());
}

#[tokio::test]
async fn connection_failures_are_request_errors() {
    let transport =
        FakeTransport::default().fail(TransportError::Connection("connection refused".into()));
    let service = service(&transport);

    let error = service
        .entity("Customer")
        .read(1)
        .await
        .expect_err("request should fail");
    assert!(matches!(error, Error::Request { .. }));
    assert_eq!(error.status_code(), None);
}

#[tokio::test]
async fn invalid_json_is_a_deserialization_error() {
    let transport = FakeTransport::default().respond(StatusCode::OK, "<html>maintenance</html>");
    let service = service(&transport);

    let error = service
        .entity("Customer")
        .read(1)
        .await
        .expect_err("request should fail");
    assert!(matches!(error, Error::DeserializationError { .. }));
    assert_eq!(error.response_body(), Some("<html>maintenance</html>"));
}

#[tokio::test]
async fn empty_body_decodes_to_an_empty_entity() -> Result<()> {
    let transport = FakeTransport::default().respond(StatusCode::OK, "");
    let service = service(&transport);

    let response = service.entity("Customer").read(1).await?;
    assert!(response.as_entity().is_some_and(|e| e.is_empty()));
    Ok(())
}

#[tokio::test]
async fn signer_failures_stop_the_request() {
    fn failing_signer(
        _: &Credentials,
        _: &Method,
        _: &Url,
    ) -> std::result::Result<BTreeMap<String, String>, BoxError> {
        Err("token expired".into())
    }

    let transport = FakeTransport::default();
    let service = DataService::new(test_utils::credentials(), REALM_ID, failing_signer)
        .with_transport(&transport);

    let error = service
        .entity("Customer")
        .read(1)
        .await
        .expect_err("signing should fail");
    assert!(matches!(error, Error::Signing { .. }));
    assert!(transport.requests().is_empty());
}
