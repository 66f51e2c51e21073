use std::fs;
use taxcalc::core::config::AppConfig;
use taxcalc::core::error::Error;
use taxcalc::core::period::Period;
use tracing::info;

mod test_utils {
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub const CLIENT_INFO: &str = r#"{
        "clientId": "3MSaMMtczs",
        "name": "Test User",
        "accounts": [
            {"id": "fop-usd", "sendId": "s1", "currencyCode": 840, "balance": 0,
             "creditLimit": 0, "maskedPan": [], "type": "fop", "iban": "UA1"},
            {"id": "card-uah", "sendId": "s2", "currencyCode": 980, "balance": 0,
             "creditLimit": 0, "maskedPan": [], "type": "black", "iban": "UA2"}
        ]
    }"#;

    pub const RATES: &str = r#"[
        {"currencyCodeA": 840, "currencyCodeB": 980, "date": 1700000000, "rateBuy": 40.0, "rateSell": 41.0}
    ]"#;

    pub const STATEMENT: &str = r#"[
        {"id": "in-1", "time": 1700000300, "operationAmount": 100000, "currencyCode": 840},
        {"id": "out-1", "time": 1700000200, "operationAmount": -2500, "currencyCode": 840},
        {"id": "in-2", "time": 1700000100, "operationAmount": 50000, "currencyCode": 840}
    ]"#;

    /// A Monobank lookalike serving one FOP USD account.
    pub async fn create_monobank_mock() -> MockServer {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/personal/client-info"))
            .respond_with(ResponseTemplate::new(200).set_body_string(CLIENT_INFO))
            .mount(&mock_server)
            .await;
        Mock::given(method("POST"))
            .and(path("/bank/currency"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RATES))
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path_regex(r"^/personal/statement/fop-usd/\d+/\d+$"))
            .respond_with(ResponseTemplate::new(200).set_body_string(STATEMENT))
            .mount(&mock_server)
            .await;

        mock_server
    }

    /// A Monobank lookalike rejecting the token.
    pub async fn create_forbidden_mock() -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&mock_server)
            .await;
        mock_server
    }

    pub fn config_yaml(banks: &[(&str, String)], on_error: &str, data_path: &str) -> String {
        let banks: String = banks
            .iter()
            .map(|(id, url)| {
                format!(
                    "  - kind: monobank\n    id: \"{id}\"\n    token: \"test-token\"\n    base_url: \"{url}\"\n"
                )
            })
            .collect();
        format!(
            "banks:\n{banks}cache:\n  backend: memory\non_error: {on_error}\nrequest_delay_secs: 0\ndata_path: \"{data_path}\"\n"
        )
    }
}

#[test_log::test(tokio::test)]
async fn test_full_app_flow_with_mock() {
    let mock_server = test_utils::create_monobank_mock().await;
    let data_dir = tempfile::tempdir().expect("Failed to create temp dir");

    let config_file = tempfile::NamedTempFile::new().expect("Failed to create temp file");
    let config_path = config_file.path();
    let config_content = test_utils::config_yaml(
        &[("monobank", mock_server.uri())],
        "abort",
        data_dir.path().to_str().unwrap(),
    );
    fs::write(config_path, &config_content).expect("Failed to write config file");

    let result = taxcalc::run_command(
        taxcalc::AppCommand::Report {
            period: Some(Period::Months(2.0)),
        },
        Some(config_path.to_str().unwrap()),
    )
    .await;
    assert!(
        result.is_ok(),
        "Main function failed with: {:?}",
        result.err()
    );
}

#[test_log::test(tokio::test)]
async fn test_income_and_taxes_from_mock() {
    let mock_server = test_utils::create_monobank_mock().await;
    let data_dir = tempfile::tempdir().unwrap();
    let config: AppConfig = serde_yaml::from_str(&test_utils::config_yaml(
        &[("monobank", mock_server.uri())],
        "abort",
        data_dir.path().to_str().unwrap(),
    ))
    .unwrap();

    let aggregation = taxcalc::calculate(&config, Period::Months(3.0))
        .await
        .unwrap();
    info!(?aggregation, "Aggregated");

    // (100000 + 50000) minor USD units at 40 UAH, in major units.
    assert!(!aggregation.is_partial());
    assert!((aggregation.totals.income - 60_000.0).abs() < 1e-6);
    assert!((aggregation.totals.taxes.general - 3_000.0).abs() < 1e-6);
    assert!((aggregation.totals.taxes.military - 600.0).abs() < 1e-6);
    assert!((aggregation.totals.taxes.total - 3_600.0).abs() < 1e-6);
}

#[test_log::test(tokio::test)]
async fn test_abort_policy_fails_on_rejected_token() {
    let good = test_utils::create_monobank_mock().await;
    let bad = test_utils::create_forbidden_mock().await;
    let data_dir = tempfile::tempdir().unwrap();
    let config: AppConfig = serde_yaml::from_str(&test_utils::config_yaml(
        &[("monobank", good.uri()), ("mono-second", bad.uri())],
        "abort",
        data_dir.path().to_str().unwrap(),
    ))
    .unwrap();

    let err = taxcalc::calculate(&config, Period::Months(1.0))
        .await
        .unwrap_err();
    let err = err
        .downcast_ref::<Error>()
        .expect("Expected a domain error");
    assert!(matches!(
        err,
        Error::AggregationFailed { bank_id, .. } if bank_id == "mono-second"
    ));
}

#[test_log::test(tokio::test)]
async fn test_continue_policy_reports_failed_bank() {
    let good = test_utils::create_monobank_mock().await;
    let bad = test_utils::create_forbidden_mock().await;
    let data_dir = tempfile::tempdir().unwrap();
    let config: AppConfig = serde_yaml::from_str(&test_utils::config_yaml(
        &[("mono-second", bad.uri()), ("monobank", good.uri())],
        "continue",
        data_dir.path().to_str().unwrap(),
    ))
    .unwrap();

    let aggregation = taxcalc::calculate(&config, Period::Months(1.0))
        .await
        .unwrap();

    assert!(aggregation.is_partial());
    assert_eq!(aggregation.failures.len(), 1);
    assert_eq!(aggregation.failures[0].bank_id, "mono-second");
    assert!(matches!(
        aggregation.failures[0].error,
        Error::FetchFailed { status: 403, .. }
    ));
    assert!((aggregation.totals.income - 60_000.0).abs() < 1e-6);
}

#[test_log::test(tokio::test)]
async fn test_duplicate_bank_ids_are_rejected() {
    let data_dir = tempfile::tempdir().unwrap();
    let config: AppConfig = serde_yaml::from_str(&test_utils::config_yaml(
        &[
            ("monobank", "http://127.0.0.1:1".to_string()),
            ("monobank", "http://127.0.0.1:2".to_string()),
        ],
        "abort",
        data_dir.path().to_str().unwrap(),
    ))
    .unwrap();

    let err = taxcalc::calculate(&config, Period::Months(1.0))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("Duplicate bank id"));
}

#[test_log::test(tokio::test)]
async fn test_negative_period_is_rejected() {
    let mock_server = test_utils::create_monobank_mock().await;
    let data_dir = tempfile::tempdir().unwrap();
    let config: AppConfig = serde_yaml::from_str(&test_utils::config_yaml(
        &[("monobank", mock_server.uri())],
        "abort",
        data_dir.path().to_str().unwrap(),
    ))
    .unwrap();

    let err = taxcalc::calculate(&config, Period::Months(-3.0))
        .await
        .unwrap_err();
    assert!(err.to_string().contains("non-negative"));
    assert!(mock_server.received_requests().await.unwrap().is_empty());
}

#[test_log::test(tokio::test)]
async fn test_missing_config_file() {
    let result = taxcalc::run_command(
        taxcalc::AppCommand::Report { period: None },
        Some("/nonexistent/taxcalc/config.yaml"),
    )
    .await;
    let err = result.unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));
}
