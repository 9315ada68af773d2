use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::Server;
use predicates::prelude::*;

const REQUIRED_VARS: [&str; 5] = [
    "SHOREFETCH_DATASTORE_URL",
    "SHOREFETCH_DATASTORE_KEY",
    "SHOREFETCH_MAIL_SERVICE_ID",
    "SHOREFETCH_MAIL_TEMPLATE_ID",
    "SHOREFETCH_MAIL_PUBLIC_KEY",
];

fn shorefetch() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("shorefetch"));
    for var in REQUIRED_VARS {
        cmd.env_remove(var);
    }
    cmd.env_remove("SHOREFETCH_MAX_RETRIES")
        .env_remove("SHOREFETCH_BASE_DELAY_MS")
        .env_remove("SHOREFETCH_CACHE_MAX_AGE_MS");
    cmd
}

#[test]
fn test_get_prints_json_body() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/api/rooms")
        .match_header("content-type", "application/json")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"rooms": [{"name": "Ocean Suite", "price": 320}]}"#)
        .expect(1)
        .create();

    shorefetch()
        .args(["get", &format!("{}/api/rooms", url)])
        .assert()
        .success()
        .stdout(predicates::str::contains("Ocean Suite"))
        .stdout(predicates::str::contains("320"));

    mock.assert();
}

#[test]
fn test_get_not_found_fails_with_user_message() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/api/rooms/99")
        .with_status(404)
        .with_body(r#"{"message": "Room not found"}"#)
        .expect(1)
        .create();

    shorefetch()
        .args(["get", &format!("{}/api/rooms/99", url), "--base-delay-ms", "1"])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "The requested resource was not found.",
        ));

    mock.assert();
}

#[test]
fn test_get_retries_server_errors() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/api/gallery")
        .with_status(503)
        .expect(3)
        .create();

    shorefetch()
        .args([
            "get",
            &format!("{}/api/gallery", url),
            "--retries",
            "2",
            "--base-delay-ms",
            "1",
        ])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "Server error. Please try again later.",
        ));

    mock.assert();
}

#[test]
fn test_retries_flag_reads_environment() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("GET", "/api/gallery")
        .with_status(503)
        .expect(1)
        .create();

    shorefetch()
        .env("SHOREFETCH_MAX_RETRIES", "0")
        .args(["get", &format!("{}/api/gallery", url)])
        .assert()
        .failure()
        .stderr(predicates::str::contains(
            "Server error. Please try again later.",
        ));

    mock.assert();
}

#[test]
fn test_log_json_dumps_records() {
    let mut server = Server::new();
    let url = server.url();

    let _mock = server
        .mock("GET", "/api/content")
        .with_status(403)
        .create();

    shorefetch()
        .args(["--log-json", "get", &format!("{}/api/content", url)])
        .assert()
        .failure()
        .stderr(predicates::str::contains(r#""category": "auth""#))
        .stderr(predicates::str::contains(r#""severity": "high""#))
        .stderr(predicates::str::contains(r#""category": "auth""#).count(1));
}

#[test]
fn test_post_sends_json() {
    let mut server = Server::new();
    let url = server.url();

    let mock = server
        .mock("POST", "/admin/api/content")
        .match_body(mockito::Matcher::JsonString(
            r#"{"title": "Sunset deck"}"#.to_string(),
        ))
        .with_status(200)
        .with_body(r#"{"success": true}"#)
        .create();

    shorefetch()
        .args([
            "post",
            &format!("{}/admin/api/content", url),
            "--data",
            r#"{"title": "Sunset deck"}"#,
        ])
        .assert()
        .success()
        .stdout(predicates::str::contains("\"success\": true"));

    mock.assert();
}

#[test]
fn test_post_invalid_json_fails() {
    shorefetch()
        .args(["post", "http://127.0.0.1:9/x", "--data", "{nope"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Invalid JSON in --data"));
}

#[test]
fn test_check_env_lists_missing_variables() {
    shorefetch()
        .env("SHOREFETCH_DATASTORE_URL", "https://db.resort.example")
        .env("SHOREFETCH_DATASTORE_KEY", "anon-key")
        .arg("check-env")
        .assert()
        .success()
        .stdout(predicates::str::contains("missing: SHOREFETCH_MAIL_SERVICE_ID"))
        .stdout(predicates::str::contains("SHOREFETCH_DATASTORE_URL").not());
}

#[test]
fn test_check_env_all_present() {
    let mut cmd = shorefetch();
    for var in REQUIRED_VARS {
        cmd.env(var, "value");
    }
    cmd.arg("check-env")
        .assert()
        .success()
        .stdout(predicates::str::contains(
            "All required environment variables are set.",
        ));
}

#[test]
fn test_invalid_tuning_value_fails() {
    shorefetch()
        .env("SHOREFETCH_MAX_RETRIES", "many")
        .arg("check-env")
        .assert()
        .failure()
        .stderr(predicates::str::contains("SHOREFETCH_MAX_RETRIES"));
}
