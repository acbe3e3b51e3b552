use serde_json::Value;
use tracing::{debug, instrument};

use crate::account::AccountInfo;
use crate::error::GqlError;
use crate::query::{build_query, request_body, strip_whitespace};

/// Source of account state, keyed by endpoint and raw address.
pub trait AccountFetcher {
    fn get_account_info(&self, endpoint: &str, address: &str) -> Result<AccountInfo, GqlError>;
}

/// Blocking GraphQL client for the indexing service.
///
/// Each call is a single POST with no retry; timeouts are the transport's
/// defaults.
#[derive(Debug, Clone, Default)]
pub struct GqlClient {
    http: reqwest::blocking::Client,
}

impl GqlClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client on top of a preconfigured HTTP client.
    pub fn with_http(http: reqwest::blocking::Client) -> Self {
        Self { http }
    }

    /// Posts `query` to `endpoint` and returns the parsed JSON response.
    #[instrument(skip(self, query))]
    pub fn fetch(&self, endpoint: &str, query: &str) -> Result<Value, GqlError> {
        let body = request_body(&strip_whitespace(query));

        debug!("Sending GraphQL request");

        let response = self
            .http
            .post(endpoint)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        let text = response.text()?;

        if !status.is_success() {
            return Err(GqlError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        debug!(bytes = text.len(), "Received successful response");

        Ok(serde_json::from_str(&text)?)
    }

    /// Fetches code, data and balance of the account at `address`.
    #[instrument(skip(self))]
    pub fn get_account_info(&self, endpoint: &str, address: &str) -> Result<AccountInfo, GqlError> {
        let response = self.fetch(endpoint, &build_query(address))?;
        AccountInfo::from_response(&response)
    }
}

impl AccountFetcher for GqlClient {
    fn get_account_info(&self, endpoint: &str, address: &str) -> Result<AccountInfo, GqlError> {
        GqlClient::get_account_info(self, endpoint, address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    /// Serves exactly one HTTP response and hands back the raw request.
    fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "{}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status_line,
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (format!("http://{}/graphql", addr), handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let len = head
                    .lines()
                    .find_map(|l| l.strip_prefix("content-length:"))
                    .map(|v| v.trim().parse::<usize>().unwrap())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + len {
                    break;
                }
            }
        }
        String::from_utf8(buf).unwrap()
    }

    fn split_request(request: &str) -> (String, Value) {
        let (head, body) = request.split_once("\r\n\r\n").unwrap();
        (head.to_lowercase(), serde_json::from_str(body).unwrap())
    }

    fn client() -> GqlClient {
        GqlClient::with_http(reqwest::blocking::Client::builder().no_proxy().build().unwrap())
    }

    #[test]
    fn test_fetch_posts_query_and_variables() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", r#"{"data":{}}"#);

        let response = client().fetch(&url, "query {\n  x\n}").unwrap();
        assert_eq!(response, json!({"data": {}}));

        let (head, body) = split_request(&server.join().unwrap());
        assert!(head.starts_with("post /graphql "));
        assert!(head.contains("content-type: application/json"));
        assert_eq!(body, json!({"query": "query{x}", "variables": {}}));
    }

    #[test]
    fn test_get_account_info() {
        let (url, server) = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"data":{"blockchain":{"account":{"info":{"balance":"0x10","data":"D","code":"C"}}}}}"#,
        );

        let info = client().get_account_info(&url, "0:abcd").unwrap();
        assert_eq!(
            info,
            AccountInfo {
                code: "C".into(),
                data: "D".into(),
                balance: "0x10".into(),
            }
        );

        let (_, body) = split_request(&server.join().unwrap());
        assert_eq!(body["query"], build_query("0:abcd"));
    }

    #[test]
    fn test_non_success_status() {
        let (url, server) = serve_once("HTTP/1.1 502 Bad Gateway", r#"{"error":"upstream"}"#);
        match client().fetch(&url, "query{x}") {
            Err(GqlError::Status { status, body }) => {
                assert_eq!(status, 502);
                assert!(body.contains("upstream"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_non_json_body() {
        let (url, server) = serve_once("HTTP/1.1 200 OK", "<html>oops</html>");
        assert!(matches!(
            client().fetch(&url, "query{x}"),
            Err(GqlError::Json(_))
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_connection_refused() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let err = client()
            .fetch(&format!("http://127.0.0.1:{}/graphql", port), "query{x}")
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    #[ignore = "requires CELLBRIDGE_ENDPOINT pointing at a live service"]
    fn test_live_endpoint() {
        let endpoint = std::env::var("CELLBRIDGE_ENDPOINT").expect("CELLBRIDGE_ENDPOINT not set");
        let address = format!("-1:{}", "5".repeat(64));
        let info = GqlClient::new().get_account_info(&endpoint, &address).unwrap();
        assert!(info.balance.starts_with("0x"));
    }
}
