//! Gmail client tests against a local stand-in for the Gmail REST API
//!
//! A plain TCP listener answers canned JSON so the real HTTP path (URLs,
//! auth header, parsing, label changes) runs without network access.

use base64::prelude::*;
use mail::{GmailAuth, GmailClient, GmailCredentials, InboxTools, MailProvider, MessageId};
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{SystemTime, UNIX_EPOCH};
use tempfile::TempDir;

/// One request seen by the fake server
#[derive(Debug, Clone)]
struct SeenRequest {
    line: String,
    authorization: Option<String>,
    body: String,
}

fn metadata_message(id: &str, from: &str, subject: &str) -> String {
    serde_json::json!({
        "id": id,
        "threadId": format!("t-{}", id),
        "labelIds": ["INBOX", "UNREAD"],
        "snippet": "Quick question &amp; a favor",
        "payload": {
            "mimeType": "multipart/alternative",
            "headers": [
                { "name": "From", "value": from },
                { "name": "Subject", "value": subject },
                { "name": "Date", "value": "Thu, 4 Jan 2024 08:00:00 +0000" }
            ]
        }
    })
    .to_string()
}

fn full_message(id: &str) -> String {
    serde_json::json!({
        "id": id,
        "threadId": format!("t-{}", id),
        "labelIds": ["INBOX", "UNREAD"],
        "snippet": "Quick question",
        "payload": {
            "mimeType": "multipart/mixed",
            "headers": [],
            "body": { "size": 0 },
            "parts": [
                {
                    "partId": "0",
                    "mimeType": "multipart/alternative",
                    "body": { "size": 0 },
                    "parts": [
                        { "partId": "0.0", "mimeType": "text/html", "body": { "size": 10, "data": BASE64_URL_SAFE_NO_PAD.encode("<p>html</p>") } },
                        { "partId": "0.1", "mimeType": "text/plain", "body": { "size": 10, "data": BASE64_URL_SAFE_NO_PAD.encode("Could you review my PR?") } }
                    ]
                },
                { "partId": "1", "mimeType": "application/pdf", "filename": "a.pdf", "body": { "attachmentId": "att1", "size": 1000 } }
            ]
        }
    })
    .to_string()
}

fn route(line: &str) -> (u16, String) {
    let path = line.split_whitespace().nth(1).unwrap_or_default();

    if path.starts_with("/gmail/v1/users/me/messages?") {
        if path.contains("q=from%3A") {
            return (200, r#"{"messages":[{"id":"m2","threadId":"t-m2"}],"resultSizeEstimate":1}"#.to_string());
        }
        return (
            200,
            r#"{"messages":[{"id":"m1","threadId":"t-m1"},{"id":"m2","threadId":"t-m2"}],"resultSizeEstimate":2}"#
                .to_string(),
        );
    }
    if path.starts_with("/gmail/v1/users/me/messages/m1?format=metadata") {
        return (200, metadata_message("m1", "Alex <alex@example.com>", "PR review"));
    }
    if path.starts_with("/gmail/v1/users/me/messages/m2?format=metadata") {
        return (200, metadata_message("m2", "Boss <boss@example.com>", "Budget"));
    }
    if path.starts_with("/gmail/v1/users/me/messages/m1?format=full") {
        return (200, full_message("m1"));
    }
    if path == "/gmail/v1/users/me/messages/m1/modify" {
        return (200, r#"{"id":"m1","labelIds":["INBOX"]}"#.to_string());
    }
    (404, r#"{"error":{"code":404,"message":"Requested entity was not found."}}"#.to_string())
}

fn handle(stream: TcpStream, seen: &Mutex<Vec<SeenRequest>>) {
    let mut reader = BufReader::new(match stream.try_clone() {
        Ok(s) => s,
        Err(_) => return,
    });

    let mut line = String::new();
    if reader.read_line(&mut line).is_err() || line.is_empty() {
        return;
    }

    let mut content_length = 0usize;
    let mut chunked = false;
    let mut authorization = None;
    loop {
        let mut header = String::new();
        if reader.read_line(&mut header).is_err() {
            return;
        }
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            let value = value.trim().to_string();
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.parse().unwrap_or(0);
            } else if name.eq_ignore_ascii_case("transfer-encoding") {
                chunked = value.eq_ignore_ascii_case("chunked");
            } else if name.eq_ignore_ascii_case("authorization") {
                authorization = Some(value);
            }
        }
    }

    let body = if chunked {
        match read_chunked(&mut reader) {
            Some(body) => body,
            None => return,
        }
    } else {
        let mut body = vec![0u8; content_length];
        if reader.read_exact(&mut body).is_err() {
            return;
        }
        body
    };

    let line = line.trim_end().to_string();
    let (status, payload) = route(&line);
    seen.lock().unwrap().push(SeenRequest {
        line,
        authorization,
        body: String::from_utf8_lossy(&body).into_owned(),
    });

    let reason = if status == 200 { "OK" } else { "Not Found" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        payload.len(),
        payload
    );
    let mut stream = stream;
    stream.write_all(response.as_bytes()).ok();
    stream.flush().ok();
}

fn read_chunked(reader: &mut BufReader<TcpStream>) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).ok()?;
        let size = usize::from_str_radix(size_line.trim(), 16).ok()?;
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).ok()?;
        if size == 0 {
            return Some(body);
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

/// Start the fake API; returns its base URL and the request log
fn start_server() -> (String, Arc<Mutex<Vec<SeenRequest>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let log = seen.clone();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            handle(stream, &log);
        }
    });

    (format!("http://{}/gmail/v1", addr), seen)
}

/// A client whose auth context already holds a fresh token
fn make_client(dir: &TempDir, base_url: &str) -> GmailClient {
    let token_path = dir.path().join("tokens.json");
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();
    std::fs::write(
        &token_path,
        serde_json::json!({
            "access_token": "test-access-token",
            "refresh_token": null,
            "expires_at": now + 3600
        })
        .to_string(),
    )
    .unwrap();

    let credentials = GmailCredentials {
        client_id: "test-client".to_string(),
        client_secret: "test-secret".to_string(),
    };
    GmailClient::new(GmailAuth::new(credentials, token_path)).with_base_url(base_url)
}

#[test]
fn test_list_unread_fetches_and_normalizes() {
    let (base_url, seen) = start_server();
    let dir = TempDir::new().unwrap();
    let client = make_client(&dir, &base_url);

    let messages = client.list_unread(20).unwrap();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].id.as_str(), "m1");
    assert_eq!(messages[0].sender, "Alex <alex@example.com>");
    assert_eq!(messages[0].subject, "PR review");
    assert_eq!(messages[0].snippet, "Quick question & a favor");
    assert!(messages[0].is_unread);
    assert_eq!(messages[1].subject, "Budget");

    let seen = seen.lock().unwrap();
    assert!(seen[0].line.contains("maxResults=20&labelIds=INBOX&labelIds=UNREAD"));
    assert!(
        seen.iter()
            .all(|r| r.authorization.as_deref() == Some("Bearer test-access-token"))
    );
}

#[test]
fn test_get_body_picks_plain_text_part() {
    let (base_url, _) = start_server();
    let dir = TempDir::new().unwrap();
    let client = make_client(&dir, &base_url);

    let body = client.get_body(&MessageId::new("m1")).unwrap();
    assert_eq!(body, "Could you review my PR?");
}

#[test]
fn test_set_read_state_sends_label_change() {
    let (base_url, seen) = start_server();
    let dir = TempDir::new().unwrap();
    let client = make_client(&dir, &base_url);

    assert!(client.set_read_state(&MessageId::new("m1"), false).unwrap());
    // Unknown message: Gmail answers 404, reported as "not applied"
    assert!(!client.set_read_state(&MessageId::new("missing"), false).unwrap());

    let seen = seen.lock().unwrap();
    assert!(seen[0].line.starts_with("POST /gmail/v1/users/me/messages/m1/modify"));
    let body: serde_json::Value = serde_json::from_str(&seen[0].body).unwrap();
    assert_eq!(body, serde_json::json!({ "removeLabelIds": ["UNREAD"] }));
}

#[test]
fn test_search_by_sender_uses_from_query() {
    let (base_url, seen) = start_server();
    let dir = TempDir::new().unwrap();
    let client = make_client(&dir, &base_url);

    let found = client.search_by_sender("boss@example.com", 5).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id.as_str(), "m2");
    assert!(seen.lock().unwrap()[0].line.contains("q=from%3Aboss%40example.com"));
}

#[test]
fn test_tools_over_gmail_client() {
    let (base_url, _) = start_server();
    let dir = TempDir::new().unwrap();
    let tools = InboxTools::new(Arc::new(make_client(&dir, &base_url)));

    let email = tools.read_email("alex");
    assert!(email.contains("Email ID: m1"));
    assert!(email.contains("Could you review my PR?"));

    assert_eq!(
        tools.mark_email_as_read("m1"),
        "Email has been marked as read."
    );
    assert!(
        tools
            .mark_email_as_read("missing")
            .starts_with("Error marking email as read: ")
    );
}

#[test]
fn test_unreachable_api_becomes_error_text() {
    // Bind then drop to get a port nobody is listening on
    let addr = TcpListener::bind("127.0.0.1:0").unwrap().local_addr().unwrap();
    let dir = TempDir::new().unwrap();
    let client = make_client(&dir, &format!("http://{}/gmail/v1", addr));
    let tools = InboxTools::new(Arc::new(client));

    assert!(tools.get_unread_mail(5).starts_with("Error fetching emails: "));
}
