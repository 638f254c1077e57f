//! Shared HTTP client configuration and bounded response helpers.

use std::io::{self, Read};
use std::sync::OnceLock;
use std::time::Duration;

use serde::de::DeserializeOwned;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("studyml/", env!("CARGO_PKG_VERSION"));

/// Errors from a bounded JSON GET.
#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// The server answered with a non-success status.
    #[error("HTTP {code} from {url}: {body}")]
    Status { url: String, code: u16, body: String },
    /// Connection, TLS or protocol failure.
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    /// The body could not be read or exceeded the size cap.
    #[error("Failed to read response from {url}: {source}")]
    Body { url: String, source: io::Error },
    /// The body was not the expected JSON shape.
    #[error("Invalid JSON from {url}: {source}")]
    Json {
        url: String,
        source: serde_json::Error,
    },
}

/// Return a shared HTTP agent with consistent timeouts.
pub fn agent() -> &'static ureq::Agent {
    static AGENT: OnceLock<ureq::Agent> = OnceLock::new();
    AGENT.get_or_init(|| {
        ureq::AgentBuilder::new()
            .timeout_connect(CONNECT_TIMEOUT)
            .timeout_read(READ_TIMEOUT)
            .timeout_write(WRITE_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
    })
}

/// Issue a GET and decode the JSON body, reading at most `max_bytes`.
pub fn get_json<T: DeserializeOwned>(url: &str, max_bytes: usize) -> Result<T, HttpError> {
    let response = match agent().get(url).set("Accept", "application/json").call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, response)) => {
            let body = response.into_string().unwrap_or_default();
            return Err(HttpError::Status {
                url: url.to_string(),
                code,
                body,
            });
        }
        Err(ureq::Error::Transport(err)) => {
            return Err(HttpError::Transport {
                url: url.to_string(),
                message: err.to_string(),
            });
        }
    };
    let bytes = read_response_bytes(response, max_bytes).map_err(|source| HttpError::Body {
        url: url.to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| HttpError::Json {
        url: url.to_string(),
        source,
    })
}

/// Read a response into memory, enforcing a maximum byte size.
pub fn read_response_bytes(response: ureq::Response, max_bytes: usize) -> Result<Vec<u8>, io::Error> {
    check_content_length(&response, max_bytes)?;
    let reader = response.into_reader();
    let mut limited = reader.take(max_bytes as u64 + 1);
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response exceeded {max_bytes} bytes"),
        ));
    }
    Ok(bytes)
}

fn check_content_length(response: &ureq::Response, max_bytes: usize) -> Result<(), io::Error> {
    let Some(length) = response.header("Content-Length") else {
        return Ok(());
    };
    let Ok(length) = length.parse::<u64>() else {
        return Ok(());
    };
    if length > max_bytes as u64 {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Response too large: {length} bytes"),
        ));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_server {
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve each canned response to one connection, in order, then stop.
    pub(crate) fn serve(responses: Vec<String>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            for response in responses {
                if let Ok((mut stream, _)) = listener.accept() {
                    let mut buf = [0u8; 2048];
                    let _ = stream.read(&mut buf);
                    let _ = stream.write_all(response.as_bytes());
                }
            }
        });
        format!("http://{addr}/")
    }

    pub(crate) fn json_response(body: &str) -> String {
        format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        )
    }
}
