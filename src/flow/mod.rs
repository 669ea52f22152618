//! Flow model: one intercepted request/response exchange
//!
//! The host proxy owns flows; hooks only mutate them in place. Flows are
//! also (de)serializable so recorded exchanges can be replayed through the
//! hooks from the command line.

pub mod body;
pub mod headers;
pub mod request;
pub mod response;

pub use headers::{names, Headers};
pub use request::Request;
pub use response::Response;

use serde::{Deserialize, Serialize};

/// One request/response exchange
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flow {
    /// The client request
    pub request: Request,

    /// The upstream response, absent until one arrives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Response>,

    /// Transport or processing error recorded for this flow
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Flow {
    /// Create a flow that has only seen its request
    pub fn new(request: Request) -> Self {
        Self {
            request,
            response: None,
            error: None,
        }
    }

    /// Attach a response
    pub fn with_response(mut self, response: Response) -> Self {
        self.response = Some(response);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flow_json_roundtrip_keeps_headers_order() {
        let json = r#"{
            "request": {"url": "https://a.example/app.js", "headers": [["Origin", "https://a.example"]]},
            "response": {
                "status_code": 200,
                "headers": [["content-type", "text/javascript"], ["X-B", "2"]],
                "body": {"text": "var a = 1;"}
            }
        }"#;
        let flow: Flow = serde_json::from_str(json).unwrap();
        let resp = flow.response.as_ref().unwrap();
        assert_eq!(resp.body, b"var a = 1;");
        assert_eq!(resp.headers.iter().nth(1), Some(("X-B", "2")));

        let out = serde_json::to_value(&flow).unwrap();
        assert_eq!(out["response"]["headers"][0][0], "content-type");
        assert!(out.get("error").is_none());
    }
}
