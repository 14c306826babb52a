#[cfg(test)]
pub mod test {
    use std::sync::{Arc, Mutex};

    use serde_json::{Map, Value as JsonValue};

    use crate::files::Files;
    use crate::properties::Properties;
    use crate::transport::{Request, Response, Transport, TransportError};

    /// A pull response for the `Development;UnitTest` context.
    pub const PULL_RESPONSE: &str = r#"{
  "context": "Development;UnitTest",
  "account": "ConfigHub",
  "repo": "UnitTest",
  "properties": {
    "db.port": { "type": "Integer", "val": 3306 },
    "app.name": { "type": "Text", "val": "Billing Service" },
    "countries": { "type": "List", "val": ["US", "UK", "BA"] },
    "limits": { "type": "Map", "val": { "max": "10" } },
    "db.password": { "type": "Text", "encryption": "secrets", "val": "UjJ4b2RXSk9aWFE9" },
    "legacy.timeout": { "type": "Long", "deprecated": true, "val": "30" }
  },
  "files": {
    "server/conf/tomee.xml": "<tomee>\n  <port>8080</port>\n</tomee>\n",
    "settings.conf": "log.level=info\n"
  }
}"#;

    fn section(name: &str) -> Map<String, JsonValue> {
        let mut doc: JsonValue = serde_json::from_str(PULL_RESPONSE).unwrap();
        match doc[name].take() {
            JsonValue::Object(map) => map,
            other => panic!("fixture section {name} is not an object: {other}"),
        }
    }

    pub fn sample_properties() -> Properties {
        Properties::decode(&section("properties")).unwrap()
    }

    pub fn sample_files() -> Files {
        Files::decode(&section("files")).unwrap()
    }

    #[test]
    fn fixture_decodes() {
        assert_eq!(sample_properties().len(), 6);
        assert_eq!(sample_files().len(), 2);
    }

    // -- Recording transport ----------------------------------------------------

    /// Transport that records every request and answers from a canned reply.
    /// Clones share the same log and reply.
    #[derive(Clone)]
    pub struct MockTransport {
        reply: Arc<Mutex<Result<Response, String>>>,
        requests: Arc<Mutex<Vec<Request>>>,
    }

    impl MockTransport {
        pub fn with_response(response: Response) -> Self {
            Self {
                reply: Arc::new(Mutex::new(Ok(response))),
                requests: Arc::default(),
            }
        }

        /// `200 OK` with the given body.
        pub fn ok(body: &str) -> Self {
            Self::with_response(Response {
                status: 200,
                body: body.to_string(),
                etag: None,
            })
        }

        pub fn failing(message: &str) -> Self {
            Self {
                reply: Arc::new(Mutex::new(Err(message.to_string()))),
                requests: Arc::default(),
            }
        }

        pub fn respond_with(&self, response: Response) {
            *self.reply.lock().unwrap() = Ok(response);
        }

        pub fn requests(&self) -> Vec<Request> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl Transport for MockTransport {
        fn send(&self, request: &Request) -> Result<Response, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            self.reply.lock().unwrap().clone().map_err(TransportError)
        }
    }
}
