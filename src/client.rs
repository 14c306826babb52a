use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use serde_json::Map;

use crate::error::ConfigHubError;
use crate::files::Files;
use crate::properties::Properties;
use crate::push::{PushQueue, PushResponse};
use crate::settings::Settings;
use crate::snapshot::Snapshot;
use crate::transport::{HttpTransport, Method, Request, Transport};
use crate::types::Auth;

/// Version reported to the service on push.
pub const CLIENT_VERSION: &str = "v1.3.0";

const DEFAULT_SERVER: &str = "api.confighub.com";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Characters escaped in account and repository path segments.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// A session with one ConfigHub repository.
///
/// Holds the connection parameters, the most recently pulled properties and
/// files, and the queue of pending pushes. Pull, load and flush take
/// `&mut self`; wrap the session in a `Mutex` to share it between threads.
pub struct ConfigHub {
    auth: Auth,
    context: Option<String>,
    application_name: Option<String>,
    tag: Option<String>,
    date: Option<String>,
    security_groups: BTreeMap<String, String>,
    include_comments: bool,
    include_value_context: bool,
    transport: Box<dyn Transport>,
    account: Option<String>,
    repository: Option<String>,
    properties: Properties,
    files: Files,
    raw_properties: Map<String, serde_json::Value>,
    raw_files: Map<String, serde_json::Value>,
    push_queue: PushQueue,
}

impl ConfigHub {
    pub fn builder() -> ConfigHubBuilder {
        ConfigHubBuilder::new()
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn files(&self) -> &Files {
        &self.files
    }

    pub fn push_queue(&mut self) -> &mut PushQueue {
        &mut self.push_queue
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Repository owner, as configured or as reported by the last decode.
    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }

    pub fn repository(&self) -> Option<&str> {
        self.repository.as_deref()
    }

    /// Pull properties and files for the session's context.
    pub fn pull(&mut self) -> Result<(), ConfigHubError> {
        let context = self
            .context
            .clone()
            .filter(|c| !c.trim().is_empty())
            .ok_or(ConfigHubError::BlankParameter("Context"))?;

        let mut headers = self.auth_headers();
        headers.push(("Context", context));
        if let Some(date) = &self.date {
            headers.push(("Repository-Date", date.clone()));
        }
        if let Some(tag) = &self.tag {
            headers.push(("Tag", tag.clone()));
        }
        if let Some(app) = &self.application_name {
            headers.push(("Application-Name", app.clone()));
        }
        if !self.security_groups.is_empty() {
            let auth = serde_json::to_string(&self.security_groups)
                .map_err(ConfigHubError::InvalidPayload)?;
            headers.push(("Security-Profile-Auth", auth));
        }
        headers.push(("Include-Comments", self.include_comments.to_string()));
        headers.push((
            "Include-Value-Context",
            self.include_value_context.to_string(),
        ));

        let request = Request {
            method: Method::Get,
            path: self.rest_path("/rest/pull"),
            headers,
            body: None,
        };

        let response = self
            .transport
            .send(&request)
            .map_err(|e| ConfigHubError::Transport(e.to_string()))?;

        match response.status {
            200 => self.apply(Snapshot::parse(&response.body)?),
            status => {
                let reason = rejection_reason(status);
                tracing::error!(status, reason, "pull rejected");
                Err(ConfigHubError::PullRejected { status, reason })
            }
        }
    }

    /// Send all queued changes.
    ///
    /// The queue is emptied whether or not the push succeeds; failures to
    /// reach the service are reported as status `0` instead of an error.
    pub fn flush(&mut self) -> PushResponse {
        let encoded = self.push_queue.encode();
        self.push_queue.clear();

        let body = match encoded {
            Ok(json) => json.to_string(),
            Err(e) => return PushResponse::failed(e.to_string()),
        };

        let mut headers = self.auth_headers();
        if let Some(app) = &self.application_name {
            headers.push(("Application-Name", app.clone()));
        }
        headers.push(("Content-Type", "application/json".into()));
        headers.push(("Client-Version", CLIENT_VERSION.into()));

        let request = Request {
            method: Method::Post,
            path: self.rest_path("/rest/push"),
            headers,
            body: Some(body),
        };

        match self.transport.send(&request) {
            Ok(response) => {
                tracing::debug!(status = response.status, "push completed");
                PushResponse {
                    status: response.status,
                    message: response.etag,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "push failed");
                PushResponse::failed(e.to_string())
            }
        }
    }

    /// Replace the current properties and files with a saved snapshot.
    /// A session without a context takes the snapshot's.
    pub fn from_file(&mut self, path: &Path) -> Result<(), ConfigHubError> {
        self.apply(Snapshot::read(path)?)
    }

    /// Save the current properties and files as a pretty-printed snapshot.
    pub fn to_file(&self, path: &Path) -> Result<(), ConfigHubError> {
        let snapshot = Snapshot {
            error: None,
            context: self.context.clone(),
            account: self.account.clone(),
            repo: self.repository.clone(),
            properties: Some(self.raw_properties.clone()),
            files: Some(self.raw_files.clone()),
        };
        snapshot.write(path)?;
        tracing::info!(path = %path.display(), "wrote configuration to file");
        Ok(())
    }

    /// Validate a pulled or loaded document and swap in its tables.
    ///
    /// Nothing on the session changes unless every check and decode passes.
    fn apply(&mut self, snapshot: Snapshot) -> Result<(), ConfigHubError> {
        if let (Some(requested), Some(received)) = (&self.context, &snapshot.context)
            && requested != received
        {
            tracing::error!(%requested, %received, "context mismatch");
            return Err(ConfigHubError::ContextMismatch {
                requested: requested.clone(),
                received: received.clone(),
            });
        }

        if let Some(message) = snapshot.error {
            tracing::error!(%message, "ConfigHub returned an error");
            return Err(ConfigHubError::Remote(message));
        }

        let raw_properties = snapshot.properties.unwrap_or_default();
        let raw_files = snapshot.files.unwrap_or_default();
        let properties = Properties::decode(&raw_properties)?;
        let files = Files::decode(&raw_files)?;

        if self.context.is_none() {
            self.context = snapshot.context;
        }
        if snapshot.account.is_some() {
            self.account = snapshot.account;
        }
        if snapshot.repo.is_some() {
            self.repository = snapshot.repo;
        }
        self.properties = properties;
        self.files = files;
        self.raw_properties = raw_properties;
        self.raw_files = raw_files;
        Ok(())
    }

    fn auth_headers(&self) -> Vec<(&'static str, String)> {
        match &self.auth {
            Auth::Token(token) => vec![("Client-Token", token.clone())],
            Auth::Repository { .. } => Vec::new(),
        }
    }

    /// Token sessions use the bare endpoint; account sessions append
    /// `/<account>/<repository>`.
    fn rest_path(&self, endpoint: &str) -> String {
        match &self.auth {
            Auth::Token(_) => endpoint.to_string(),
            Auth::Repository {
                account,
                repository,
            } => format!(
                "{endpoint}/{}/{}",
                utf8_percent_encode(account, PATH_SEGMENT),
                utf8_percent_encode(repository, PATH_SEGMENT)
            ),
        }
    }
}

fn rejection_reason(status: u16) -> &'static str {
    match status {
        401 => "token no longer authorized",
        404 => "requested repository not found",
        406 => "invalid token",
        500 => "ConfigHub internal server error",
        _ => "unexpected response status",
    }
}

/// Builder for a [`ConfigHub`] session.
///
/// Exactly one authentication mode must be chosen: [`token()`](Self::token),
/// or both [`account()`](Self::account) and [`repository()`](Self::repository).
/// Everything is validated in [`build()`](Self::build).
///
/// Credentials from [`settings()`](Self::settings) are used only when none of
/// the three auth setters was called.
pub struct ConfigHubBuilder {
    token: Option<String>,
    account: Option<String>,
    repository: Option<String>,
    settings_auth: [Option<String>; 3],
    context: Option<String>,
    server: String,
    secure: bool,
    timeout: Duration,
    application_name: Option<String>,
    tag: Option<String>,
    date: Option<String>,
    security_groups: BTreeMap<String, String>,
    include_comments: bool,
    include_value_context: bool,
    transport: Option<Box<dyn Transport>>,
}

impl ConfigHubBuilder {
    fn new() -> Self {
        Self {
            token: None,
            account: None,
            repository: None,
            settings_auth: [None, None, None],
            context: None,
            server: DEFAULT_SERVER.to_string(),
            secure: true,
            timeout: DEFAULT_TIMEOUT,
            application_name: None,
            tag: None,
            date: None,
            security_groups: BTreeMap::new(),
            include_comments: false,
            include_value_context: false,
            transport: None,
        }
    }

    /// Start from loaded [`Settings`]. Later builder calls override them.
    pub fn settings(mut self, settings: &Settings) -> Self {
        self.settings_auth = [
            settings.token.clone(),
            settings.account.clone(),
            settings.repository.clone(),
        ];
        self.context = settings.context.clone().or(self.context);
        self.application_name = settings.application_name.clone().or(self.application_name);
        self.tag = settings.tag.clone().or(self.tag);
        self.date = settings.date.clone().or(self.date);
        self.server = settings.server.clone();
        self.secure = settings.secure;
        self.timeout = Duration::from_secs(settings.timeout_secs);
        self.include_comments = settings.include_comments;
        self.include_value_context = settings.include_value_context;
        if let Some(groups) = &settings.security_groups {
            self.security_groups
                .extend(groups.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Repository owner, for token-less access. Requires [`repository()`](Self::repository).
    pub fn account(mut self, account: &str) -> Self {
        self.account = Some(account.to_string());
        self
    }

    pub fn repository(mut self, repository: &str) -> Self {
        self.repository = Some(repository.to_string());
        self
    }

    /// Semicolon-delimited context, e.g. `"Production;MyApp"`. Required for [`ConfigHub::pull`].
    pub fn context(mut self, context: &str) -> Self {
        self.context = Some(context.to_string());
        self
    }

    /// Server host with optional port and path prefix (default `api.confighub.com`).
    pub fn server(mut self, server: &str) -> Self {
        self.server = server.to_string();
        self
    }

    /// `https` when true (default), plain `http` otherwise.
    pub fn secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Request timeout of the built-in HTTP transport.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn application_name(mut self, name: &str) -> Self {
        self.application_name = Some(name.to_string());
        self
    }

    /// Pull configuration as of a tag.
    pub fn tag(mut self, tag: &str) -> Self {
        self.tag = Some(tag.to_string());
        self
    }

    /// Pull configuration as of a date, `YYYY-MM-DDTHH:MM:SSZ`.
    pub fn date(mut self, date: &str) -> Self {
        self.date = Some(date.to_string());
        self
    }

    /// Ask the service to decrypt values of a security group before
    /// returning them. Without this, encrypted values come back as ciphertext.
    pub fn decrypt_security_group(mut self, group: &str, password: &str) -> Self {
        self.security_groups
            .insert(group.to_string(), password.to_string());
        self
    }

    pub fn include_comments(mut self, include: bool) -> Self {
        self.include_comments = include;
        self
    }

    pub fn include_value_context(mut self, include: bool) -> Self {
        self.include_value_context = include;
        self
    }

    /// Use a custom transport instead of the built-in HTTP one.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    fn effective_auth(&self) -> Result<Auth, ConfigHubError> {
        let explicit = self.token.is_some() || self.account.is_some() || self.repository.is_some();
        let [token, account, repository] = if explicit {
            [&self.token, &self.account, &self.repository]
        } else {
            let [t, a, r] = &self.settings_auth;
            [t, a, r]
        };
        let token = non_blank(token, "Token")?;
        let account = non_blank(account, "Account")?;
        let repository = non_blank(repository, "Repository name")?;

        match (token, account, repository) {
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => Err(ConfigHubError::ConflictingAuth),
            (Some(token), None, None) => Ok(Auth::Token(token)),
            (None, Some(account), Some(repository)) => Ok(Auth::Repository {
                account,
                repository,
            }),
            (None, _, _) => Err(ConfigHubError::AuthRequired),
        }
    }

    pub fn build(self) -> Result<ConfigHub, ConfigHubError> {
        let auth = self.effective_auth()?;
        let context = non_blank(&self.context, "Context")?;

        let (account, repository) = match &auth {
            Auth::Repository {
                account,
                repository,
            } => (Some(account.clone()), Some(repository.clone())),
            Auth::Token(_) => (None, None),
        };

        let transport: Box<dyn Transport> = match self.transport {
            Some(t) => t,
            None => Box::new(HttpTransport::new(&self.server, self.secure, self.timeout)),
        };

        Ok(ConfigHub {
            auth,
            context,
            application_name: self.application_name,
            tag: self.tag,
            date: self.date,
            security_groups: self.security_groups,
            include_comments: self.include_comments,
            include_value_context: self.include_value_context,
            transport,
            account,
            repository,
            properties: Properties::default(),
            files: Files::default(),
            raw_properties: Map::new(),
            raw_files: Map::new(),
            push_queue: PushQueue::new(),
        })
    }
}

/// `None` stays `None`; a present but blank value is an error.
fn non_blank(value: &Option<String>, name: &'static str) -> Result<Option<String>, ConfigHubError> {
    match value {
        Some(v) if v.trim().is_empty() => Err(ConfigHubError::BlankParameter(name)),
        other => Ok(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::test::{MockTransport, PULL_RESPONSE};
    use crate::transport::Response;
    use std::fs;
    use tempfile::TempDir;

    fn hub(transport: &MockTransport) -> ConfigHub {
        ConfigHub::builder()
            .account("ConfigHub")
            .repository("UnitTest")
            .context("Development;UnitTest")
            .application_name("Properties UnitTest")
            .transport(transport.clone())
            .build()
            .unwrap()
    }

    #[test]
    fn build_requires_auth() {
        let result = ConfigHub::builder().context("Dev").build();
        assert!(matches!(result, Err(ConfigHubError::AuthRequired)));
    }

    #[test]
    fn build_rejects_half_repository_auth() {
        let result = ConfigHub::builder().account("ConfigHub").build();
        assert!(matches!(result, Err(ConfigHubError::AuthRequired)));
    }

    #[test]
    fn build_rejects_both_auth_modes() {
        let result = ConfigHub::builder()
            .token("abc")
            .account("ConfigHub")
            .repository("UnitTest")
            .build();
        assert!(matches!(result, Err(ConfigHubError::ConflictingAuth)));
    }

    #[test]
    fn explicit_account_replaces_settings_token() {
        let settings = Settings::from_toml_str("token = \"from-file\"").unwrap();
        let hub = ConfigHub::builder()
            .settings(&settings)
            .account("ConfigHub")
            .repository("UnitTest")
            .transport(MockTransport::failing("offline"))
            .build()
            .unwrap();
        assert_eq!(hub.auth_headers(), Vec::new());
        assert_eq!(hub.rest_path("/rest/pull"), "/rest/pull/ConfigHub/UnitTest");
    }

    #[test]
    fn explicit_token_replaces_settings_repository() {
        let settings =
            Settings::from_toml_str("account = \"ConfigHub\"\nrepository = \"UnitTest\"").unwrap();
        let hub = ConfigHub::builder()
            .settings(&settings)
            .token("tok")
            .transport(MockTransport::failing("offline"))
            .build()
            .unwrap();
        assert_eq!(hub.account(), None);
        assert_eq!(hub.rest_path("/rest/pull"), "/rest/pull");
    }

    #[test]
    fn conflicting_settings_auth_is_rejected() {
        let settings = Settings::from_toml_str(
            "token = \"t\"\naccount = \"ConfigHub\"\nrepository = \"UnitTest\"",
        )
        .unwrap();
        let result = ConfigHub::builder().settings(&settings).build();
        assert!(matches!(result, Err(ConfigHubError::ConflictingAuth)));
    }

    #[test]
    fn build_rejects_blank_parameters() {
        let result = ConfigHub::builder().token("  ").build();
        assert!(matches!(result, Err(ConfigHubError::BlankParameter("Token"))));

        let result = ConfigHub::builder().token("abc").context("").build();
        assert!(matches!(result, Err(ConfigHubError::BlankParameter("Context"))));
    }

    #[test]
    fn pull_without_context_fails() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = ConfigHub::builder()
            .token("abc")
            .transport(transport.clone())
            .build()
            .unwrap();
        assert!(matches!(hub.pull(), Err(ConfigHubError::BlankParameter("Context"))));
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn pull_populates_tables() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = hub(&transport);
        hub.pull().unwrap();

        assert_eq!(hub.properties().get_integer("db.port").unwrap(), Some(3306));
        assert_eq!(hub.properties().get_long("db.port").unwrap(), Some(3306));
        assert_eq!(hub.properties().get("db.port").as_deref(), Some("3306"));
        assert!(!hub.properties().is_deprecated("db.port"));
        assert!(hub.files().has_file("server/conf/tomee.xml"));
        assert_eq!(hub.account(), Some("ConfigHub"));
        assert_eq!(hub.repository(), Some("UnitTest"));
    }

    #[test]
    fn pull_request_shape_for_repository_auth() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = hub(&transport);
        hub.pull().unwrap();

        let requests = transport.requests();
        let req = &requests[0];
        assert_eq!(req.method, Method::Get);
        assert_eq!(req.path, "/rest/pull/ConfigHub/UnitTest");
        assert_eq!(req.header("Context"), Some("Development;UnitTest"));
        assert_eq!(req.header("Application-Name"), Some("Properties UnitTest"));
        assert_eq!(req.header("Include-Comments"), Some("false"));
        assert_eq!(req.header("Include-Value-Context"), Some("false"));
        assert_eq!(req.header("Client-Token"), None);
        assert_eq!(req.header("Tag"), None);
        assert_eq!(req.header("Repository-Date"), None);
        assert_eq!(req.header("Security-Profile-Auth"), None);
    }

    #[test]
    fn pull_request_shape_for_token_auth() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = ConfigHub::builder()
            .token("tok")
            .context("Development;UnitTest")
            .tag("release-1")
            .date("2016-01-01T00:00:00Z")
            .decrypt_security_group("secrets", "hunter2")
            .include_comments(true)
            .include_value_context(true)
            .transport(transport.clone())
            .build()
            .unwrap();
        hub.pull().unwrap();

        let requests = transport.requests();
        let req = &requests[0];
        assert_eq!(req.path, "/rest/pull");
        assert_eq!(req.header("Client-Token"), Some("tok"));
        assert_eq!(req.header("Tag"), Some("release-1"));
        assert_eq!(req.header("Repository-Date"), Some("2016-01-01T00:00:00Z"));
        assert_eq!(req.header("Security-Profile-Auth"), Some(r#"{"secrets":"hunter2"}"#));
        assert_eq!(req.header("Include-Comments"), Some("true"));
        assert_eq!(req.header("Include-Value-Context"), Some("true"));
    }

    #[test]
    fn repository_segments_are_escaped() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let hub = ConfigHub::builder()
            .account("My Org")
            .repository("a/b")
            .transport(transport)
            .build()
            .unwrap();
        assert_eq!(hub.rest_path("/rest/pull"), "/rest/pull/My%20Org/a%2Fb");
    }

    #[test]
    fn pull_context_mismatch() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = ConfigHub::builder()
            .token("tok")
            .context("Production;UnitTest")
            .transport(transport)
            .build()
            .unwrap();
        let err = hub.pull().unwrap_err();
        assert!(matches!(err, ConfigHubError::ContextMismatch { .. }));
        assert!(hub.properties().is_empty());
    }

    #[test]
    fn pull_remote_error() {
        let transport = MockTransport::ok(r#"{"error": "Invalid token"}"#);
        let mut hub = hub(&transport);
        let err = hub.pull().unwrap_err();
        assert!(matches!(err, ConfigHubError::Remote(m) if m == "Invalid token"));
    }

    #[test]
    fn pull_rejected_status() {
        let transport = MockTransport::with_response(Response {
            status: 404,
            body: String::new(),
            etag: None,
        });
        let mut hub = hub(&transport);
        let err = hub.pull().unwrap_err();
        assert!(matches!(
            err,
            ConfigHubError::PullRejected {
                status: 404,
                reason: "requested repository not found"
            }
        ));
    }

    #[test]
    fn pull_transport_failure() {
        let transport = MockTransport::failing("connection refused");
        let mut hub = hub(&transport);
        let err = hub.pull().unwrap_err();
        assert!(matches!(err, ConfigHubError::Transport(m) if m.contains("connection refused")));
    }

    #[test]
    fn failed_pull_keeps_previous_tables() {
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = hub(&transport);
        hub.pull().unwrap();

        transport.respond_with(Response {
            status: 200,
            body: r#"{"context": "Development;UnitTest",
                      "properties": {"db.port": {"type": "Integer", "val": "many"}}}"#
                .into(),
            etag: None,
        });
        let err = hub.pull().unwrap_err();
        assert!(matches!(err, ConfigHubError::Decode { .. }));
        assert_eq!(hub.properties().get_integer("db.port").unwrap(), Some(3306));
        assert!(hub.files().has_file("server/conf/tomee.xml"));
    }

    #[test]
    fn invalid_body_is_invalid_payload() {
        let transport = MockTransport::ok("<html>oops</html>");
        let mut hub = hub(&transport);
        assert!(matches!(hub.pull(), Err(ConfigHubError::InvalidPayload(_))));
    }

    #[test]
    fn flush_sends_and_clears() {
        let transport = MockTransport::with_response(Response {
            status: 200,
            body: String::new(),
            etag: Some("ok".into()),
        });
        let mut hub = hub(&transport);
        hub.push_queue().enable_key_creation();
        hub.push_queue()
            .key("unittest.logger.level")
            .enable_push()
            .set_value("DEBUG", "*;MyApp")
            .unwrap();

        let response = hub.flush();
        assert_eq!(response.status, 200);
        assert_eq!(response.message.as_deref(), Some("ok"));
        assert!(response.is_success());
        assert!(hub.push_queue().is_empty());

        let requests = transport.requests();
        let req = &requests[0];
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/rest/push/ConfigHub/UnitTest");
        assert_eq!(req.header("Content-Type"), Some("application/json"));
        assert_eq!(req.header("Client-Version"), Some(CLIENT_VERSION));
        let body: serde_json::Value = serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
        assert_eq!(body["enableKeyCreation"], true);
        assert_eq!(body["data"][0]["key"], "unittest.logger.level");
    }

    #[test]
    fn flush_clears_even_when_transport_fails() {
        let transport = MockTransport::failing("connection reset");
        let mut hub = hub(&transport);
        hub.push_queue().key("k").set_value(&1, "Dev").unwrap();

        let response = hub.flush();
        assert_eq!(response.status, 0);
        assert!(response.message.unwrap().contains("connection reset"));
        assert!(!hub.flush().is_success());
        assert!(hub.push_queue().is_empty());
    }

    #[test]
    fn flush_reports_rejection_status() {
        let transport = MockTransport::with_response(Response {
            status: 406,
            body: String::new(),
            etag: Some("Key creation is not enabled".into()),
        });
        let mut hub = hub(&transport);
        hub.push_queue().key("new.key").set_value("x", "Dev").unwrap();

        let response = hub.flush();
        assert_eq!(response.status, 406);
        assert!(!response.is_success());
        assert!(hub.push_queue().is_empty());
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tmp").join("conf.json");

        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut pulled = hub(&transport);
        pulled.pull().unwrap();
        pulled.to_file(&path).unwrap();

        let mut loaded = ConfigHub::builder()
            .account("ConfigHub")
            .repository("UnitTest")
            .transport(MockTransport::failing("offline"))
            .build()
            .unwrap();
        loaded.from_file(&path).unwrap();
        assert_eq!(loaded.context(), Some("Development;UnitTest"));

        assert_eq!(loaded.properties(), pulled.properties());
        assert_eq!(loaded.files(), pulled.files());
        assert_eq!(loaded.properties().get_integer("db.port").unwrap(), Some(3306));
        assert!(loaded.files().has_file("server/conf/tomee.xml"));

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["context"], "Development;UnitTest");
        assert_eq!(saved["account"], "ConfigHub");
        assert_eq!(saved["repo"], "UnitTest");
    }

    #[test]
    fn resaving_a_loaded_snapshot_keeps_its_context() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first.json");
        let second = dir.path().join("second.json");
        fs::write(&first, PULL_RESPONSE).unwrap();

        let mut hub = ConfigHub::builder()
            .token("tok")
            .transport(MockTransport::failing("offline"))
            .build()
            .unwrap();
        hub.from_file(&first).unwrap();
        hub.to_file(&second).unwrap();

        let saved: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&second).unwrap()).unwrap();
        assert_eq!(saved["context"], "Development;UnitTest");
    }

    #[test]
    fn from_file_checks_context() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("conf.json");
        fs::write(&path, PULL_RESPONSE).unwrap();

        let mut hub = ConfigHub::builder()
            .token("tok")
            .context("Production;Other")
            .transport(MockTransport::failing("offline"))
            .build()
            .unwrap();
        assert!(matches!(
            hub.from_file(&path),
            Err(ConfigHubError::ContextMismatch { .. })
        ));
    }

    #[test]
    fn write_pulled_file_locally() {
        let dir = TempDir::new().unwrap();
        let transport = MockTransport::ok(PULL_RESPONSE);
        let mut hub = hub(&transport);
        hub.pull().unwrap();

        let dest = dir.path().join("conf").join("tomee.xml");
        hub.files().write_to_local("server/conf/tomee.xml", &dest).unwrap();
        assert!(fs::read_to_string(&dest).unwrap().contains("<port>8080</port>"));

        let err = hub
            .files()
            .write_to_local("not/in/payload.xml", &dest)
            .unwrap_err();
        assert!(matches!(err, ConfigHubError::NotPulled(_)));
    }

    #[test]
    fn settings_seed_the_builder() {
        let settings = Settings::from_toml_str(
            r#"
            token = "from-file"
            context = "Production;App"
            tag = "v2"
            [security_groups]
            secrets = "pw"
            "#,
        )
        .unwrap();
        let transport = MockTransport::ok(r#"{"context": "Staging;App"}"#);
        let mut hub = ConfigHub::builder()
            .settings(&settings)
            .context("Staging;App")
            .transport(transport.clone())
            .build()
            .unwrap();
        hub.pull().unwrap();

        let requests = transport.requests();
        let req = &requests[0];
        assert_eq!(req.header("Client-Token"), Some("from-file"));
        assert_eq!(req.header("Context"), Some("Staging;App"));
        assert_eq!(req.header("Tag"), Some("v2"));
        assert_eq!(req.header("Security-Profile-Auth"), Some(r#"{"secrets":"pw"}"#));
    }
}
