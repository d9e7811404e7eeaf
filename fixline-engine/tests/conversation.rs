/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 19/10/26
******************************************************************************/

//! End-to-end tests: a `FixClient` talking to a `FixServer` over loopback.

use fixline_core::error::{DispatchError, FixError, IllegalStateError};
use fixline_core::message::{Message, MsgType};
use fixline_core::tags;
use fixline_engine::{
    AdminHandler, ApplicationHandler, ConnectorConfig, FixClient, FixServer, HandlerContext,
    HandlerError, HandlerErrorPolicy, NoOpAdminHandler, async_trait,
};
use fixline_session::{LogoutOrigin, SessionEvent, SessionSettings};
use parking_lot::Mutex;
use std::io::Write;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(10);

type Log = Arc<Mutex<Vec<String>>>;

fn config() -> ConnectorConfig {
    ConnectorConfig::new()
        .with_worker_threads(2)
        .with_shutdown_timeout(Duration::from_secs(2))
        .with_tick_interval(Duration::from_millis(50))
}

fn client_settings() -> SessionSettings {
    SessionSettings::new()
        .with("SenderCompID", "CLIENT")
        .with("TargetCompID", "SERVER")
}

fn user_request(id: &str) -> Message {
    Message::new(MsgType::UserRequest)
        .with(tags::USER_REQUEST_ID, id)
        .with(tags::USER_REQUEST_TYPE, 4)
        .with(tags::USERNAME, "user")
}

fn wait_until(condition: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    condition()
}

/// Answers every UserRequest with a UserResponse reporting the user active.
struct UserStatusResponder {
    log: Log,
    seen_ids: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl ApplicationHandler for UserStatusResponder {
    fn accepts(&self, message: &Message) -> bool {
        *message.msg_type() == MsgType::UserRequest
    }

    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &Message,
        _out: &mut Vec<Message>,
    ) -> Result<(), HandlerError> {
        self.log.lock().push(message.msg_type().to_string());
        let id = message.get(tags::USER_REQUEST_ID).unwrap_or_default();
        self.seen_ids.lock().push(id.to_string());
        let response = Message::new(MsgType::UserResponse)
            .with(tags::USER_REQUEST_ID, id)
            .with(tags::USERNAME, message.get(tags::USERNAME).unwrap_or_default())
            .with(tags::USER_STATUS, 1)
            .with(tags::USER_STATUS_TEXT, "Active");
        ctx.write(response)?;
        Ok(())
    }
}

fn start_server(log: &Log) -> (FixServer, SocketAddr, Arc<Mutex<Vec<String>>>) {
    let seen_ids = Arc::new(Mutex::new(Vec::new()));
    let responder = UserStatusResponder {
        log: Arc::clone(log),
        seen_ids: Arc::clone(&seen_ids),
    };
    let handlers: Vec<Arc<dyn ApplicationHandler>> = vec![Arc::new(responder)];
    let mut server =
        FixServer::new(0, Arc::new(NoOpAdminHandler), handlers).with_config(config());
    let addr = server.start().unwrap();
    (server, addr, seen_ids)
}

/// Client side: sends one UserRequest per id on logon and closes once the
/// response to the last one arrives.
struct UserStatusClient {
    request_ids: Vec<String>,
    log: Log,
    events: Mutex<Vec<SessionEvent>>,
    messages: Mutex<Vec<Message>>,
}

impl UserStatusClient {
    fn new(requests: usize, log: &Log) -> Self {
        Self::with_request_ids((1..=requests).map(|n| n.to_string()).collect(), log)
    }

    fn with_request_ids(request_ids: Vec<String>, log: &Log) -> Self {
        Self {
            request_ids,
            log: Arc::clone(log),
            events: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl AdminHandler for UserStatusClient {
    async fn on_event(
        &self,
        ctx: &HandlerContext,
        event: &SessionEvent,
    ) -> Result<(), HandlerError> {
        self.events.lock().push(event.clone());
        if let SessionEvent::Logon(_) = event {
            for id in &self.request_ids {
                ctx.write(user_request(id))?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationHandler for UserStatusClient {
    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &Message,
        _out: &mut Vec<Message>,
    ) -> Result<(), HandlerError> {
        self.log.lock().push(message.msg_type().to_string());
        self.messages.lock().push(message.clone());
        if message.get(tags::USER_REQUEST_ID) == self.request_ids.last().map(String::as_str) {
            ctx.close();
        }
        Ok(())
    }
}

/// Shares one recorder between the client and the test body.
struct Shared(Arc<UserStatusClient>);

#[async_trait]
impl AdminHandler for Shared {
    async fn on_event(
        &self,
        ctx: &HandlerContext,
        event: &SessionEvent,
    ) -> Result<(), HandlerError> {
        self.0.on_event(ctx, event).await
    }
}

#[async_trait]
impl ApplicationHandler for Shared {
    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &Message,
        out: &mut Vec<Message>,
    ) -> Result<(), HandlerError> {
        self.0.on_message(ctx, message, out).await
    }
}

#[test]
fn test_user_status_conversation() {
    let log = Log::default();
    let (mut server, addr, _) = start_server(&log);
    let recorder = Arc::new(UserStatusClient::with_request_ids(
        vec!["UserRequestID".to_string()],
        &log,
    ));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_application(Shared(Arc::clone(&recorder)));

    let closed = client.connect_port(addr.port()).unwrap();
    assert!(closed.wait_timeout(WAIT), "client did not close");

    assert_eq!(*log.lock(), ["BE", "BF"]);
    let messages = recorder.messages.lock();
    assert_eq!(messages.len(), 1);
    let response = &messages[0];
    assert_eq!(*response.msg_type(), MsgType::UserResponse);
    assert_eq!(response.get(tags::USER_REQUEST_ID), Some("UserRequestID"));
    assert_eq!(response.get(tags::USERNAME), Some("user"));
    assert_eq!(response.get(tags::USER_STATUS), Some("1"));
    assert_eq!(response.get(tags::USER_STATUS_TEXT), Some("Active"));
    assert_eq!(response.get(tags::SENDER_COMP_ID), Some("SERVER"));
    assert_eq!(response.get(tags::TARGET_COMP_ID), Some("CLIENT"));

    client.disconnect().unwrap();
    server.stop().unwrap();
}

#[test]
fn test_events_reach_only_admin_handler() {
    let log = Log::default();
    let (mut server, addr, _) = start_server(&log);
    let recorder = Arc::new(UserStatusClient::new(1, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_application(Shared(Arc::clone(&recorder)));

    let closed = client.connect_port(addr.port()).unwrap();
    assert!(closed.wait_timeout(WAIT));

    let events = recorder.events.lock();
    assert_eq!(events.len(), 2, "events: {events:?}");
    assert!(matches!(&events[0], SessionEvent::Logon(logon) if logon.target_comp_id.as_str() == "SERVER"));
    assert!(matches!(&events[1], SessionEvent::Logout(logout) if logout.origin == LogoutOrigin::Local));
    assert!(
        recorder
            .messages
            .lock()
            .iter()
            .all(|m| !m.is_admin())
    );

    client.disconnect().unwrap();
    server.stop().unwrap();
}

#[test]
fn test_emitted_messages_arrive_in_order() {
    let log = Log::default();
    let (mut server, addr, seen_ids) = start_server(&log);
    let recorder = Arc::new(UserStatusClient::new(20, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_application(Shared(Arc::clone(&recorder)));

    let closed = client.connect_port(addr.port()).unwrap();
    assert!(closed.wait_timeout(WAIT));

    let expected: Vec<String> = (1..=20).map(|n| n.to_string()).collect();
    assert_eq!(*seen_ids.lock(), expected);
    let answered: Vec<String> = recorder
        .messages
        .lock()
        .iter()
        .filter_map(|m| m.get(tags::USER_REQUEST_ID).map(str::to_string))
        .collect();
    assert_eq!(answered, expected);

    client.disconnect().unwrap();
    server.stop().unwrap();
}

#[test]
fn test_connect_disconnect_connect_again() {
    let log = Log::default();
    let (mut server, addr, seen_ids) = start_server(&log);
    let recorder = Arc::new(UserStatusClient::new(0, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_admin_handler(Shared(Arc::clone(&recorder)));

    for round in 1..=2 {
        let closed = client.connect_port(addr.port()).unwrap();
        assert!(client.is_connected());
        assert_eq!(client.remote_address(), Some(SocketAddr::from(([127, 0, 0, 1], addr.port()))));
        assert!(matches!(
            client.connect_port(addr.port()),
            Err(FixError::IllegalState(IllegalStateError::AlreadyConnected))
        ));
        assert!(wait_until(|| {
            recorder
                .events
                .lock()
                .iter()
                .filter(|e| matches!(e, SessionEvent::Logon(_)))
                .count()
                == round
        }));

        client.send(user_request(&round.to_string())).unwrap();
        let sent = round;
        assert!(wait_until(|| seen_ids.lock().len() == sent));

        client.disconnect().unwrap();
        assert!(closed.is_closed());
        assert!(!client.is_connected());
        assert!(matches!(
            client.disconnect(),
            Err(FixError::IllegalState(IllegalStateError::NotConnected))
        ));
    }

    assert_eq!(*seen_ids.lock(), ["1", "2"]);
    server.stop().unwrap();
}

#[test]
fn test_server_side_close_keeps_client_active_until_disconnect() {
    let log = Log::default();
    let (mut server, addr, _) = start_server(&log);
    let recorder = Arc::new(UserStatusClient::new(0, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_admin_handler(Shared(Arc::clone(&recorder)));

    let closed = client.connect_port(addr.port()).unwrap();
    assert!(wait_until(|| !recorder.events.lock().is_empty()));

    server.stop().unwrap();
    assert!(closed.wait_timeout(WAIT));
    assert!(matches!(
        recorder.events.lock().last(),
        Some(SessionEvent::Logout(logout)) if logout.origin == LogoutOrigin::Remote
    ));

    assert!(matches!(
        client.send(user_request("late")),
        Err(FixError::Connection(_))
    ));
    client.disconnect().unwrap();
}

#[test]
fn test_settings_from_property_file() {
    let log = Log::default();
    let (mut server, addr, _) = start_server(&log);

    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "# client session\nSenderCompID=CLIENT\nTargetCompID: SERVER\nHeartBtInt=5\nSocketConnectHost=127.0.0.1\nSocketConnectPort={}",
        addr.port()
    )
    .unwrap();

    let recorder = Arc::new(UserStatusClient::new(1, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_application(Shared(Arc::clone(&recorder)));
    client.set_settings_resource(file.path());

    let closed = client.connect_configured().unwrap();
    assert!(closed.wait_timeout(WAIT));
    assert!(matches!(
        recorder.events.lock().first(),
        Some(SessionEvent::Logon(logon)) if logon.heartbeat_interval == Duration::from_secs(5)
    ));
    assert_eq!(*log.lock(), ["BE", "BF"]);

    client.disconnect().unwrap();
    server.stop().unwrap();
}

#[test]
fn test_comp_id_mismatch_is_refused() {
    let log = Log::default();
    let mut server = FixServer::new(0, Arc::new(NoOpAdminHandler), Vec::new())
        .with_config(config())
        .with_settings_provider(fixline_session::StaticSessionSettingsProvider::new(
            SessionSettings::new()
                .with("SenderCompID", "SERVER")
                .with("TargetCompID", "SOMEONE"),
        ));
    let addr = server.start().unwrap();

    let recorder = Arc::new(UserStatusClient::new(1, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_application(Shared(Arc::clone(&recorder)));

    let closed = client.connect_port(addr.port()).unwrap();
    assert!(closed.wait_timeout(WAIT));
    assert!(
        !recorder
            .events
            .lock()
            .iter()
            .any(|e| matches!(e, SessionEvent::Logon(_)))
    );
    assert!(log.lock().is_empty());

    client.disconnect().unwrap();
    server.stop().unwrap();
}

/// Fails every UserRequest.
struct FailingDirectory;

#[async_trait]
impl ApplicationHandler for FailingDirectory {
    fn name(&self) -> &str {
        "failing-directory"
    }

    async fn on_message(
        &self,
        _ctx: &HandlerContext,
        _message: &Message,
        _out: &mut Vec<Message>,
    ) -> Result<(), HandlerError> {
        Err(HandlerError::new("directory unavailable"))
    }
}

/// Records dispatch failures reported on the server side.
#[derive(Default)]
struct FailureLog(Mutex<Vec<DispatchError>>);

#[async_trait]
impl AdminHandler for FailureLog {
    async fn on_event(
        &self,
        _ctx: &HandlerContext,
        _event: &SessionEvent,
    ) -> Result<(), HandlerError> {
        Ok(())
    }

    async fn on_dispatch_error(&self, _ctx: &HandlerContext, error: &DispatchError) {
        self.0.lock().push(error.clone());
    }
}

#[test]
fn test_handler_failure_with_disconnect_policy_closes_connection() {
    let failures = Arc::new(FailureLog::default());
    let handlers: Vec<Arc<dyn ApplicationHandler>> = vec![Arc::new(FailingDirectory)];
    let mut server = FixServer::new(0, Arc::clone(&failures) as Arc<dyn AdminHandler>, handlers)
        .with_config(config().with_handler_error_policy(HandlerErrorPolicy::Disconnect));
    let addr = server.start().unwrap();

    let log = Log::default();
    let recorder = Arc::new(UserStatusClient::new(1, &log));
    let mut client = FixClient::new()
        .with_config(config())
        .with_settings(client_settings())
        .with_application(Shared(Arc::clone(&recorder)));

    let closed = client.connect_port(addr.port()).unwrap();
    assert!(closed.wait_timeout(WAIT), "server kept the connection open");
    assert!(log.lock().is_empty());
    assert!(matches!(
        recorder.events.lock().last(),
        Some(SessionEvent::Logout(logout)) if logout.origin == LogoutOrigin::Remote
    ));

    let reported = failures.0.lock();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].handler, "failing-directory");
    assert_eq!(reported[0].reason, "directory unavailable");
    drop(reported);

    client.disconnect().unwrap();
    server.stop().unwrap();
}
