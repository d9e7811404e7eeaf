//! User status server demo.
//!
//! Answers every UserRequest (BE) with a UserResponse (BF) reporting the user
//! as active. Stops on Enter.

use fixline::prelude::*;
use std::sync::Arc;
use tracing::info;

mod common;
use common::{DemoConfig, init_logging};

struct UserDirectory;

#[async_trait]
impl AdminHandler for UserDirectory {
    async fn on_event(
        &self,
        ctx: &HandlerContext,
        event: &SessionEvent,
    ) -> std::result::Result<(), HandlerError> {
        info!(connection = ctx.connection_id(), %event, "session event");
        Ok(())
    }
}

#[async_trait]
impl ApplicationHandler for UserDirectory {
    fn accepts(&self, message: &Message) -> bool {
        *message.msg_type() == MsgType::UserRequest
    }

    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &Message,
        _out: &mut Vec<Message>,
    ) -> std::result::Result<(), HandlerError> {
        let request_id = message
            .get(tags::USER_REQUEST_ID)
            .ok_or("UserRequest without UserRequestID")?;
        let username = message.get(tags::USERNAME).unwrap_or_default();
        info!(request_id, username, "user status requested");

        ctx.write(
            Message::new(MsgType::UserResponse)
                .with(tags::USER_REQUEST_ID, request_id)
                .with(tags::USERNAME, username)
                .with(tags::USER_STATUS, 1)
                .with(tags::USER_STATUS_TEXT, "Active"),
        )?;
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = DemoConfig::from_env("SERVER", "CLIENT");

    let directory = Arc::new(UserDirectory);
    let handlers: Vec<Arc<dyn ApplicationHandler>> = vec![directory.clone()];
    let mut server = FixServer::new(cfg.port, directory, handlers)
        .with_config(ConnectorConfig::from_env()?)
        .with_settings_provider(StaticSessionSettingsProvider::new(
            SessionSettings::new()
                .with("SenderCompID", &cfg.sender_comp_id)
                .with("TargetCompID", &cfg.target_comp_id),
        ));

    let addr = server.start()?;
    info!(%addr, "user status server listening, press Enter to stop");
    std::io::stdin().read_line(&mut String::new())?;

    server.stop()?;
    Ok(())
}
