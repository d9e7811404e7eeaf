//! User status client demo.
//!
//! Logs on, asks for the status of one user, prints the answer and logs out.

use fixline::prelude::*;
use tracing::{info, warn};

mod common;
use common::{DemoConfig, init_logging};

struct UserStatusQuery {
    username: String,
}

#[async_trait]
impl AdminHandler for UserStatusQuery {
    async fn on_event(
        &self,
        ctx: &HandlerContext,
        event: &SessionEvent,
    ) -> std::result::Result<(), HandlerError> {
        match event {
            SessionEvent::Logon(logon) => {
                info!(target = %logon.target_comp_id, "logged on, requesting user status");
                ctx.write(
                    Message::new(MsgType::UserRequest)
                        .with(tags::USER_REQUEST_ID, "1")
                        .with(tags::USER_REQUEST_TYPE, 4)
                        .with(tags::USERNAME, &self.username),
                )?;
            }
            SessionEvent::Reject(reject) => warn!(text = ?reject.text, "request rejected"),
            other => info!(event = %other, "session event"),
        }
        Ok(())
    }
}

#[async_trait]
impl ApplicationHandler for UserStatusQuery {
    async fn on_message(
        &self,
        ctx: &HandlerContext,
        message: &Message,
        _out: &mut Vec<Message>,
    ) -> std::result::Result<(), HandlerError> {
        if *message.msg_type() == MsgType::UserResponse {
            info!(
                username = message.get(tags::USERNAME),
                status = message.get(tags::USER_STATUS),
                text = message.get(tags::USER_STATUS_TEXT),
                "user status received"
            );
            ctx.close();
        }
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    init_logging();
    let cfg = DemoConfig::from_env("CLIENT", "SERVER");

    let mut client = FixClient::new()
        .with_config(ConnectorConfig::from_env()?)
        .with_settings(
            SessionSettings::new()
                .with("SenderCompID", &cfg.sender_comp_id)
                .with("TargetCompID", &cfg.target_comp_id),
        )
        .with_application(UserStatusQuery {
            username: cfg.username.clone(),
        });

    let closed = client.connect(&cfg.host, cfg.port)?;
    closed.wait();
    client.disconnect()?;
    Ok(())
}
