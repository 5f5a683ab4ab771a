use std::time::Instant;

use async_trait::async_trait;

use crate::{
    dispatch::{Ctx, Handler, Outcome},
    event::Event,
    Result,
};

/// `/ping`: reply, then edit in the measured round-trip time. Exempt from
/// the ban gate by registration.
pub struct Ping;

#[async_trait]
impl Handler for Ping {
    async fn handle(&self, cx: &Ctx, ev: &Event) -> Result<Outcome> {
        let started = Instant::now();
        let sent = cx.gateway.reply(ev.chat_id(), "<b>Pong!</b>").await?;
        let ms = started.elapsed().as_secs_f64() * 1000.0;

        cx.gateway
            .edit(sent, &format!("<b>Pong!</b> <code>{ms:.1}</code>ms"))
            .await?;

        Ok(Outcome::Continue)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::ChatKind;
    use crate::store::MemoryStore;
    use crate::testutil::{msg_event, test_ctx, RecordingGateway};

    #[tokio::test]
    async fn replies_then_edits_with_latency() {
        let gw = Arc::new(RecordingGateway::new());
        let cx = test_ctx(gw.clone(), Arc::new(MemoryStore::new()), 1);

        Ping.handle(&cx, &msg_event(5, ChatKind::Private, Some(2), "/ping"))
            .await
            .unwrap();

        assert_eq!(gw.reply_texts(), vec!["<b>Pong!</b>".to_string()]);
        let edits = gw.edits.lock().unwrap();
        assert_eq!(edits.len(), 1);
        assert!(edits[0].1.contains("ms"));
    }
}
