use super::sse::SseFrame;
use super::WatchTarget;
use crate::error::{LnbotError, Result};
use crate::model::{Invoice, Payment, ResourceStatus, Snapshot};

/// One decoded event from an invoice or payment stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A non-terminal update carrying the latest resource state.
    Status(Snapshot),
    Settled(Option<Snapshot>),
    Expired,
    Failed(Option<Snapshot>),
}

impl StreamEvent {
    /// Decodes a frame for `target`.
    ///
    /// Frames tagged `settled`, `expired` or `failed` map directly. Any
    /// other tag is classified by the status in its payload. Frames with
    /// no recognizable payload (keepalives, unknown tags) yield `None`.
    pub fn decode(target: WatchTarget, frame: &SseFrame) -> Result<Option<StreamEvent>> {
        let payload = parse_payload(target, &frame.data);
        let event = match frame.event.as_str() {
            "settled" => Some(StreamEvent::Settled(payload)),
            "expired" => Some(StreamEvent::Expired),
            "failed" => Some(StreamEvent::Failed(payload)),
            "error" if payload.is_none() => {
                return Err(LnbotError::Transport(error_message(&frame.data)));
            }
            _ => payload.map(StreamEvent::from_snapshot),
        };
        Ok(event)
    }

    /// Classifies a snapshot by its own status.
    pub fn from_snapshot(snapshot: Snapshot) -> StreamEvent {
        match snapshot.status() {
            ResourceStatus::Settled => StreamEvent::Settled(Some(snapshot)),
            ResourceStatus::Expired => StreamEvent::Expired,
            ResourceStatus::Failed => StreamEvent::Failed(Some(snapshot)),
            _ => StreamEvent::Status(snapshot),
        }
    }
}

fn parse_payload(target: WatchTarget, data: &str) -> Option<Snapshot> {
    let data = data.trim();
    if data.is_empty() {
        return None;
    }
    let value: serde_json::Value = serde_json::from_str(data).ok()?;
    if !value.is_object() {
        return None;
    }
    // Some streams wrap the resource, others send it bare.
    let inner = value
        .get("data")
        .filter(|d| d.is_object())
        .cloned()
        .unwrap_or(value);
    match target {
        WatchTarget::Invoice(_) => serde_json::from_value::<Invoice>(inner)
            .ok()
            .map(Snapshot::Invoice),
        WatchTarget::Payment(_) => serde_json::from_value::<Payment>(inner)
            .ok()
            .map(Snapshot::Payment),
    }
}

fn error_message(data: &str) -> String {
    let data = data.trim();
    if data.is_empty() {
        "stream error".to_string()
    } else {
        format!("stream error: {}", data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: &str, data: &str) -> SseFrame {
        SseFrame {
            event: event.to_string(),
            data: data.to_string(),
        }
    }

    #[test]
    fn settled_tag_carries_payload() {
        let event = StreamEvent::decode(
            WatchTarget::Invoice(4),
            &frame("settled", r#"{"number":4,"status":"settled","amount":100}"#),
        )
        .unwrap();
        match event {
            Some(StreamEvent::Settled(Some(Snapshot::Invoice(invoice)))) => {
                assert_eq!(invoice.number, 4);
                assert_eq!(invoice.amount, 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn settled_tag_without_payload() {
        let event = StreamEvent::decode(WatchTarget::Invoice(4), &frame("settled", "")).unwrap();
        assert_eq!(event, Some(StreamEvent::Settled(None)));
    }

    #[test]
    fn untagged_frame_classified_by_status() {
        let target = WatchTarget::Payment(9);
        let pending = StreamEvent::decode(
            target,
            &frame("message", r#"{"number":9,"status":"processing"}"#),
        )
        .unwrap();
        assert!(matches!(pending, Some(StreamEvent::Status(_))));

        let failed = StreamEvent::decode(
            target,
            &frame("payment.updated", r#"{"number":9,"status":"failed","failureReason":"no route"}"#),
        )
        .unwrap();
        assert!(matches!(failed, Some(StreamEvent::Failed(Some(_)))));
    }

    #[test]
    fn wrapped_payload() {
        let event = StreamEvent::decode(
            WatchTarget::Invoice(2),
            &frame("update", r#"{"data":{"number":2,"status":"expired"}}"#),
        )
        .unwrap();
        assert_eq!(event, Some(StreamEvent::Expired));
    }

    #[test]
    fn keepalive_is_skipped() {
        let event = StreamEvent::decode(WatchTarget::Invoice(1), &frame("ping", "")).unwrap();
        assert_eq!(event, None);
        let event = StreamEvent::decode(WatchTarget::Invoice(1), &frame("message", "hello")).unwrap();
        assert_eq!(event, None);
    }

    #[test]
    fn error_frame_is_transport_error() {
        let err = StreamEvent::decode(WatchTarget::Invoice(1), &frame("error", "upstream gone"))
            .unwrap_err();
        assert!(err.to_string().contains("upstream gone"));
    }
}
