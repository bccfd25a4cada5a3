use pilltime_domain::ScheduleEntry;
use serde::{Deserialize, Serialize};

/// Messages the foreground controller posts to the background engine.
///
/// Delivery is at-most-once with no acknowledgement or retry layer: a
/// send that cannot be delivered is dropped and the next poll cycle
/// self-corrects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum EngineMessage {
    /// Replace the persisted schedule with a freshly compiled one.
    #[serde(rename = "UPDATE_SCHEDULES")]
    UpdateSchedules(Vec<ScheduleEntry>),
    /// Reply to a `RequestSchedules`; evaluated immediately and cached
    /// into the store so later headless passes work from fresh data.
    #[serde(rename = "SCHEDULES_RESPONSE")]
    SchedulesResponse(Vec<ScheduleEntry>),
    #[serde(rename = "START_CHECKER")]
    StartChecker,
    #[serde(rename = "STOP_CHECKER")]
    StopChecker,
    /// Clear today's fire record, re-arming every dose for the day.
    #[serde(rename = "RESET_FIRED")]
    ResetFired,
}

/// Messages the engine posts to an attached foreground context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ClientMessage {
    /// Ask the foreground to recompile its live schedule and reply
    /// with `SCHEDULES_RESPONSE`. Fire-and-forget.
    #[serde(rename = "REQUEST_SCHEDULES")]
    RequestSchedules,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn control_messages_serialize_as_tagged_payloads() {
        assert_eq!(
            serde_json::to_value(EngineMessage::StartChecker).unwrap(),
            json!({"type": "START_CHECKER"})
        );
        assert_eq!(
            serde_json::to_value(ClientMessage::RequestSchedules).unwrap(),
            json!({"type": "REQUEST_SCHEDULES"})
        );
    }

    #[test]
    fn schedule_payloads_round_trip() {
        let msg: EngineMessage = serde_json::from_value(json!({
            "type": "UPDATE_SCHEDULES",
            "data": [{
                "medId": "m1",
                "time": "08:00",
                "title": "お薬を飲む時間です！",
                "body": "ロキソニンを1 錠服用してください"
            }]
        }))
        .unwrap();

        match &msg {
            EngineMessage::UpdateSchedules(entries) => {
                assert_eq!(entries.len(), 1);
                assert_eq!(entries[0].fire_key(), "m1_08:00");
            }
            other => panic!("unexpected message: {:?}", other),
        }

        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "UPDATE_SCHEDULES");
        assert_eq!(json["data"][0]["medId"], "m1");
    }
}
