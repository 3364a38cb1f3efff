use serde::{Deserialize, Serialize};

use esledger::Event;

pub enum TestCommand {
    Single(i64),
    Multi(Vec<i64>),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TestEvent {
    Added { add: i64 },
}

impl Event for TestEvent {
    fn event_type(&self) -> &'static str {
        match self {
            Self::Added { .. } => "Added",
        }
    }
}

#[derive(Default, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestAggregateState {
    pub count: i64,
    pub digest: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("zero is not an increment")]
    ZeroIncrement,
}
