//! Shared fixtures for command tests.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use chrono::{DateTime, Local, TimeZone, Utc};
use mockable::Clock;
use serde_json::Value;

use crate::command::domain::{CommandRequest, ValidatedInput};
use crate::command::ports::{ServiceMethod, service_fn};
use crate::outcome::Outcome;

/// Clock frozen at a known instant.
pub struct FixedClock(pub DateTime<Utc>);

impl FixedClock {
    pub fn new() -> Self {
        Self(
            Utc.with_ymd_and_hms(2024, 9, 1, 8, 30, 0)
                .single()
                .expect("valid timestamp"),
        )
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Counts invocations of a validator or service.
#[derive(Clone, Default)]
pub struct CallCounter(Arc<AtomicUsize>);

impl CallCounter {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Service echoing the validated input channels.
pub fn echo_service(counter: CallCounter) -> impl ServiceMethod {
    service_fn(move |input: ValidatedInput| {
        let calls = counter.clone();
        async move {
            calls.hit();
            let (body, params, query) = input.into_parts();
            Outcome::Ok(serde_json::json!({"body": body, "params": params, "query": query}))
        }
    })
}

/// Validator that records its invocations and accepts everything.
pub fn counting_validator(
    counter: CallCounter,
) -> impl Fn(&CommandRequest) -> Outcome<ValidatedInput> + Send + Sync {
    move |request: &CommandRequest| {
        counter.hit();
        Ok(ValidatedInput::from_request(request))
    }
}

/// Extracts a string field of a response payload.
pub fn data_field<'a>(data: Option<&'a Value>, pointer: &str) -> Option<&'a Value> {
    data.and_then(|payload| payload.pointer(pointer))
}
