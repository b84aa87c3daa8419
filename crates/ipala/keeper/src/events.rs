//! Event types and attribute keys emitted by the keeper.

use chrono::{DateTime, Utc};
use ipala_store::Event;
use ipala_types::{AccAddress, Coin, MsgClaim, UnBonding};

use crate::claim::ClaimOutcome;

pub const EVENT_TYPE_MESSAGE: &str = "message";
pub const EVENT_TYPE_CLAIM: &str = "claim";
pub const EVENT_TYPE_COMPLETE_UNBONDING: &str = "complete_unbonding";

pub const ATTRIBUTE_KEY_MODULE: &str = "module";
pub const ATTRIBUTE_KEY_SENDER: &str = "sender";
pub const ATTRIBUTE_KEY_ACTION: &str = "action";
pub const ATTRIBUTE_KEY_OPERATOR: &str = "operator";
pub const ATTRIBUTE_KEY_MONIKER: &str = "moniker";
pub const ATTRIBUTE_KEY_OUTCOME: &str = "outcome";
pub const ATTRIBUTE_KEY_AMOUNT: &str = "amount";
pub const ATTRIBUTE_KEY_COMPLETION_TIME: &str = "completion_time";

const ACTION_CLAIM: &str = "claim";

pub(crate) fn message_event(module: &str, sender: &AccAddress) -> Event {
    Event::new(EVENT_TYPE_MESSAGE)
        .attr(ATTRIBUTE_KEY_MODULE, module)
        .attr(ATTRIBUTE_KEY_SENDER, sender)
        .attr(ATTRIBUTE_KEY_ACTION, ACTION_CLAIM)
}

pub(crate) fn claim_event(msg: &MsgClaim, outcome: &ClaimOutcome) -> Event {
    let event = Event::new(EVENT_TYPE_CLAIM)
        .attr(ATTRIBUTE_KEY_OPERATOR, msg.operator_address)
        .attr(ATTRIBUTE_KEY_MONIKER, &msg.moniker)
        .attr(ATTRIBUTE_KEY_OUTCOME, outcome.action());
    match outcome {
        ClaimOutcome::Created { bond } | ClaimOutcome::ProfileUpdated { bond } => {
            event.attr(ATTRIBUTE_KEY_AMOUNT, bond)
        }
        ClaimOutcome::BondIncreased { delta, .. } => event.attr(ATTRIBUTE_KEY_AMOUNT, delta),
        ClaimOutcome::BondDecreased {
            delta, matures_at, ..
        } => with_completion(event.attr(ATTRIBUTE_KEY_AMOUNT, delta), matures_at),
        ClaimOutcome::Evicted {
            released,
            matures_at,
        } => with_completion(event.attr(ATTRIBUTE_KEY_AMOUNT, released), matures_at),
    }
}

pub(crate) fn complete_unbonding_event(entry: &UnBonding) -> Event {
    Event::new(EVENT_TYPE_COMPLETE_UNBONDING)
        .attr(ATTRIBUTE_KEY_OPERATOR, entry.account_address)
        .attr(ATTRIBUTE_KEY_AMOUNT, &entry.amount)
        .attr(ATTRIBUTE_KEY_COMPLETION_TIME, entry.end_time.to_rfc3339())
}

fn with_completion(event: Event, matures_at: &DateTime<Utc>) -> Event {
    event.attr(ATTRIBUTE_KEY_COMPLETION_TIME, matures_at.to_rfc3339())
}
