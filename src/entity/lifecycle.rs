// src/entity/lifecycle.rs
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::{iso_millis, to_record, InvestmentInvitation, InvitationStatus, LotStatus};
use crate::error::{ConchitasError, Result};
use crate::storage::merge_into;

pub const LOTS: &str = "lots";
pub const INVITATIONS: &str = "investmentInvitations";

/// Fields an invitation gains when it leaves `pending`.
const RESPONSE_FIELDS: [&str; 6] = [
    "status",
    "responseDate",
    "responseMessage",
    "acceptedAmount",
    "acceptedPercentage",
    "updatedAt",
];

fn status_of(record: &Value) -> Option<&str> {
    record.get("status").and_then(Value::as_str)
}

fn parse_status<T: std::str::FromStr<Err = String>>(raw: &str) -> Result<T> {
    raw.parse().map_err(ConchitasError::InvalidRecord)
}

/// Check the `status` change from `current` to `next` against the collection's
/// lifecycle and fill in what the new state requires. Collections without a
/// lifecycle, and writes that keep the status, pass through untouched.
pub fn apply_status_change(
    collection: &str,
    current: &Value,
    next: &mut Value,
    at: DateTime<Utc>,
) -> Result<()> {
    let Some(to) = status_of(next) else {
        return Ok(());
    };
    if status_of(current) == Some(to) {
        return Ok(());
    }

    match collection {
        LOTS => {
            let to: LotStatus = parse_status(to)?;
            if let Some(Ok(from)) = status_of(current).map(str::parse::<LotStatus>) {
                from.transition(to)?;
            }
            Ok(())
        }
        INVITATIONS => {
            let to: InvitationStatus = parse_status(to)?;
            let from = status_of(current)
                .map(str::parse::<InvitationStatus>)
                .transpose()
                .map_err(ConchitasError::InvalidRecord)?
                .unwrap_or_default();
            if !from.can_transition_to(to) {
                return Err(ConchitasError::InvalidTransition {
                    from: from.to_string(),
                    to: to.to_string(),
                });
            }
            respond(current, next, to, at)
        }
        _ => Ok(()),
    }
}

/// Moves a pending invitation to `to`, taking the investor's figures and
/// message from `next` and writing the resulting response fields back into it.
fn respond(current: &Value, next: &mut Value, to: InvitationStatus, at: DateTime<Utc>) -> Result<()> {
    let Ok(mut invitation) = serde_json::from_value::<InvestmentInvitation>(current.clone()) else {
        // Free-form record: only the response date can be derived.
        if next.get("responseDate").map_or(true, Value::is_null) {
            merge_into(next, Value::Object(response_date(at)));
        }
        return Ok(());
    };

    let message = next
        .get("responseMessage")
        .and_then(Value::as_str)
        .map(str::to_string);
    match to {
        InvitationStatus::Accepted => {
            let amount = next
                .get("acceptedAmount")
                .and_then(Value::as_u64)
                .unwrap_or(invitation.invited_amount);
            let percentage = next
                .get("acceptedPercentage")
                .and_then(Value::as_u64)
                .and_then(|p| u32::try_from(p).ok())
                .unwrap_or(invitation.invited_percentage);
            invitation.accept(amount, percentage, message, at)?;
        }
        InvitationStatus::Rejected => invitation.reject(message, at)?,
        InvitationStatus::Expired => invitation.expire(at)?,
        InvitationStatus::Pending => {}
    }

    let typed = to_record(&invitation)?;
    let response: Map<String, Value> = RESPONSE_FIELDS
        .iter()
        .map(|key| (key.to_string(), typed[*key].clone()))
        .collect();
    merge_into(next, Value::Object(response));
    Ok(())
}

fn response_date(at: DateTime<Utc>) -> Map<String, Value> {
    let mut fields = Map::new();
    fields.insert("responseDate".to_string(), Value::from(iso_millis::format(&at)));
    fields
}

/// Expire every pending invitation past its expiration date. Returns the ids
/// of the invitations that changed. Records that are not well-formed
/// invitations are left alone.
pub fn expire_overdue(records: &mut [Value], now: DateTime<Utc>) -> Result<Vec<String>> {
    let mut expired = Vec::new();
    for record in records.iter_mut() {
        let Ok(mut invitation) = serde_json::from_value::<InvestmentInvitation>(record.clone())
        else {
            tracing::debug!(id = ?record.get("id"), "skipping malformed invitation");
            continue;
        };
        if !invitation.is_overdue(now) {
            continue;
        }
        invitation.expire(now)?;
        merge_into(record, to_record(&invitation)?);
        expired.push(invitation.id);
    }
    Ok(expired)
}
