// src/entity/invitation.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::iso_millis;
use crate::error::{ConchitasError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum InvitationStatus {
    #[default]
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl InvitationStatus {
    /// Only a pending invitation can change state.
    pub fn can_transition_to(self, next: InvitationStatus) -> bool {
        self == InvitationStatus::Pending && next != InvitationStatus::Pending
    }
}

impl std::fmt::Display for InvitationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvitationStatus::Pending => write!(f, "pending"),
            InvitationStatus::Accepted => write!(f, "accepted"),
            InvitationStatus::Rejected => write!(f, "rejected"),
            InvitationStatus::Expired => write!(f, "expired"),
        }
    }
}

impl std::str::FromStr for InvitationStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(InvitationStatus::Pending),
            "accepted" => Ok(InvitationStatus::Accepted),
            "rejected" => Ok(InvitationStatus::Rejected),
            "expired" => Ok(InvitationStatus::Expired),
            _ => Err(format!("Invalid invitation status: {}", s)),
        }
    }
}

/// An offer from a farm operator to an investor to fund a lot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentInvitation {
    pub id: String,
    pub maricultor_id: String,
    pub maricultor_name: String,
    pub investor_id: String,
    pub investor_email: String,
    pub sector_id: String,
    pub sector_name: String,
    pub lot_id: String,
    pub status: InvitationStatus,
    pub invited_amount: u64,
    pub invited_percentage: u32,
    pub message: String,
    #[serde(with = "iso_millis")]
    pub invitation_date: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub expiration_date: DateTime<Utc>,
    #[serde(with = "iso_millis::option")]
    pub response_date: Option<DateTime<Utc>>,
    pub response_message: Option<String>,
    pub accepted_amount: Option<u64>,
    pub accepted_percentage: Option<u32>,
    #[serde(with = "iso_millis")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "iso_millis")]
    pub updated_at: DateTime<Utc>,
}

impl InvestmentInvitation {
    fn leave_pending(&mut self, next: InvitationStatus, at: DateTime<Utc>) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(ConchitasError::InvalidTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        self.response_date = Some(at);
        self.updated_at = at;
        Ok(())
    }

    pub fn accept(
        &mut self,
        amount: u64,
        percentage: u32,
        message: Option<String>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        self.leave_pending(InvitationStatus::Accepted, at)?;
        self.response_message = message;
        self.accepted_amount = Some(amount);
        self.accepted_percentage = Some(percentage);
        Ok(())
    }

    pub fn reject(&mut self, message: Option<String>, at: DateTime<Utc>) -> Result<()> {
        self.leave_pending(InvitationStatus::Rejected, at)?;
        self.response_message = message;
        Ok(())
    }

    pub fn expire(&mut self, at: DateTime<Utc>) -> Result<()> {
        self.leave_pending(InvitationStatus::Expired, at)
    }

    /// Still pending past its expiration date.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == InvitationStatus::Pending && now > self.expiration_date
    }

    /// Response fields are empty while pending and accepted figures only
    /// exist on accepted invitations.
    pub fn response_fields_consistent(&self) -> bool {
        let accepted_figures =
            self.accepted_amount.is_some() || self.accepted_percentage.is_some();
        match self.status {
            InvitationStatus::Pending => {
                self.response_date.is_none()
                    && self.response_message.is_none()
                    && !accepted_figures
            }
            InvitationStatus::Accepted => {
                self.response_date.is_some()
                    && self.accepted_amount.is_some()
                    && self.accepted_percentage.is_some()
            }
            InvitationStatus::Rejected | InvitationStatus::Expired => {
                self.response_date.is_some() && !accepted_figures
            }
        }
    }
}
