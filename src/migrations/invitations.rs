use chrono::{DateTime, TimeZone, Utc};

use super::{Migration, MigrationContext, MigrationReport};
use crate::entity::{to_records, InvestmentInvitation, InvitationStatus};
use crate::error::Result;
use crate::storage::Document;

const COLLECTION: &str = "investmentInvitations";
/// Invitations sit right after the investments they lead to.
const ANCHOR: &str = "investments";

fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, h, mi, s)
        .single()
        .unwrap_or_default()
}

fn end_of_day(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
    at(y, mo, d, 23, 59, 59) + chrono::Duration::milliseconds(999)
}

/// The three sample invitations: one pending, one accepted, one rejected.
pub fn sample_invitations() -> Vec<InvestmentInvitation> {
    let base = |id: &str, investor_id: &str, email: &str, sector: (&str, &str), lot: &str| {
        InvestmentInvitation {
            id: id.to_string(),
            maricultor_id: "maricultor-001".to_string(),
            maricultor_name: "Juan Pérez".to_string(),
            investor_id: investor_id.to_string(),
            investor_email: email.to_string(),
            sector_id: sector.0.to_string(),
            sector_name: sector.1.to_string(),
            lot_id: lot.to_string(),
            status: InvitationStatus::Pending,
            invited_amount: 0,
            invited_percentage: 0,
            message: String::new(),
            invitation_date: DateTime::<Utc>::default(),
            expiration_date: DateTime::<Utc>::default(),
            response_date: None,
            response_message: None,
            accepted_amount: None,
            accepted_percentage: None,
            created_at: DateTime::<Utc>::default(),
            updated_at: DateTime::<Utc>::default(),
        }
    };

    let north = ("sector-001", "Sector Norte");
    let south = ("sector-002", "Sector Sur");

    let pending = {
        let sent = at(2025, 9, 20, 10, 0, 0);
        InvestmentInvitation {
            invited_amount: 30000,
            invited_percentage: 25,
            message: "Te invitamos a participar en nuestro proyecto de cultivo en el Sector Norte. \
                      Esperamos una buena temporada de crecimiento."
                .to_string(),
            invitation_date: sent,
            expiration_date: end_of_day(2025, 10, 5),
            created_at: sent,
            updated_at: sent,
            ..base("invitation-001", "investor-001", "investor1@conchas.com", north, "lot-001")
        }
    };

    let accepted = {
        let sent = at(2025, 9, 15, 10, 0, 0);
        let responded = at(2025, 9, 18, 14, 30, 0);
        InvestmentInvitation {
            status: InvitationStatus::Accepted,
            invited_amount: 50000,
            invited_percentage: 30,
            message: "Excelente oportunidad de inversión en el Sector Sur con proyección de alta \
                      rentabilidad."
                .to_string(),
            invitation_date: sent,
            expiration_date: end_of_day(2025, 9, 30),
            response_date: Some(responded),
            response_message: Some(
                "Acepto la invitación. Me interesa mucho participar en este proyecto.".to_string(),
            ),
            accepted_amount: Some(50000),
            accepted_percentage: Some(30),
            created_at: sent,
            updated_at: responded,
            ..base(
                "invitation-002",
                "investor-test-001",
                "inversor.prueba@example.com",
                south,
                "lot-002",
            )
        }
    };

    let rejected = {
        let sent = at(2025, 8, 25, 10, 0, 0);
        let responded = at(2025, 8, 28, 16, 0, 0);
        InvestmentInvitation {
            status: InvitationStatus::Rejected,
            invited_amount: 40000,
            invited_percentage: 20,
            message: "Nueva oportunidad en el Sector Norte con siembra reciente.".to_string(),
            invitation_date: sent,
            expiration_date: end_of_day(2025, 9, 10),
            response_date: Some(responded),
            response_message: Some(
                "Gracias por la invitación, pero en este momento no puedo participar.".to_string(),
            ),
            created_at: sent,
            updated_at: responded,
            ..base("invitation-003", "investor-001", "investor1@conchas.com", north, "lot-003")
        }
    };

    vec![pending, accepted, rejected]
}

/// Adds the invitations collection with sample data, once.
pub struct InvestmentInvitations;

impl Migration for InvestmentInvitations {
    fn id(&self) -> &'static str {
        "0008_investment_invitations"
    }

    fn description(&self) -> &'static str {
        "Investment invitations collection with sample records"
    }

    fn apply(&self, doc: &mut Document, _ctx: &mut MigrationContext) -> Result<MigrationReport> {
        if doc.get(COLLECTION).is_some() {
            return Ok(MigrationReport::new(self.id())
                .with(format!("{} already exists, left unchanged", COLLECTION)));
        }

        let invitations = sample_invitations();
        let report = MigrationReport::new(self.id()).with(format!(
            "{} added with {} sample records",
            COLLECTION,
            invitations.len()
        ));
        doc.insert_collection_after(ANCHOR, COLLECTION, to_records(&invitations)?);

        Ok(report)
    }
}
