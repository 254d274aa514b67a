//! Pieces shared by the commerce schemas, whose journal and CAPI adapters report the same
//! market and must agree on where it is and whether it was already sent.

use eddn_common::{Context, Record};
use serde::Serialize;
use tracing::debug;

use super::{optional_i64, Outcome, SuppressReason};
use crate::capi::CapiDocuments;
use crate::dedup::DedupSlot;
use crate::error::SchemaError;

/// The station a commerce report describes.
#[derive(Clone, Debug, PartialEq)]
pub struct Market {
    pub system_name: String,
    pub station_name: String,
    pub market_id: i64,
}

impl Market {
    /// Read the market a journal event reports. `None` when any part is missing.
    pub fn from_journal(record: &Record) -> Result<Option<Self>, SchemaError> {
        let market_id = optional_i64(record, "MarketID")?;

        Ok(
            match (
                record.get_str("StarSystem"),
                record.get_str("StationName"),
                market_id,
            ) {
                (Some(system_name), Some(station_name), Some(market_id)) => Some(Self {
                    system_name: system_name.to_owned(),
                    station_name: station_name.to_owned(),
                    market_id,
                }),
                _ => None,
            },
        )
    }

    /// Read the market from the profile and shipyard documents. `None` when any part is missing.
    pub fn from_capi(documents: &CapiDocuments) -> Option<Self> {
        let system_name = documents
            .profile
            .as_ref()?
            .last_system
            .as_ref()?
            .name
            .as_deref()?;
        let shipyard = documents.shipyard.as_ref()?;

        Some(Self {
            system_name: system_name.to_owned(),
            station_name: shipyard.name.clone()?,
            market_id: shipyard.id?,
        })
    }

    /// Whether this is the station the commander is docked at.
    pub fn is_current(&self, context: &Context) -> bool {
        context.location.snapshot().matches(
            Some(self.system_name.as_str()),
            Some(self.station_name.as_str()),
            Some(self.market_id),
        )
    }
}

/// Where the journal adapter stands after the checks every commerce event goes through.
pub enum JournalGate {
    Open(Market),
    Closed(Outcome),
}

/// Check that a journal commerce event is complete and describes the current station.
///
/// Events missing their timestamp or any part of the market do not apply. A market id of the
/// wrong type is an error.
pub fn journal_gate(record: &Record, context: &Context) -> Result<JournalGate, SchemaError> {
    if record.is_empty() || !context.version.snapshot().is_known() {
        return Ok(JournalGate::Closed(Outcome::NotApplicable));
    }

    let Some(market) = Market::from_journal(record)? else {
        debug!("commerce event does not name its market");
        return Ok(JournalGate::Closed(Outcome::NotApplicable));
    };
    if record.get_str("timestamp").is_none() || !market.is_current(context) {
        return Ok(JournalGate::Closed(Outcome::NotApplicable));
    }

    Ok(JournalGate::Open(market))
}

/// Where the CAPI adapter stands after the checks every refresh goes through.
pub enum CapiGate<'a> {
    Open { market: Market, timestamp: &'a str },
    Closed(Outcome),
}

/// Check that a CAPI refresh is stamped and describes the current station. Runs after the
/// adapter has found its inventory.
pub fn capi_gate<'a>(documents: &'a CapiDocuments, context: &Context) -> CapiGate<'a> {
    if !context.version.snapshot().is_known() {
        return CapiGate::Closed(Outcome::NotApplicable);
    }

    let Some(timestamp) = documents
        .shipyard
        .as_ref()
        .and_then(|shipyard| shipyard.timestamp.as_deref())
    else {
        debug!("capi shipyard document has no timestamp");
        return CapiGate::Closed(Outcome::Suppressed(SuppressReason::MissingTimestamp));
    };

    match Market::from_capi(documents) {
        Some(market) if market.is_current(context) => CapiGate::Open { market, timestamp },
        _ => CapiGate::Closed(Outcome::NotApplicable),
    }
}

/// Stamp a finished message with the game version and pass the dedup gate. The gate runs last
/// so a market is only remembered once its message is complete.
pub fn finish<M: Serialize>(
    message: &M,
    market_id: i64,
    last_sent: &DedupSlot,
    context: &Context,
    source: Option<&str>,
) -> Result<Outcome, SchemaError> {
    let record = Record::from_serialize(message)?;
    let record = context.version.snapshot().augment_version(record, source);

    if !last_sent.check_and_set(Some(market_id)) {
        return Ok(Outcome::Suppressed(SuppressReason::Duplicate));
    }

    Ok(Outcome::Ready(record))
}
