//! The complaint record served by the remote API and the payload used to update it.

use std::fmt;

use serde::{Deserialize, Serialize};
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::{BorrowedFormatItem, well_known::Rfc3339},
    macros::format_description,
};

/// The canonical identifier of a complaint.
///
/// The remote API exposes the key as `folio` on some records and as `id` on
/// others. A record's folio is always used as its key, falling back to `id`
/// only when the folio is missing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Folio(String);

impl Folio {
    /// Wrap `value` as a folio.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The folio as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Folio {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Folio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a complaint is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    /// The complaint has been received but nobody is working on it yet.
    Recibida,
    /// The complaint is being handled.
    #[serde(rename = "En proceso")]
    EnProceso,
    /// The complaint has been resolved.
    Resuelta,
    /// The complaint was rejected.
    Rechazada,
}

impl Status {
    /// Every status, in lifecycle order.
    pub const ALL: [Status; 4] = [
        Status::Recibida,
        Status::EnProceso,
        Status::Resuelta,
        Status::Rechazada,
    ];

    /// The label used by the remote API and shown to the admin.
    pub fn label(self) -> &'static str {
        match self {
            Status::Recibida => "Recibida",
            Status::EnProceso => "En proceso",
            Status::Resuelta => "Resuelta",
            Status::Rechazada => "Rechazada",
        }
    }

    /// Parse a status from its exact label.
    pub fn from_label(label: &str) -> Option<Self> {
        Status::ALL.into_iter().find(|status| status.label() == label)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A citizen complaint as loaded from the remote API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawComplaint")]
pub struct Complaint {
    /// The canonical identifier.
    pub folio: Folio,
    /// The raw `id` field, if the API sent one. Never used as a key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// The complaint category. Open-ended, not enumerated.
    pub tipo: String,
    /// The current status.
    pub estatus: Status,
    /// The timestamp assigned by the origin, as sent by the API.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fecha: Option<String>,
    /// The admin's notes on the complaint. Editable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// What the citizen wrote. Read-only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texto: Option<String>,
}

/// The shape of a complaint on the wire, before the identifier is resolved.
#[derive(Deserialize)]
struct RawComplaint {
    #[serde(default)]
    folio: Option<String>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    tipo: String,
    estatus: Status,
    #[serde(default)]
    fecha: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    texto: Option<String>,
}

impl TryFrom<RawComplaint> for Complaint {
    type Error = String;

    fn try_from(raw: RawComplaint) -> Result<Self, Self::Error> {
        let id = match raw.id {
            Some(serde_json::Value::String(id)) => Some(id),
            Some(serde_json::Value::Number(id)) => Some(id.to_string()),
            _ => None,
        };

        let folio = raw
            .folio
            .filter(|folio| !folio.is_empty())
            .or_else(|| id.clone())
            .ok_or_else(|| format!("complaint of type \"{}\" has neither folio nor id", raw.tipo))?;

        Ok(Self {
            folio: Folio::new(folio),
            id,
            tipo: raw.tipo,
            estatus: raw.estatus,
            fecha: raw.fecha,
            description: raw.description,
            texto: raw.texto,
        })
    }
}

impl Complaint {
    /// The point in time the complaint was filed, if `fecha` can be parsed.
    ///
    /// Timestamps without an offset are interpreted in `local_offset`.
    pub fn timestamp(&self, local_offset: UtcOffset) -> Option<OffsetDateTime> {
        self.fecha
            .as_deref()
            .and_then(|fecha| parse_timestamp(fecha, local_offset))
    }

    /// `fecha` formatted for display in the local timezone.
    ///
    /// Falls back to the raw text when it cannot be parsed and to "N/A" when
    /// it is missing.
    pub fn display_fecha(&self, local_offset: UtcOffset) -> String {
        match (self.timestamp(local_offset), self.fecha.as_deref()) {
            (Some(timestamp), _) => format_timestamp(timestamp.to_offset(local_offset)),
            (None, Some(raw)) => raw.to_owned(),
            (None, None) => "N/A".to_owned(),
        }
    }

    /// Apply an accepted update to this complaint.
    pub fn apply(&mut self, update: &ComplaintUpdate) {
        self.estatus = update.estatus;

        if let Some(description) = &update.description {
            self.description = if description.is_empty() {
                None
            } else {
                Some(description.clone())
            };
        }
    }
}

/// The mutable fields of a complaint, sent to `PUT /quejas/{folio}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintUpdate {
    /// The new status.
    pub estatus: Status,
    /// The new description. `None` leaves it untouched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

const DATE_TIME_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
const DATE_TIME_SUBSECOND_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");
const DATE_TIME_SPACE_FORMAT: &[BorrowedFormatItem] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const DISPLAY_FORMAT: &[BorrowedFormatItem] =
    format_description!("[day]/[month]/[year] [hour]:[minute]:[second]");

/// Parse a timestamp sent by the API.
///
/// Accepts RFC 3339, ISO 8601 date-times without an offset (read as local
/// time) and plain dates (read as local midnight).
pub fn parse_timestamp(text: &str, local_offset: UtcOffset) -> Option<OffsetDateTime> {
    let text = text.trim();

    if let Ok(timestamp) = OffsetDateTime::parse(text, &Rfc3339) {
        return Some(timestamp);
    }

    [
        DATE_TIME_SUBSECOND_FORMAT,
        DATE_TIME_FORMAT,
        DATE_TIME_SPACE_FORMAT,
    ]
    .into_iter()
    .find_map(|format| PrimitiveDateTime::parse(text, format).ok())
    .or_else(|| {
        Date::parse(text, DATE_FORMAT)
            .ok()
            .map(|date| date.midnight())
    })
    .map(|date_time| date_time.assume_offset(local_offset))
}

/// Format a timestamp as "dd/mm/yyyy hh:mm:ss".
pub fn format_timestamp(timestamp: OffsetDateTime) -> String {
    timestamp
        .format(DISPLAY_FORMAT)
        .unwrap_or_else(|_| timestamp.to_string())
}

#[cfg(test)]
mod tests {
    use time::{UtcOffset, macros::datetime};

    use super::{Complaint, ComplaintUpdate, Folio, Status, parse_timestamp};

    #[test]
    fn deserializes_complaint_with_folio() {
        let json = r#"{
            "folio": "Q-001",
            "tipo": "Alumbrado",
            "estatus": "En proceso",
            "fecha": "2024-06-01T10:30:00.000Z",
            "description": "Lámpara fundida"
        }"#;

        let complaint: Complaint = serde_json::from_str(json).unwrap();

        assert_eq!(complaint.folio, Folio::new("Q-001"));
        assert_eq!(complaint.tipo, "Alumbrado");
        assert_eq!(complaint.estatus, Status::EnProceso);
        assert_eq!(complaint.description.as_deref(), Some("Lámpara fundida"));
    }

    #[test]
    fn falls_back_to_id_when_folio_missing() {
        let json = r#"{"id": 42, "tipo": "Baches", "estatus": "Recibida"}"#;

        let complaint: Complaint = serde_json::from_str(json).unwrap();

        assert_eq!(complaint.folio, Folio::new("42"));
        assert_eq!(complaint.id.as_deref(), Some("42"));
    }

    #[test]
    fn prefers_folio_over_id() {
        let json = r#"{"id": "abc", "folio": "Q-7", "tipo": "Baches", "estatus": "Recibida"}"#;

        let complaint: Complaint = serde_json::from_str(json).unwrap();

        assert_eq!(complaint.folio, Folio::new("Q-7"));
    }

    #[test]
    fn reads_texto_separately_from_description() {
        let json = r#"{"folio": "Q-1", "tipo": "Agua", "estatus": "Resuelta", "texto": "Fuga"}"#;

        let complaint: Complaint = serde_json::from_str(json).unwrap();

        assert_eq!(complaint.texto.as_deref(), Some("Fuga"));
        assert_eq!(complaint.description, None);
    }

    #[test]
    fn reads_record_with_both_texto_and_description() {
        let json = r#"[{
            "folio": "Q-1",
            "tipo": "Agua",
            "estatus": "Recibida",
            "texto": "Fuga en la calle",
            "description": "Asignada a cuadrilla"
        }]"#;

        let complaints: Vec<Complaint> = serde_json::from_str(json).unwrap();

        assert_eq!(complaints[0].texto.as_deref(), Some("Fuga en la calle"));
        assert_eq!(complaints[0].description.as_deref(), Some("Asignada a cuadrilla"));
    }

    #[test]
    fn rejects_record_without_identifier() {
        let json = r#"{"tipo": "Agua", "estatus": "Resuelta"}"#;

        let result = serde_json::from_str::<Complaint>(json);

        assert!(result.is_err());
    }

    #[test]
    fn rejects_unknown_status() {
        let json = r#"{"folio": "Q-1", "tipo": "Agua", "estatus": "Archivada"}"#;

        let result = serde_json::from_str::<Complaint>(json);

        assert!(result.is_err());
    }

    #[test]
    fn status_serializes_with_api_labels() {
        for status in Status::ALL {
            let json = serde_json::to_string(&status).unwrap();

            assert_eq!(json, format!("\"{}\"", status.label()));
            assert_eq!(Status::from_label(status.label()), Some(status));
        }
    }

    #[test]
    fn parses_rfc3339_timestamp() {
        let got = parse_timestamp("2024-06-01T10:30:00Z", UtcOffset::UTC);

        assert_eq!(got, Some(datetime!(2024-06-01 10:30:00 UTC)));
    }

    #[test]
    fn parses_naive_timestamp_in_local_offset() {
        let offset = UtcOffset::from_hms(-6, 0, 0).unwrap();

        let got = parse_timestamp("2024-06-01T00:00:00", offset);

        assert_eq!(got, Some(datetime!(2024-06-01 00:00:00 -06:00)));
    }

    #[test]
    fn parses_plain_date_as_local_midnight() {
        let got = parse_timestamp("2024-06-01", UtcOffset::UTC);

        assert_eq!(got, Some(datetime!(2024-06-01 00:00:00 UTC)));
    }

    #[test]
    fn garbage_timestamp_is_none() {
        assert_eq!(parse_timestamp("ayer", UtcOffset::UTC), None);
    }

    #[test]
    fn display_fecha_falls_back() {
        let mut complaint: Complaint =
            serde_json::from_str(r#"{"folio": "Q-1", "tipo": "Agua", "estatus": "Resuelta"}"#)
                .unwrap();
        assert_eq!(complaint.display_fecha(UtcOffset::UTC), "N/A");

        complaint.fecha = Some("ayer".to_owned());
        assert_eq!(complaint.display_fecha(UtcOffset::UTC), "ayer");

        complaint.fecha = Some("2024-06-01T09:05:03Z".to_owned());
        assert_eq!(complaint.display_fecha(UtcOffset::UTC), "01/06/2024 09:05:03");
    }

    #[test]
    fn apply_update_sets_status_and_description() {
        let mut complaint: Complaint = serde_json::from_str(
            r#"{"folio": "Q-1", "tipo": "Agua", "estatus": "Recibida", "description": "Fuga"}"#,
        )
        .unwrap();

        complaint.apply(&ComplaintUpdate {
            estatus: Status::Resuelta,
            description: Some(String::new()),
        });

        assert_eq!(complaint.estatus, Status::Resuelta);
        assert_eq!(complaint.description, None);
    }
}
