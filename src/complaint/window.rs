//! Report windows and the instant ranges they resolve to.

use serde::{Deserialize, Serialize};
use time::{
    Date, Duration, OffsetDateTime, PrimitiveDateTime, UtcOffset,
    format_description::BorrowedFormatItem,
    macros::{format_description, time},
};

use crate::{Error, complaint::model::Complaint};

const QUERY_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");
const LABEL_DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[day]/[month]/[year]");

/// The report window selector as sent by the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowQuery {
    /// The window preset.
    pub ventana: Option<WindowPreset>,
    /// Start date for a custom window, "YYYY-MM-DD" or empty.
    pub desde: Option<String>,
    /// End date for a custom window, "YYYY-MM-DD" or empty.
    pub hasta: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindowPreset {
    ThisMonth,
    ThisYear,
    Custom,
}

impl WindowPreset {
    pub const ALL: [WindowPreset; 3] = [
        WindowPreset::ThisMonth,
        WindowPreset::ThisYear,
        WindowPreset::Custom,
    ];

    pub fn as_query_value(self) -> &'static str {
        match self {
            Self::ThisMonth => "this-month",
            Self::ThisYear => "this-year",
            Self::Custom => "custom",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::ThisMonth => "Este mes",
            Self::ThisYear => "Este año",
            Self::Custom => "Personalizado",
        }
    }
}

/// The period of time a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportWindow {
    /// From local midnight on the first of the current month through now.
    #[default]
    ThisMonth,
    /// From local midnight on January 1 of the current year through now.
    ThisYear,
    /// From the start of `start` through the last instant of `end`. A missing
    /// bound is unbounded.
    Custom {
        start: Option<Date>,
        end: Option<Date>,
    },
}

impl ReportWindow {
    /// Build a window from the query string, defaulting to this month.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidDate] if a custom bound is not a valid
    /// "YYYY-MM-DD" date. Bounds are ignored for the other presets.
    pub fn from_query(query: &WindowQuery) -> Result<Self, Error> {
        match query.ventana.unwrap_or(WindowPreset::ThisMonth) {
            WindowPreset::ThisMonth => Ok(Self::ThisMonth),
            WindowPreset::ThisYear => Ok(Self::ThisYear),
            WindowPreset::Custom => Ok(Self::Custom {
                start: parse_query_date(query.desde.as_deref())?,
                end: parse_query_date(query.hasta.as_deref())?,
            }),
        }
    }

    pub fn preset(&self) -> WindowPreset {
        match self {
            Self::ThisMonth => WindowPreset::ThisMonth,
            Self::ThisYear => WindowPreset::ThisYear,
            Self::Custom { .. } => WindowPreset::Custom,
        }
    }

    /// Resolve the window against `now`, which must already be in the local
    /// offset.
    pub fn resolve(&self, now: OffsetDateTime) -> InstantRange {
        let offset = now.offset();
        let today = now.date();

        match *self {
            Self::ThisMonth => {
                let first_of_month = today - Duration::days(i64::from(today.day()) - 1);

                InstantRange {
                    start: Some(first_of_month.midnight().assume_offset(offset)),
                    end: Some(now),
                }
            }
            Self::ThisYear => {
                let first_of_year = today - Duration::days(i64::from(today.ordinal()) - 1);

                InstantRange {
                    start: Some(first_of_year.midnight().assume_offset(offset)),
                    end: Some(now),
                }
            }
            Self::Custom { start, end } => InstantRange {
                start: start.map(|date| date.midnight().assume_offset(offset)),
                end: end.map(|date| {
                    PrimitiveDateTime::new(date, time!(23:59:59.999)).assume_offset(offset)
                }),
            },
        }
    }

    /// A human readable description of the window.
    pub fn label(&self) -> String {
        match self {
            Self::ThisMonth | Self::ThisYear => self.preset().label().to_owned(),
            Self::Custom { start, end } => match (start, end) {
                (Some(start), Some(end)) => {
                    format!("Del {} al {}", format_label_date(*start), format_label_date(*end))
                }
                (Some(start), None) => format!("Desde el {}", format_label_date(*start)),
                (None, Some(end)) => format!("Hasta el {}", format_label_date(*end)),
                (None, None) => "Todo el periodo".to_owned(),
            },
        }
    }

    /// Encode the window as a URL query string, without the leading '?'.
    pub fn to_query(&self) -> String {
        let (start, end) = match self {
            Self::Custom { start, end } => (
                start.map(format_query_date).unwrap_or_default(),
                end.map(format_query_date).unwrap_or_default(),
            ),
            _ => (String::new(), String::new()),
        };

        serde_urlencoded::to_string([
            ("ventana", self.preset().as_query_value()),
            ("desde", start.as_str()),
            ("hasta", end.as_str()),
        ])
        .unwrap_or_default()
    }

    /// The custom start date formatted for a date input.
    pub fn start_input_value(&self) -> String {
        match self {
            Self::Custom {
                start: Some(start), ..
            } => format_query_date(*start),
            _ => String::new(),
        }
    }

    /// The custom end date formatted for a date input.
    pub fn end_input_value(&self) -> String {
        match self {
            Self::Custom { end: Some(end), .. } => format_query_date(*end),
            _ => String::new(),
        }
    }
}

/// An inclusive range of instants. `None` is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstantRange {
    pub start: Option<OffsetDateTime>,
    pub end: Option<OffsetDateTime>,
}

impl InstantRange {
    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, instant: OffsetDateTime) -> bool {
        self.start.is_none_or(|start| instant >= start) && self.end.is_none_or(|end| instant <= end)
    }

    /// Whether `complaint` falls inside the range.
    ///
    /// A complaint without a parseable `fecha` only passes a fully unbounded
    /// range.
    pub fn admits(&self, complaint: &Complaint, local_offset: UtcOffset) -> bool {
        if self.is_unbounded() {
            return true;
        }

        complaint
            .timestamp(local_offset)
            .is_some_and(|timestamp| self.contains(timestamp))
    }
}

/// Split `complaints` into those inside and outside `range`, preserving order.
pub fn partition<'a>(
    complaints: impl IntoIterator<Item = &'a Complaint>,
    range: &InstantRange,
    local_offset: UtcOffset,
) -> (Vec<&'a Complaint>, Vec<&'a Complaint>) {
    complaints
        .into_iter()
        .partition(|complaint| range.admits(complaint, local_offset))
}

fn parse_query_date(text: Option<&str>) -> Result<Option<Date>, Error> {
    match text.map(str::trim) {
        None | Some("") => Ok(None),
        Some(text) => Date::parse(text, QUERY_DATE_FORMAT)
            .map(Some)
            .map_err(|_| Error::InvalidDate(text.to_owned())),
    }
}

fn format_query_date(date: Date) -> String {
    date.format(QUERY_DATE_FORMAT).unwrap_or_default()
}

fn format_label_date(date: Date) -> String {
    date.format(LABEL_DATE_FORMAT).unwrap_or_default()
}
