use crate::repository::{Entity, PgQuery, PgQueryAs};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::macros::datetime;
use time::OffsetDateTime;

/// An open service request awaiting or under response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct ActiveCall {
    pub id: i32,
    pub address: String,
    pub patient_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub open_ts: OffsetDateTime,
    // Nothing writes this column yet; rows keep it NULL.
    #[serde(
        default,
        with = "time::serde::rfc3339::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub closed_ts: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub upd_ts: OffsetDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub responder_id: Option<i32>,
    pub status: String,
    pub notes: String,
}

/// Writable fields of an active call. Absent fields decode as empty strings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ActiveCallFields {
    pub address: String,
    pub patient_name: String,
    pub status: String,
    pub notes: String,
}

/// A scheduled shift during which a priest takes calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct OnCall {
    pub id: i32,
    pub priest_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_ts: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub upd_ts: OffsetDateTime,
    pub status: String,
}

/// Written in place of an absent on-call time.
pub const ZERO_TIME: OffsetDateTime = datetime!(0001-01-01 00:00:00 UTC);

/// Writable fields of an on-call shift. Absent fields decode as zero values
/// (`priest_id` 0, times at [`ZERO_TIME`]) and are stored unchecked.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OnCallFields {
    pub priest_id: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end_time: OffsetDateTime,
    pub status: String,
}

impl Default for OnCallFields {
    fn default() -> Self {
        Self {
            priest_id: 0,
            start_time: ZERO_TIME,
            end_time: ZERO_TIME,
            status: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Priest {
    pub id: i32,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PriestFields {
    pub name: String,
}

impl Entity for ActiveCall {
    type Fields = ActiveCallFields;

    const TABLE: &'static str = "ocm.active_calls";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "address",
        "patient_name",
        "open_ts",
        "closed_ts",
        "upd_ts",
        "responder_id",
        "status",
        "notes",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "address",
        "patient_name",
        "open_ts",
        "upd_ts",
        "status",
        "notes",
    ];
    const UPDATE_COLUMNS: &'static [&'static str] =
        &["address", "patient_name", "status", "notes", "upd_ts"];

    fn bind_insert<'q>(
        fields: &'q ActiveCallFields,
        now: OffsetDateTime,
        query: PgQueryAs<'q, Self>,
    ) -> PgQueryAs<'q, Self> {
        query
            .bind(fields.address.as_str())
            .bind(fields.patient_name.as_str())
            .bind(now)
            .bind(now)
            .bind(fields.status.as_str())
            .bind(fields.notes.as_str())
    }

    fn bind_update<'q>(
        fields: &'q ActiveCallFields,
        now: OffsetDateTime,
        query: PgQuery<'q>,
    ) -> PgQuery<'q> {
        query
            .bind(fields.address.as_str())
            .bind(fields.patient_name.as_str())
            .bind(fields.status.as_str())
            .bind(fields.notes.as_str())
            .bind(now)
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn assemble(id: i32, fields: &ActiveCallFields, now: OffsetDateTime) -> Self {
        Self {
            id,
            address: fields.address.clone(),
            patient_name: fields.patient_name.clone(),
            open_ts: now,
            closed_ts: None,
            upd_ts: now,
            responder_id: None,
            status: fields.status.clone(),
            notes: fields.notes.clone(),
        }
    }

    fn overwrite(&mut self, fields: &ActiveCallFields, now: OffsetDateTime) {
        self.address = fields.address.clone();
        self.patient_name = fields.patient_name.clone();
        self.status = fields.status.clone();
        self.notes = fields.notes.clone();
        self.upd_ts = now;
    }
}

impl Entity for OnCall {
    type Fields = OnCallFields;

    const TABLE: &'static str = "ocm.on_call";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "priest_id",
        "start_time",
        "end_time",
        "created_ts",
        "upd_ts",
        "status",
    ];
    const INSERT_COLUMNS: &'static [&'static str] = &[
        "priest_id",
        "start_time",
        "end_time",
        "created_ts",
        "upd_ts",
        "status",
    ];
    const UPDATE_COLUMNS: &'static [&'static str] =
        &["priest_id", "start_time", "end_time", "upd_ts", "status"];

    fn bind_insert<'q>(
        fields: &'q OnCallFields,
        now: OffsetDateTime,
        query: PgQueryAs<'q, Self>,
    ) -> PgQueryAs<'q, Self> {
        query
            .bind(fields.priest_id)
            .bind(fields.start_time)
            .bind(fields.end_time)
            .bind(now)
            .bind(now)
            .bind(fields.status.as_str())
    }

    fn bind_update<'q>(
        fields: &'q OnCallFields,
        now: OffsetDateTime,
        query: PgQuery<'q>,
    ) -> PgQuery<'q> {
        query
            .bind(fields.priest_id)
            .bind(fields.start_time)
            .bind(fields.end_time)
            .bind(now)
            .bind(fields.status.as_str())
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn assemble(id: i32, fields: &OnCallFields, now: OffsetDateTime) -> Self {
        Self {
            id,
            priest_id: fields.priest_id,
            start_time: fields.start_time,
            end_time: fields.end_time,
            created_ts: now,
            upd_ts: now,
            status: fields.status.clone(),
        }
    }

    fn overwrite(&mut self, fields: &OnCallFields, now: OffsetDateTime) {
        self.priest_id = fields.priest_id;
        self.start_time = fields.start_time;
        self.end_time = fields.end_time;
        self.upd_ts = now;
        self.status = fields.status.clone();
    }
}

impl Entity for Priest {
    type Fields = PriestFields;

    const TABLE: &'static str = "ocm.priests";
    const COLUMNS: &'static [&'static str] = &["id", "name"];
    const INSERT_COLUMNS: &'static [&'static str] = &["name"];
    const UPDATE_COLUMNS: &'static [&'static str] = &["name"];

    fn bind_insert<'q>(
        fields: &'q PriestFields,
        _now: OffsetDateTime,
        query: PgQueryAs<'q, Self>,
    ) -> PgQueryAs<'q, Self> {
        query.bind(fields.name.as_str())
    }

    fn bind_update<'q>(
        fields: &'q PriestFields,
        _now: OffsetDateTime,
        query: PgQuery<'q>,
    ) -> PgQuery<'q> {
        query.bind(fields.name.as_str())
    }

    fn id(&self) -> i32 {
        self.id
    }

    fn assemble(id: i32, fields: &PriestFields, _now: OffsetDateTime) -> Self {
        Self {
            id,
            name: fields.name.clone(),
        }
    }

    fn overwrite(&mut self, fields: &PriestFields, _now: OffsetDateTime) {
        self.name = fields.name.clone();
    }
}
