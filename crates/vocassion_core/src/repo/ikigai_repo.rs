//! Ikigai map repository. Section lists are stored as JSON arrays.

use super::{not_found_on_foreign_key, parse_uuid, RepoError, RepoResult};
use crate::model::ikigai::{IkigaiEntries, IkigaiMap};
use crate::model::profile::ProfileId;
use rusqlite::{params, Connection, Row};

pub trait IkigaiRepository {
    /// Creates or fully replaces the map for a profile.
    fn upsert_map(&self, profile_id: ProfileId, entries: &IkigaiEntries) -> RepoResult<IkigaiMap>;
    fn get_map(&self, profile_id: ProfileId) -> RepoResult<Option<IkigaiMap>>;
}

pub struct SqliteIkigaiRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteIkigaiRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl IkigaiRepository for SqliteIkigaiRepository<'_> {
    fn upsert_map(&self, profile_id: ProfileId, entries: &IkigaiEntries) -> RepoResult<IkigaiMap> {
        self.conn
            .execute(
                "INSERT INTO ikigai_maps (profile_id, passion, mission, profession, vocation)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(profile_id) DO UPDATE SET
                    passion = excluded.passion,
                    mission = excluded.mission,
                    profession = excluded.profession,
                    vocation = excluded.vocation,
                    updated_at = (strftime('%s', 'now') * 1000);",
                params![
                    profile_id.to_string(),
                    encode_list(&entries.passion)?,
                    encode_list(&entries.mission)?,
                    encode_list(&entries.profession)?,
                    encode_list(&entries.vocation)?,
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "profile", profile_id))?;

        self.get_map(profile_id)?
            .ok_or_else(|| RepoError::InvalidData("ikigai map missing in read-back".into()))
    }

    fn get_map(&self, profile_id: ProfileId) -> RepoResult<Option<IkigaiMap>> {
        let mut stmt = self.conn.prepare(
            "SELECT profile_id, passion, mission, profession, vocation, updated_at
             FROM ikigai_maps
             WHERE profile_id = ?1;",
        )?;
        let mut rows = stmt.query([profile_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_map_row(row)?));
        }
        Ok(None)
    }
}

fn parse_map_row(row: &Row<'_>) -> RepoResult<IkigaiMap> {
    let profile_text: String = row.get("profile_id")?;
    Ok(IkigaiMap {
        profile_id: parse_uuid(&profile_text, "ikigai_maps.profile_id")?,
        entries: IkigaiEntries {
            passion: decode_list(&row.get::<_, String>("passion")?, "passion")?,
            mission: decode_list(&row.get::<_, String>("mission")?, "mission")?,
            profession: decode_list(&row.get::<_, String>("profession")?, "profession")?,
            vocation: decode_list(&row.get::<_, String>("vocation")?, "vocation")?,
        },
        updated_at: row.get("updated_at")?,
    })
}

fn encode_list(values: &[String]) -> RepoResult<String> {
    serde_json::to_string(values)
        .map_err(|err| RepoError::InvalidData(format!("cannot encode ikigai entries: {err}")))
}

fn decode_list(value: &str, column: &str) -> RepoResult<Vec<String>> {
    serde_json::from_str(value).map_err(|err| {
        RepoError::InvalidData(format!("invalid JSON list in ikigai_maps.{column}: {err}"))
    })
}
