//! Typed response shapes for the 7 Days to Die web API.
//!
//! Every endpoint decodes into exactly one of these structs, chosen at the
//! call site in [`crate::client::SdtdClient`]. Decoding is permissive on
//! purpose: the server is free to add fields (ignored) or omit them
//! (defaulted) without breaking the client. Only syntactically invalid JSON
//! is an error.
//!
//! The vanilla web server and Alloc's Server Fixes disagree on field naming
//! (`entityId` vs `entityid`, `platformId` vs `steamid`, ...), so the modded
//! player list gets its own shape rather than sharing the vanilla one.

// The shapes mirror the full wire format; not every field is rendered.
#![allow(dead_code)]

use serde::Deserialize;
use serde_json::Value;

/// Envelope fields present on most vanilla responses.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ResponseMeta {
    #[serde(rename = "serverTime")]
    pub server_time: String,
}

/// Acknowledgement envelope for write operations. The body may also be
/// entirely empty, in which case decoding is skipped.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Ack {
    pub meta: ResponseMeta,
}

/// One entry of the server configuration (`serverconfig.xml` contents).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerInfoEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    /// Mixed-type: the server reports strings, numbers, and booleans here.
    pub value: Value,
}

/// `GET /api/serverinfo`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerInfoResponse {
    pub meta: ResponseMeta,
    pub data: Vec<ServerInfoEntry>,
}

/// In-game clock as reported by the server.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct GameTime {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct ServerStats {
    #[serde(rename = "gameTime")]
    pub game_time: GameTime,
    pub players: i64,
    pub hostiles: i64,
    pub animals: i64,
}

/// `GET /api/serverstats` (and the `/api/getstats` capability probe).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ServerStatsResponse {
    pub meta: ResponseMeta,
    pub data: ServerStats,
}

/// One game preference: current value plus its default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GamePref {
    pub name: String,
    pub value: Value,
    #[serde(rename = "default")]
    pub default_value: Value,
}

/// `GET /api/gameprefs`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct GamePrefsResponse {
    pub meta: ResponseMeta,
    pub data: Vec<GamePref>,
}

/// World position, block coordinates.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Location {
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Location {
    /// Render as a `(x, y, z)` coordinate string.
    pub fn coordinates(&self) -> String {
        format!("({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(default)]
pub struct Kills {
    pub zombies: i64,
    pub players: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BanState {
    #[serde(rename = "banActive")]
    pub active: bool,
    pub reason: String,
    pub until: String,
}

/// A player record as reported by the vanilla web server.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Player {
    #[serde(rename = "entityId")]
    pub entity_id: String,
    pub name: String,
    #[serde(rename = "platformId")]
    pub platform_id: String,
    #[serde(rename = "crossplatformId")]
    pub crossplatform_id: String,
    #[serde(rename = "totalPlayTimeSeconds")]
    pub total_play_time_seconds: i64,
    #[serde(rename = "lastOnline")]
    pub last_online: String,
    pub online: bool,
    pub ip: String,
    pub ping: i64,
    pub position: Location,
    pub level: i64,
    pub health: i64,
    pub stamina: f32,
    pub score: i64,
    pub deaths: i64,
    pub kills: Kills,
    pub banned: BanState,
}

impl Player {
    /// Total playtime as `D:HH:MM:SS`.
    pub fn playtime(&self) -> String {
        format_duration(self.total_play_time_seconds)
    }
}

/// A player record as reported by Alloc's Server Fixes. Same information,
/// different field names and types than the vanilla [`Player`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModPlayer {
    #[serde(rename = "entityid")]
    pub entity_id: i64,
    pub name: String,
    #[serde(rename = "steamid")]
    pub platform_id: String,
    #[serde(rename = "crossplatformid")]
    pub crossplatform_id: String,
    #[serde(rename = "totalplaytime")]
    pub total_play_time_seconds: i64,
    #[serde(rename = "lastonline")]
    pub last_online: String,
    pub online: bool,
    pub ip: String,
    pub ping: i64,
    pub position: Location,
    pub banned: bool,
}

impl ModPlayer {
    /// Total playtime as `D:HH:MM:SS`.
    pub fn playtime(&self) -> String {
        format_duration(self.total_play_time_seconds)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayersData {
    pub players: Vec<Player>,
}

/// `GET /api/player` — players currently online.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlayersResponse {
    pub meta: ResponseMeta,
    pub data: PlayersData,
}

/// `GET /api/getplayerlist` — all players known to the server
/// (Alloc's Server Fixes only; no vanilla envelope).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ModPlayersResponse {
    pub total: i64,
    pub players: Vec<ModPlayer>,
}

/// One server log line.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogEntry {
    /// Consecutive number of this log line.
    pub id: i64,
    pub msg: String,
    /// Severity (Log, Warning, Error, Assert, Exception).
    #[serde(rename = "type")]
    pub kind: String,
    /// Stack trace, populated for Exception entries.
    pub trace: String,
    #[serde(rename = "isotime")]
    pub iso_time: String,
    /// Milliseconds since server start, reported as a string.
    #[serde(rename = "uptime")]
    pub uptime_ms: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogData {
    pub entries: Vec<LogEntry>,
    /// Number of the first line retrieved.
    #[serde(rename = "firstLine")]
    pub first_line: i64,
    /// Number of the next line to request to follow up without gaps.
    #[serde(rename = "lastLine")]
    pub last_line: i64,
}

/// `GET /api/log`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LogResponse {
    pub meta: ResponseMeta,
    pub data: LogData,
}

/// Render a second count as `D:HH:MM:SS`.
pub fn format_duration(total_seconds: i64) -> String {
    let days = total_seconds / 86_400;
    let hours = total_seconds % 86_400 / 3_600;
    let minutes = total_seconds % 3_600 / 60;
    let seconds = total_seconds % 60;
    format!("{days}:{hours:02}:{minutes:02}:{seconds:02}")
}
