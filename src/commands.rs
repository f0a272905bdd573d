//! Command handlers and table rendering.
//!
//! Each handler fetches from [`SdtdClient`] and prints an aligned-column
//! table (or a short confirmation for writes). Formatting only — all
//! protocol behavior lives in the client.

use serde_json::Value;

use crate::client::{ClientError, SdtdClient};
use crate::config::{PlayerCommands, WhitelistCommands};
use crate::types::format_duration;

/// Show the server configuration as a SETTING/TYPE/VALUE table.
pub async fn serverinfo(client: &SdtdClient) -> Result<(), ClientError> {
    let resp = client.server_info().await?;

    let mut rows = vec![header(&["SETTING", "TYPE", "VALUE"])];
    for entry in &resp.data {
        rows.push(vec![
            entry.name.clone(),
            entry.kind.clone(),
            value_to_string(&entry.value),
        ]);
    }
    render_table(&rows);
    Ok(())
}

/// Show current game time and entity counts.
pub async fn serverstats(client: &SdtdClient) -> Result<(), ClientError> {
    let resp = client.server_stats().await?;
    let time = resp.data.game_time;

    println!(
        "server time: {} days, {:02}:{:02}",
        time.days, time.hours, time.minutes
    );
    println!("players: {}", resp.data.players);
    println!("animals: {}", resp.data.animals);
    println!("zombies: {}", resp.data.hostiles);
    Ok(())
}

/// Show game preferences with their defaults.
pub async fn gameprefs(client: &SdtdClient) -> Result<(), ClientError> {
    let resp = client.game_prefs().await?;

    let mut rows = vec![header(&["PREFERENCE", "VALUE", "DEFAULT"])];
    for pref in &resp.data {
        rows.push(vec![
            pref.name.clone(),
            value_to_string(&pref.value),
            value_to_string(&pref.default_value),
        ]);
    }
    render_table(&rows);
    Ok(())
}

/// Player subcommands.
pub async fn player(client: &SdtdClient, command: &PlayerCommands) -> Result<(), ClientError> {
    match command {
        PlayerCommands::List { offline } => player_list(client, *offline).await,
    }
}

/// List players: currently-online via the vanilla endpoint, or all known
/// players via Alloc's Server Fixes when `--offline` is given.
async fn player_list(client: &SdtdClient, offline: bool) -> Result<(), ClientError> {
    let mut rows = vec![header(&[
        "NAME",
        "ENTITY ID",
        "PLATFORM ID",
        "ONLINE",
        "LAST ONLINE",
        "PLAYTIME",
        "LOCATION",
        "PING (MS)",
    ])];

    if offline {
        let resp = client.all_players().await?;
        for player in &resp.players {
            rows.push(vec![
                player.name.clone(),
                player.entity_id.to_string(),
                player.platform_id.clone(),
                player.online.to_string(),
                player.last_online.clone(),
                player.playtime(),
                player.position.coordinates(),
                player.ping.to_string(),
            ]);
        }
    } else {
        let resp = client.online_players().await?;
        for player in &resp.data.players {
            rows.push(vec![
                player.name.clone(),
                player.entity_id.clone(),
                player.platform_id.clone(),
                player.online.to_string(),
                player.last_online.clone(),
                player.playtime(),
                player.position.coordinates(),
                player.ping.to_string(),
            ]);
        }
    }

    render_table(&rows);
    Ok(())
}

/// Show a window of the server log.
pub async fn log(
    client: &SdtdClient,
    count: Option<i64>,
    first_line: Option<i64>,
) -> Result<(), ClientError> {
    let resp = client.log(count, first_line).await?;

    let mut rows = vec![header(&["TIMESTAMP", "TIME SINCE BOOT", "SEV", "MESSAGE"])];
    for entry in &resp.data.entries {
        // Uptime arrives as a millisecond count in a string.
        let uptime = match entry.uptime_ms.parse::<i64>() {
            Ok(ms) => format_duration(ms / 1000),
            Err(_) => entry.uptime_ms.clone(),
        };
        rows.push(vec![
            entry.iso_time.clone(),
            uptime,
            entry.kind.clone(),
            entry.msg.clone(),
        ]);
    }
    render_table(&rows);
    Ok(())
}

/// Whitelist subcommands.
pub async fn whitelist(
    client: &SdtdClient,
    command: &WhitelistCommands,
) -> Result<(), ClientError> {
    match command {
        WhitelistCommands::Adduser { name, id } => {
            client.add_whitelist_user(id, name).await?;
            println!("Added user '{name}' ({id}) to the whitelist.");
        }
        WhitelistCommands::Deleteuser { id } => {
            client.remove_whitelist_user(id).await?;
            println!("Deleted user {id} from the whitelist.");
        }
    }
    Ok(())
}

fn header(columns: &[&str]) -> Vec<String> {
    columns.iter().map(|c| (*c).to_string()).collect()
}

/// Render a JSON value for a table cell without quoting strings.
fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Print rows as space-aligned columns sized to their widest cell. The last
/// column is left ragged.
fn render_table(rows: &[Vec<String>]) {
    let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut widths = vec![0usize; columns];
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    for row in rows {
        let mut line = String::new();
        for (i, cell) in row.iter().enumerate() {
            if i + 1 == row.len() {
                line.push_str(cell);
            } else {
                line.push_str(&format!("{cell:<width$}  ", width = widths[i]));
            }
        }
        println!("{}", line.trim_end());
    }
}
