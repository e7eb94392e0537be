// src/services/pages.rs

//! Page parsers for the ranking site.
//!
//! Pure functions over page source. Parsed documents never outlive the call,
//! so nothing here is held across an `.await`.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::MapRecord;
use crate::utils::{has_identity_marker, normalize_time};

/// Marker element the results table shows while it has no rows.
pub const EMPTY_TABLE_SELECTOR: &str = ".dataTables_empty";

const HISTORY_ROW_SELECTOR: &str = "#history tr";
const MAP_LINK_SELECTOR: &str = ".hover-preview";
const UID_ATTR: &str = "data-uid";
const PLAYER_NAME_SELECTOR: &str = "h4.text-center.padding-top";
const NAME_SUFFIX: &str = "on All Editions";

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Whether the results table is still showing its empty placeholder.
pub fn has_empty_table(source: &str) -> Result<bool> {
    let selector = parse_selector(EMPTY_TABLE_SELECTOR)?;
    Ok(Html::parse_document(source).select(&selector).next().is_some())
}

/// Whether the page carries the page-size `<select name=...>` control.
pub fn has_page_size_control(source: &str, control: &str) -> Result<bool> {
    let selector = parse_selector(&format!("select[name=\"{control}\"]"))?;
    Ok(Html::parse_document(source).select(&selector).next().is_some())
}

/// Read the profile table: one record per row, in rendered order.
///
/// The map name and uid come from the row's preview link, the rank from its
/// third cell. Rows missing any of them are skipped.
pub fn parse_profile_rows(source: &str) -> Result<Vec<MapRecord>> {
    let row_sel = parse_selector(HISTORY_ROW_SELECTOR)?;
    let link_sel = parse_selector(MAP_LINK_SELECTOR)?;
    let cell_sel = parse_selector("td")?;

    let document = Html::parse_document(source);
    let mut records = Vec::new();
    for row in document.select(&row_sel) {
        let Some(link) = row.select(&link_sel).next() else {
            continue;
        };
        let Some(rank_cell) = row.select(&cell_sel).nth(2) else {
            continue;
        };

        let name = text_of(&link);
        let Some(uid) = link.value().attr(UID_ATTR) else {
            log::debug!("Row for {name:?} has no {UID_ATTR}, skipping");
            continue;
        };
        if name.is_empty() {
            continue;
        }
        records.push(MapRecord::new(name, uid.trim(), text_of(&rank_cell)));
    }
    Ok(records)
}

/// Find the player's normalized time in a map's record table.
///
/// The player's row is the first with at least three cells whose second cell
/// links to `pid=<pid>`.
pub fn find_player_time(source: &str, pid: &str) -> Result<Option<String>> {
    let row_sel = parse_selector("tr")?;
    let cell_sel = parse_selector("td")?;

    let document = Html::parse_document(source);
    for row in document.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < 3 {
            continue;
        }
        if has_identity_marker(&cells[1].inner_html(), pid) {
            return Ok(Some(normalize_time(&text_of(&cells[2]))));
        }
    }
    Ok(None)
}

/// Display name from a profile page header, without the edition suffix.
pub fn parse_player_name(source: &str) -> Result<Option<String>> {
    let selector = parse_selector(PLAYER_NAME_SELECTOR)?;
    let document = Html::parse_document(source);
    let Some(header) = document.select(&selector).next() else {
        return Ok(None);
    };

    // Styled names are split over spans; glue the pieces back without spaces
    let full: String = header.text().map(str::trim).collect();
    let name = full.split(NAME_SUFFIX).next().unwrap_or_default().trim();
    Ok((!name.is_empty()).then(|| name.to_string()))
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal copies of the site's markup.

    /// Profile page with one table row per `(name, uid, rank)`.
    pub fn profile_page(player: &str, rows: &[(&str, &str, &str)]) -> String {
        let body: String = rows
            .iter()
            .enumerate()
            .map(|(i, (name, uid, rank))| {
                format!(
                    "<tr><td>{}</td><td><a class=\"hover-preview\" data-uid=\"{uid}\" href=\"maps.php?uid={uid}\">{name}</a></td><td>{rank}</td><td>2024-01-01</td></tr>",
                    i + 1
                )
            })
            .collect();
        format!(
            "<html><body><h4 class=\"text-center padding-top\">{player} on All Editions</h4>\
             <table id=\"history\"><thead><tr><th>#</th><th>Map</th><th>Rank</th><th>Date</th></tr></thead>\
             <tbody>{body}</tbody></table></body></html>"
        )
    }

    /// Profile page whose table never finished loading.
    pub fn empty_profile_page() -> String {
        "<html><body><table id=\"history\"><tbody><tr><td class=\"dataTables_empty\">No data</td></tr></tbody></table></body></html>".to_string()
    }

    /// Map page with one row per `(pid, time)`.
    pub fn map_page(rows: &[(&str, &str)], with_control: bool) -> String {
        let control = if with_control {
            "<select name=\"maps_length\"><option value=\"10\">10</option><option value=\"-1\">All</option></select>"
        } else {
            ""
        };
        let body: String = rows
            .iter()
            .enumerate()
            .map(|(i, (pid, time))| {
                format!(
                    "<tr><td>{}</td><td><a href=\"players.php?pid={pid}&amp;edition=0\">Player {pid}</a></td><td>{time}</td></tr>",
                    i + 1
                )
            })
            .collect();
        format!("<html><body>{control}<table id=\"maps\"><tbody>{body}</tbody></table></body></html>")
    }
}
