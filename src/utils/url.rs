// src/utils/url.rs

//! Ranking site endpoints.

use url::Url;

use crate::error::Result;
use crate::models::RemoteConfig;

/// Profile view for a player: the table of every map they have cleared.
///
/// # Examples
/// ```
/// use kk_dashboard::models::RemoteConfig;
/// use kk_dashboard::utils::url::profile_url;
///
/// let url = profile_url(&RemoteConfig::default(), "4821").unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://kackiestkacky.com/hunting/editions/players.php?pid=4821&edition=0"
/// );
/// ```
pub fn profile_url(remote: &RemoteConfig, pid: &str) -> Result<Url> {
    let mut url = remote.base()?.join("players.php")?;
    url.query_pairs_mut()
        .append_pair("pid", pid)
        .append_pair("edition", &remote.edition.to_string());
    Ok(url)
}

/// Detail view for one map: every player's record on it.
pub fn map_url(remote: &RemoteConfig, uid: &str) -> Result<Url> {
    let mut url = remote.base()?.join("maps.php")?;
    url.query_pairs_mut().append_pair("uid", uid);
    Ok(url)
}

/// Public dashboard sheet for a sheet id.
pub fn sheet_url(sheet_id: &str) -> Result<Url> {
    let base = Url::parse("https://docs.google.com/spreadsheets/d/")?;
    Ok(base.join(sheet_id)?)
}
