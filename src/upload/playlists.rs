//! Playlist fan-out: add an uploaded video to every channel playlist.

use serde_json::{json, Value};

use super::client::{UploadClient, UploadError, UploadResult};

/// One playlist on the channel.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistRef {
    pub id: String,
    pub title: String,
}

impl<'a> UploadClient<'a> {
    /// List the channel's playlists (up to the configured maximum).
    pub fn list_playlists(&self, access_token: &str) -> UploadResult<Vec<PlaylistRef>> {
        let url = format!(
            "{}/playlists?part=snippet&mine=true&maxResults={}",
            self.settings().api_url,
            self.settings().max_playlists
        );

        let response = self.http().get(&url).bearer_auth(access_token).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        let json: Value = response.json()?;
        Ok(parse_playlists(&json))
    }

    /// Insert a video into one playlist.
    pub fn insert_playlist_item(
        &self,
        access_token: &str,
        playlist_id: &str,
        video_id: &str,
    ) -> UploadResult<()> {
        let url = format!("{}/playlistItems?part=snippet", self.settings().api_url);

        let body = json!({
            "snippet": {
                "playlistId": playlist_id,
                "resourceId": {
                    "kind": "youtube#video",
                    "videoId": video_id,
                }
            }
        });

        let response = self
            .http()
            .post(&url)
            .bearer_auth(access_token)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(UploadError::BadStatus {
                status: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    /// Add a video to every playlist on the channel.
    ///
    /// Individual playlist failures (duplicates, limits) are warned and
    /// skipped so the rest of the fan-out continues. Returns how many
    /// inserts succeeded.
    pub fn add_to_all_playlists(&self, access_token: &str, video_id: &str) -> UploadResult<usize> {
        let playlists = self.list_playlists(access_token)?;

        if playlists.is_empty() {
            tracing::info!("no playlists found for fan-out");
            return Ok(0);
        }

        let mut added = 0;
        for playlist in &playlists {
            match self.insert_playlist_item(access_token, &playlist.id, video_id) {
                Ok(()) => {
                    tracing::info!(playlist = %playlist.title, video_id, "added to playlist");
                    added += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        playlist = %playlist.title,
                        "failed to add video to playlist: {}",
                        e
                    );
                }
            }
        }

        Ok(added)
    }
}

/// Parse the playlist list response.
fn parse_playlists(json: &Value) -> Vec<PlaylistRef> {
    json.get("items")
        .and_then(|i| i.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| {
                    let id = item.get("id")?.as_str()?.to_string();
                    let title = item
                        .get("snippet")
                        .and_then(|s| s.get("title"))
                        .and_then(|t| t.as_str())
                        .unwrap_or("")
                        .to_string();
                    Some(PlaylistRef { id, title })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_playlist_items() {
        let json: Value = serde_json::from_str(
            r#"{"items":[
                {"id":"PL1","snippet":{"title":"Sleep Sounds"}},
                {"id":"PL2","snippet":{"title":"For Newborns"}}
            ]}"#,
        )
        .unwrap();

        let playlists = parse_playlists(&json);
        assert_eq!(playlists.len(), 2);
        assert_eq!(playlists[0].id, "PL1");
        assert_eq!(playlists[1].title, "For Newborns");
    }

    #[test]
    fn empty_response_parses_to_no_playlists() {
        let json: Value = serde_json::from_str("{}").unwrap();
        assert!(parse_playlists(&json).is_empty());
    }

    #[test]
    fn items_without_id_are_skipped() {
        let json: Value = serde_json::from_str(
            r#"{"items":[{"snippet":{"title":"No Id"}},{"id":"PL9","snippet":{"title":"Ok"}}]}"#,
        )
        .unwrap();

        let playlists = parse_playlists(&json);
        assert_eq!(playlists.len(), 1);
        assert_eq!(playlists[0].id, "PL9");
    }
}
