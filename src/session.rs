use std::collections::HashMap;

use crate::models::{ItemKind, MediaItem, PlayMethod, ServerRecord};

/// Everything later stages need to know about a resolved playback URL.
#[derive(Debug, Clone)]
pub struct UrlProperties {
    pub method: PlayMethod,
    pub run_time_ticks: u64,
    pub item_id: String,
    /// Series id for episodes, item id otherwise.
    pub refresh_id: String,
    pub kind: ItemKind,
    /// Local subtitle slot -> source stream index.
    pub subtitle_mapping: HashMap<usize, u32>,
}

/// Per-request playback context: the active server and user plus the
/// properties recorded against each resolved URL. Created when a playback
/// request starts and discarded when it ends; single writer per key.
#[derive(Debug)]
pub struct PlaybackSession {
    server: ServerRecord,
    user_id: String,
    props: HashMap<String, UrlProperties>,
}

impl PlaybackSession {
    pub fn new(server: ServerRecord, user_id: impl Into<String>) -> Self {
        Self {
            server,
            user_id: user_id.into(),
            props: HashMap::new(),
        }
    }

    pub fn server(&self) -> &ServerRecord {
        &self.server
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Record the chosen method and item bookkeeping against a URL key.
    /// Re-resolving the same URL replaces the previous record.
    pub fn record(&mut self, url: &str, item: &MediaItem, method: PlayMethod) {
        self.props.insert(
            url.to_string(),
            UrlProperties {
                method,
                run_time_ticks: item.run_time_ticks,
                item_id: item.id.clone(),
                refresh_id: item.refresh_id(),
                kind: item.kind.clone(),
                subtitle_mapping: HashMap::new(),
            },
        );
    }

    /// Tag a composite URL with the primary item's properties so lookups by
    /// the composite key behave like lookups by the primary segment.
    pub fn record_composite(&mut self, composite_url: &str, item: &MediaItem, method: PlayMethod) {
        self.record(composite_url, item, method);
    }

    pub fn method_for(&self, url: &str) -> Option<PlayMethod> {
        self.props.get(url).map(|p| p.method)
    }

    pub fn properties(&self, url: &str) -> Option<&UrlProperties> {
        self.props.get(url)
    }

    pub fn set_subtitle_mapping(&mut self, url: &str, mapping: HashMap<usize, u32>) {
        if let Some(props) = self.props.get_mut(url) {
            props.subtitle_mapping = mapping;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Artwork;

    fn server() -> ServerRecord {
        ServerRecord {
            id: "machine-1".to_string(),
            name: "Test".to_string(),
            scheme: "http".to_string(),
            host: "localhost".to_string(),
            port: 8096,
            access_token: Some("token".to_string()),
        }
    }

    fn episode(id: &str, series_id: &str) -> MediaItem {
        MediaItem {
            id: id.to_string(),
            name: "Pilot".to_string(),
            kind: ItemKind::Episode {
                series_id: Some(series_id.to_string()),
                series_name: Some("Show".to_string()),
                season: Some(1),
                episode: Some(1),
            },
            run_time_ticks: 600_000_000,
            resume_ticks: 0,
            part_count: 0,
            media_sources: Vec::new(),
            overview: None,
            year: None,
            community_rating: None,
            premiere_date: None,
            artwork: Artwork::default(),
        }
    }

    #[test]
    fn test_record_and_lookup() {
        let mut session = PlaybackSession::new(server(), "user-1");
        let item = episode("ep-1", "series-9");

        session.record("http://s/ep-1", &item, PlayMethod::DirectStream);

        let props = session.properties("http://s/ep-1").unwrap();
        assert_eq!(props.method, PlayMethod::DirectStream);
        assert_eq!(props.item_id, "ep-1");
        assert_eq!(props.refresh_id, "series-9");
        assert_eq!(props.run_time_ticks, 600_000_000);
    }

    #[test]
    fn test_re_resolution_replaces_record() {
        let mut session = PlaybackSession::new(server(), "user-1");
        let item = episode("ep-1", "series-9");

        session.record("http://s/ep-1", &item, PlayMethod::Transcode);
        session.record("http://s/ep-1", &item, PlayMethod::DirectPlay);

        assert_eq!(
            session.method_for("http://s/ep-1"),
            Some(PlayMethod::DirectPlay)
        );
    }

    #[test]
    fn test_subtitle_mapping_attaches_to_existing_key() {
        let mut session = PlaybackSession::new(server(), "user-1");
        let item = episode("ep-1", "series-9");
        session.record("http://s/ep-1", &item, PlayMethod::DirectStream);

        let mut mapping = HashMap::new();
        mapping.insert(0, 2u32);
        session.set_subtitle_mapping("http://s/ep-1", mapping);

        let props = session.properties("http://s/ep-1").unwrap();
        assert_eq!(props.subtitle_mapping.get(&0), Some(&2));
    }
}
