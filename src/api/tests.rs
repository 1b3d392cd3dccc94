use super::client::EmbyApi;
use super::errors::ApiError;
use crate::models::{ConnectionStatus, ItemKind, PlayMethod, ServerRecord};
use mockito::Matcher;
use serde_json::json;

fn test_api(server: &mockito::Server) -> EmbyApi {
    EmbyApi::new(
        server.url(),
        "test_token".to_string(),
        "test_user_id".to_string(),
    )
}

fn test_record(url: &str, token: Option<&str>) -> ServerRecord {
    let parsed = url::Url::parse(url).unwrap();
    ServerRecord {
        id: "machine-1".to_string(),
        name: "Test Server".to_string(),
        scheme: parsed.scheme().to_string(),
        host: parsed.host_str().unwrap().to_string(),
        port: parsed.port().unwrap_or(8096),
        access_token: token.map(|t| t.to_string()),
    }
}

fn movie_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "Id": id,
        "Name": name,
        "Type": "Movie",
        "ProductionYear": 2015,
        "CommunityRating": 7.5,
        "RunTimeTicks": 72_000_000_000u64,
        "UserData": { "PlaybackPositionTicks": 0 },
        "ImageTags": { "Primary": "tag-1" },
        "BackdropImageTags": ["bd-1"],
        "MediaSources": [
            {
                "Id": "source-1",
                "SupportsDirectPlay": true,
                "SupportsDirectStream": true,
                "MediaStreams": [
                    { "Index": 0, "Type": "Video" },
                    { "Index": 1, "Type": "Audio" },
                    {
                        "Index": 2,
                        "Type": "Subtitle",
                        "IsExternal": true,
                        "IsTextSubtitleStream": true
                    }
                ]
            }
        ]
    })
}

#[tokio::test]
async fn test_get_item_parses_movie() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/Users/test_user_id/Items/movie-1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(movie_json("movie-1", "Test Movie").to_string())
        .create_async()
        .await;

    let api = test_api(&server);
    let item = api.get_item("movie-1").await.unwrap();

    assert_eq!(item.id, "movie-1");
    assert_eq!(item.name, "Test Movie");
    assert_eq!(item.kind, ItemKind::Movie);
    assert_eq!(item.run_time_ticks, 72_000_000_000);
    assert_eq!(item.resume_ticks, 0);
    assert_eq!(item.media_sources.len(), 1);
    assert_eq!(
        item.artwork.primary.as_deref(),
        Some(format!("{}/Items/movie-1/Images/Primary?tag=tag-1", server.url()).as_str())
    );
}

#[tokio::test]
async fn test_get_item_parses_episode_fields() {
    let mut server = mockito::Server::new_async().await;
    let body = json!({
        "Id": "ep-1",
        "Name": "Pilot",
        "Type": "Episode",
        "SeriesId": "series-9",
        "SeriesName": "Test Show",
        "ParentIndexNumber": 1,
        "IndexNumber": 3,
        "RunTimeTicks": 18_000_000_000u64,
        "UserData": { "PlaybackPositionTicks": 9_000_000_000u64 }
    });
    let _mock = server
        .mock("GET", "/Users/test_user_id/Items/ep-1")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.to_string())
        .create_async()
        .await;

    let api = test_api(&server);
    let item = api.get_item("ep-1").await.unwrap();

    assert_eq!(
        item.kind,
        ItemKind::Episode {
            series_id: Some("series-9".to_string()),
            series_name: Some("Test Show".to_string()),
            season: Some(1),
            episode: Some(3),
        }
    );
    assert_eq!(item.refresh_id(), "series-9");
    assert_eq!(item.resume_secs(), 900.0);
}

#[tokio::test]
async fn test_get_intros_honors_record_count() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/Users/test_user_id/Items/movie-1/Intros")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "TotalRecordCount": 0,
                "Items": [movie_json("stale-intro", "Should Be Ignored")]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = test_api(&server);
    let intros = api.get_intros("movie-1").await.unwrap();
    assert!(intros.is_empty());
}

#[tokio::test]
async fn test_get_intros_preserves_server_order() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/Users/test_user_id/Items/movie-1/Intros")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "TotalRecordCount": 2,
                "Items": [
                    movie_json("intro-a", "Intro A"),
                    movie_json("intro-b", "Intro B")
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = test_api(&server);
    let intros = api.get_intros("movie-1").await.unwrap();

    let ids: Vec<&str> = intros.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["intro-a", "intro-b"]);
}

#[tokio::test]
async fn test_get_additional_parts() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/Videos/movie-1/AdditionalParts")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "TotalRecordCount": 1,
                "Items": [movie_json("movie-1-pt2", "Test Movie Part 2")]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = test_api(&server);
    let parts = api.get_additional_parts("movie-1").await.unwrap();

    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].id, "movie-1-pt2");
}

#[tokio::test]
async fn test_get_playback_info_flags() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/Items/movie-1/PlaybackInfo")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "MediaSources": [
                    {
                        "Id": "source-1",
                        "Path": "/mnt/media/movie.mkv",
                        "Protocol": "File",
                        "SupportsDirectPlay": false,
                        "SupportsDirectStream": true,
                        "MediaStreams": []
                    }
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let api = test_api(&server);
    let sources = api.get_playback_info("movie-1").await.unwrap();

    assert_eq!(sources.len(), 1);
    assert!(!sources[0].supports_direct_play);
    assert!(sources[0].supports_direct_stream);
    assert_eq!(sources[0].path.as_deref(), Some("/mnt/media/movie.mkv"));
}

#[tokio::test]
async fn test_authenticate_success() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/Users/AuthenticateByName")
        .with_status(200)
        .with_body(
            json!({
                "User": { "Id": "user-1", "Name": "kodi" },
                "AccessToken": "secret-token"
            })
            .to_string(),
        )
        .create_async()
        .await;

    let auth = EmbyApi::authenticate(&server.url(), "kodi", "hunter2")
        .await
        .unwrap();

    assert_eq!(auth.user.id, "user-1");
    assert_eq!(auth.access_token, "secret-token");
}

#[tokio::test]
async fn test_authenticate_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/Users/AuthenticateByName")
        .with_status(401)
        .with_body("Invalid user or password")
        .create_async()
        .await;

    let result = EmbyApi::authenticate(&server.url(), "kodi", "wrong").await;
    assert!(matches!(
        result,
        Err(ApiError::Authentication { status: 401, .. })
    ));
}

#[tokio::test]
async fn test_get_public_users() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/Users/Public")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!([
                { "Name": "kodi", "HasPassword": false },
                { "Name": "admin", "HasPassword": true }
            ])
            .to_string(),
        )
        .create_async()
        .await;

    let users = EmbyApi::get_public_users(&server.url()).await.unwrap();

    assert_eq!(users.len(), 2);
    assert_eq!(users[0].display_name(), "kodi");
    assert_eq!(users[1].display_name(), "admin (secure)");
}

#[tokio::test]
async fn test_check_connection_ok() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/System/Info")
        .with_status(200)
        .with_body(json!({ "ServerName": "Den" }).to_string())
        .create_async()
        .await;

    let record = test_record(&server.url(), Some("token"));
    assert_eq!(
        EmbyApi::check_connection(&record).await,
        ConnectionStatus::Ok
    );
}

#[tokio::test]
async fn test_check_connection_unauthorized() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/System/Info")
        .with_status(401)
        .create_async()
        .await;

    let record = test_record(&server.url(), Some("stale-token"));
    assert_eq!(
        EmbyApi::check_connection(&record).await,
        ConnectionStatus::Unauthorized
    );
}

#[tokio::test]
async fn test_check_connection_unreachable() {
    // Nothing listens on this port.
    let record = ServerRecord {
        id: "gone".to_string(),
        name: "Gone".to_string(),
        scheme: "http".to_string(),
        host: "127.0.0.1".to_string(),
        port: 1,
        access_token: None,
    };
    assert_eq!(
        EmbyApi::check_connection(&record).await,
        ConnectionStatus::Unreachable
    );
}

#[test]
fn test_stream_url_builders() {
    let api = EmbyApi::new(
        "http://server:8096".to_string(),
        "key".to_string(),
        "user-1".to_string(),
    );

    assert_eq!(
        api.direct_play_url("42", "src-1"),
        "http://server:8096/Videos/42/stream?Static=true&MediaSourceId=src-1&api_key=key"
    );
    assert_eq!(
        api.direct_stream_url("42", "src-1"),
        "http://server:8096/Videos/42/stream?MediaSourceId=src-1&api_key=key"
    );
    assert_eq!(
        api.transcode_url("42", "src-1"),
        "http://server:8096/Videos/42/main.m3u8?MediaSourceId=src-1&api_key=key"
    );
    assert_eq!(
        api.subtitle_url("42", 2),
        "http://server:8096/Videos/42/42/Subtitles/2/Stream.srt"
    );
}

#[test]
fn test_play_method_display() {
    assert_eq!(PlayMethod::DirectPlay.to_string(), "DirectPlay");
    assert_eq!(PlayMethod::Transcode.to_string(), "Transcode");
}
