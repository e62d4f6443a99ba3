//! Maps the scrapers' heterogeneous payload shapes onto [`CanonicalItem`].
//!
//! Scraper variants disagree on where the item collection lives (`data`,
//! `items`, `episodes`, `anime_info.episodes`), whether it is a list or a
//! single object, and what each field is called. All of that is absorbed
//! here so nothing downstream looks up alternate keys.

use serde_json::{Map, Value};

use crate::CanonicalItem;

const COLLECTION_KEYS: &[&str] = &["data", "items", "episodes"];
const TITLE_KEYS: &[&str] = &["title", "name"];
const COVER_KEYS: &[&str] = &["cover_image", "cover", "coverImage", "image"];
const DETAIL_KEYS: &[&str] = &["detail_url", "url", "video_url", "link"];
const EPISODE_INFO_KEYS: &[&str] = &["episode_info", "status"];
/// Item-level episode text in search results; a collection key at the top level.
const EPISODE_TEXT_KEY: &str = "episodes";
const EPISODE_KEYS: &[&str] = &["current_episode", "episode"];
const SOURCE_KEYS: &[&str] = &["source_url", "anime_url"];

/// Extract every item of the payload, in payload order.
pub fn collect_items(payload: &Value) -> Vec<CanonicalItem> {
    match collection(payload) {
        Some(Value::Array(entries)) => entries.iter().map(item_from_value).collect(),
        Some(entry @ Value::Object(_)) => vec![item_from_value(entry)],
        _ => Vec::new(),
    }
}

/// Title of the show a collection belongs to, if the payload names one.
pub fn collection_title(payload: &Value) -> Option<String> {
    string_field(payload, &["anime_title"]).or_else(|| {
        payload
            .get("anime_info")
            .and_then(|info| string_field(info, TITLE_KEYS))
    })
}

/// Page the scraper read from, if the payload reports it.
pub fn source_url(payload: &Value) -> Option<String> {
    string_field(payload, SOURCE_KEYS)
}

/// Map one payload entry to a canonical item, defaulting every missing field.
pub fn item_from_value(entry: &Value) -> CanonicalItem {
    let Value::Object(fields) = entry else {
        return match entry {
            Value::String(title) => CanonicalItem::new(title.as_str()),
            _ => CanonicalItem::new(""),
        };
    };

    let mut item = CanonicalItem::new(first_string(fields, TITLE_KEYS).unwrap_or_default());
    if let Some(cover) = first_string(fields, COVER_KEYS) {
        item = item.with_cover_image(cover);
    }
    if let Some(detail) = first_string(fields, DETAIL_KEYS) {
        item = item.with_detail_url(detail);
    }
    let info = first_string(fields, EPISODE_INFO_KEYS).or_else(|| {
        fields
            .get(EPISODE_TEXT_KEY)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|text| !text.is_empty())
            .map(str::to_string)
    });
    if let Some(info) = info {
        item = item.with_episode_info(info);
    }

    let episode = first_episode(fields)
        .or_else(|| item.episode_info.as_deref().and_then(episode_from_text));
    if let Some(episode) = episode {
        item = item.with_current_episode(episode);
    }
    item
}

/// First run of ASCII digits in `text`, e.g. `更新至12集` -> 12.
pub fn episode_from_text(text: &str) -> Option<u32> {
    let start = text.find(|c: char| c.is_ascii_digit())?;
    let digits: String = text[start..]
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok()
}

fn collection(payload: &Value) -> Option<&Value> {
    COLLECTION_KEYS
        .iter()
        .filter_map(|key| payload.get(*key))
        .find(|value| !value.is_null())
        .or_else(|| {
            payload
                .get("anime_info")
                .and_then(|info| info.get("episodes"))
        })
}

fn string_field(value: &Value, keys: &[&str]) -> Option<String> {
    value.as_object().and_then(|fields| first_string(fields, keys))
}

fn first_string(fields: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match fields.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn first_episode(fields: &Map<String, Value>) -> Option<u32> {
    EPISODE_KEYS.iter().find_map(|key| match fields.get(*key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::UNKNOWN_TITLE;
    use serde_json::json;

    #[test]
    fn test_latest_update_entry() {
        let item = item_from_value(&json!({
            "title": "百妖谱·洛阳篇",
            "cover_image": "http://css.yhdmtu.xyz/news/2023/10/07/da7f014187a0f.jpg",
            "detail_url": "http://www.iyinghua.com/show/6594.html",
            "episode_info": "更新至12集",
            "current_episode": 12
        }));
        assert_eq!(item.title, "百妖谱·洛阳篇");
        assert_eq!(item.current_episode, Some(12));
        assert_eq!(
            item.detail_url.as_deref(),
            Some("http://www.iyinghua.com/show/6594.html")
        );
    }

    #[test]
    fn test_episode_entry_aliases() {
        let item = item_from_value(&json!({
            "episode": 3,
            "title": "第3集",
            "url": "http://www.iyinghua.com/v/6594-3.html",
            "relative_url": "/v/6594-3.html"
        }));
        assert_eq!(item.current_episode, Some(3));
        assert_eq!(
            item.detail_url.as_deref(),
            Some("http://www.iyinghua.com/v/6594-3.html")
        );
    }

    #[test]
    fn test_episode_inferred_from_info_text() {
        let item = item_from_value(&json!({"title": "牧神记", "episode_info": "更新至8集"}));
        assert_eq!(item.current_episode, Some(8));
    }

    #[test]
    fn test_search_entry_episode_text() {
        let item = item_from_value(&json!({
            "title": "牧神记",
            "url": "http://www.iyinghua.com/show/6235.html",
            "image": "http://css.yhdmtu.xyz/news/2024/10/29/mushenji.jpg",
            "episodes": "更新至8集",
            "description": "..."
        }));
        assert_eq!(item.episode_info.as_deref(), Some("更新至8集"));
        assert_eq!(item.current_episode, Some(8));

        let item = item_from_value(&json!({"title": "牧神记", "episodes": [{"episode": 1}]}));
        assert_eq!(item.episode_info, None);
        assert_eq!(item.current_episode, None);
    }

    #[test]
    fn test_missing_fields_default() {
        let item = item_from_value(&json!({"anime_type": "TV"}));
        assert_eq!(item.title, UNKNOWN_TITLE);
        assert_eq!(item.cover_image, None);
        assert_eq!(item.current_episode, None);

        assert_eq!(item_from_value(&json!(null)).title, UNKNOWN_TITLE);
        assert_eq!(item_from_value(&json!("魔天记")).title, "魔天记");
    }

    #[test]
    fn test_video_payload_is_single_object() {
        let payload = json!({
            "success": true,
            "data": {
                "video_url": "https://cdn.example/abc",
                "title": "第1集",
                "current_episode": 1,
                "source_url": "http://www.iyinghua.com/v/6543-1.html"
            }
        });
        let items = collect_items(&payload);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].detail_url.as_deref(), Some("https://cdn.example/abc"));
    }

    #[test]
    fn test_anime_info_shape() {
        let payload = json!({
            "success": true,
            "anime_info": {
                "title": "光死去的夏天",
                "episodes": [{"episode": 1, "title": "第1集"}, {"episode": 2, "title": "第2集"}]
            }
        });
        assert_eq!(collect_items(&payload).len(), 2);
        assert_eq!(collection_title(&payload).as_deref(), Some("光死去的夏天"));
    }

    #[test]
    fn test_null_data_falls_through_to_items() {
        let payload = json!({"data": null, "items": [{"title": "X"}]});
        assert_eq!(collect_items(&payload).len(), 1);
    }

    #[test]
    fn test_episode_from_text() {
        assert_eq!(episode_from_text("更新至12集"), Some(12));
        assert_eq!(episode_from_text("第03集"), Some(3));
        assert_eq!(episode_from_text("完结"), None);
    }
}
