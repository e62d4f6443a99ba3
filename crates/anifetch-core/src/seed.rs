//! Fixed, known-good datasets served when live acquisition is unavailable.

use crate::{AcquisitionTask, CanonicalItem, TaskKind};

const LATEST: &[(&str, &str, &str, u32)] = &[
    (
        "百妖谱·洛阳篇",
        "http://css.yhdmtu.xyz/news/2023/10/07/da7f014187a0f.jpg",
        "http://www.iyinghua.com/show/6594.html",
        12,
    ),
    (
        "牧神记",
        "http://css.yhdmtu.xyz/news/2023/10/07/qj207i0a077.jpg",
        "http://www.iyinghua.com/show/6389.html",
        8,
    ),
    (
        "光死去的夏天",
        "http://css.yhdmtu.xyz/news/2023/10/07/20250165.jpg",
        "http://www.iyinghua.com/show/6559.html",
        3,
    ),
    (
        "魔天记",
        "http://css.yhdmtu.xyz/news/2023/10/07/8a1165eec0gy.jpg",
        "http://www.iyinghua.com/show/6524.html",
        15,
    ),
    (
        "公爵千金的家庭教师",
        "http://css.yhdmtu.xyz/news/2023/10/07/20250170.jpg",
        "http://www.iyinghua.com/show/6526.html",
        6,
    ),
];

const SEED_EPISODES: u32 = 12;

/// Title shown when a video address could not be resolved.
pub const UNRESOLVED_VIDEO_TITLE: &str = "解析失败";

/// Source of seed data for each task kind.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeedCatalog;

impl SeedCatalog {
    /// Seed items for `task`, truncated to its limit.
    pub fn items_for(&self, task: &AcquisitionTask) -> Vec<CanonicalItem> {
        let mut items = match task.kind() {
            TaskKind::Latest => Self::latest(),
            TaskKind::Search => Self::search(task.param("q").unwrap_or_default()),
            TaskKind::Episodes => Self::episodes(),
            TaskKind::Video => vec![CanonicalItem::new(UNRESOLVED_VIDEO_TITLE).with_current_episode(1)],
        };
        items.truncate(task.limit());
        items
    }

    pub fn latest() -> Vec<CanonicalItem> {
        LATEST
            .iter()
            .map(|(title, cover, detail, episode)| {
                CanonicalItem::new(*title)
                    .with_cover_image(*cover)
                    .with_detail_url(*detail)
                    .with_episode_info(format!("更新至{episode}集"))
                    .with_current_episode(*episode)
            })
            .collect()
    }

    /// Seed titles containing `query`, or every seed title when none match.
    pub fn search(query: &str) -> Vec<CanonicalItem> {
        let all = Self::latest();
        let query = query.trim();
        if query.is_empty() {
            return all;
        }
        let matching: Vec<_> = all
            .iter()
            .filter(|item| item.title.contains(query))
            .cloned()
            .collect();
        if matching.is_empty() {
            all
        } else {
            matching
        }
    }

    pub fn episodes() -> Vec<CanonicalItem> {
        (1..=SEED_EPISODES)
            .map(|n| CanonicalItem::new(format!("第{n}集")).with_current_episode(n))
            .collect()
    }
}
