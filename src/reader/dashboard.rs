//! Dashboard view model: a user's feeds plus their newest articles.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::QueryBuilder;

use super::subscription::SubscriptionRepository;
use crate::db::{parse_datetime, Db, DbPool};
use crate::feed::Feed;
use crate::{FoloError, Result};

/// Articles returned when no limit is given.
pub const DEFAULT_DASHBOARD_LIMIT: u32 = 100;

/// Upper bound on the article limit.
pub const MAX_DASHBOARD_LIMIT: u32 = 500;

/// An article as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardArticle {
    /// Article ID.
    pub id: i64,
    /// Owning feed ID.
    pub feed_id: i64,
    /// Owning feed title.
    pub feed_title: String,
    /// Title.
    pub title: String,
    /// Content.
    pub content: String,
    /// Link.
    pub url: String,
    /// Publish time.
    pub published_at: DateTime<Utc>,
    /// Read by the requesting user.
    pub is_read: bool,
    /// Saved by the requesting user.
    pub is_saved: bool,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct DashboardArticleRow {
    id: i64,
    feed_id: i64,
    feed_title: String,
    title: String,
    content: String,
    url: String,
    published_at: String,
    is_read: bool,
    is_saved: bool,
}

impl From<DashboardArticleRow> for DashboardArticle {
    fn from(row: DashboardArticleRow) -> Self {
        DashboardArticle {
            id: row.id,
            feed_id: row.feed_id,
            feed_title: row.feed_title,
            title: row.title,
            content: row.content,
            url: row.url,
            published_at: parse_datetime(&row.published_at).unwrap_or_else(Utc::now),
            is_read: row.is_read,
            is_saved: row.is_saved,
        }
    }
}

/// Dashboard contents.
#[derive(Debug, Clone, Serialize)]
pub struct Dashboard {
    /// Subscribed feeds, ordered by title.
    pub feeds: Vec<Feed>,
    /// Newest articles first.
    pub articles: Vec<DashboardArticle>,
    /// The feed filter, if one was applied.
    pub current_feed_id: Option<i64>,
}

/// Builder for a user's dashboard.
#[derive(Debug, Clone)]
pub struct DashboardQuery {
    user_id: String,
    feed_id: Option<i64>,
    saved_only: bool,
    unread_only: bool,
    limit: u32,
}

impl DashboardQuery {
    /// Start a query for `user_id`.
    pub fn for_user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            feed_id: None,
            saved_only: false,
            unread_only: false,
            limit: DEFAULT_DASHBOARD_LIMIT,
        }
    }

    /// Restrict articles to one subscribed feed.
    pub fn feed(mut self, feed_id: Option<i64>) -> Self {
        self.feed_id = feed_id;
        self
    }

    /// Only saved articles.
    pub fn saved_only(mut self, saved_only: bool) -> Self {
        self.saved_only = saved_only;
        self
    }

    /// Only unread articles.
    pub fn unread_only(mut self, unread_only: bool) -> Self {
        self.unread_only = unread_only;
        self
    }

    /// Maximum number of articles, clamped to `1..=MAX_DASHBOARD_LIMIT`.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.clamp(1, MAX_DASHBOARD_LIMIT);
        self
    }

    /// Requesting user.
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    /// Load the dashboard.
    ///
    /// A feed filter naming a feed the user is not subscribed to is
    /// [`FoloError::NotFound`].
    pub async fn load(&self, pool: &DbPool) -> Result<Dashboard> {
        let feeds = SubscriptionRepository::new(pool)
            .list_feeds(&self.user_id)
            .await?;

        if let Some(feed_id) = self.feed_id {
            if !feeds.iter().any(|f| f.id == feed_id) {
                return Err(FoloError::NotFound("feed".to_string()));
            }
        }

        let articles = if feeds.is_empty() {
            Vec::new()
        } else {
            self.load_articles(pool).await?
        };

        Ok(Dashboard {
            feeds,
            articles,
            current_feed_id: self.feed_id,
        })
    }

    async fn load_articles(&self, pool: &DbPool) -> Result<Vec<DashboardArticle>> {
        let mut query: QueryBuilder<Db> = QueryBuilder::new(
            r#"
            SELECT a.id, a.feed_id, f.title AS feed_title, a.title, a.content, a.url,
                   a.published_at,
                   COALESCE(s.is_read, FALSE) AS is_read,
                   COALESCE(s.is_saved, FALSE) AS is_saved
            FROM articles a
            INNER JOIN feeds f ON f.id = a.feed_id
            LEFT JOIN user_article_states s ON s.article_id = a.id AND s.user_id = "#,
        );
        query.push_bind(&self.user_id);

        match self.feed_id {
            Some(feed_id) => {
                query.push(" WHERE a.feed_id = ");
                query.push_bind(feed_id);
            }
            None => {
                query.push(" WHERE a.feed_id IN (SELECT feed_id FROM subscriptions WHERE user_id = ");
                query.push_bind(&self.user_id);
                query.push(")");
            }
        }

        if self.saved_only {
            query.push(" AND COALESCE(s.is_saved, FALSE) = TRUE");
        }
        if self.unread_only {
            query.push(" AND COALESCE(s.is_read, FALSE) = FALSE");
        }

        query.push(" ORDER BY a.published_at DESC, a.id DESC LIMIT ");
        query.push_bind(i64::from(self.limit));

        let rows = query
            .build_query_as::<DashboardArticleRow>()
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(DashboardArticle::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::{ArticleRecord, ArticleRepository, FeedRecord, FeedRepository};
    use crate::reader::ReadStateRepository;
    use crate::Database;
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, 0, 0, 0).unwrap()
    }

    async fn create_feed(db: &Database, url: &str, title: &str, entries: &[(&str, u32)]) -> i64 {
        let feed_id = FeedRepository::new(db.pool())
            .upsert_feed(&FeedRecord {
                url: url.to_string(),
                title: title.to_string(),
                site_link: String::new(),
                last_fetched_at: Utc::now(),
            })
            .await
            .unwrap();
        let records: Vec<_> = entries
            .iter()
            .map(|(id, day)| ArticleRecord {
                external_id: id.to_string(),
                title: id.to_string(),
                content: String::new(),
                url: String::new(),
                published_at: ts(*day),
            })
            .collect();
        ArticleRepository::new(db.pool())
            .upsert_articles(feed_id, url, &records)
            .await
            .unwrap();
        feed_id
    }

    async fn article_id(db: &Database, feed_id: i64, external_id: &str) -> i64 {
        ArticleRepository::new(db.pool())
            .get_by_external_id(feed_id, external_id)
            .await
            .unwrap()
            .unwrap()
            .id
    }

    async fn fixture() -> (Database, i64, i64) {
        let db = Database::open_in_memory().await.unwrap();
        let tech = create_feed(&db, "https://tech.example/feed", "Tech", &[("t1", 1), ("t2", 3)]).await;
        let news = create_feed(&db, "https://news.example/feed", "News", &[("n1", 2), ("n2", 4)]).await;
        create_feed(&db, "https://other.example/feed", "Other", &[("o1", 5)]).await;

        let subs = SubscriptionRepository::new(db.pool());
        subs.subscribe("alice", tech).await.unwrap();
        subs.subscribe("alice", news).await.unwrap();
        (db, tech, news)
    }

    fn titles(dashboard: &Dashboard) -> Vec<&str> {
        dashboard.articles.iter().map(|a| a.title.as_str()).collect()
    }

    #[test]
    fn test_limit_is_clamped() {
        assert_eq!(DashboardQuery::for_user("u").limit, DEFAULT_DASHBOARD_LIMIT);
        assert_eq!(DashboardQuery::for_user("u").limit(0).limit, 1);
        assert_eq!(
            DashboardQuery::for_user("u").limit(10_000).limit,
            MAX_DASHBOARD_LIMIT
        );
    }

    #[tokio::test]
    async fn test_dashboard_merges_subscribed_feeds_newest_first() {
        let (db, _, _) = fixture().await;

        let dashboard = DashboardQuery::for_user("alice").load(db.pool()).await.unwrap();

        let feed_titles: Vec<_> = dashboard.feeds.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(feed_titles, vec!["News", "Tech"]);
        assert_eq!(titles(&dashboard), vec!["n2", "t2", "n1", "t1"]);
        assert_eq!(dashboard.articles[0].feed_title, "News");
        assert!(dashboard.current_feed_id.is_none());
        assert!(dashboard.articles.iter().all(|a| !a.is_read && !a.is_saved));
    }

    #[tokio::test]
    async fn test_dashboard_without_subscriptions() {
        let (db, _, _) = fixture().await;
        let dashboard = DashboardQuery::for_user("bob").load(db.pool()).await.unwrap();
        assert!(dashboard.feeds.is_empty());
        assert!(dashboard.articles.is_empty());
    }

    #[tokio::test]
    async fn test_dashboard_feed_filter() {
        let (db, tech, _) = fixture().await;

        let dashboard = DashboardQuery::for_user("alice")
            .feed(Some(tech))
            .load(db.pool())
            .await
            .unwrap();

        assert_eq!(titles(&dashboard), vec!["t2", "t1"]);
        assert_eq!(dashboard.current_feed_id, Some(tech));
        assert_eq!(dashboard.feeds.len(), 2);
    }

    #[tokio::test]
    async fn test_dashboard_rejects_unsubscribed_feed() {
        let (db, tech, _) = fixture().await;

        let result = DashboardQuery::for_user("bob")
            .feed(Some(tech))
            .load(db.pool())
            .await;
        assert!(matches!(result, Err(FoloError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_dashboard_state_flags_and_filters() {
        let (db, tech, news) = fixture().await;
        let states = ReadStateRepository::new(db.pool());
        let t2 = article_id(&db, tech, "t2").await;
        let n1 = article_id(&db, news, "n1").await;

        states.mark_read("alice", t2).await.unwrap();
        states.set_saved("alice", n1, true).await.unwrap();
        // Another user's state must not leak.
        states.mark_read("bob", n1).await.unwrap();

        let dashboard = DashboardQuery::for_user("alice").load(db.pool()).await.unwrap();
        let t2_row = dashboard.articles.iter().find(|a| a.id == t2).unwrap();
        assert!(t2_row.is_read);
        assert!(!t2_row.is_saved);
        let n1_row = dashboard.articles.iter().find(|a| a.id == n1).unwrap();
        assert!(!n1_row.is_read);
        assert!(n1_row.is_saved);

        let saved = DashboardQuery::for_user("alice")
            .saved_only(true)
            .load(db.pool())
            .await
            .unwrap();
        assert_eq!(titles(&saved), vec!["n1"]);

        let unread = DashboardQuery::for_user("alice")
            .unread_only(true)
            .load(db.pool())
            .await
            .unwrap();
        assert_eq!(titles(&unread), vec!["n2", "n1", "t1"]);
    }

    #[tokio::test]
    async fn test_dashboard_limit() {
        let (db, _, _) = fixture().await;
        let dashboard = DashboardQuery::for_user("alice")
            .limit(2)
            .load(db.pool())
            .await
            .unwrap();
        assert_eq!(titles(&dashboard), vec!["n2", "t2"]);
    }
}
