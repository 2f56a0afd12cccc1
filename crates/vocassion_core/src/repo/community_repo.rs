//! Community feed repository: posts, likes and comments.

use super::{not_found_on_foreign_key, parse_count, parse_uuid, RepoError, RepoResult};
use crate::model::community::{
    CommunityPost, LikeState, NewPost, PostComment, PostId, PostKind, PostSummary,
    DEFAULT_COMMUNITY_ID,
};
use crate::model::profile::ProfileId;
use rusqlite::{params, Connection, Row};
use uuid::Uuid;

pub trait CommunityRepository {
    fn community_exists(&self, community_id: &str) -> RepoResult<bool>;
    /// Expects a validated post; its community must exist.
    fn create_post(&self, profile_id: ProfileId, post: &NewPost) -> RepoResult<CommunityPost>;
    fn get_post(&self, post_id: PostId) -> RepoResult<CommunityPost>;
    /// Feed rows newest first, with author and engagement counts.
    fn list_posts(&self, limit: u32) -> RepoResult<Vec<PostSummary>>;
    /// Adds the like when absent, removes it when present.
    fn toggle_like(&self, post_id: PostId, profile_id: ProfileId) -> RepoResult<LikeState>;
    fn add_comment(
        &self,
        post_id: PostId,
        profile_id: ProfileId,
        content: &str,
    ) -> RepoResult<PostComment>;
    /// Oldest first.
    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<PostComment>>;
}

pub struct SqliteCommunityRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCommunityRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    fn like_count(&self, post_id: PostId) -> RepoResult<u32> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM post_likes WHERE post_id = ?1;",
            [post_id.to_string()],
            |row| row.get(0),
        )?;
        parse_count(count, "post_likes.count")
    }
}

impl CommunityRepository for SqliteCommunityRepository<'_> {
    fn community_exists(&self, community_id: &str) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM communities WHERE id = ?1);",
            [community_id],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }

    fn create_post(&self, profile_id: ProfileId, post: &NewPost) -> RepoResult<CommunityPost> {
        let id = Uuid::new_v4();
        let community_id = post.community_id.as_deref().unwrap_or(DEFAULT_COMMUNITY_ID);
        self.conn
            .execute(
                "INSERT INTO community_posts (id, profile_id, community_id, title, content, kind)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
                params![
                    id.to_string(),
                    profile_id.to_string(),
                    community_id,
                    post.title.as_str(),
                    post.content.as_str(),
                    post.kind.as_str(),
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "community", community_id))?;

        self.get_post(id)
    }

    fn get_post(&self, post_id: PostId) -> RepoResult<CommunityPost> {
        let mut stmt = self.conn.prepare(
            "SELECT id, profile_id, community_id, title, content, kind, created_at
             FROM community_posts
             WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([post_id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_post_row(row),
            None => Err(RepoError::not_found("post", post_id)),
        }
    }

    fn list_posts(&self, limit: u32) -> RepoResult<Vec<PostSummary>> {
        let mut stmt = self.conn.prepare(
            "SELECT
                p.id,
                p.profile_id,
                pr.name AS user_name,
                pr.image_url AS user_image,
                p.title,
                p.content,
                p.kind,
                (SELECT COUNT(*) FROM post_likes l WHERE l.post_id = p.id) AS likes,
                (SELECT COUNT(*) FROM post_comments c WHERE c.post_id = p.id) AS comments,
                p.created_at
             FROM community_posts p
             JOIN profiles pr ON pr.id = p.profile_id
             ORDER BY p.created_at DESC, p.rowid DESC
             LIMIT ?1;",
        )?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut posts = Vec::new();
        while let Some(row) = rows.next()? {
            posts.push(parse_summary_row(row)?);
        }
        Ok(posts)
    }

    fn toggle_like(&self, post_id: PostId, profile_id: ProfileId) -> RepoResult<LikeState> {
        let removed = self.conn.execute(
            "DELETE FROM post_likes WHERE post_id = ?1 AND profile_id = ?2;",
            params![post_id.to_string(), profile_id.to_string()],
        )?;
        let liked = if removed == 0 {
            self.conn
                .execute(
                    "INSERT INTO post_likes (post_id, profile_id) VALUES (?1, ?2);",
                    params![post_id.to_string(), profile_id.to_string()],
                )
                .map_err(|err| not_found_on_foreign_key(err, "post", post_id))?;
            true
        } else {
            false
        };

        Ok(LikeState {
            liked,
            like_count: self.like_count(post_id)?,
        })
    }

    fn add_comment(
        &self,
        post_id: PostId,
        profile_id: ProfileId,
        content: &str,
    ) -> RepoResult<PostComment> {
        let id = Uuid::new_v4();
        self.conn
            .execute(
                "INSERT INTO post_comments (id, post_id, profile_id, content)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    id.to_string(),
                    post_id.to_string(),
                    profile_id.to_string(),
                    content
                ],
            )
            .map_err(|err| not_found_on_foreign_key(err, "post", post_id))?;

        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, profile_id, content, created_at
             FROM post_comments WHERE id = ?1;",
        )?;
        let mut rows = stmt.query([id.to_string()])?;
        match rows.next()? {
            Some(row) => parse_comment_row(row),
            None => Err(RepoError::InvalidData(
                "comment missing in read-back".to_string(),
            )),
        }
    }

    fn list_comments(&self, post_id: PostId) -> RepoResult<Vec<PostComment>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, profile_id, content, created_at
             FROM post_comments
             WHERE post_id = ?1
             ORDER BY created_at ASC, rowid ASC;",
        )?;
        let mut rows = stmt.query([post_id.to_string()])?;
        let mut comments = Vec::new();
        while let Some(row) = rows.next()? {
            comments.push(parse_comment_row(row)?);
        }
        Ok(comments)
    }
}

fn parse_kind(value: &str) -> RepoResult<PostKind> {
    PostKind::parse(value).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid kind `{value}` in community_posts.kind"))
    })
}

fn parse_post_row(row: &Row<'_>) -> RepoResult<CommunityPost> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    let kind_text: String = row.get("kind")?;
    Ok(CommunityPost {
        id: parse_uuid(&id_text, "community_posts.id")?,
        profile_id: parse_uuid(&profile_text, "community_posts.profile_id")?,
        community_id: row.get("community_id")?,
        title: row.get("title")?,
        content: row.get("content")?,
        kind: parse_kind(&kind_text)?,
        created_at: row.get("created_at")?,
    })
}

fn parse_summary_row(row: &Row<'_>) -> RepoResult<PostSummary> {
    let id_text: String = row.get("id")?;
    let profile_text: String = row.get("profile_id")?;
    let kind_text: String = row.get("kind")?;
    Ok(PostSummary {
        id: parse_uuid(&id_text, "community_posts.id")?,
        profile_id: parse_uuid(&profile_text, "community_posts.profile_id")?,
        user_name: row.get("user_name")?,
        user_image: row.get("user_image")?,
        title: row.get("title")?,
        content: row.get("content")?,
        kind: parse_kind(&kind_text)?,
        likes: parse_count(row.get("likes")?, "post_likes.count")?,
        comments: parse_count(row.get("comments")?, "post_comments.count")?,
        created_at: row.get("created_at")?,
    })
}

fn parse_comment_row(row: &Row<'_>) -> RepoResult<PostComment> {
    let id_text: String = row.get("id")?;
    let post_text: String = row.get("post_id")?;
    let profile_text: String = row.get("profile_id")?;
    Ok(PostComment {
        id: parse_uuid(&id_text, "post_comments.id")?,
        post_id: parse_uuid(&post_text, "post_comments.post_id")?,
        profile_id: parse_uuid(&profile_text, "post_comments.profile_id")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}
