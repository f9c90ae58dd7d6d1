use crate::models::{AnnotatedComment, Comment, VideoMetadata};
use chrono::{DateTime, Duration, Utc};
use log::info;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Per-session cache of stage results, keyed by video id.
#[derive(Debug, Default)]
pub struct SessionContext {
    metadata: HashMap<String, VideoMetadata>,
    comments: HashMap<String, Vec<Comment>>,
    annotated: HashMap<String, Vec<AnnotatedComment>>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metadata(&self, video_id: &str) -> Option<&VideoMetadata> {
        self.metadata.get(video_id)
    }

    pub fn comments(&self, video_id: &str) -> Option<&Vec<Comment>> {
        self.comments.get(video_id)
    }

    pub fn annotated(&self, video_id: &str) -> Option<&Vec<AnnotatedComment>> {
        self.annotated.get(video_id)
    }

    pub fn store_metadata(&mut self, metadata: VideoMetadata) {
        self.metadata.insert(metadata.id.clone(), metadata);
    }

    pub fn store_comments(&mut self, video_id: &str, comments: Vec<Comment>) {
        self.comments.insert(video_id.to_string(), comments);
    }

    pub fn store_annotated(&mut self, video_id: &str, annotated: Vec<AnnotatedComment>) {
        self.annotated.insert(video_id.to_string(), annotated);
    }

    /// Drop cached comments and everything derived from them.
    pub fn invalidate_comments(&mut self, video_id: &str) {
        self.comments.remove(video_id);
        self.annotated.remove(video_id);
    }

    pub fn invalidate_annotated(&mut self, video_id: &str) {
        self.annotated.remove(video_id);
    }

    pub fn invalidate_video(&mut self, video_id: &str) {
        self.metadata.remove(video_id);
        self.invalidate_comments(video_id);
    }

    pub fn cached_videos(&self) -> usize {
        self.metadata.len()
    }
}

pub type SharedSession = Arc<tokio::sync::Mutex<SessionContext>>;

struct SessionEntry {
    context: SharedSession,
    last_access: DateTime<Utc>,
}

pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<String, SessionEntry>>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        SessionStore {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub fn create(&self) -> String {
        self.create_at(Utc::now())
    }

    pub fn get(&self, session_id: &str) -> Option<SharedSession> {
        self.get_at(session_id, Utc::now())
    }

    pub fn remove(&self, session_id: &str) -> bool {
        if let Ok(mut sessions) = self.sessions.lock() {
            if sessions.remove(session_id).is_some() {
                info!("Session {session_id} closed.");
                return true;
            }
        }
        false
    }

    pub fn len(&self) -> usize {
        if let Ok(sessions) = self.sessions.lock() {
            sessions.len()
        } else {
            0
        }
    }

    pub(crate) fn create_at(&self, now: DateTime<Utc>) -> String {
        let session_id = uuid::Uuid::new_v4().to_string();
        if let Ok(mut sessions) = self.sessions.lock() {
            let before = sessions.len();
            let ttl = self.ttl;
            sessions.retain(|_, entry| now - entry.last_access < ttl);
            let purged = before - sessions.len();
            if purged > 0 {
                info!("Purged {purged} expired sessions.");
            }

            sessions.insert(
                session_id.clone(),
                SessionEntry {
                    context: Arc::new(tokio::sync::Mutex::new(SessionContext::new())),
                    last_access: now,
                },
            );
            info!("Session {session_id} opened ({} active).", sessions.len());
        }
        session_id
    }

    pub(crate) fn get_at(&self, session_id: &str, now: DateTime<Utc>) -> Option<SharedSession> {
        let mut sessions = self.sessions.lock().ok()?;

        let expired = match sessions.get_mut(session_id) {
            Some(entry) if now - entry.last_access < self.ttl => {
                entry.last_access = now;
                return Some(entry.context.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            sessions.remove(session_id);
            info!("Session {session_id} expired.");
        }
        None
    }
}
