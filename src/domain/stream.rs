/// Well-known stream ids of a Feedly user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserStreams {
    user_id: String,
}

impl UserStreams {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
        }
    }

    /// Category holding every subscription; its unread count is the total.
    pub fn global_all(&self) -> String {
        format!("user/{}/category/global.all", self.user_id)
    }

    /// Tag applied to saved entries.
    pub fn saved(&self) -> String {
        format!("user/{}/tag/global.saved", self.user_id)
    }
}
