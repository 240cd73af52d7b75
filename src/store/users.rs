use crate::error::Result;
use crate::models::UserProfile;
use crate::Pos;

pub struct UserStore<'a> {
    pos: &'a Pos,
}

impl<'a> UserStore<'a> {
    pub(crate) fn new(pos: &'a Pos) -> Self {
        Self { pos }
    }

    /// The `users` row of an auth account
    pub async fn profile(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(self
            .pos
            .from("users")?
            .select("*")
            .eq("id", user_id)
            .execute_one::<UserProfile>()
            .await?)
    }

    /// Profile of the signed-in user; `None` when signed out or when the
    /// account has no profile row
    pub async fn current(&self) -> Result<Option<UserProfile>> {
        match self.pos.current_user_id() {
            Some(id) => self.profile(&id).await,
            None => Ok(None),
        }
    }
}
