use serde::{Deserialize, Serialize};

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct User {
    #[serde(alias = "uid", alias = "user_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, alias = "avatarUrl", alias = "avatar")]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub favorites: Vec<String>,
}

impl User {
    pub fn is_favorite(&self, restaurant_id: &str) -> bool {
        self.favorites.iter().any(|id| id == restaurant_id)
    }

    /// Takes the backend's list as-is, only collapsing duplicate ids.
    pub fn replace_favorites(&mut self, favorites: Vec<String>) {
        let mut unique: Vec<String> = Vec::with_capacity(favorites.len());
        for id in favorites {
            if !unique.contains(&id) {
                unique.push(id);
            }
        }
        self.favorites = unique;
    }

    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(email) = patch.email {
            self.email = email;
        }
        if let Some(avatar_url) = patch.avatar_url {
            self.avatar_url = Some(avatar_url);
        }
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Registration {
    pub email: String,
    pub password: String,
    pub name: String,
}

/// Login and register answers carry the token under either key.
#[derive(Clone, Deserialize, Debug, Default)]
pub struct TokenResponse {
    #[serde(default, rename = "idToken")]
    pub id_token: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenResponse {
    pub fn into_token(self) -> Option<String> {
        self.id_token
            .or(self.token)
            .filter(|t| !t.is_empty())
    }
}

#[derive(Clone, Serialize, Deserialize, Debug, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
