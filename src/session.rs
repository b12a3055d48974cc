use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};

/// Credential/identity bundle supplied by an external authentication flow.
///
/// The engine never authenticates, refreshes or validates it; the fields are
/// consumed purely as substitution values during launch assembly. Empty
/// fields stay out of the substitution map, so a template that references
/// them fails loudly instead of producing a malformed command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub username: String,
    pub uuid: String,
    pub access_token: String,
    pub xuid: String,
    pub user_type: String,
    pub client_id: String,
}

impl Session {
    /// Offline session with the UUID the game derives for offline players
    /// (version-3 layout of `md5("OfflinePlayer:<name>")`).
    pub fn offline(username: &str) -> Self {
        let username = username.trim();
        Self {
            username: username.to_string(),
            uuid: offline_uuid(username),
            access_token: "offline_access_token".into(),
            xuid: "0".into(),
            user_type: "legacy".into(),
            client_id: "0".into(),
        }
    }

    /// Legacy `--session` value some old argument templates still reference.
    pub fn session_token(&self) -> String {
        format!("token:{}:{}", self.access_token, self.uuid)
    }
}

fn offline_uuid(username: &str) -> String {
    let digest = Md5::digest(format!("OfflinePlayer:{}", username));
    uuid::Builder::from_md5_bytes(digest.into())
        .into_uuid()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_uuid_is_stable_and_version_3() {
        let a = Session::offline("Alex");
        let b = Session::offline("Alex");
        assert_eq!(a.uuid, b.uuid);
        // Version nibble of a name-based md5 UUID is 3.
        assert_eq!(&a.uuid[14..15], "3");

        let other = Session::offline("Steve");
        assert_ne!(a.uuid, other.uuid);
    }

    #[test]
    fn session_token_combines_access_token_and_uuid() {
        let s = Session::offline("Alex");
        assert_eq!(
            s.session_token(),
            format!("token:{}:{}", s.access_token, s.uuid)
        );
    }
}
