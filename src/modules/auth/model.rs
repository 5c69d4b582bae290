use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::SessionError;
use super::password::verify_password;

/// Icon tag a user picks for their account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Emblem {
    Shield,
    Crown,
    Trophy,
    Star,
    Flag,
    Target,
    Medal,
    Anchor,
}

impl Emblem {
    pub const ALL: [Emblem; 8] = [
        Emblem::Shield,
        Emblem::Crown,
        Emblem::Trophy,
        Emblem::Star,
        Emblem::Flag,
        Emblem::Target,
        Emblem::Medal,
        Emblem::Anchor,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Emblem::Shield => "shield",
            Emblem::Crown => "crown",
            Emblem::Trophy => "trophy",
            Emblem::Star => "star",
            Emblem::Flag => "flag",
            Emblem::Target => "target",
            Emblem::Medal => "medal",
            Emblem::Anchor => "anchor",
        }
    }
}

impl fmt::Display for Emblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emblem {
    type Err = SessionError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        Emblem::ALL
            .iter()
            .copied()
            .find(|emblem| emblem.as_str() == tag)
            .ok_or_else(|| {
                let known: Vec<&str> = Emblem::ALL.iter().map(Emblem::as_str).collect();
                SessionError::Validation(format!(
                    "unknown emblem {:?}, expected one of: {}",
                    tag,
                    known.join(", ")
                ))
            })
    }
}

/// Persisted as a plain string; "" means no emblem
mod optional_emblem {
    use super::Emblem;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<Emblem>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value.map(|e| e.as_str()).unwrap_or(""))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Emblem>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(tag) => tag.parse().map(Some).map_err(serde::de::Error::custom),
        }
    }
}

/// A registered account as stored in the `users` collection
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub iterations: u32,
    #[serde(default)]
    pub phone: String,
    #[serde(default, with = "optional_emblem")]
    pub emblem: Option<Emblem>,
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub last_login: u64,
}

impl Account {
    /// Public view of the account, without credential fields
    pub fn to_session(&self) -> Session {
        Session {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
            emblem: self.emblem,
        }
    }

    pub fn verify_password(&self, password: &str) -> bool {
        verify_password(password, &self.password_hash, &self.salt, self.iterations)
    }
}

/// The currently logged-in user, stored in the `user` slot
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Session {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default, with = "optional_emblem")]
    pub emblem: Option<Emblem>,
}

/// New profile values; `emblem: None` keeps the stored emblem
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub emblem: Option<Emblem>,
}

impl ProfileUpdate {
    pub fn new(name: impl Into<String>, email: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            emblem: None,
        }
    }

    pub fn with_emblem(mut self, emblem: Emblem) -> Self {
        self.emblem = Some(emblem);
        self
    }

    /// Like `with_emblem`, for tags coming from user input
    pub fn with_emblem_tag(self, tag: &str) -> Result<Self, SessionError> {
        Ok(self.with_emblem(tag.parse()?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emblem_parsing() {
        for emblem in Emblem::ALL {
            assert_eq!(emblem.as_str().parse::<Emblem>().unwrap(), emblem);
        }
        assert!(matches!(
            "dragon".parse::<Emblem>(),
            Err(SessionError::Validation(_))
        ));
        // Tags are case-sensitive
        assert!("Crown".parse::<Emblem>().is_err());
    }

    #[test]
    fn test_session_serialization() {
        let session = Session {
            id: "1700000000000-ab12cd34".to_string(),
            name: "Alice".to_string(),
            email: "a@x.com".to_string(),
            phone: String::new(),
            emblem: Some(Emblem::Crown),
        };

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["emblem"], "crown");
        assert_eq!(json["phone"], "");
        assert!(json.get("password_hash").is_none());
    }

    #[test]
    fn test_empty_and_missing_emblem_read_as_none() {
        let session: Session =
            serde_json::from_str(r#"{"id":"1","name":"A","email":"a@x.com","emblem":""}"#).unwrap();
        assert_eq!(session.emblem, None);

        let session: Session =
            serde_json::from_str(r#"{"id":"1","name":"A","email":"a@x.com"}"#).unwrap();
        assert_eq!(session.emblem, None);
        assert_eq!(session.phone, "");

        let bad = serde_json::from_str::<Session>(
            r#"{"id":"1","name":"A","email":"a@x.com","emblem":"dragon"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_profile_update_builder() {
        let update = ProfileUpdate::new("A", "a@x.com", "555").with_emblem_tag("star").unwrap();
        assert_eq!(update.emblem, Some(Emblem::Star));

        let err = ProfileUpdate::new("A", "a@x.com", "").with_emblem_tag("dragon");
        assert!(matches!(err, Err(SessionError::Validation(_))));
    }
}
