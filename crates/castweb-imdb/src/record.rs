use serde::{Deserialize, Serialize};

/// One acting credit of a person, as written to the output table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credit {
    #[serde(rename = "actor/actress")]
    pub person: String,
    #[serde(rename = "movie_or_TV_name")]
    pub title: String,
}

impl Credit {
    pub fn new(person: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            person: person.into(),
            title: title.into(),
        }
    }
}
