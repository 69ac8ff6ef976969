use micrograph::Variables;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const FILM_URL: &str = "https://swapi-graphql.netlify.app/.netlify/functions/index";

/// A film lookup without identity fields, as a plain client would send it.
pub const TITLE_QUERY: &str = r#"
    query TestQuery($id: ID) {
        film(filmID: $id) {
            title
        }
    }
"#;

/// A film lookup that selects the identifying `id`.
pub const FILM_QUERY: &str = r#"
    query MockFilmQuery($filmID: ID) {
        film(filmID: $filmID) {
            id
            title
            episodeID
        }
    }
"#;

/// A narrower view of the same film, used to check that subsets are served from the store.
pub const FILM_ID_QUERY: &str = r#"
    query MockFilmIdQuery($filmID: ID) {
        film(filmID: $filmID) {
            __typename
            id
        }
    }
"#;

pub const FILM_TITLE_FRAGMENT: &str = r#"
    fragment FilmTitle on Film {
        title
    }
"#;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Film {
    pub id: String,
    pub title: String,
    #[serde(rename = "episodeID")]
    pub episode_id: i64
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmTitle {
    pub title: String
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TitleData {
    pub film: FilmTitle
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FilmData {
    pub film: Film
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct TitleVariables {
    pub id: i64
}

lazy_static! {
    pub static ref FILM_VARIABLES: Variables = variables(json!({ "filmID": 1 }));
    pub static ref TITLE_VARIABLES: Variables = variables(json!({ "id": 1 }));
    pub static ref FILM_DATA: Value = json!({
        "film": {
            "__typename": "Film",
            "id": "ZmlsbXM6MQ==",
            "title": "A New Hope",
            "episodeID": 4
        }
    });
    pub static ref FILM_RESPONSE: Value = json!({ "data": FILM_DATA.clone() });
    pub static ref TITLE_RESPONSE: Value = json!({
        "data": {
            "film": { "title": "A New Hope" }
        }
    });
}

/// Turn a `json!` object into [`Variables`](../micrograph/type.Variables.html).
/// Anything else gives an empty map.
pub fn variables(value: Value) -> Variables {
    match value {
        Value::Object(map) => map,
        _ => Variables::new()
    }
}

pub fn assert_title(data: Option<&TitleData>) {
    let data = data.expect("result has no data");
    assert_eq!(data.film.title, "A New Hope");
}
