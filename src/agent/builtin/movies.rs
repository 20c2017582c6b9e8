//! Agent answering questions about films from a movie search API
//!
//! The request is expected to name the film after the word "movie" or
//! "film" ("Who are the actors in the movie The Shining?"). The agent looks
//! the title up through `GET {base_url}?apikey=..&q=<title>`, takes the
//! first hit, and templates a one-sentence answer about its year, runtime,
//! MPAA rating, or cast.

use crate::agent::Agent;
use crate::error::sanitize_error_message;
use crate::http::HttpClient;
use crate::protocol::{Description, Request, Response};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

pub const MOVIES_AGENT_NAME: &str = "movies";

/// Search endpoint of the public movie API
pub const DEFAULT_MOVIES_BASE_URL: &str = "http://api.rottentomatoes.com/api/public/v1.0/movies.json";

const SUMMARY: &str =
    "Get answers to questions about movies. Ask about actors, runtime, MPAA rating, or release year.";
const EXAMPLE: &str = "Who are the actors in the movie The Shining?";

const NO_TITLE_TEXT: &str = "I'm sorry, I don't understand your question.";
const UNKNOWN_FIELD_TEXT: &str = "I'm sorry, I don't understand your question regarding movies.";
const UNKNOWN_MOVIE_TEXT: &str = "I am sorry, I don't know that movie.";
const REQUEST_FAILED_TEXT: &str = "I'm sorry, something went wrong with the movie database request. \
     Please make sure you have a proper API key.";
const BAD_PAYLOAD_TEXT: &str = "I'm sorry, the movie database sent a reply I could not read.";

/// Settings for [`MoviesAgent`]
#[derive(Debug, Clone)]
pub struct MoviesAgentConfig {
    pub api_key: String,
    pub base_url: Url,
}

/// Which fact about a film the user asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MovieField {
    Year,
    Runtime,
    MpaaRating,
    Actors,
    Unknown,
}

impl MovieField {
    /// Detect the requested fact; checked in priority order
    pub fn detect(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if lowered.contains("year") {
            MovieField::Year
        } else if lowered.contains("runtime") {
            MovieField::Runtime
        } else if lowered.contains("mpaa rating") {
            MovieField::MpaaRating
        } else if lowered.contains("actor") {
            MovieField::Actors
        } else {
            MovieField::Unknown
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResults {
    #[serde(default)]
    movies: Vec<Movie>,
}

#[derive(Debug, Deserialize)]
struct Movie {
    title: String,
    #[serde(default)]
    year: Option<Value>,
    #[serde(default)]
    runtime: Option<Value>,
    #[serde(default)]
    mpaa_rating: Option<Value>,
    #[serde(default)]
    abridged_cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct CastMember {
    name: String,
}

pub struct MoviesAgent {
    name: String,
    client: Arc<dyn HttpClient>,
    config: MoviesAgentConfig,
}

impl MoviesAgent {
    pub fn new(client: Arc<dyn HttpClient>, config: MoviesAgentConfig) -> Self {
        Self {
            name: MOVIES_AGENT_NAME.to_string(),
            client,
            config,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Everything after the first "movie"/"film" token, lower-cased
    pub fn find_movie_title(text: &str) -> String {
        let tokens: Vec<String> = text
            .split_whitespace()
            .map(|token| token.to_lowercase())
            .collect();

        let title = tokens
            .iter()
            .position(|token| token == "movie" || token == "film")
            .map(|start| tokens[start + 1..].join(" "))
            .unwrap_or_default();

        title.replace(['?', '.'], "").trim().to_string()
    }

    fn search_url(&self, title: &str) -> Url {
        let mut url = self.config.base_url.clone();
        url.query_pairs_mut()
            .append_pair("apikey", &self.config.api_key)
            .append_pair("q", title);
        url
    }

    fn format_answer(field: MovieField, movie: &Movie) -> Option<String> {
        let title = movie.title.trim();
        match field {
            MovieField::Runtime => movie.runtime.as_ref().and_then(render_value).map(|runtime| {
                format!("The runtime for the film, {title}, is {runtime} minutes long.")
            }),
            MovieField::Year => movie
                .year
                .as_ref()
                .and_then(render_value)
                .map(|year| format!("The year the film, {title}, was created is {year}.")),
            MovieField::MpaaRating => movie
                .mpaa_rating
                .as_ref()
                .and_then(render_value)
                .map(|rating| format!("The MPAA rating for the film, {title}, is {rating}.")),
            MovieField::Actors => {
                if movie.abridged_cast.is_empty() {
                    return None;
                }
                let names: Vec<&str> = movie
                    .abridged_cast
                    .iter()
                    .map(|member| member.name.trim())
                    .collect();
                Some(format!(
                    "The film, {title}, stars actors {}.",
                    names.join(", ")
                ))
            }
            MovieField::Unknown => None,
        }
    }
}

/// Render a JSON scalar without quotes; empty strings and nulls count as missing
fn render_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[async_trait]
impl Agent for MoviesAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<Description> {
        Some(Description::new(self.name.clone(), SUMMARY, EXAMPLE))
    }

    async fn process(&self, request: &Request) -> Response {
        let title = Self::find_movie_title(request.text());
        if title.is_empty() {
            return Response::not_understood(NO_TITLE_TEXT);
        }

        let field = MovieField::detect(request.text());
        if field == MovieField::Unknown {
            return Response::not_understood(UNKNOWN_FIELD_TEXT);
        }

        debug!(request_id = %request.id(), title = %title, field = ?field, "Looking up movie");

        let body = match self.client.get(&self.search_url(&title)).await {
            Ok(body) => body,
            Err(e) => {
                warn!(
                    request_id = %request.id(),
                    error = %sanitize_error_message(&e.to_string()),
                    "Movie search request failed"
                );
                return Response::failed(REQUEST_FAILED_TEXT);
            }
        };

        let results: SearchResults = match serde_json::from_str(&body) {
            Ok(results) => results,
            Err(e) => {
                warn!(request_id = %request.id(), error = %e, "Movie search returned invalid JSON");
                return Response::failed(BAD_PAYLOAD_TEXT);
            }
        };

        let Some(movie) = results.movies.first() else {
            return Response::not_understood(UNKNOWN_MOVIE_TEXT);
        };

        match Self::format_answer(field, movie) {
            Some(text) => Response::answered(text).with_payload(json!({
                "title": movie.title.trim(),
                "year": movie.year,
                "runtime": movie.runtime,
                "mpaa_rating": movie.mpaa_rating,
                "cast": movie.abridged_cast.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
            })),
            None => Response::not_understood(format!(
                "I'm sorry, I don't have that information about the film, {}.",
                movie.title.trim()
            )),
        }
    }
}
