//! Reference source HTTP client.
//!
//! Blocking reqwest client (no Tokio runtime required).

use std::collections::BTreeSet;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dexclean_canon::create::NewEntity;
use dexclean_canon::NameSource;

use crate::error::SourceError;

// ── Constants ───────────────────────────────────────────────────────

pub const DEFAULT_API_BASE: &str = "https://pokeapi.co/api/v2";
/// Large enough that every listing normally fits one page.
pub const DEFAULT_PAGE_SIZE: u32 = 10_000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = concat!("dexclean/", env!("CARGO_PKG_VERSION"));
const LOOKUP_ENDPOINT: &str = "pokemon";
const ERROR_BODY_LIMIT: usize = 200;

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ListPage {
    #[serde(default)]
    results: Vec<NamedResource>,
    next: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NamedResource {
    name: String,
}

#[derive(Debug, Deserialize)]
struct PokemonBody {
    name: String,
    #[serde(default)]
    types: Vec<TypeSlot>,
    #[serde(default)]
    abilities: Vec<AbilitySlot>,
}

#[derive(Debug, Deserialize)]
struct TypeSlot {
    #[serde(default)]
    slot: u32,
    #[serde(rename = "type")]
    kind: NamedResource,
}

#[derive(Debug, Deserialize)]
struct AbilitySlot {
    #[serde(default)]
    slot: u32,
    ability: NamedResource,
}

/// One entity as the source describes it. Names are raw (`"mr-mime"`);
/// rendering happens on storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    pub name: String,
    /// Ordered by slot.
    pub types: Vec<String>,
    /// Ordered by slot.
    pub abilities: Vec<String>,
}

impl From<PokemonBody> for EntityRecord {
    fn from(mut body: PokemonBody) -> Self {
        body.types.sort_by_key(|t| t.slot);
        body.abilities.sort_by_key(|a| a.slot);
        Self {
            name: body.name,
            types: body.types.into_iter().map(|t| t.kind.name).collect(),
            abilities: body.abilities.into_iter().map(|a| a.ability.name).collect(),
        }
    }
}

impl From<EntityRecord> for NewEntity {
    fn from(record: EntityRecord) -> Self {
        NewEntity {
            name: record.name,
            types: record.types,
            abilities: record.abilities,
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ReferenceClient {
    http: Client,
    api_base: Url,
    page_size: u32,
}

impl ReferenceClient {
    pub fn new(api_base: &str, timeout: Duration) -> Result<Self, SourceError> {
        let parsed = Url::parse(api_base.trim())
            .map_err(|_| SourceError::InvalidBase(api_base.to_string()))?;
        if parsed.cannot_be_a_base() {
            return Err(SourceError::InvalidBase(api_base.to_string()));
        }

        let http = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        Ok(Self {
            http,
            api_base: parsed,
            page_size: DEFAULT_PAGE_SIZE,
        })
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_str()
    }

    /// Every name listed under `endpoint`, following `next` until it is null.
    pub fn list_names(&self, endpoint: &str) -> Result<BTreeSet<String>, SourceError> {
        let mut url = self.endpoint_url(&[endpoint, ""])?;
        url.query_pairs_mut()
            .append_pair("limit", &self.page_size.to_string());

        let mut names = BTreeSet::new();
        let mut visited = BTreeSet::from([url.to_string()]);
        let mut page = 0u32;

        loop {
            page += 1;
            let body: ListPage = self.get_json(&url)?;
            debug!(endpoint, page, results = body.results.len(), "fetched listing page");

            let Some(next) = body.next else {
                names.extend(body.results.into_iter().map(|r| r.name));
                break;
            };

            // Guard: more pages promised but this one was empty
            if body.results.is_empty() {
                return Err(SourceError::Pagination(format!(
                    "{endpoint}: page {page} is empty but 'next' is set"
                )));
            }
            names.extend(body.results.into_iter().map(|r| r.name));

            let next = url
                .join(&next)
                .map_err(|e| SourceError::Parse(format!("invalid 'next' cursor '{next}': {e}")))?;

            // Infinite loop protection: a cursor already visited
            if !visited.insert(next.to_string()) {
                return Err(SourceError::Pagination(format!(
                    "{endpoint}: cursor {next} repeated"
                )));
            }
            url = next;
        }

        info!(endpoint, pages = page, names = names.len(), "listing complete");
        Ok(names)
    }

    /// Look up one entity by name. The name is slugged: trimmed,
    /// lowercased, spaces replaced with hyphens.
    pub fn lookup(&self, name: &str) -> Result<EntityRecord, SourceError> {
        let slug = slug(name);
        if slug.is_empty() {
            return Err(SourceError::NotFound(name.to_string()));
        }
        let url = self.endpoint_url(&[LOOKUP_ENDPOINT, &slug])?;

        match self.get_json::<PokemonBody>(&url) {
            Ok(body) => Ok(body.into()),
            Err(SourceError::NotFound(_)) => Err(SourceError::NotFound(name.to_string())),
            Err(e) => Err(e),
        }
    }

    // ── Internals ───────────────────────────────────────────────────

    fn endpoint_url(&self, segments: &[&str]) -> Result<Url, SourceError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| SourceError::InvalidBase(self.api_base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T, SourceError> {
        debug!(%url, "GET");
        let resp = self
            .http
            .get(url.clone())
            .send()
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound(url.to_string()));
        }
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            let excerpt: String = body.chars().take(ERROR_BODY_LIMIT).collect();
            return Err(SourceError::Http(status.as_u16(), excerpt));
        }

        resp.json::<T>().map_err(|e| SourceError::Parse(e.to_string()))
    }
}

impl NameSource for ReferenceClient {
    type Error = SourceError;

    fn list_names(&self, endpoint: &str) -> Result<BTreeSet<String>, SourceError> {
        ReferenceClient::list_names(self, endpoint)
    }
}

fn slug(name: &str) -> String {
    name.trim()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}
