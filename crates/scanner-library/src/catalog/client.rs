use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use scanner_core::{FileEntry, Library, Metadata, PlainLyrics, SyncedLyrics};

use super::dto::{
    DeleteFilesRequest, FileSelector, HasLyricsResponse, IllustrationKind, Page, SaveMetadataResponse, SaveMode, User,
};
use super::error::CatalogError;

/// Talks to the catalog over HTTP. One instance is shared (behind an
/// `Arc`) across the whole daemon; `reqwest::Client` is itself a cheap
/// handle onto a pooled connector, so cloning it is fine.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    base_url: String,
    api_key: String,
    http: reqwest::Client,
}

impl CatalogClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), api_key: api_key.into(), http: reqwest::Client::new() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url.trim_end_matches('/'))
    }

    async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, CatalogError> {
        if resp.status().as_u16() >= 400 {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(CatalogError::Http { status, body });
        }
        Ok(resp)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str, bearer: Option<&str>) -> Result<T, CatalogError> {
        let mut req = self.http.get(self.url(path)).header("x-api-key", &self.api_key);
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        let resp = Self::check_status(req.send().await?).await?;
        Ok(resp.json::<T>().await?)
    }

    /// Follows `metadata.next` until it is empty, concatenating `items`.
    async fn paginate<T: DeserializeOwned>(&self, first_path: String) -> Result<Vec<T>, CatalogError> {
        let mut items = Vec::new();
        let mut next = Some(first_path);
        while let Some(path) = next {
            let page: Page<T> = self.get_json(&path, None).await?;
            items.extend(page.items);
            next = page.metadata.next;
        }
        Ok(items)
    }

    pub async fn health_check(&self) -> Result<(), CatalogError> {
        let resp = self.http.get(self.url("/")).header("x-api-key", &self.api_key).send().await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    pub async fn get_user_from_access_token(&self, token: &str) -> Result<User, CatalogError> {
        self.get_json("/users/me", Some(token)).await
    }

    pub async fn get_all_libraries(&self) -> Result<Vec<Library>, CatalogError> {
        self.paginate("/libraries".to_string()).await
    }

    pub async fn get_library(&self, slug: &str) -> Result<Library, CatalogError> {
        self.get_json(&format!("/libraries/{slug}"), None).await
    }

    pub async fn get_all_files(&self, selector: &FileSelector) -> Result<Vec<FileEntry>, CatalogError> {
        let query: Vec<String> = selector.query_pairs().into_iter().map(|(k, v)| format!("{k}={}", urlencode(&v))).collect();
        let path = if query.is_empty() { "/files".to_string() } else { format!("/files?{}", query.join("&")) };
        self.paginate(path).await
    }

    pub async fn delete_files(&self, ids: &[i64]) -> Result<(), CatalogError> {
        let resp = self
            .http
            .delete(self.url("/files"))
            .header("x-api-key", &self.api_key)
            .json(&DeleteFilesRequest { ids: ids.to_vec() })
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    pub async fn has_lyrics(&self, song_id: i64) -> Result<(bool, bool), CatalogError> {
        let resp: HasLyricsResponse = self.get_json(&format!("/songs/{song_id}/lyrics"), None).await?;
        Ok((resp.plain, resp.synced))
    }

    pub async fn post_lyrics(&self, song_id: i64, plain: &PlainLyrics, synced: Option<&SyncedLyrics>) -> Result<(), CatalogError> {
        let mut body = serde_json::json!({ "plain": plain.0 });
        if let Some(s) = synced {
            body["synced"] = serde_json::to_value(&s.0).unwrap_or_default();
        }
        let resp = self
            .http
            .post(self.url(&format!("/songs/{song_id}/lyrics")))
            .header("x-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }

    pub async fn save_metadata(&self, m: &Metadata, mode: SaveMode) -> Result<SaveMetadataResponse, CatalogError> {
        let form = metadata_form(m);
        let req = match mode {
            SaveMode::Create => self.http.post(self.url("/metadata")),
            SaveMode::Update => self.http.put(self.url("/metadata")),
        };
        let resp = req.header("x-api-key", &self.api_key).multipart(form).send().await?;
        let resp = Self::check_status(resp).await?;
        Ok(resp.json::<SaveMetadataResponse>().await?)
    }

    pub async fn post_illustration(&self, track_id: i64, kind: IllustrationKind, bytes: Vec<u8>) -> Result<(), CatalogError> {
        let kind_str = match kind {
            IllustrationKind::Cover => "cover",
            IllustrationKind::Thumbnail => "thumbnail",
        };
        let form = Form::new()
            .text("trackId", track_id.to_string())
            .text("type", kind_str)
            .part("file", Part::bytes(bytes).file_name("illustration"));
        let resp = self
            .http
            .post(self.url("/illustrations/file"))
            .header("x-api-key", &self.api_key)
            .multipart(form)
            .send()
            .await?;
        Self::check_status(resp).await?;
        Ok(())
    }
}

/// Builds the metadata multipart form, including a field only when its
/// value is non-empty/positive, per §4.1.
fn metadata_form(m: &Metadata) -> Form {
    let mut form = Form::new().text("isCompilation", m.is_compilation.to_string());

    macro_rules! text_if_some {
        ($form:ident, $field:expr, $name:literal) => {
            if let Some(v) = $field {
                if !v.is_empty() {
                    $form = $form.text($name, v.clone());
                }
            }
        };
    }

    text_if_some!(form, &m.artist, "artist");
    text_if_some!(form, &m.sort_artist, "sortArtist");
    text_if_some!(form, &m.album_artist, "albumArtist");
    text_if_some!(form, &m.sort_album_artist, "sortAlbumArtist");
    text_if_some!(form, &m.album, "album");
    text_if_some!(form, &m.sort_album, "sortAlbum");
    text_if_some!(form, &m.release, "release");
    text_if_some!(form, &m.name, "name");
    text_if_some!(form, &m.sort_name, "sortName");
    text_if_some!(form, &m.disc_name, "discName");
    text_if_some!(form, &m.discogs_id, "discogsId");
    text_if_some!(form, &m.label, "label");
    text_if_some!(form, &m.illustration_path, "illustrationPath");
    text_if_some!(form, &m.checksum, "checksum");
    text_if_some!(form, &m.path, "path");
    text_if_some!(form, &m.fingerprint, "fingerprint");

    if let Some(d) = &m.album_release_date {
        form = form.text("albumReleaseDate", d.to_rfc3339());
    }
    if let Some(d) = &m.release_release_date {
        form = form.text("releaseReleaseDate", d.to_rfc3339());
    }
    if let Some(d) = &m.registration_date {
        form = form.text("registrationDate", d.to_rfc3339());
    }

    if m.index >= 0 {
        form = form.text("index", m.index.to_string());
    }
    if m.disc_index >= 0 {
        form = form.text("discIndex", m.disc_index.to_string());
    }
    if let Some(b) = m.bitrate {
        if b > 0 {
            form = form.text("bitrate", b.to_string());
        }
    }
    if let Some(bpm) = m.bpm {
        form = form.text("bpm", bpm.to_string());
    }
    if let Some(d) = m.duration {
        form = form.text("duration", d.to_string());
    }
    if let Some(t) = m.r#type {
        form = form.text("type", format!("{t:?}").to_lowercase());
    }
    if let Some(idx) = m.illustration_stream_index {
        form = form.text("illustrationStreamIndex", idx.to_string());
    }
    form = form.text("illustrationLocation", format!("{:?}", m.illustration_location).to_lowercase());

    for genre in &m.genres {
        form = form.text("genres", genre.clone());
    }
    if !m.plain_lyrics.is_empty() {
        if let Ok(json) = serde_json::to_string(&m.plain_lyrics.0) {
            form = form.text("plainLyrics", json);
        }
    }
    if !m.synced_lyrics.is_empty() {
        if let Ok(json) = serde_json::to_string(&m.synced_lyrics.0) {
            form = form.text("syncedLyrics", json);
        }
    }

    form
}

fn urlencode(s: &str) -> String {
    s.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => (b as char).to_string(),
            _ => format!("%{b:02X}"),
        })
        .collect()
}
