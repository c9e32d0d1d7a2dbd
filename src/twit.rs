use std::time::Duration;

use anyhow::{anyhow, Error};
use regex::Regex;
use reqwest::Client;
use serde::Serialize;

use crate::formats::{Format, FormatRanker, QualityRanker};
use crate::page;

const HOST: &str = "twit.tv";
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:84.0) Gecko/20100101 Firefox/84.0";
const ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

const DOWNLOAD_OPTIONS: &str = r#"(?s)<div class="choices[^"]+"[^>]*>(.*?)</div>"#;
const DOWNLOAD_LINK: &str = r#"<a href\s*=\s*"(?P<url>[^"]+)"[^>]*>(?P<label>[^<]*)</a>"#;
const MP4_FILE_NAME: &str =
    r#".*/(?P<id>[^_./]+)(?:_[^_]+_(?P<width>\d*)x(?P<height>\d*)_(?P<bitrate>\d*))?\."#;
const AIR_DATE: &str = r#"<p[^>]*class="air-date"[^>]*>([^<]*)</p>"#;
const RUNNING_TIME: &str = r#"Running time:(?:</strong>)?\s*((?:\d{0,2}:){0,2}\d{2})"#;

#[derive(Clone, Debug)]
pub struct ExtractorConfig {
    pub host: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        ExtractorConfig {
            host: HOST.to_string(),
            timeout: Duration::from_secs(30),
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl ExtractorConfig {
    pub fn with_host(mut self, host: &str) -> Self {
        self.host = host.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = user_agent.to_string();
        self
    }
}

/// A show episode as addressed by its page URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Episode {
    pub show: String,
    pub number: String,
}

impl Episode {
    /// Accepts `/shows/<show>/episodes/<number>` as well as the old `/<show>/<number>` form.
    pub fn from_url(url: &str, host: &str) -> Result<Episode, Error> {
        let host = regex::escape(host);
        let patterns = [
            format!(
                r#"^https?://(?:www\.)?{}/shows/(?P<show>[^/]+)/episodes/(?P<number>\d+)"#,
                host
            ),
            format!(
                r#"^https?://(?:www\.)?{}/(?P<show>[^/]+)/(?P<number>\d+)"#,
                host
            ),
        ];
        for pattern in &patterns {
            if let Some(capture) = Regex::new(pattern)?.captures(url) {
                return Ok(Episode {
                    show: capture["show"].to_string(),
                    number: capture["number"].to_string(),
                });
            }
        }
        Err(anyhow!("Unsupported URL: {}", url))
    }

    pub fn display_id(&self) -> String {
        format!("{}_{}", self.show, self.number)
    }
}

/// Everything known about an episode after its page has been scraped.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MediaRecord {
    /// Taken from the MP4 file names; absent when no MP4 link carried one.
    pub id: Option<String>,
    pub display_id: String,
    pub webpage_url: String,
    pub title: String,
    /// Sorted worst to best.
    pub formats: Vec<Format>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    /// `YYYYMMDD`
    pub upload_date: Option<String>,
    /// Seconds.
    pub duration: Option<u64>,
}

pub struct Extractor {
    pub config: ExtractorConfig,
    client: Client,
    ranker: Box<dyn FormatRanker + Send + Sync>,
}

impl Extractor {
    pub fn new(config: ExtractorConfig) -> Result<Extractor, Error> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .cookie_store(true)
            .build()?;
        Ok(Extractor {
            config,
            client,
            ranker: Box::new(QualityRanker),
        })
    }

    pub fn with_ranker(mut self, ranker: Box<dyn FormatRanker + Send + Sync>) -> Extractor {
        self.ranker = ranker;
        self
    }

    pub async fn extract(&self, url: &str) -> Result<MediaRecord, Error> {
        let episode = Episode::from_url(url, &self.config.host)?;
        let webpage = self.fetch_page(url).await?;
        parse_page(&episode, url, &webpage, self.ranker.as_ref())
    }

    pub async fn fetch_page(&self, url: &str) -> Result<String, Error> {
        let response = self
            .client
            .get(url)
            .header("Accept", ACCEPT)
            .header("Dnt", "1")
            .send()
            .await?;
        if !response.status().is_success() {
            Err(anyhow!(
                "Failed to fetch {}: HTTP {}",
                url,
                response.status()
            ))?
        }
        Ok(response.text().await?)
    }
}

/// Builds the record for one episode page. Only the download block is mandatory.
pub fn parse_page(
    episode: &Episode,
    url: &str,
    webpage: &str,
    ranker: &dyn FormatRanker,
) -> Result<MediaRecord, Error> {
    let download_options = download_options(webpage)?;
    let (mut formats, video_id) = extract_formats(&download_links(download_options)?)?;
    ranker.sort(&mut formats);

    let title = page::og_search_title(webpage)?;
    let title = title.split(" | ").next().unwrap_or(&title).to_string();
    let upload_date = page::search_regex(webpage, &[AIR_DATE], "upload date", false)?
        .and_then(|date| page::unified_strdate(&date));
    let duration = page::search_regex(webpage, &[RUNNING_TIME], "duration", false)?
        .and_then(|duration| page::parse_duration(&duration));

    Ok(MediaRecord {
        id: video_id,
        display_id: episode.display_id(),
        webpage_url: url.to_string(),
        title,
        formats,
        description: page::og_search_description(webpage)?,
        thumbnail: page::og_search_thumbnail(webpage)?,
        upload_date,
        duration,
    })
}

fn download_options(webpage: &str) -> Result<&str, Error> {
    let regex = Regex::new(DOWNLOAD_OPTIONS)?;
    Ok(regex
        .captures(webpage)
        .and_then(|capture| capture.get(1))
        .ok_or(anyhow!("Unable to extract download options"))?
        .as_str())
}

/// `(url, label)` of every plain-text link, in page order.
fn download_links(download_options: &str) -> Result<Vec<(String, String)>, Error> {
    let regex = Regex::new(DOWNLOAD_LINK)?;
    Ok(regex
        .captures_iter(download_options)
        .map(|capture| (capture["url"].to_string(), capture["label"].to_string()))
        .collect())
}

/// Turns the links into formats. The last MP4 whose file name carries an id names the video.
fn extract_formats(links: &[(String, String)]) -> Result<(Vec<Format>, Option<String>), Error> {
    let file_name_regex = Regex::new(MP4_FILE_NAME)?;
    let mut formats = Vec::with_capacity(links.len());
    let mut video_id = None;
    for (url, label) in links {
        let mut format = Format {
            format_id: label.replace(' ', "-"),
            url: url.clone(),
            width: None,
            height: None,
            tbr: None,
        };
        if page::determine_ext(url).as_deref() == Some("mp4") {
            if let Some(capture) = file_name_regex.captures(url) {
                format.width = int_or_none(capture.name("width").map(|m| m.as_str()));
                format.height = int_or_none(capture.name("height").map(|m| m.as_str()));
                format.tbr = int_or_none(capture.name("bitrate").map(|m| m.as_str()));
                video_id = Some(capture["id"].to_string());
            }
        }
        formats.push(format);
    }
    Ok((formats, video_id))
}

fn int_or_none(digits: Option<&str>) -> Option<u64> {
    digits.and_then(|digits| digits.parse().ok())
}
