//! Feed fetcher with SSRF protection and resource limits.

use std::net::IpAddr;
use std::time::Duration;

use feed_rs::parser;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use reqwest::Client;
use tracing::debug;

use super::types::ParseOutcome;
use crate::config::FetchConfig;
use crate::{FoloError, Result};

/// Hostnames and suffixes never fetched unless private hosts are allowed.
const FORBIDDEN_HOST_SUFFIXES: &[&str] = &[
    ".local",
    ".localhost",
    ".internal",
    ".intranet",
    ".corp",
    ".home",
    ".lan",
];

/// HTTP fetcher that turns a feed URL into a [`ParseOutcome`].
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    max_feed_size: u64,
    max_content_length: usize,
    allow_private_hosts: bool,
}

impl FeedFetcher {
    /// Build a fetcher from the `[fetch]` configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .read_timeout(Duration::from_secs(config.read_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .redirect(redirect_policy(config.max_redirects, config.allow_private_hosts))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| FoloError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_feed_size: config.max_feed_size_bytes,
            max_content_length: config.max_content_length,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Maximum article content length in characters.
    pub fn max_content_length(&self) -> usize {
        self.max_content_length
    }

    /// Fetch and parse the feed at `url`.
    ///
    /// Returns `Err` only when the URL itself is rejected. Everything that
    /// goes wrong after that (transport, HTTP status, size, parser) is an
    /// [`ParseOutcome::Unreadable`].
    pub async fn fetch(&self, url: &str) -> Result<ParseOutcome> {
        validate_url(url, self.allow_private_hosts)?;

        let mut response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                return Ok(ParseOutcome::Unreadable {
                    reason: format!("failed to fetch feed: {e}"),
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Ok(ParseOutcome::Unreadable {
                reason: format!("HTTP error: {status}"),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_feed_size {
                return Ok(self.too_large(content_length));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);

        let mut body: Vec<u8> = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    body.extend_from_slice(&chunk);
                    if body.len() as u64 > self.max_feed_size {
                        return Ok(self.too_large(body.len() as u64));
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    return Ok(ParseOutcome::Unreadable {
                        reason: format!("failed to read response: {e}"),
                    })
                }
            }
        }

        debug!(feed = %url, bytes = body.len(), "Fetched feed document");
        Ok(parse_document(&body, Some(url), content_type.as_deref()))
    }

    fn too_large(&self, size: u64) -> ParseOutcome {
        ParseOutcome::Unreadable {
            reason: format!(
                "feed too large: {} bytes (max {} bytes)",
                size, self.max_feed_size
            ),
        }
    }
}

/// Redirect policy that applies the URL checks to every hop.
fn redirect_policy(max_redirects: usize, allow_private_hosts: bool) -> Policy {
    Policy::custom(move |attempt| {
        match check_redirect(
            attempt.url(),
            attempt.previous().len(),
            max_redirects,
            allow_private_hosts,
        ) {
            Ok(()) => attempt.follow(),
            Err(e) => attempt.error(e),
        }
    })
}

/// Decide whether a redirect to `target` may be followed after `hops`
/// earlier requests.
fn check_redirect(
    target: &url::Url,
    hops: usize,
    max_redirects: usize,
    allow_private_hosts: bool,
) -> Result<()> {
    if hops > max_redirects {
        return Err(FoloError::Validation(format!(
            "too many redirects (max {max_redirects})"
        )));
    }
    validate_url(target.as_str(), allow_private_hosts).map(|_| ())
}

/// Parse a feed document.
///
/// The parser is built without its id generator so that entries lacking an
/// id stay observable as such. A document the parser rejects is retried once
/// from the first feed marker when something (typically a server-side error
/// message) was printed ahead of it; if that salvage yields entries the
/// outcome is usable with a warning.
pub fn parse_document(
    bytes: &[u8],
    base_uri: Option<&str>,
    content_type: Option<&str>,
) -> ParseOutcome {
    let mut warnings = Vec::new();

    if let Some(content_type) = content_type {
        if !looks_like_feed_content_type(content_type) {
            warnings.push(format!("unexpected content type: {content_type}"));
        }
    }

    let parser = parser::Builder::new()
        .base_uri(base_uri)
        .id_generator(|_links, _title, _uri| String::new())
        .build();

    let error = match parser.parse(bytes) {
        Ok(feed) => return ParseOutcome::Usable { feed, warnings },
        Err(e) => e,
    };

    if let Some(start) = find_document_start(bytes) {
        if let Ok(feed) = parser.parse(&bytes[start..]) {
            if !feed.entries.is_empty() {
                warnings.push(format!(
                    "skipped {start} bytes of malformed content before the document"
                ));
                return ParseOutcome::Usable { feed, warnings };
            }
        }
    }

    ParseOutcome::Unreadable {
        reason: error.to_string(),
    }
}

/// Offset of the first feed marker, if it is not at the start of `bytes`.
fn find_document_start(bytes: &[u8]) -> Option<usize> {
    const MARKERS: &[&[u8]] = &[b"<?xml", b"<rss", b"<feed", b"<rdf:RDF"];

    MARKERS
        .iter()
        .filter_map(|marker| {
            bytes
                .windows(marker.len())
                .position(|window| window == *marker)
        })
        .min()
        .filter(|start| *start > 0)
}

fn looks_like_feed_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.contains("xml") || mime.contains("rss") || mime.contains("atom") || mime.contains("json")
}

/// Validate a feed URL.
///
/// The URL must be absolute `http`/`https`. Unless `allow_private_hosts` is
/// set, reserved hostnames and loopback/private/link-local addresses are
/// refused.
pub fn validate_url(url: &str, allow_private_hosts: bool) -> Result<url::Url> {
    let parsed =
        url::Url::parse(url).map_err(|e| FoloError::Validation(format!("invalid URL: {e}")))?;

    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(FoloError::Validation(format!(
            "unsupported URL scheme: {}",
            parsed.scheme()
        )));
    }

    let host = parsed
        .host()
        .ok_or_else(|| FoloError::Validation("URL has no host".to_string()))?;

    if allow_private_hosts {
        return Ok(parsed);
    }

    match host {
        url::Host::Domain(domain) if is_forbidden_hostname(domain) => {
            return Err(FoloError::Validation(format!("forbidden host: {domain}")));
        }
        url::Host::Domain(_) => {}
        url::Host::Ipv4(ip) => check_ip(IpAddr::V4(ip))?,
        url::Host::Ipv6(ip) => check_ip(IpAddr::V6(ip))?,
    }

    Ok(parsed)
}

fn check_ip(ip: IpAddr) -> Result<()> {
    if is_private_ip(&ip) {
        return Err(FoloError::Validation(format!(
            "private IP address not allowed: {ip}"
        )));
    }
    Ok(())
}

fn is_forbidden_hostname(host: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == "localhost" || FORBIDDEN_HOST_SUFFIXES.iter().any(|s| host.ends_with(s))
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                || v4.is_documentation()
                // Carrier-grade NAT: 100.64.0.0/10
                || (octets[0] == 100 && (64..=127).contains(&octets[1]))
        }
        IpAddr::V6(v6) => {
            if let Some(mapped) = v6.to_ipv4_mapped() {
                return is_private_ip(&IpAddr::V4(mapped));
            }
            let first = v6.segments()[0];
            v6.is_loopback()
                || v6.is_unspecified()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80
        }
    }
}
