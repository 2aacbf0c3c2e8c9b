//! Scrape target normalization
//!
//! Turns user input (full URLs, scheme-less links, `ig:`/`tt:` prefixes or
//! bare usernames) into a canonical URL with a detected platform and kind.

use serde::Serialize;

use crate::data::Platform;
use crate::error::AppError;

/// What a target URL points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TargetKind {
    /// A creator profile; scraping yields that creator's recent videos
    Profile { username: String },
    /// A single video
    Video,
}

/// Normalized scrape request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScrapeTarget {
    pub url: String,
    pub platform: Platform,
    #[serde(flatten)]
    pub kind: TargetKind,
}

impl ScrapeTarget {
    /// Normalize and classify raw input.
    pub fn parse(input: &str) -> Result<Self, AppError> {
        let normalized = normalize_input(input)?;
        let url = url::Url::parse(&normalized)
            .map_err(|e| AppError::Validation(format!("invalid URL '{}': {}", input.trim(), e)))?;

        let host = url
            .host_str()
            .map(|h| h.to_ascii_lowercase())
            .ok_or_else(|| AppError::Validation(format!("URL has no host: {}", normalized)))?;
        let platform = detect_platform(&host).ok_or_else(|| {
            AppError::Validation(format!("unsupported platform for URL: {}", normalized))
        })?;

        let segments: Vec<&str> = url
            .path_segments()
            .map(|s| s.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let kind = detect_kind(platform, &host, &segments, &url).ok_or_else(|| {
            AppError::Validation(format!(
                "URL is neither a profile nor a video link: {}",
                normalized
            ))
        })?;

        Ok(Self {
            url: normalized,
            platform,
            kind,
        })
    }

    /// Profile target for a tracked account
    pub fn profile(platform: Platform, username: &str) -> Self {
        let username = username.trim().trim_start_matches('@').to_string();
        Self {
            url: platform.profile_url(&username),
            platform,
            kind: TargetKind::Profile { username },
        }
    }

    pub fn is_profile(&self) -> bool {
        matches!(self.kind, TargetKind::Profile { .. })
    }
}

fn normalize_input(input: &str) -> Result<String, AppError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("URL or username is required".to_string()));
    }

    let lower = trimmed.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        return Ok(trimmed.to_string());
    }

    if ["tiktok.com", "instagram.com", "youtube.com", "youtu.be"]
        .iter()
        .any(|domain| lower.contains(domain))
    {
        return Ok(format!("https://{}", trimmed));
    }

    let prefixed = [
        ("instagram:", Platform::Instagram),
        ("ig:", Platform::Instagram),
        ("tiktok:", Platform::Tiktok),
        ("tt:", Platform::Tiktok),
        ("youtube:", Platform::Youtube),
        ("yt:", Platform::Youtube),
    ];
    for (prefix, platform) in prefixed {
        if lower.starts_with(prefix) {
            let username = validate_username(&trimmed[prefix.len()..])?;
            return Ok(platform.profile_url(username));
        }
    }

    let username = validate_username(trimmed)?;
    Ok(Platform::Tiktok.profile_url(username))
}

fn validate_username(raw: &str) -> Result<&str, AppError> {
    let username = raw.trim().trim_start_matches('@');
    let valid = !username.is_empty()
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'));
    if valid {
        Ok(username)
    } else {
        Err(AppError::Validation(format!("invalid username: {}", raw.trim())))
    }
}

fn detect_platform(host: &str) -> Option<Platform> {
    if host.contains("tiktok") {
        Some(Platform::Tiktok)
    } else if host.contains("instagram") || host.contains("instagr.am") {
        Some(Platform::Instagram)
    } else if host.contains("youtube") || host.contains("youtu.be") {
        Some(Platform::Youtube)
    } else {
        None
    }
}

fn detect_kind(
    platform: Platform,
    host: &str,
    segments: &[&str],
    url: &url::Url,
) -> Option<TargetKind> {
    let profile = |name: &str| TargetKind::Profile {
        username: name.trim_start_matches('@').to_string(),
    };

    match platform {
        Platform::Tiktok => match segments {
            [user] if user.starts_with('@') && user.len() > 1 => Some(profile(*user)),
            [user, "video", id, ..]
                if user.starts_with('@') && id.chars().all(|c| c.is_ascii_digit()) =>
            {
                Some(TargetKind::Video)
            }
            _ => None,
        },
        Platform::Instagram => match segments {
            ["p" | "reel" | "reels", _id, ..] => Some(TargetKind::Video),
            [user] if !matches!(*user, "explore" | "accounts" | "stories") => Some(profile(*user)),
            _ => None,
        },
        Platform::Youtube => {
            if host.contains("youtu.be") {
                return (segments.len() == 1).then_some(TargetKind::Video);
            }
            match segments {
                ["watch"] if url.query_pairs().any(|(k, v)| k == "v" && !v.is_empty()) => {
                    Some(TargetKind::Video)
                }
                ["shorts", _id] => Some(TargetKind::Video),
                [user, ..] if user.starts_with('@') && user.len() > 1 => Some(profile(*user)),
                ["c", name, ..] => Some(profile(*name)),
                _ => None,
            }
        }
    }
}
