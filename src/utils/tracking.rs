use regex::Regex;
use url::Url;

/// Coarse device classification parsed from the User-Agent string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_type: String,
    pub browser: String,
    pub os: String,
}

/// Substring-level User-Agent parsing. Good enough for dashboard
/// breakdowns; anything needing precision should use a real UA database.
pub fn parse_user_agent(ua: &str) -> DeviceInfo {
    let lower = ua.to_lowercase();

    let tablet_re = Regex::new(r"tablet|ipad").unwrap();
    let mobile_re =
        Regex::new(r"mobile|android|iphone|ipad|ipod|blackberry|iemobile|opera mini").unwrap();

    let device_type = if tablet_re.is_match(&lower) {
        "tablet"
    } else if mobile_re.is_match(&lower) {
        "mobile"
    } else {
        "desktop"
    };

    // Ordered checks: Edge and many others embed "Chrome" in their UA, so
    // they classify as Chrome here. Kept as-is for dashboard continuity.
    let browser = if lower.contains("chrome") {
        "Chrome"
    } else if lower.contains("safari") {
        "Safari"
    } else if lower.contains("firefox") {
        "Firefox"
    } else if lower.contains("edge") {
        "Edge"
    } else {
        "Unknown"
    };

    let os = if lower.contains("windows") {
        "Windows"
    } else if lower.contains("mac") {
        "Mac"
    } else if lower.contains("linux") {
        "Linux"
    } else if lower.contains("android") {
        "Android"
    } else if lower.contains("ios") || lower.contains("iphone") || lower.contains("ipad") {
        "iOS"
    } else {
        "Unknown"
    };

    DeviceInfo {
        device_type: device_type.to_string(),
        browser: browser.to_string(),
        os: os.to_string(),
    }
}

/// Guess a country from the BCP 47 language tag's region subtag
/// (fr-FR -> FR). Low-confidence heuristic, not geolocation: a French
/// browser in Belgium still reports FR.
pub fn country_from_language(language: &str) -> Option<String> {
    let region = language
        .split(['-', '_'])
        .nth(1)?
        .trim();
    if region.len() == 2 && region.chars().all(|c| c.is_ascii_alphabetic()) {
        Some(region.to_uppercase())
    } else {
        None
    }
}

/// utm_* query parameters extracted from the hosting page URL
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub source: Option<String>,
    pub medium: Option<String>,
    pub campaign: Option<String>,
}

pub fn utm_params(page_url: &str) -> UtmParams {
    let Ok(url) = Url::parse(page_url) else {
        return UtmParams::default();
    };

    let mut params = UtmParams::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "utm_source" => params.source = Some(value.into_owned()),
            "utm_medium" => params.medium = Some(value.into_owned()),
            "utm_campaign" => params.campaign = Some(value.into_owned()),
            _ => {}
        }
    }
    params
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user_agent_desktop_chrome() {
        let info = parse_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 Chrome/126.0 Safari/537.36",
        );
        assert_eq!(info.device_type, "desktop");
        assert_eq!(info.browser, "Chrome");
        assert_eq!(info.os, "Windows");
    }

    #[test]
    fn test_parse_user_agent_iphone() {
        let info = parse_user_agent(
            "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) Version/17.0 Mobile/15E148 Safari/604.1",
        );
        assert_eq!(info.device_type, "mobile");
        assert_eq!(info.browser, "Safari");
        // "like Mac OS X" wins over iphone in the ordered checks
        assert_eq!(info.os, "Mac");
    }

    #[test]
    fn test_parse_user_agent_ipad_is_tablet() {
        let info = parse_user_agent("Mozilla/5.0 (iPad; CPU OS 16_6) Mobile/15E148");
        assert_eq!(info.device_type, "tablet");
    }

    #[test]
    fn test_parse_user_agent_unknown() {
        let info = parse_user_agent("curl/8.4.0");
        assert_eq!(info.device_type, "desktop");
        assert_eq!(info.browser, "Unknown");
        assert_eq!(info.os, "Unknown");
    }

    #[test]
    fn test_country_from_language() {
        assert_eq!(country_from_language("fr-FR"), Some("FR".to_string()));
        assert_eq!(country_from_language("en_us"), Some("US".to_string()));
        assert_eq!(country_from_language("fr"), None);
        assert_eq!(country_from_language("zh-Hant"), None);
        assert_eq!(country_from_language(""), None);
    }

    #[test]
    fn test_utm_params() {
        let params = utm_params(
            "https://play.example.com/c/summer?utm_source=newsletter&utm_medium=email&utm_campaign=soldes&x=1",
        );
        assert_eq!(params.source.as_deref(), Some("newsletter"));
        assert_eq!(params.medium.as_deref(), Some("email"));
        assert_eq!(params.campaign.as_deref(), Some("soldes"));
    }

    #[test]
    fn test_utm_params_invalid_url() {
        assert_eq!(utm_params("not a url"), UtmParams::default());
        assert_eq!(utm_params("https://example.com/"), UtmParams::default());
    }
}
